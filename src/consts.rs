use std::time::Duration;

/// Interval between device state fetches while waiting for an asynchronous
/// command to finish. Matches the polling cadence the cameras expect.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Timeout for establishing the TCP connection to the camera.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for a buffered command round trip (request sent, response body
/// read). The image download path is not bounded by this.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// `User-Agent` sent with every request, identifying this library.
pub const USER_AGENT: &str = concat!("osc-cam-rs/", env!("CARGO_PKG_VERSION"));

/// Name of the anti-XSRF header required by OSC devices. Sent as `1`.
pub const XSRF_HEADER: &str = "x-xsrf-protected";

/// `Content-Type` for command bodies. The charset suffix is part of the
/// protocol, so the body is built by hand instead of through a JSON helper.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// State field under which Bubl cameras report in-flight commands. This is
/// a vendor extension, not part of the OSC standard.
pub const BUBL_PROGRESS_FIELD: &str = "_bublCommands";

/// Contains the HTTP endpoint paths of the OSC API.
pub mod path {
    pub const COMMANDS_EXECUTE: &str = "/osc/commands/execute";
    pub const INFO: &str = "/osc/info";
    pub const STATE: &str = "/osc/state";
}

/// Contains the command names modeled by this library. Any other name can
/// still be sent through the custom-command escape hatch.
pub mod cmd {
    pub const START_SESSION: &str = "camera.startSession";
    pub const UPDATE_SESSION: &str = "camera.updateSession";
    pub const CLOSE_SESSION: &str = "camera.closeSession";

    pub const TAKE_PICTURE: &str = "camera.takePicture";

    pub const LIST_IMAGES: &str = "camera.listImages";
    pub const DELETE: &str = "camera.delete";
    pub const GET_IMAGE: &str = "camera.getImage";
    pub const GET_METADATA: &str = "camera.getMetadata";

    pub const GET_OPTIONS: &str = "camera.getOptions";
    pub const SET_OPTIONS: &str = "camera.setOptions";
}

/// Option names recognized by the capability cache. Options returned by the
/// device under any other name are ignored. The `...Support` companions
/// carry the device-advertised value lists for their base option.
pub const OPTION_NAMES: &[&str] = &[
    "captureMode",
    "captureModeSupport",
    "exposureProgram",
    "exposureProgramSupport",
    "iso",
    "isoSupport",
    "shutterSpeed",
    "shutterSpeedSupport",
    "aperture",
    "apertureSupport",
    "whiteBalance",
    "whiteBalanceSupport",
    "exposureCompensation",
    "exposureCompensationSupport",
    "fileFormat",
    "fileFormatSupport",
    "exposureDelay",
    "exposureDelaySupport",
    "sleepDelay",
    "sleepDelaySupport",
    "offDelay",
    "offDelaySupport",
    "totalSpace",
    "remainingSpace",
    "gpsInfo",
    "dateTimeZone",
    "hdr",
    "hdrSupport",
    "exposureBracket",
    "exposureBracketSupport",
    "gyro",
    "gyroSupport",
    "imageStabilization",
    "imageStabilizationSupport",
    "wifiPassword",
];
