//! A client library for controlling 360° cameras over Wi-Fi using the
//! [Open Spherical Camera (OSC)] HTTP API.
//!
//! The library covers the session lifecycle, capability-gated option access,
//! picture capture with completion polling, and the stored-image operations
//! of the protocol (list, download, metadata, delete). Commands the library
//! does not model can be sent through the `execute` escape hatch.
//!
//! [Open Spherical Camera (OSC)]: https://developers.google.com/streetview/open-spherical-camera
//!
//! ## Example
//!
//! ```no_run
//! use osc_cam_rs::cam::{OscCam, PollPolicy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cam = OscCam::new("192.168.0.1", 80)?;
//!
//!     cam.connect().await?;
//!
//!     println!("Device info: {:#?}", cam.info().await?);
//!
//!     cam.take_picture(&PollPolicy::default()).await?;
//!
//!     cam.disconnect().await?;
//!
//!     Ok(())
//! }
//! ```

/// Contains command names, endpoint paths, the option vocabulary and default values.
pub mod consts;

/// Contains the command envelope codec for the command endpoint.
pub mod envelope;

/// Contains the HTTP plumbing and its error classification.
pub mod transport;

/// Contains the device info/state models and the completion-detection strategies.
pub mod device;

/// Contains the client-side mirror of the camera options.
pub mod options;

/// Contains various convenience methods for interacting with the camera.
pub mod util;

/// Contains the main camera struct.
pub mod cam;

/// Crate-specific error enum.
/// Every function interacting with the camera returns a Result enum with this error type.
#[derive(thiserror::Error, Debug)]
pub enum OscError {
    #[error("HTTP transport failed")]
    Transport(#[from] transport::TransportError),

    #[error("The device answered with a malformed response: {reason}")]
    MalformedResponse { reason: String },

    #[error("No active session, call connect() first")]
    NoActiveSession,

    #[error("The option \"{name}\" is not advertised by this device")]
    UnsupportedOption { name: String },

    #[error("An image URI is required for this operation")]
    MissingUri,

    #[error("Timed out while waiting for the device to finish the command")]
    PollTimeout(#[from] tokio::time::error::Elapsed),
}

pub type OscResult<T> = Result<T, OscError>;
