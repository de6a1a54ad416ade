use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, TryStreamExt as _};
use log::*;
use serde_json::{Map, Value};

use crate::{
    OscError, OscResult,
    consts,
    device::{CompletionCheck, DeviceInfo, DeviceState, VendorProgress},
    envelope::{self, CommandResponse, CommandState},
    options::OptionCache,
    transport::{Method, Transport, TransportError},
};

/// Struct for interacting with an OSC camera over the network.
///
/// One instance talks to one device and owns at most one session. Calls that
/// touch the session or the option cache take `&mut self`, so session
/// handling is serialized by the borrow rules; plain command round trips
/// only need `&self`.
pub struct OscCam {
    transport: Transport,
    /// Session id as assigned by the device, echoed back verbatim.
    sid: Option<Value>,
    options: OptionCache,
    cmds: Vec<String>,
    completion: Box<dyn CompletionCheck + Send + Sync>,
}

/// Controls how [`OscCam::execute_and_await`] waits for a long-running
/// command.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Pause between state fetches.
    pub interval: Duration,
    /// Overall cap on the wait. `None` polls for as long as the device
    /// keeps reporting progress.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: consts::POLL_INTERVAL,
            deadline: None,
        }
    }
}

impl PollPolicy {
    /// Default polling cadence with an overall deadline on top.
    pub fn with_deadline(deadline: Duration) -> Self {
        Self {
            deadline: Some(deadline),
            ..Self::default()
        }
    }
}

/// What [`OscCam::execute_and_await`] came back with.
#[derive(Debug)]
pub enum CommandOutcome {
    /// The first response already settled the command (`done` or `error`).
    Immediate(CommandResponse),
    /// The command kept running past the first response; this is the state
    /// snapshot that satisfied the completion check.
    Polled(DeviceState),
}

impl CommandOutcome {
    /// The immediate response, when no polling happened.
    pub fn response(&self) -> Option<&CommandResponse> {
        match self {
            Self::Immediate(response) => Some(response),
            Self::Polled(_) => None,
        }
    }

    /// The final state snapshot, when the polling path ran.
    pub fn state(&self) -> Option<&DeviceState> {
        match self {
            Self::Immediate(_) => None,
            Self::Polled(state) => Some(state),
        }
    }
}

/// An image download with the body still unread.
///
/// The payload is raw JPEG/binary data, not a command envelope. Pull it
/// fully buffered with [`Self::bytes`] or chunk by chunk with
/// [`Self::into_stream`].
pub struct ImageStream {
    inner: reqwest::Response,
}

impl ImageStream {
    pub fn status(&self) -> reqwest::StatusCode {
        self.inner.status()
    }

    /// Size announced by the device, if it sent a `Content-Length` header.
    pub fn content_length(&self) -> Option<u64> {
        self.inner.content_length()
    }

    /// Buffers the whole image into memory.
    pub async fn bytes(self) -> OscResult<Bytes> {
        Ok(self.inner.bytes().await.map_err(TransportError::from)?)
    }

    /// Turns the download into a stream of body chunks.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, TransportError>> {
        self.inner.bytes_stream().map_err(TransportError::from)
    }
}

impl OscCam {
    /// Prepares a client for the camera at `host:port`.
    ///
    /// Nothing is sent yet; the caller should use the `connect` function
    /// next to open a session.
    ///
    /// * `host` - IP or hostname of the device.
    /// * `port` - Port of the OSC endpoint, usually 80.
    pub fn new(host: impl Into<String>, port: u16) -> OscResult<Self> {
        Ok(Self {
            transport: Transport::new(host, port)?,
            sid: None,
            options: OptionCache::new(),
            cmds: Vec::new(),
            completion: Box::new(VendorProgress::bubl()),
        })
    }

    /// Swaps the strategy used to decide, from a state snapshot, whether a
    /// long-running command has finished.
    ///
    /// The default matches Bublcam-style devices ([`VendorProgress::bubl`]).
    /// Devices without any in-progress reporting can use
    /// [`AlwaysComplete`](crate::device::AlwaysComplete).
    pub fn set_completion_check(&mut self, check: impl CompletionCheck + Send + Sync + 'static) {
        self.completion = Box::new(check);
    }

    pub fn host(&self) -> &str {
        self.transport.host()
    }

    pub fn port(&self) -> u16 {
        self.transport.port()
    }

    /// Id of the active session, if any. Devices hand out either a number
    /// or a string; it is kept as received.
    pub fn session_id(&self) -> Option<&Value> {
        self.sid.as_ref()
    }

    /// Local mirror of the options the device has reported so far.
    pub fn options(&self) -> &OptionCache {
        &self.options
    }

    /// Command names the device advertised in the last `info` call.
    pub fn supported_commands(&self) -> &[String] {
        &self.cmds
    }

    pub(crate) fn completion(&self) -> &(dyn CompletionCheck + Send + Sync) {
        self.completion.as_ref()
    }

    /// Opens a session on the device.
    ///
    /// On `state: "done"` the reported `sessionId` is stored and the
    /// session-scoped commands become available. Any other response state
    /// is handed back untouched with no session established.
    pub async fn connect(&mut self) -> OscResult<CommandResponse> {
        if self.sid.is_some() {
            warn!("Opening a new session while one is active, the old one is replaced");
        }

        let response = self.execute(consts::cmd::START_SESSION, None).await?;

        if response.state == CommandState::Done {
            let sid = response
                .result("sessionId")
                .cloned()
                .ok_or_else(|| OscError::MalformedResponse {
                    reason: "startSession reported done without a sessionId".to_owned(),
                })?;

            info!("Session {sid} opened with {}:{}", self.host(), self.port());
            self.sid = Some(sid);
        }

        Ok(response)
    }

    /// Refreshes the current session so the device keeps it alive. Neither
    /// the session state nor its id change.
    pub async fn update(&mut self) -> OscResult<CommandResponse> {
        let sid = self.require_session()?;

        let mut parameters = Map::new();
        parameters.insert("sessionId".to_owned(), sid);

        self.execute(consts::cmd::UPDATE_SESSION, Some(parameters))
            .await
    }

    /// Closes the current session.
    ///
    /// The stored id is cleared no matter what the device answers; a failed
    /// close leaves the session to expire on the device on its own.
    pub async fn disconnect(&mut self) -> OscResult<CommandResponse> {
        let sid = self.require_session()?;

        let mut parameters = Map::new();
        parameters.insert("sessionId".to_owned(), sid);

        let result = self
            .execute(consts::cmd::CLOSE_SESSION, Some(parameters))
            .await;

        self.sid = None;

        match &result {
            Ok(response) if response.state != CommandState::Done => {
                warn!("closeSession was not accepted, dropping the session locally anyway");
            }
            Ok(_) => info!("Session closed"),
            Err(err) => warn!("closeSession failed ({err}), dropping the session locally anyway"),
        }

        result
    }

    /// Single command round trip against the command endpoint.
    ///
    /// Returns whatever the device reports, including `state: "error"`;
    /// device-side errors are data for the caller to inspect, not failures.
    /// This is also the escape hatch for commands the library does not
    /// model: pass any full command name and its parameters.
    ///
    /// * `name` - Full command name, such as `camera._bublUpdate`.
    /// * `parameters` - The command's `parameters` object, if it takes one.
    pub async fn execute(
        &self,
        name: &str,
        parameters: Option<Map<String, Value>>,
    ) -> OscResult<CommandResponse> {
        let body = envelope::encode(name, parameters);

        let raw = self
            .transport
            .execute(Method::Post, consts::path::COMMANDS_EXECUTE, Some(body))
            .await?;

        let response = envelope::decode(&raw.body)?;

        if response.state == CommandState::Error {
            warn!("{name} failed on the device: {:?}", response.errors);
        }

        Ok(response)
    }

    /// Executes a command and, if the device answers `inProgress`, polls
    /// the state endpoint until the completion check reports the device
    /// idle again.
    ///
    /// * `name` - Full command name.
    /// * `parameters` - The command's `parameters` object, if it takes one.
    /// * `policy` - Poll interval and optional overall deadline.
    ///
    /// Without a deadline this waits for as long as the device keeps
    /// reporting progress; with one, exceeding it returns
    /// [`OscError::PollTimeout`].
    pub async fn execute_and_await(
        &self,
        name: &str,
        parameters: Option<Map<String, Value>>,
        policy: &PollPolicy,
    ) -> OscResult<CommandOutcome> {
        let response = self.execute(name, parameters).await?;

        if response.state != CommandState::InProgress {
            return Ok(CommandOutcome::Immediate(response));
        }

        info!("{name} is still running on the device, polling for completion");

        let snapshot = match policy.deadline {
            Some(deadline) => {
                tokio::time::timeout(deadline, self.poll_until_complete(policy.interval)).await??
            }
            None => self.poll_until_complete(policy.interval).await?,
        };

        Ok(CommandOutcome::Polled(snapshot))
    }

    async fn poll_until_complete(&self, interval: Duration) -> OscResult<DeviceState> {
        loop {
            tokio::time::sleep(interval).await;

            let snapshot = self.state().await?;

            if self.completion.is_complete(&snapshot) {
                return Ok(snapshot);
            }

            debug!("Device still busy (fingerprint {})", snapshot.fingerprint);
        }
    }

    /// Triggers image capture.
    ///
    /// Capture routinely outlives the HTTP round trip, so the device tends
    /// to answer `inProgress`; the call then waits according to `policy`.
    ///
    /// * `policy` - Poll interval and optional overall deadline.
    pub async fn take_picture(&self, policy: &PollPolicy) -> OscResult<CommandOutcome> {
        let sid = self.require_session()?;

        let mut parameters = Map::new();
        parameters.insert("sessionId".to_owned(), sid);

        self.execute_and_await(consts::cmd::TAKE_PICTURE, Some(parameters), policy)
            .await
    }

    /// Fetches one state snapshot from the state endpoint.
    pub async fn state(&self) -> OscResult<DeviceState> {
        let raw = self
            .transport
            .execute(Method::Post, consts::path::STATE, None)
            .await?;

        serde_json::from_slice(&raw.body).map_err(|err| OscError::MalformedResponse {
            reason: err.to_string(),
        })
    }

    /// Fetches the device info document and remembers the advertised
    /// command list (see the `supported_commands` function).
    pub async fn info(&mut self) -> OscResult<DeviceInfo> {
        let raw = self
            .transport
            .execute(Method::Get, consts::path::INFO, None)
            .await?;

        let info: DeviceInfo =
            serde_json::from_slice(&raw.body).map_err(|err| OscError::MalformedResponse {
                reason: err.to_string(),
            })?;

        self.cmds = info.api.clone();

        Ok(info)
    }

    /// Lists stored images.
    ///
    /// * `count` - Maximum number of entries to return.
    /// * `max_thumbnail_size` - Largest acceptable thumbnail edge, in pixels.
    /// * `include_thumbnails` - Whether thumbnails are wanted at all.
    pub async fn list_images(
        &self,
        count: u32,
        max_thumbnail_size: u32,
        include_thumbnails: bool,
    ) -> OscResult<CommandResponse> {
        let mut parameters = Map::new();
        parameters.insert("entryCount".to_owned(), Value::from(count));
        parameters.insert("maxSize".to_owned(), Value::from(max_thumbnail_size));
        parameters.insert("includeThumb".to_owned(), Value::from(include_thumbnails));

        self.execute(consts::cmd::LIST_IMAGES, Some(parameters))
            .await
    }

    /// Deletes one stored image.
    ///
    /// * `uri` - Device-side identifier of the image, as reported by the
    ///   `list_images` function or by a finished capture.
    pub async fn delete_image(&self, uri: &str) -> OscResult<CommandResponse> {
        Self::require_uri(uri)?;

        let mut parameters = Map::new();
        parameters.insert("fileUri".to_owned(), Value::from(uri));

        self.execute(consts::cmd::DELETE, Some(parameters)).await
    }

    /// Reads the metadata (EXIF and spherical XMP) of one stored image.
    ///
    /// * `uri` - Device-side identifier of the image.
    pub async fn get_image_metadata(&self, uri: &str) -> OscResult<CommandResponse> {
        Self::require_uri(uri)?;

        let mut parameters = Map::new();
        parameters.insert("fileUri".to_owned(), Value::from(uri));

        self.execute(consts::cmd::GET_METADATA, Some(parameters))
            .await
    }

    /// Downloads one stored image.
    ///
    /// The response body is binary, not a command envelope, and is not
    /// buffered here; the returned [`ImageStream`] exposes it as bytes or
    /// as a chunk stream.
    ///
    /// * `uri` - Device-side identifier of the image.
    pub async fn get_image(&self, uri: &str) -> OscResult<ImageStream> {
        Self::require_uri(uri)?;

        let mut parameters = Map::new();
        parameters.insert("fileUri".to_owned(), Value::from(uri));

        let body = envelope::encode(consts::cmd::GET_IMAGE, Some(parameters));

        let inner = self
            .transport
            .send(Method::Post, consts::path::COMMANDS_EXECUTE, Some(body))
            .await?;

        Ok(ImageStream { inner })
    }

    /// Reads options from the device and merges them into the local cache.
    ///
    /// Every returned option whose name is part of the recognized
    /// vocabulary overwrites the cached value; anything else the device
    /// reports is ignored.
    ///
    /// * `names` - Option names to request. An empty slice requests the
    ///   full vocabulary of [`consts::OPTION_NAMES`].
    pub async fn get_options(&mut self, names: &[&str]) -> OscResult<CommandResponse> {
        let sid = self.require_session()?;

        let names: Vec<Value> = if names.is_empty() {
            consts::OPTION_NAMES
                .iter()
                .map(|name| Value::from(*name))
                .collect()
        } else {
            names.iter().map(|name| Value::from(*name)).collect()
        };

        let mut parameters = Map::new();
        parameters.insert("sessionId".to_owned(), sid);
        parameters.insert("optionNames".to_owned(), Value::Array(names));

        let response = self
            .execute(consts::cmd::GET_OPTIONS, Some(parameters))
            .await?;

        if let Some(options) = response.result("options").and_then(Value::as_object) {
            self.options.merge(options);
            debug!("Option cache now holds {} entries", self.options.len());
        }

        Ok(response)
    }

    /// Fetches the full recognized option vocabulary into the cache.
    pub async fn refresh_options(&mut self) -> OscResult<CommandResponse> {
        self.get_options(&[]).await
    }

    /// Writes options to the device.
    ///
    /// The whole batch is validated against the option cache first: if the
    /// cache is empty it is filled with one implicit full fetch, and any
    /// name the device has never reported rejects the batch with
    /// [`OscError::UnsupportedOption`] before a request is sent.
    ///
    /// * `settings` - Option name to new value.
    pub async fn set_options(&mut self, settings: Map<String, Value>) -> OscResult<CommandResponse> {
        let sid = self.require_session()?;

        if self.options.is_empty() {
            info!("Option cache is empty, fetching options before the write");
            self.refresh_options().await?;
        }

        for name in settings.keys() {
            if !self.options.contains(name) {
                warn!("Rejecting option write, {name} was never advertised by this device");
                return Err(OscError::UnsupportedOption { name: name.clone() });
            }
        }

        let mut parameters = Map::new();
        parameters.insert("sessionId".to_owned(), sid);
        parameters.insert("options".to_owned(), Value::Object(settings));

        self.execute(consts::cmd::SET_OPTIONS, Some(parameters))
            .await
    }

    fn require_session(&self) -> OscResult<Value> {
        self.sid.clone().ok_or(OscError::NoActiveSession)
    }

    fn require_uri(uri: &str) -> OscResult<()> {
        if uri.is_empty() {
            return Err(OscError::MissingUri);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn poll_policy_defaults_to_unbounded_one_second_cadence() {
        let policy = PollPolicy::default();

        assert_eq!(policy.interval, Duration::from_secs(1));
        assert_eq!(policy.deadline, None);

        let bounded = PollPolicy::with_deadline(Duration::from_secs(30));
        assert_eq!(bounded.interval, Duration::from_secs(1));
        assert_eq!(bounded.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn outcome_accessors_match_the_variant() {
        let response: CommandResponse =
            serde_json::from_value(json!({"state": "done", "results": {"fileUri": "pic.jpg"}}))
                .unwrap();

        let immediate = CommandOutcome::Immediate(response);
        assert!(immediate.response().is_some());
        assert!(immediate.state().is_none());

        let polled = CommandOutcome::Polled(DeviceState::default());
        assert!(polled.response().is_none());
        assert!(polled.state().is_some());
    }

    #[test]
    fn new_does_not_open_a_session() {
        let cam = OscCam::new("192.168.0.1", 80).unwrap();

        assert_eq!(cam.session_id(), None);
        assert!(cam.options().is_empty());
        assert!(cam.supported_commands().is_empty());
        assert_eq!(cam.host(), "192.168.0.1");
        assert_eq!(cam.port(), 80);
    }
}
