use crate::{
    OscError, OscResult,
    cam::{CommandOutcome, OscCam, PollPolicy},
    consts,
};
use log::*;
use serde_json::Value;
use std::future::Future;

/// This trait provides convenience functions for the `OscCam` struct.
pub trait CamUtil {
    /// Convenience method for taking a picture and also downloading it.
    ///
    /// * `policy` - Poll interval and optional deadline used while waiting
    ///   for the capture to finish.
    ///
    /// Returns the image as a byte buffer.
    fn take_picture_and_get(
        &self,
        policy: &PollPolicy,
    ) -> impl Future<Output = OscResult<Vec<u8>>> + Send;
}

impl CamUtil for OscCam {
    async fn take_picture_and_get(&self, policy: &PollPolicy) -> OscResult<Vec<u8>> {
        let outcome = self.take_picture(policy).await?;

        // Where the image ended up depends on how the capture finished:
        // an immediate `done` carries the fileUri in the response, a polled
        // capture reports it through the device state instead.
        let uri = match &outcome {
            CommandOutcome::Immediate(response) => response.result("fileUri").cloned(),
            CommandOutcome::Polled(snapshot) => self
                .completion()
                .results_for(consts::cmd::TAKE_PICTURE, snapshot)
                .and_then(|results| results.get("fileUri").cloned()),
        };

        let uri = uri
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| OscError::MalformedResponse {
                reason: "the device did not report a fileUri for the captured image".to_owned(),
            })?;

        info!("Capture finished, downloading {uri}");

        let image = self.get_image(&uri).await?;

        Ok(image.bytes().await?.to_vec())
    }
}
