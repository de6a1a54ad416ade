use serde::Deserialize;
use serde_json::{Map, Value};

use crate::consts;

/// Static device metadata served at `/osc/info`.
///
/// Cameras routinely leave fields out of this document, so everything
/// falls back to its default when missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceInfo {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub firmware_version: String,
    pub support_url: String,
    pub gps: bool,
    pub gyro: bool,
    /// Seconds since the camera booted.
    pub uptime: u64,
    /// Ordered list of command names the device claims to support.
    pub api: Vec<String>,
    pub endpoints: Endpoints,
}

/// Ports the device advertises for the API and its update channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoints {
    pub http_port: u16,
    pub http_updates_port: u16,
}

/// One snapshot of `/osc/state`.
///
/// The `state` payload is device specific, so it stays a free-form JSON map.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    /// Opaque tag that changes whenever the state changes.
    pub fingerprint: String,
    pub state: Map<String, Value>,
}

impl DeviceState {
    /// Looks up one field of the free-form `state` payload.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }
}

/// Decides, from a state snapshot, whether the device has finished the
/// commands it reported as `inProgress`.
///
/// The protocol does not standardize in-progress reporting through the state
/// endpoint, so the detection logic is swappable per device family.
pub trait CompletionCheck {
    /// Returns `true` once the snapshot shows no command still running.
    fn is_complete(&self, state: &DeviceState) -> bool;

    /// Digs a finished command's `results` out of the snapshot, for devices
    /// that report per-command results there.
    ///
    /// * `name` - Full command name, such as `camera.takePicture`.
    /// * `state` - A snapshot that satisfied [`Self::is_complete`].
    fn results_for(&self, _name: &str, _state: &DeviceState) -> Option<Map<String, Value>> {
        None
    }
}

/// Completion check for devices that mirror command progress into an array
/// of command status objects under a vendor extension field of the state
/// payload.
///
/// The snapshot counts as complete once no entry in that array carries
/// `"state": "inProgress"`. A device that never populates the field is
/// complete on the first snapshot.
#[derive(Debug, Clone)]
pub struct VendorProgress {
    field: String,
}

impl VendorProgress {
    /// * `field` - Name of the state field holding the status array.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// The Bublcam flavour, which reports through `_bublCommands`.
    pub fn bubl() -> Self {
        Self::new(consts::BUBL_PROGRESS_FIELD)
    }

    fn entries<'a>(&self, state: &'a DeviceState) -> Option<&'a Vec<Value>> {
        state.field(&self.field)?.as_array()
    }
}

impl CompletionCheck for VendorProgress {
    fn is_complete(&self, state: &DeviceState) -> bool {
        match self.entries(state) {
            Some(entries) => !entries
                .iter()
                .any(|entry| entry.get("state").and_then(Value::as_str) == Some("inProgress")),
            None => true,
        }
    }

    fn results_for(&self, name: &str, state: &DeviceState) -> Option<Map<String, Value>> {
        self.entries(state)?
            .iter()
            .find(|entry| entry.get("name").and_then(Value::as_str) == Some(name))?
            .get("results")?
            .as_object()
            .cloned()
    }
}

/// Completion check for devices without any in-progress reporting; every
/// snapshot counts as complete.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysComplete;

impl CompletionCheck for AlwaysComplete {
    fn is_complete(&self, _state: &DeviceState) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(body: Value) -> DeviceState {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn info_tolerates_sparse_documents() {
        let info: DeviceInfo =
            serde_json::from_str(r#"{"manufacturer":"Bubl","api":["camera.takePicture"]}"#)
                .unwrap();

        assert_eq!(info.manufacturer, "Bubl");
        assert_eq!(info.api, vec!["camera.takePicture"]);
        assert_eq!(info.model, "");
        assert_eq!(info.endpoints.http_port, 0);
    }

    #[test]
    fn info_decodes_a_full_document() {
        let info: DeviceInfo = serde_json::from_value(json!({
            "manufacturer": "Bubl",
            "model": "bublcam1.0",
            "serialNumber": "100123",
            "firmwareVersion": "v1.2.3",
            "supportUrl": "http://www.bublcam.com/support",
            "gps": false,
            "gyro": true,
            "uptime": 67,
            "api": ["camera.startSession", "camera.takePicture"],
            "endpoints": {"httpPort": 80, "httpUpdatesPort": 10080}
        }))
        .unwrap();

        assert_eq!(info.serial_number, "100123");
        assert_eq!(info.firmware_version, "v1.2.3");
        assert!(info.gyro);
        assert!(!info.gps);
        assert_eq!(info.uptime, 67);
        assert_eq!(info.endpoints.http_port, 80);
        assert_eq!(info.endpoints.http_updates_port, 10080);
    }

    #[test]
    fn vendor_progress_sees_running_commands() {
        let check = VendorProgress::bubl();

        let running = snapshot(json!({
            "fingerprint": "FIG_0001",
            "state": {
                "batteryLevel": 0.5,
                "_bublCommands": [
                    {"name": "camera.takePicture", "state": "inProgress", "progress": {"completion": 0.25}}
                ]
            }
        }));
        assert!(!check.is_complete(&running));

        let finished = snapshot(json!({
            "fingerprint": "FIG_0002",
            "state": {
                "_bublCommands": [
                    {"name": "camera.takePicture", "state": "done", "results": {"fileUri": "pic.jpg"}}
                ]
            }
        }));
        assert!(check.is_complete(&finished));
    }

    #[test]
    fn missing_progress_field_means_complete() {
        let check = VendorProgress::bubl();
        let state = snapshot(json!({"state": {"batteryLevel": 1.0}}));

        assert!(check.is_complete(&state));
        assert_eq!(check.results_for("camera.takePicture", &state), None);
    }

    #[test]
    fn empty_progress_array_means_complete() {
        let check = VendorProgress::bubl();
        let state = snapshot(json!({"state": {"_bublCommands": []}}));

        assert!(check.is_complete(&state));
    }

    #[test]
    fn vendor_progress_extracts_results_by_command_name() {
        let check = VendorProgress::bubl();
        let state = snapshot(json!({
            "state": {
                "_bublCommands": [
                    {"name": "camera._bublTimelapse", "state": "done", "results": {}},
                    {"name": "camera.takePicture", "state": "done", "results": {"fileUri": "pic.jpg"}}
                ]
            }
        }));

        let results = check.results_for("camera.takePicture", &state).unwrap();
        assert_eq!(results.get("fileUri"), Some(&json!("pic.jpg")));
        assert_eq!(check.results_for("camera.getOptions", &state), None);
    }

    #[test]
    fn always_complete_ignores_the_snapshot() {
        let state = snapshot(json!({
            "state": {
                "_bublCommands": [{"name": "camera.takePicture", "state": "inProgress"}]
            }
        }));

        assert!(AlwaysComplete.is_complete(&state));
    }
}
