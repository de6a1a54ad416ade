use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{OscError, OscResult};

/// Execution state reported by the device for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommandState {
    /// The command finished; `results` holds its output.
    Done,
    /// The command is still running on the device.
    InProgress,
    /// The command failed; `errors` holds the device's error info.
    Error,
}

/// Structured error info the device attaches to a failed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// A decoded command response envelope.
///
/// `state` is the only field every device sends. `name` and `id` are echoes
/// some devices add (`id` identifies an in-progress command). A device-side
/// failure shows up as `state == Error` with `errors` filled in; it is
/// returned to the caller as data, never as an `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub state: CommandState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<CommandError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl CommandResponse {
    /// Looks up a field of `results`. `None` when the response has no
    /// results or the field is absent.
    pub fn result(&self, field: &str) -> Option<&Value> {
        self.results.as_ref()?.get(field)
    }
}

/// Encodes a command request as the canonical `{"name": ..., "parameters":
/// ...}` body. `parameters` is omitted entirely when not applicable, as for
/// `camera.startSession`.
pub fn encode(name: &str, parameters: Option<Map<String, Value>>) -> Vec<u8> {
    let mut body = Map::new();
    body.insert("name".to_owned(), Value::from(name));

    if let Some(parameters) = parameters {
        body.insert("parameters".to_owned(), Value::Object(parameters));
    }

    Value::Object(body).to_string().into_bytes()
}

/// Decodes a command response body.
///
/// Fails with [`OscError::MalformedResponse`] when the body is not valid
/// JSON or the required envelope fields are missing or of the wrong shape.
/// Fields this library does not model are ignored.
pub fn decode(body: &[u8]) -> OscResult<CommandResponse> {
    serde_json::from_slice(body).map_err(|err| OscError::MalformedResponse {
        reason: err.to_string(),
    })
}
