//! Test helpers for the mock-device integration tests

// Each test binary compiles this module on its own and uses a subset.
#![allow(dead_code)]

use mockito::{Matcher, Mock, ServerGuard};
use osc_cam_rs::cam::OscCam;
use serde_json::{Value, json};

/// Builds a client pointed at the mock device.
pub fn cam_for(server: &ServerGuard) -> OscCam {
    let address = server.host_with_port();
    let (host, port) = address
        .rsplit_once(':')
        .expect("mock server address should be host:port");

    OscCam::new(host, port.parse().expect("mock server port")).expect("client should build")
}

/// Mounts a `camera.startSession` mock answering `done` with the given id.
pub async fn session_mock(server: &mut ServerGuard, sid: Value) -> Mock {
    command_mock(
        server,
        json!({"name": "camera.startSession"}),
        json!({"state": "done", "results": {"sessionId": sid}}),
    )
    .await
}

/// Mounts a command-endpoint mock matching `request` exactly and answering
/// with the given envelope.
pub async fn command_mock(server: &mut ServerGuard, request: Value, response: Value) -> Mock {
    server
        .mock("POST", "/osc/commands/execute")
        .match_body(Matcher::Json(request))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(response.to_string())
        .create_async()
        .await
}

/// Mounts a `/osc/state` mock serving the given snapshot document.
pub async fn state_mock(server: &mut ServerGuard, snapshot: Value) -> Mock {
    server
        .mock("POST", "/osc/state")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(snapshot.to_string())
        .create_async()
        .await
}
