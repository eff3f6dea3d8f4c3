//! Shared harness for session-level tests.

use std::path::PathBuf;
use std::time::Duration;

use hostbridge_config::Config;
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::context::{BridgeContext, BridgeHost, DispatchStatus};
use crate::filesystem::FileSystem;
use crate::host::headless::{HeadlessApp, HeadlessTray, HeadlessWindow};
use crate::registry::HeadlessToolkit;
use crate::response::{RecordingSink, Response};

/// Callback timeout used unless a test asks for another.
pub(crate) const TEST_TIMEOUT_MS: u64 = 2_000;

/// Upper bound for draining the worker in tests.
pub(crate) const DRAIN: Duration = Duration::from_secs(5);

pub(crate) fn test_config(callback_timeout_ms: u64) -> Config {
    Config {
        callback_timeout_ms,
        app_name: "hostbridge-tests".to_owned(),
        ..Config::default()
    }
}

/// A bridge plus handles onto every headless collaborator it owns.
pub(crate) struct Harness {
    pub(crate) bridge: BridgeContext,
    pub(crate) sink: RecordingSink,
    pub(crate) toolkit: HeadlessToolkit,
    pub(crate) window: HeadlessWindow,
    pub(crate) tray: HeadlessTray,
    pub(crate) app: HeadlessApp,
    pub(crate) dir: TempDir,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::build(test_config(TEST_TIMEOUT_MS), |host| host)
    }

    pub(crate) fn with_filesystem(filesystem: impl FileSystem + 'static) -> Self {
        Self::build(test_config(TEST_TIMEOUT_MS), |host| {
            host.with_filesystem(filesystem)
        })
    }

    pub(crate) fn build(config: Config, customise: impl FnOnce(BridgeHost) -> BridgeHost) -> Self {
        let sink = RecordingSink::new();
        let toolkit = HeadlessToolkit::new();
        let window = HeadlessWindow::new();
        let tray = HeadlessTray::new();
        let app = HeadlessApp::new(config.app_name(), "1.2.3");
        let host = customise(
            BridgeHost::headless(&config)
                .with_toolkit(toolkit.clone())
                .with_window(window.clone())
                .with_tray(tray.clone())
                .with_app(app.clone()),
        );
        let bridge = BridgeContext::new(config, host, Box::new(sink.clone()))
            .expect("bridge worker should start");
        Self {
            bridge,
            sink,
            toolkit,
            window,
            tray,
            app,
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Absolute path of `name` inside the scratch directory.
    pub(crate) fn path(&self, name: &str) -> String {
        self.dir_path().join(name).to_string_lossy().into_owned()
    }

    pub(crate) fn dir_path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub(crate) fn send(&mut self, message: &Value) -> DispatchStatus {
        self.bridge.dispatch_str(&message.to_string())
    }

    /// Dispatches `message` and waits for any work it queued.
    pub(crate) fn call(&mut self, message: &Value) -> DispatchStatus {
        let status = self.send(message);
        self.settle();
        status
    }

    pub(crate) fn settle(&mut self) {
        assert!(
            self.bridge.pump_until_idle(DRAIN),
            "worker should go idle"
        );
    }

    /// The single response for `callback_id`.
    pub(crate) fn only_response(&self, callback_id: &str) -> Response {
        let mut responses = self.sink.responses_for(callback_id);
        assert_eq!(
            responses.len(),
            1,
            "expected exactly one response for {callback_id}: {responses:?}"
        );
        responses.remove(0)
    }

    pub(crate) fn result(&self, callback_id: &str) -> Value {
        let response = self.only_response(callback_id);
        response
            .result()
            .cloned()
            .unwrap_or_else(|| panic!("expected success for {callback_id}: {response:?}"))
    }
}

/// Builds an envelope message.
pub(crate) fn envelope(domain: &str, action: &str, data: Value, callback_id: &str) -> Value {
    json!({
        "domain": domain,
        "action": action,
        "data": data,
        "callbackId": callback_id,
    })
}
