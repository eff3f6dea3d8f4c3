//! Capability domain handlers.
//!
//! Each domain module exposes `handle(services, envelope)`, which resolves the
//! action, decodes its arguments and either answers inline or returns a job
//! for the I/O worker. Handlers report failures as [`BridgeError`]; the
//! router turns them into responses.

pub(crate) mod app;
pub(crate) mod fs;
pub(crate) mod native_ui;
pub(crate) mod tray;
pub(crate) mod window;

use std::sync::Arc;

use serde_json::Value;

use crate::error::BridgeError;
use crate::filesystem::FileSystem;
use crate::host::{AppControl, DirectoryResolver, HostError, TrayControl, WindowControl};
use crate::registry::ComponentRegistry;
use crate::response::HostEvent;
use crate::watch::WatchTable;
use crate::worker::Job;

/// What a handler produced.
pub(crate) enum Outcome {
    /// The result is known now.
    Ready(Result<Value, BridgeError>),
    /// The result will come from the I/O worker.
    Deferred(Job),
}

impl Outcome {
    pub(crate) fn ready(value: Value) -> Self {
        Self::Ready(Ok(value))
    }
}

/// Collaborators and state reachable from handlers.
pub(crate) struct Services {
    pub(crate) app_name: String,
    pub(crate) filesystem: Arc<dyn FileSystem>,
    pub(crate) directories: Box<dyn DirectoryResolver>,
    pub(crate) window: Box<dyn WindowControl>,
    pub(crate) tray: Box<dyn TrayControl>,
    pub(crate) app: Box<dyn AppControl>,
    pub(crate) registry: ComponentRegistry,
    pub(crate) watches: WatchTable,
    /// Events raised while handling the current request.
    pub(crate) events: Vec<HostEvent>,
    /// Set by `app.quit`; acted on once the acknowledgement is delivered.
    pub(crate) quit_requested: bool,
}

pub(crate) fn host_failure(context: &str, error: &HostError) -> BridgeError {
    BridgeError::native(context, error.to_string())
}
