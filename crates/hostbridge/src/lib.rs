//! Asynchronous message bridge between embedded script code and native host
//! capabilities.
//!
//! Script code running inside a sandboxed web-content engine posts JSON
//! envelopes naming a capability domain, an action, a payload and an optional
//! callback id. The bridge decodes each envelope, routes it to the domain
//! handler, and answers every callback id exactly once through the host's
//! script entry points:
//!
//! ```text
//! script  ──{"domain":"fs","action":"readFile","data":{"path":"/tmp/t.txt"},"callbackId":"cb1"}──▶  BridgeContext::dispatch
//!                                                                                                       │
//! script  ◀──__hostbridgeResolve("cb1","readFile","hello")── ResponseSink ◀── correlator ◀── handler ◀─┘
//! ```
//!
//! Domains:
//!
//! - `fs`: file and directory access, run on a background worker.
//! - `nativeUI`: lists and tables owned by a [`ComponentRegistry`].
//! - `window`, `tray`, `app`: thin commands over host collaborators.
//!
//! One [`BridgeContext`] exists per script session. It lives on the UI
//! thread; the host calls [`BridgeContext::pump`] from its loop to deliver
//! results produced by the worker.
//!
//! Failures never escape to the host. Every handler error is mapped onto the
//! fixed [`ErrorKind`] taxonomy and delivered to the caller's error entry
//! point, or logged when the request carried no callback id.

mod bootstrap;
mod context;
mod correlator;
mod domains;
mod envelope;
mod error;
mod filesystem;
mod health;
pub mod host;
pub mod registry;
mod response;
mod router;
mod telemetry;
mod watch;
mod worker;

pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, bootstrap_with,
};
pub use context::{BridgeContext, BridgeHost, DispatchStatus};
pub use correlator::{CallbackCorrelator, CallbackTicket, CorrelationError};
pub use envelope::{Envelope, ReplyAddress, recover_reply_address};
pub use error::{
    ACCESS_DENIED, ALREADY_EXISTS, BRIDGE_DESTROYED, BridgeError, COMPONENT_NOT_FOUND,
    DIRECTORY_NOT_EMPTY, DIRECTORY_UNAVAILABLE, ErrorKind, FILE_NOT_FOUND, IS_A_DIRECTORY,
    NOT_A_DIRECTORY, OPERATION_FAILED, TIMED_OUT,
};
pub use filesystem::{DirEntryInfo, FileStat, FileSystem, NativeFileSystem};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use registry::{ComponentRegistry, Interaction};
pub use response::{
    EntryPoints, HostEvent, JsonlSink, RecordingSink, Response, ResponseSink, ScriptChannel,
    ScriptFunctionSink, script_call,
};
pub use router::Domain;
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};
pub use watch::{WatchEntry, WatchTable};
pub use worker::{CompletionWaker, WorkerError};

#[cfg(test)]
mod tests;
