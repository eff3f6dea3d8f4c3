use crate::logging::LogFormat;

/// Log filter applied when nothing else is configured.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Milliseconds a callback may stay in flight before it is failed.
pub const DEFAULT_CALLBACK_TIMEOUT_MS: u64 = 30_000;

/// Largest wire message the codec accepts.
pub const DEFAULT_MAX_ENVELOPE_BYTES: usize = 1024 * 1024;

/// Script global invoked with `(callbackId, action, result)`.
pub const DEFAULT_SUCCESS_FUNCTION: &str = "__hostbridgeResolve";

/// Script global invoked with `(callbackId, action, context, message)`.
pub const DEFAULT_ERROR_FUNCTION: &str = "__hostbridgeReject";

/// Script global invoked with unsolicited component and tray events.
pub const DEFAULT_EVENT_FUNCTION: &str = "__hostbridgeEvent";

/// Application name used for the per-app data directory.
pub const DEFAULT_APP_NAME: &str = "hostbridge";

/// Owned log filter, for serde and `ortho_config` defaults.
#[must_use]
pub fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default diagnostics encoding.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default callback timeout in milliseconds.
#[must_use]
pub const fn default_callback_timeout_ms() -> u64 {
    DEFAULT_CALLBACK_TIMEOUT_MS
}

/// Default envelope size limit in bytes.
#[must_use]
pub const fn default_max_envelope_bytes() -> usize {
    DEFAULT_MAX_ENVELOPE_BYTES
}

/// Default success entry point name.
#[must_use]
pub fn default_success_function() -> String {
    DEFAULT_SUCCESS_FUNCTION.to_owned()
}

/// Default error entry point name.
#[must_use]
pub fn default_error_function() -> String {
    DEFAULT_ERROR_FUNCTION.to_owned()
}

/// Default event entry point name.
#[must_use]
pub fn default_event_function() -> String {
    DEFAULT_EVENT_FUNCTION.to_owned()
}

/// Default application name.
#[must_use]
pub fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_owned()
}
