//! Shared configuration for the hostbridge runtime.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a
//! `hostbridge.toml` file (or the file named by `--config-path` /
//! `HOSTBRIDGE_CONFIG_PATH`), then `HOSTBRIDGE_*` environment variables, then
//! command-line flags. The embedding host usually calls [`Config::load`] once
//! at startup and hands the result to the bridge bootstrap.

mod defaults;
mod logging;

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use crate::defaults::{
    DEFAULT_APP_NAME, DEFAULT_CALLBACK_TIMEOUT_MS, DEFAULT_ERROR_FUNCTION,
    DEFAULT_EVENT_FUNCTION, DEFAULT_LOG_FILTER, DEFAULT_MAX_ENVELOPE_BYTES,
    DEFAULT_SUCCESS_FUNCTION, default_app_name, default_callback_timeout_ms,
    default_error_function, default_event_function, default_log_filter, default_log_format,
    default_max_envelope_bytes, default_success_function,
};
pub use crate::logging::{LogFormat, LogFormatParseError};

/// Resolved bridge configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "HOSTBRIDGE")]
pub struct Config {
    /// `tracing` filter expression, for example `hostbridge=debug`.
    #[ortho_config(default = default_log_filter())]
    pub log_filter: String,
    /// Encoding used for diagnostics on stderr.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Milliseconds before an unanswered callback is failed; `0` disables.
    #[ortho_config(default = default_callback_timeout_ms())]
    pub callback_timeout_ms: u64,
    /// Largest accepted wire message in bytes.
    #[ortho_config(default = default_max_envelope_bytes())]
    pub max_envelope_bytes: usize,
    /// Script global receiving success responses.
    #[ortho_config(default = default_success_function())]
    pub success_function: String,
    /// Script global receiving error responses.
    #[ortho_config(default = default_error_function())]
    pub error_function: String,
    /// Script global receiving unsolicited events.
    #[ortho_config(default = default_event_function())]
    pub event_function: String,
    /// Application name, used to derive the app data directory.
    #[ortho_config(default = default_app_name())]
    pub app_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            log_format: default_log_format(),
            callback_timeout_ms: default_callback_timeout_ms(),
            max_envelope_bytes: default_max_envelope_bytes(),
            success_function: default_success_function(),
            error_function: default_error_function(),
            event_function: default_event_function(),
            app_name: default_app_name(),
        }
    }
}

impl Config {
    /// Filter expression handed to the tracing subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Diagnostics encoding.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Callback expiry, or `None` when timeouts are disabled.
    #[must_use]
    pub const fn callback_timeout(&self) -> Option<Duration> {
        if self.callback_timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.callback_timeout_ms))
        }
    }

    /// Largest accepted wire message in bytes.
    #[must_use]
    pub const fn max_envelope_bytes(&self) -> usize {
        self.max_envelope_bytes
    }

    /// Name of the application, used for directory lookups.
    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.app_name
    }
}
