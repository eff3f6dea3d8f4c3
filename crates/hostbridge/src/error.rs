//! Failure taxonomy shared by every domain handler.
//!
//! Handlers never let a raw native error reach script space. Whatever goes
//! wrong is converted into a [`BridgeError`], whose [`ErrorKind`] is one of a
//! fixed set of categories, and whose [`context`](BridgeError::context) and
//! [`reason`](BridgeError::reason) become the `(context, message)` pair passed
//! to the script error entry point.

use std::io;

use serde::Serialize;
use strum::{Display, EnumString};
use thiserror::Error;

/// Reason reported when a path does not exist.
pub const FILE_NOT_FOUND: &str = "File not found";
/// Reason reported when a component id is not registered.
pub const COMPONENT_NOT_FOUND: &str = "Component not found";
/// Reason reported when the OS refuses access.
pub const ACCESS_DENIED: &str = "Access denied";
/// Reason reported when a file operation targets a directory.
pub const IS_A_DIRECTORY: &str = "Is a directory";
/// Reason reported when a directory operation targets a file.
pub const NOT_A_DIRECTORY: &str = "Not a directory";
/// Reason reported when the destination already exists.
pub const ALREADY_EXISTS: &str = "Path already exists";
/// Reason reported when a directory still has children.
pub const DIRECTORY_NOT_EMPTY: &str = "Directory not empty";
/// Catch-all reason for native failures.
pub const OPERATION_FAILED: &str = "Operation failed";
/// Reason reported when a pending callback expires.
pub const TIMED_OUT: &str = "Timed out";
/// Reason reported to calls still in flight at teardown.
pub const BRIDGE_DESTROYED: &str = "Bridge destroyed";
/// Reason reported when a host directory cannot be resolved.
pub const DIRECTORY_UNAVAILABLE: &str = "Directory unavailable";

/// Fixed categories of failure visible to script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumString, Display)]
pub enum ErrorKind {
    /// A required payload field was absent.
    MissingData,
    /// The wire message could not be decoded, or its payload had the wrong shape.
    InvalidEnvelope,
    /// The addressed file or component does not exist.
    NotFound,
    /// The host refused access to the resource.
    PermissionDenied,
    /// The domain is known but the action is not.
    UnknownAction,
    /// Native work failed for any other reason.
    NativeCallFailed,
}

/// Error raised inside the bridge and delivered through the error channel.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Required payload field was absent.
    #[error("missing required field '{field}'")]
    MissingData {
        /// Name of the absent field.
        field: &'static str,
    },

    /// Wire message or payload failed to decode.
    #[error("invalid envelope: {message}")]
    InvalidEnvelope {
        /// Description of the decode failure.
        message: String,
        /// Underlying JSON error, when there is one.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Target resource does not exist.
    #[error("{context}: {reason}")]
    NotFound {
        /// Path or id that was looked up.
        context: String,
        /// Short human-readable reason.
        reason: &'static str,
    },

    /// Host refused access.
    #[error("{context}: access denied")]
    PermissionDenied {
        /// Path that was refused.
        context: String,
    },

    /// Action not recognised for a known domain.
    #[error("unknown action '{action}' for domain '{domain}'")]
    UnknownAction {
        /// Domain the envelope addressed.
        domain: &'static str,
        /// Unrecognised action name.
        action: String,
    },

    /// Native work failed.
    #[error("{context}: {reason}")]
    NativeCallFailed {
        /// Path, id or action relevant to the failure.
        context: String,
        /// Short human-readable reason.
        reason: String,
    },
}

impl BridgeError {
    /// Taxonomy category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingData { .. } => ErrorKind::MissingData,
            Self::InvalidEnvelope { .. } => ErrorKind::InvalidEnvelope,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Self::UnknownAction { .. } => ErrorKind::UnknownAction,
            Self::NativeCallFailed { .. } => ErrorKind::NativeCallFailed,
        }
    }

    /// Value passed as `context` to the script error entry point.
    #[must_use]
    pub fn context(&self) -> &str {
        match self {
            Self::MissingData { field } => *field,
            Self::InvalidEnvelope { message, .. } => message.as_str(),
            Self::NotFound { context, .. }
            | Self::PermissionDenied { context }
            | Self::NativeCallFailed { context, .. } => context.as_str(),
            Self::UnknownAction { action, .. } => action.as_str(),
        }
    }

    /// Value passed as `message` to the script error entry point.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::MissingData { .. } => "Missing data",
            Self::InvalidEnvelope { .. } => "Invalid envelope",
            Self::NotFound { reason, .. } => *reason,
            Self::PermissionDenied { .. } => ACCESS_DENIED,
            Self::UnknownAction { .. } => "Unknown action",
            Self::NativeCallFailed { reason, .. } => reason.as_str(),
        }
    }

    /// Creates a missing field error.
    #[must_use]
    pub const fn missing(field: &'static str) -> Self {
        Self::MissingData { field }
    }

    /// Creates an invalid envelope error with a custom message.
    pub fn invalid_envelope(message: impl Into<String>) -> Self {
        Self::InvalidEnvelope {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an invalid envelope error from a serde failure.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::InvalidEnvelope {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Creates a not-found error for a filesystem path.
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::NotFound {
            context: path.into(),
            reason: FILE_NOT_FOUND,
        }
    }

    /// Creates a not-found error for a component id.
    pub fn component_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            context: id.into(),
            reason: COMPONENT_NOT_FOUND,
        }
    }

    /// Creates a permission error.
    pub fn permission_denied(context: impl Into<String>) -> Self {
        Self::PermissionDenied {
            context: context.into(),
        }
    }

    /// Creates an unknown action error.
    pub fn unknown_action(domain: &'static str, action: impl Into<String>) -> Self {
        Self::UnknownAction {
            domain,
            action: action.into(),
        }
    }

    /// Creates a native failure with an explicit reason.
    pub fn native(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NativeCallFailed {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Failure delivered when a pending callback expires.
    pub fn timed_out(action: impl Into<String>) -> Self {
        Self::native(action, TIMED_OUT)
    }

    /// Failure delivered to calls still in flight at teardown.
    pub fn destroyed(action: impl Into<String>) -> Self {
        Self::native(action, BRIDGE_DESTROYED)
    }

    /// Failure recorded when a handler panics.
    pub fn panicked(action: impl Into<String>) -> Self {
        Self::native(action, OPERATION_FAILED)
    }

    /// Maps an OS error onto the taxonomy, keyed by the primary path.
    pub fn from_io(path: impl Into<String>, error: &io::Error) -> Self {
        let context = path.into();
        let reason = match error.kind() {
            io::ErrorKind::NotFound => {
                return Self::NotFound {
                    context,
                    reason: FILE_NOT_FOUND,
                };
            }
            io::ErrorKind::PermissionDenied => return Self::PermissionDenied { context },
            io::ErrorKind::IsADirectory => IS_A_DIRECTORY,
            io::ErrorKind::NotADirectory => NOT_A_DIRECTORY,
            io::ErrorKind::AlreadyExists => ALREADY_EXISTS,
            io::ErrorKind::DirectoryNotEmpty => DIRECTORY_NOT_EMPTY,
            _ => OPERATION_FAILED,
        };
        Self::NativeCallFailed {
            context,
            reason: reason.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::missing(io::ErrorKind::NotFound, ErrorKind::NotFound, FILE_NOT_FOUND)]
    #[case::denied(io::ErrorKind::PermissionDenied, ErrorKind::PermissionDenied, ACCESS_DENIED)]
    #[case::directory(io::ErrorKind::IsADirectory, ErrorKind::NativeCallFailed, IS_A_DIRECTORY)]
    #[case::file(io::ErrorKind::NotADirectory, ErrorKind::NativeCallFailed, NOT_A_DIRECTORY)]
    #[case::exists(io::ErrorKind::AlreadyExists, ErrorKind::NativeCallFailed, ALREADY_EXISTS)]
    #[case::other(io::ErrorKind::Other, ErrorKind::NativeCallFailed, OPERATION_FAILED)]
    fn io_errors_map_onto_taxonomy(
        #[case] io_kind: io::ErrorKind,
        #[case] expected_kind: ErrorKind,
        #[case] expected_reason: &str,
    ) {
        let error = BridgeError::from_io("/tmp/x", &io::Error::from(io_kind));
        assert_eq!(error.kind(), expected_kind);
        assert_eq!(error.reason(), expected_reason);
        assert_eq!(error.context(), "/tmp/x");
    }

    #[test]
    fn missing_data_reports_field_as_context() {
        let error = BridgeError::missing("path");
        assert_eq!(error.kind(), ErrorKind::MissingData);
        assert_eq!(error.context(), "path");
        assert!(error.to_string().contains("'path'"));
    }

    #[test]
    fn unknown_action_mentions_domain() {
        let error = BridgeError::unknown_action("fs", "explode");
        assert_eq!(error.kind(), ErrorKind::UnknownAction);
        assert_eq!(error.context(), "explode");
        assert!(error.to_string().contains("'fs'"));
    }

    #[test]
    fn kind_round_trips_through_text() {
        let parsed: ErrorKind = "NativeCallFailed".parse().expect("parse kind");
        assert_eq!(parsed, ErrorKind::NativeCallFailed);
        assert_eq!(ErrorKind::MissingData.to_string(), "MissingData");
    }
}
