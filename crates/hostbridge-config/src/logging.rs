use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output encodings accepted for bridge diagnostics.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for hosts that ship logs elsewhere.
    Json,
    /// Single-line human readable events on stderr.
    #[default]
    Compact,
}

impl LogFormat {
    /// Returns `true` when events should be emitted as JSON objects.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Error returned when a [`LogFormat`] cannot be parsed from text.
pub type LogFormatParseError = strum::ParseError;
