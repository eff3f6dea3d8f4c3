//! Wire envelope decoding.
//!
//! Script code posts one JSON object per message:
//!
//! ```json
//! {"domain":"fs","action":"readFile","data":{"path":"/tmp/t.txt"},"callbackId":"cb1"}
//! ```
//!
//! The codec turns that object into a typed [`Envelope`] before anything is
//! routed. Optional fields that are absent fall back to defaults and unknown
//! fields are ignored; a message without a `domain` or `action`, or one that is
//! not valid JSON at all, is rejected with
//! [`ErrorKind::InvalidEnvelope`](crate::ErrorKind::InvalidEnvelope).
//!
//! Scripts are inconsistent about where they put `callbackId`: some send it
//! next to `domain`, some inside `data`. The top-level value wins when both
//! are present.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BridgeError;

const CALLBACK_FIELD: &str = "callbackId";

/// One decoded script-to-native message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Capability domain, for example `fs` or `nativeUI`.
    pub domain: String,
    /// Action within the domain.
    pub action: String,
    /// Action arguments; always a JSON object after decoding.
    #[serde(rename = "data")]
    pub payload: Value,
    /// Correlation id for the terminal response, absent for fire-and-forget.
    #[serde(rename = "callbackId", skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireEnvelope {
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    data: Value,
    #[serde(default, rename = "callbackId")]
    callback_id: Option<String>,
}

impl Envelope {
    /// Builds an envelope with an empty payload.
    pub fn new(domain: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            action: action.into(),
            payload: Value::Object(Map::new()),
            callback_id: None,
        }
    }

    /// Replaces the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attaches a callback id.
    #[must_use]
    pub fn with_callback(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = Some(callback_id.into());
        self
    }

    /// Decodes a raw wire message.
    ///
    /// Trailing whitespace (including a JSONL newline) is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidEnvelope`] when the message is empty,
    /// larger than `max_bytes`, not valid JSON, missing `domain` or `action`,
    /// or carries a `data` value that is neither an object nor null.
    pub fn decode(message: &[u8], max_bytes: usize) -> Result<Self, BridgeError> {
        let trimmed = trim_trailing_whitespace(message);
        if trimmed.is_empty() {
            return Err(BridgeError::invalid_envelope("empty message"));
        }
        if trimmed.len() > max_bytes {
            return Err(BridgeError::invalid_envelope(format!(
                "message of {} bytes exceeds {max_bytes} byte limit",
                trimmed.len()
            )));
        }

        let root: Value = serde_json::from_slice(trimmed).map_err(BridgeError::from_json_error)?;
        if !root.is_object() {
            return Err(BridgeError::invalid_envelope("message must be a JSON object"));
        }
        let wire = WireEnvelope::deserialize(root).map_err(BridgeError::from_json_error)?;
        let domain = non_blank(wire.domain, "domain")?;
        let action = non_blank(wire.action, "action")?;

        let payload = match wire.data {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(BridgeError::invalid_envelope("data must be an object")),
        };

        let callback_id = match wire.callback_id {
            Some(id) => Some(id),
            None => nested_callback_id(&payload)?,
        }
        .filter(|id| !id.is_empty());

        Ok(Self {
            domain,
            action,
            payload: Value::Object(payload),
            callback_id,
        })
    }

    /// Encodes the envelope in wire form.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidEnvelope`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, BridgeError> {
        serde_json::to_vec(self).map_err(BridgeError::from_json_error)
    }

    /// Deserializes the payload into action-specific arguments.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidEnvelope`] when a field has the wrong type.
    pub fn arguments<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        T::deserialize(&self.payload).map_err(BridgeError::from_json_error)
    }
}

/// Reply address salvaged from a message that failed to decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyAddress {
    /// Callback id found in the message.
    pub callback_id: String,
    /// Action name, or an empty string when none could be read.
    pub action: String,
    /// Domain name, when the message carried one as a string.
    pub domain: Option<String>,
}

/// Best-effort recovery of the callback id from a rejected message.
///
/// Returns `None` unless the message is a JSON object carrying a non-empty
/// string `callbackId` at the top level or inside `data`.
#[must_use]
pub fn recover_reply_address(message: &[u8]) -> Option<ReplyAddress> {
    let Ok(Value::Object(root)) = serde_json::from_slice::<Value>(trim_trailing_whitespace(message))
    else {
        return None;
    };
    let callback_id = root
        .get(CALLBACK_FIELD)
        .and_then(Value::as_str)
        .or_else(|| {
            root.get("data")
                .and_then(|data| data.get(CALLBACK_FIELD))
                .and_then(Value::as_str)
        })
        .filter(|id| !id.is_empty())?;
    let action = root.get("action").and_then(Value::as_str).unwrap_or_default();
    let domain = root.get("domain").and_then(Value::as_str).map(str::to_owned);
    Some(ReplyAddress {
        callback_id: callback_id.to_owned(),
        action: action.to_owned(),
        domain,
    })
}

/// Unwraps a required argument, reporting the field name when absent.
///
/// # Errors
///
/// Returns [`BridgeError::MissingData`] naming `field` when `value` is `None`.
pub fn required<T>(value: Option<T>, field: &'static str) -> Result<T, BridgeError> {
    value.ok_or(BridgeError::missing(field))
}

fn non_blank(value: Option<String>, field: &str) -> Result<String, BridgeError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_owned()),
        _ => Err(BridgeError::invalid_envelope(format!("{field} field is missing"))),
    }
}

fn nested_callback_id(payload: &Map<String, Value>) -> Result<Option<String>, BridgeError> {
    match payload.get(CALLBACK_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(id)) => Ok(Some(id.clone())),
        Some(_) => Err(BridgeError::invalid_envelope("callbackId must be a string")),
    }
}

fn trim_trailing_whitespace(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;

    const LIMIT: usize = 1024;

    fn decode(input: &str) -> Result<Envelope, BridgeError> {
        Envelope::decode(input.as_bytes(), LIMIT)
    }

    #[test]
    fn decodes_full_envelope() {
        let envelope = decode(
            r#"{"domain":"fs","action":"readFile","data":{"path":"/tmp/a"},"callbackId":"cb1"}"#,
        )
        .expect("decode");
        assert_eq!(envelope.domain, "fs");
        assert_eq!(envelope.action, "readFile");
        assert_eq!(envelope.payload, json!({"path": "/tmp/a"}));
        assert_eq!(envelope.callback_id.as_deref(), Some("cb1"));
    }

    #[test]
    fn missing_data_defaults_to_empty_object() {
        let envelope = decode(r#"{"domain":"app","action":"getName"}"#).expect("decode");
        assert_eq!(envelope.payload, json!({}));
        assert!(envelope.callback_id.is_none());
    }

    #[test]
    fn reads_callback_id_nested_in_data() {
        let envelope = decode(
            r#"{"domain":"fs","action":"writeFile","data":{"path":"/tmp/t.txt","content":"hello","callbackId":"cb1"}}"#,
        )
        .expect("decode");
        assert_eq!(envelope.callback_id.as_deref(), Some("cb1"));
    }

    #[test]
    fn top_level_callback_id_wins() {
        let envelope = decode(
            r#"{"domain":"fs","action":"exists","data":{"callbackId":"inner"},"callbackId":"outer"}"#,
        )
        .expect("decode");
        assert_eq!(envelope.callback_id.as_deref(), Some("outer"));
    }

    #[test]
    fn ignores_unknown_fields() {
        let envelope = decode(r#"{"domain":"tray","action":"show","version":3,"extra":[1]}"#)
            .expect("decode");
        assert_eq!(envelope.domain, "tray");
    }

    #[test]
    fn trims_trailing_newline() {
        let envelope = decode("{\"domain\":\"app\",\"action\":\"quit\"}\r\n").expect("decode");
        assert_eq!(envelope.action, "quit");
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("  \n")]
    #[case::garbage("not json")]
    #[case::array("[1,2,3]")]
    #[case::no_domain(r#"{"action":"readFile"}"#)]
    #[case::no_action(r#"{"domain":"fs"}"#)]
    #[case::blank_action(r#"{"domain":"fs","action":"  "}"#)]
    #[case::scalar_data(r#"{"domain":"fs","action":"readFile","data":"oops"}"#)]
    #[case::numeric_callback(r#"{"domain":"fs","action":"readFile","callbackId":7}"#)]
    #[case::numeric_nested(r#"{"domain":"fs","action":"readFile","data":{"callbackId":7}}"#)]
    fn rejects_malformed_messages(#[case] input: &str) {
        let error = decode(input).expect_err("should reject");
        assert_eq!(error.kind(), ErrorKind::InvalidEnvelope);
    }

    #[test]
    fn rejects_oversized_messages() {
        let padding = "x".repeat(LIMIT);
        let input = format!(r#"{{"domain":"fs","action":"{padding}"}}"#);
        let error = decode(&input).expect_err("should reject");
        assert!(error.to_string().contains("byte limit"));
    }

    #[test]
    fn empty_callback_id_is_fire_and_forget() {
        let envelope =
            decode(r#"{"domain":"window","action":"show","callbackId":""}"#).expect("decode");
        assert!(envelope.callback_id.is_none());
    }

    #[test]
    fn encode_uses_wire_field_names() {
        let envelope = Envelope::new("fs", "stat")
            .with_payload(json!({"path": "/"}))
            .with_callback("cb9");
        let bytes = envelope.encode().expect("encode");
        let text = String::from_utf8(bytes).expect("utf8");
        assert!(text.contains(r#""data":{"path":"/"}"#));
        assert!(text.contains(r#""callbackId":"cb9""#));
        assert_eq!(decode(&text).expect("decode"), envelope);
    }

    #[derive(Debug, Deserialize)]
    struct PathArgs {
        path: Option<String>,
    }

    #[test]
    fn arguments_reject_wrong_types() {
        let envelope = Envelope::new("fs", "readFile").with_payload(json!({"path": 42}));
        let error = envelope
            .arguments::<PathArgs>()
            .expect_err("number is not a path");
        assert_eq!(error.kind(), ErrorKind::InvalidEnvelope);
    }

    #[test]
    fn required_reports_missing_field() {
        let envelope = Envelope::new("fs", "readFile");
        let args: PathArgs = envelope.arguments().expect("arguments");
        let error = required(args.path, "path").expect_err("path is absent");
        assert_eq!(error.kind(), ErrorKind::MissingData);
        assert_eq!(error.context(), "path");
    }

    #[rstest]
    #[case::top_level(
        r#"{"domain":"fs","action":"readFile","callbackId":"cb","data":"bad"}"#,
        Some("fs")
    )]
    #[case::nested(r#"{"action":"readFile","data":{"callbackId":"cb"}}"#, None)]
    #[case::numeric_domain(r#"{"domain":7,"action":"readFile","callbackId":"cb"}"#, None)]
    fn recovers_reply_address(#[case] input: &str, #[case] domain: Option<&str>) {
        let address = recover_reply_address(input.as_bytes()).expect("address");
        assert_eq!(address.callback_id, "cb");
        assert_eq!(address.action, "readFile");
        assert_eq!(address.domain.as_deref(), domain);
    }

    #[test]
    fn recovery_gives_up_on_garbage() {
        assert!(recover_reply_address(b"{callbackId: cb").is_none());
    }
}
