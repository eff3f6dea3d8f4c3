//! Native-to-script delivery.
//!
//! Terminal responses and unsolicited events leave the bridge through a
//! [`ResponseSink`]. Embedding hosts normally wrap their script engine in a
//! [`ScriptChannel`] and use [`ScriptFunctionSink`], which invokes the
//! configured global functions:
//!
//! - success: `(callbackId, action, result)`
//! - error: `(callbackId, action, context, message)`
//! - event: `(event)`
//!
//! [`JsonlSink`] writes the same information as JSONL for the stdio host.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use hostbridge_config::Config;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{BridgeError, ErrorKind};

/// Tracing target for response delivery.
pub(crate) const RESPONSE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::response");

/// Terminal response for one callback id.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Response {
    /// The call completed.
    Success {
        /// Callback id supplied with the request.
        callback_id: String,
        /// Action that produced the result.
        action: String,
        /// Action result.
        result: Value,
    },
    /// The call failed.
    Failure {
        /// Callback id supplied with the request.
        callback_id: String,
        /// Action that failed.
        action: String,
        /// Taxonomy category.
        error: ErrorKind,
        /// Path, id or field relevant to the failure.
        context: String,
        /// Short human-readable reason.
        message: String,
    },
}

impl Response {
    /// Builds a response from a handler outcome.
    #[must_use]
    pub fn from_outcome(
        callback_id: String,
        action: String,
        outcome: Result<Value, BridgeError>,
    ) -> Self {
        match outcome {
            Ok(result) => Self::Success {
                callback_id,
                action,
                result,
            },
            Err(error) => Self::Failure {
                callback_id,
                action,
                error: error.kind(),
                context: error.context().to_owned(),
                message: error.reason().to_owned(),
            },
        }
    }

    /// Callback id the response is addressed to.
    #[must_use]
    pub fn callback_id(&self) -> &str {
        match self {
            Self::Success { callback_id, .. } | Self::Failure { callback_id, .. } => callback_id,
        }
    }

    /// Action that produced the response.
    #[must_use]
    pub fn action(&self) -> &str {
        match self {
            Self::Success { action, .. } | Self::Failure { action, .. } => action,
        }
    }

    /// Returns `true` for success responses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Taxonomy category of a failure.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(*error),
        }
    }

    /// Result value of a success.
    #[must_use]
    pub const fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::Failure { .. } => None,
        }
    }
}

/// Unsolicited notification raised by a native object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostEvent {
    /// Domain that owns the source object.
    pub domain: String,
    /// Id of the component or tray item that raised the event.
    pub target: String,
    /// Event name, for example `select` or `menuClick`.
    pub name: String,
    /// Event-specific detail.
    pub detail: Value,
}

impl HostEvent {
    /// Creates an event.
    pub fn new(
        domain: impl Into<String>,
        target: impl Into<String>,
        name: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            domain: domain.into(),
            target: target.into(),
            name: name.into(),
            detail,
        }
    }
}

/// Destination for terminal responses and events.
pub trait ResponseSink {
    /// Delivers one terminal response.
    fn deliver(&mut self, response: &Response);

    /// Forwards an unsolicited event.
    fn notify(&mut self, event: &HostEvent);
}

/// Script engine hook able to call a named global function.
pub trait ScriptChannel {
    /// Invokes `function` in script space with JSON arguments.
    fn invoke(&mut self, function: &str, arguments: &[Value]);
}

impl<F> ScriptChannel for F
where
    F: FnMut(&str, &[Value]),
{
    fn invoke(&mut self, function: &str, arguments: &[Value]) {
        self(function, arguments);
    }
}

/// Renders a global function call as script source.
///
/// Hosts whose engine only accepts source text (for example an
/// `evaluate_script` style API) can pass the rendered string straight
/// through. Arguments are JSON-encoded, which keeps string content inert.
#[must_use]
pub fn script_call(function: &str, arguments: &[Value]) -> String {
    let rendered: Vec<String> = arguments.iter().map(Value::to_string).collect();
    format!("{function}({});", rendered.join(","))
}

/// Names of the script globals used for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoints {
    /// Success entry point.
    pub success: String,
    /// Error entry point.
    pub error: String,
    /// Event entry point.
    pub event: String,
}

impl EntryPoints {
    /// Reads entry point names from configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            success: config.success_function.clone(),
            error: config.error_function.clone(),
            event: config.event_function.clone(),
        }
    }
}

impl Default for EntryPoints {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Sink that calls script globals through a [`ScriptChannel`].
pub struct ScriptFunctionSink<C> {
    channel: C,
    entry_points: EntryPoints,
}

impl<C: ScriptChannel> ScriptFunctionSink<C> {
    /// Wraps a script channel.
    pub const fn new(channel: C, entry_points: EntryPoints) -> Self {
        Self {
            channel,
            entry_points,
        }
    }
}

impl<C: ScriptChannel> ResponseSink for ScriptFunctionSink<C> {
    fn deliver(&mut self, response: &Response) {
        match response {
            Response::Success {
                callback_id,
                action,
                result,
            } => self.channel.invoke(
                &self.entry_points.success,
                &[
                    Value::from(callback_id.as_str()),
                    Value::from(action.as_str()),
                    result.clone(),
                ],
            ),
            Response::Failure {
                callback_id,
                action,
                context,
                message,
                ..
            } => self.channel.invoke(
                &self.entry_points.error,
                &[
                    Value::from(callback_id.as_str()),
                    Value::from(action.as_str()),
                    Value::from(context.as_str()),
                    Value::from(message.as_str()),
                ],
            ),
        }
    }

    fn notify(&mut self, event: &HostEvent) {
        match serde_json::to_value(event) {
            Ok(value) => self.channel.invoke(&self.entry_points.event, &[value]),
            Err(error) => warn!(target: RESPONSE_TARGET, %error, "failed to encode event"),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename = "event")]
struct EventLine<'a> {
    #[serde(flatten)]
    event: &'a HostEvent,
}

/// Sink that writes one JSON object per line.
pub struct JsonlSink<W> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_line<T: Serialize>(&mut self, value: &T) -> Result<(), std::io::Error> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write> ResponseSink for JsonlSink<W> {
    fn deliver(&mut self, response: &Response) {
        if let Err(error) = self.write_line(response) {
            warn!(
                target: RESPONSE_TARGET,
                %error,
                callback_id = response.callback_id(),
                "failed to write response"
            );
        }
    }

    fn notify(&mut self, event: &HostEvent) {
        if let Err(error) = self.write_line(&EventLine { event }) {
            warn!(target: RESPONSE_TARGET, %error, "failed to write event");
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    responses: Vec<Response>,
    events: Vec<HostEvent>,
}

/// Sink that keeps everything in memory.
///
/// Clones share storage, so a host (or a test) can keep one handle while the
/// bridge owns the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Rc<RefCell<Recorded>>,
}

impl RecordingSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All responses delivered so far, in delivery order.
    #[must_use]
    pub fn responses(&self) -> Vec<Response> {
        self.inner.borrow().responses.clone()
    }

    /// Responses addressed to `callback_id`.
    #[must_use]
    pub fn responses_for(&self, callback_id: &str) -> Vec<Response> {
        self.inner
            .borrow()
            .responses
            .iter()
            .filter(|response| response.callback_id() == callback_id)
            .cloned()
            .collect()
    }

    /// All events forwarded so far.
    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.inner.borrow().events.clone()
    }
}

impl ResponseSink for RecordingSink {
    fn deliver(&mut self, response: &Response) {
        self.inner.borrow_mut().responses.push(response.clone());
    }

    fn notify(&mut self, event: &HostEvent) {
        self.inner.borrow_mut().events.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn failure() -> Response {
        Response::from_outcome(
            "cb2".to_owned(),
            "readFile".to_owned(),
            Err(BridgeError::file_not_found("/does/not/exist")),
        )
    }

    #[test]
    fn failure_carries_taxonomy_fields() {
        let response = failure();
        assert_eq!(response.error_kind(), Some(ErrorKind::NotFound));
        let Response::Failure {
            context, message, ..
        } = &response
        else {
            panic!("expected failure");
        };
        assert_eq!(context, "/does/not/exist");
        assert_eq!(message, "File not found");
    }

    #[test]
    fn script_sink_calls_error_entry_point_with_four_arguments() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&calls);
        let channel = move |function: &str, arguments: &[Value]| {
            recorder
                .borrow_mut()
                .push((function.to_owned(), arguments.to_vec()));
        };
        let mut sink = ScriptFunctionSink::new(channel, EntryPoints::default());

        sink.deliver(&failure());

        let recorded = calls.borrow();
        let (function, arguments) = recorded.first().expect("one call");
        assert_eq!(function, "__hostbridgeReject");
        assert_eq!(
            arguments,
            &vec![
                json!("cb2"),
                json!("readFile"),
                json!("/does/not/exist"),
                json!("File not found")
            ]
        );
    }

    #[test]
    fn script_sink_calls_success_entry_point() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&calls);
        let channel = move |function: &str, arguments: &[Value]| {
            recorder.borrow_mut().push(script_call(function, arguments));
        };
        let mut sink = ScriptFunctionSink::new(channel, EntryPoints::default());

        sink.deliver(&Response::from_outcome(
            "cb3".to_owned(),
            "exists".to_owned(),
            Ok(json!(true)),
        ));

        assert_eq!(
            calls.borrow().as_slice(),
            [r#"__hostbridgeResolve("cb3","exists",true);"#]
        );
    }

    #[test]
    fn jsonl_sink_frames_responses_and_events() {
        let mut output = Vec::new();
        {
            let mut sink = JsonlSink::new(&mut output);
            sink.deliver(&failure());
            sink.notify(&HostEvent::new("nativeUI", "main", "select", json!({"row": 1})));
        }
        let text = String::from_utf8(output).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.first().is_some_and(|line| line.contains(r#""kind":"failure""#)));
        assert!(lines.first().is_some_and(|line| line.contains(r#""callbackId":"cb2""#)));
        assert!(lines.get(1).is_some_and(|line| line.contains(r#""kind":"event""#)));
        assert!(lines.get(1).is_some_and(|line| line.contains(r#""target":"main""#)));
    }

    #[test]
    fn recording_sink_clones_share_storage() {
        let recorder = RecordingSink::new();
        let mut handle = recorder.clone();
        handle.deliver(&failure());
        assert_eq!(recorder.responses_for("cb2").len(), 1);
        assert!(recorder.responses_for("other").is_empty());
    }
}
