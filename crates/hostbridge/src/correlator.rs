//! Callback correlation.
//!
//! Every request that carries a callback id is registered here before its
//! handler runs. The correlator hands back a [`CallbackTicket`], which is the
//! only way to deliver the terminal response. Tickets are move-only, so a
//! handler cannot answer twice, and each carries a sequence number, so a
//! completion arriving after the call has expired or been failed at teardown
//! is discarded instead of reaching script code a second time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::BridgeError;
use crate::response::{HostEvent, Response, ResponseSink};

/// Tracing target for correlation.
pub(crate) const CORRELATOR_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::correlator");

/// Proof that a response is still owed for one callback id.
#[derive(Debug, PartialEq, Eq)]
pub struct CallbackTicket {
    callback_id: String,
    action: String,
    sequence: u64,
}

impl CallbackTicket {
    /// Callback id the ticket answers.
    #[must_use]
    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    /// Action the ticket was issued for.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }
}

/// Errors raised when registering a call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorrelationError {
    /// A call with the same callback id is still in flight.
    #[error("callback '{callback_id}' is already in flight")]
    Duplicate {
        /// Reused callback id.
        callback_id: String,
    },
}

#[derive(Debug)]
struct PendingCall {
    domain: String,
    action: String,
    issued_at: Instant,
    sequence: u64,
}

/// Tracks in-flight calls and delivers exactly one response for each.
pub struct CallbackCorrelator {
    sink: Box<dyn ResponseSink>,
    pending: HashMap<String, PendingCall>,
    next_sequence: u64,
    timeout: Option<Duration>,
}

impl CallbackCorrelator {
    /// Creates a correlator delivering through `sink`.
    ///
    /// `timeout` of `None` disables expiry.
    #[must_use]
    pub fn new(sink: Box<dyn ResponseSink>, timeout: Option<Duration>) -> Self {
        Self {
            sink,
            pending: HashMap::new(),
            next_sequence: 0,
            timeout,
        }
    }

    /// Registers a call and returns its ticket.
    ///
    /// # Errors
    ///
    /// Returns [`CorrelationError::Duplicate`] when `callback_id` is already
    /// in flight. The existing call is left untouched.
    pub fn issue(
        &mut self,
        callback_id: &str,
        domain: &str,
        action: &str,
    ) -> Result<CallbackTicket, CorrelationError> {
        self.issue_at(callback_id, domain, action, Instant::now())
    }

    pub(crate) fn issue_at(
        &mut self,
        callback_id: &str,
        domain: &str,
        action: &str,
        now: Instant,
    ) -> Result<CallbackTicket, CorrelationError> {
        if self.pending.contains_key(callback_id) {
            return Err(CorrelationError::Duplicate {
                callback_id: callback_id.to_owned(),
            });
        }
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.insert(
            callback_id.to_owned(),
            PendingCall {
                domain: domain.to_owned(),
                action: action.to_owned(),
                issued_at: now,
                sequence,
            },
        );
        Ok(CallbackTicket {
            callback_id: callback_id.to_owned(),
            action: action.to_owned(),
            sequence,
        })
    }

    /// Delivers the terminal response for `ticket`.
    ///
    /// Returns `false` when the call is no longer pending, in which case the
    /// outcome is dropped.
    pub fn complete(&mut self, ticket: CallbackTicket, outcome: Result<Value, BridgeError>) -> bool {
        let current = self
            .pending
            .get(&ticket.callback_id)
            .is_some_and(|call| call.sequence == ticket.sequence);
        if !current {
            debug!(
                target: CORRELATOR_TARGET,
                callback_id = %ticket.callback_id,
                action = %ticket.action,
                "discarding completion for settled callback"
            );
            return false;
        }
        if let Some(call) = self.pending.remove(&ticket.callback_id) {
            debug!(
                target: CORRELATOR_TARGET,
                callback_id = %ticket.callback_id,
                domain = %call.domain,
                action = %call.action,
                success = outcome.is_ok(),
                "delivering response"
            );
        }
        let response = Response::from_outcome(ticket.callback_id, ticket.action, outcome);
        self.sink.deliver(&response);
        true
    }

    /// Delivers an error for a callback id that was never registered.
    ///
    /// Used for messages rejected before routing, where a reply address could
    /// still be recovered.
    pub fn reject_untracked(&mut self, callback_id: String, action: String, error: BridgeError) {
        if self.pending.contains_key(&callback_id) {
            warn!(
                target: CORRELATOR_TARGET,
                %callback_id,
                "rejected message reuses an in-flight callback id; dropping"
            );
            return;
        }
        self.sink
            .deliver(&Response::from_outcome(callback_id, action, Err(error)));
    }

    /// Fails every call older than the configured timeout.
    ///
    /// Returns the number of calls expired.
    pub fn expire(&mut self, now: Instant) -> usize {
        let Some(timeout) = self.timeout else {
            return 0;
        };
        let overdue: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, call)| now.saturating_duration_since(call.issued_at) >= timeout)
            .map(|(callback_id, _)| callback_id.clone())
            .collect();
        let mut expired: Vec<(String, PendingCall)> = overdue
            .into_iter()
            .filter_map(|callback_id| {
                self.pending
                    .remove(&callback_id)
                    .map(|call| (callback_id, call))
            })
            .collect();
        expired.sort_by_key(|(_, call)| call.sequence);
        let count = expired.len();
        for (callback_id, call) in expired {
            warn!(
                target: CORRELATOR_TARGET,
                %callback_id,
                domain = %call.domain,
                action = %call.action,
                "callback timed out"
            );
            let error = BridgeError::timed_out(call.action.as_str());
            self.sink
                .deliver(&Response::from_outcome(callback_id, call.action, Err(error)));
        }
        count
    }

    /// Fails every pending call with the teardown error, oldest first.
    pub fn fail_all(&mut self) -> usize {
        let mut drained: Vec<(String, PendingCall)> = self.pending.drain().collect();
        drained.sort_by_key(|(_, call)| call.sequence);
        let count = drained.len();
        for (callback_id, call) in drained {
            let error = BridgeError::destroyed(call.action.as_str());
            self.sink
                .deliver(&Response::from_outcome(callback_id, call.action, Err(error)));
        }
        count
    }

    /// Earliest instant at which a pending call will expire.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        let timeout = self.timeout?;
        self.pending
            .values()
            .map(|call| call.issued_at + timeout)
            .min()
    }

    /// Number of calls awaiting a response.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when `callback_id` is awaiting a response.
    #[must_use]
    pub fn is_pending(&self, callback_id: &str) -> bool {
        self.pending.contains_key(callback_id)
    }

    /// Forwards an unsolicited event to the sink.
    pub fn notify(&mut self, event: &HostEvent) {
        self.sink.notify(event);
    }
}
