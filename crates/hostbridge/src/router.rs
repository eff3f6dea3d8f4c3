//! Domain routing for decoded envelopes.
//!
//! The router maps the envelope's domain onto a handler module and runs the
//! handler behind a panic boundary: a handler that panics produces a
//! `NativeCallFailed` response instead of unwinding into the host's UI loop.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{debug, error};

use crate::domains::{self, Outcome, Services};
use crate::envelope::Envelope;
use crate::error::BridgeError;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Known capability domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// File access.
    Fs,
    /// Host window control.
    Window,
    /// Tray item control.
    Tray,
    /// Application control.
    App,
    /// Native UI components.
    NativeUi,
}

impl Domain {
    /// Parses a domain name (ASCII case-insensitive).
    ///
    /// Returns `None` for names the bridge does not serve.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "fs" => Some(Self::Fs),
            "window" => Some(Self::Window),
            "tray" => Some(Self::Tray),
            "app" => Some(Self::App),
            "nativeui" => Some(Self::NativeUi),
            _ => None,
        }
    }

    /// Canonical wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fs => domains::fs::DOMAIN,
            Self::Window => domains::window::DOMAIN,
            Self::Tray => domains::tray::DOMAIN,
            Self::App => domains::app::DOMAIN,
            Self::NativeUi => domains::native_ui::DOMAIN,
        }
    }
}

/// Routes envelopes to domain handlers.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct DomainRouter;

impl DomainRouter {
    pub(crate) const fn new() -> Self {
        Self
    }

    /// Runs the handler for `domain`.
    ///
    /// Never fails: handler errors and panics come back as
    /// [`Outcome::Ready`] carrying the error.
    pub(crate) fn route(
        self,
        domain: Domain,
        services: &mut Services,
        envelope: &Envelope,
    ) -> Outcome {
        debug!(
            target: DISPATCH_TARGET,
            domain = domain.as_str(),
            action = %envelope.action,
            callback_id = envelope.callback_id.as_deref().unwrap_or_default(),
            "routing envelope"
        );

        let handled = catch_unwind(AssertUnwindSafe(|| match domain {
            Domain::Fs => domains::fs::handle(services, envelope),
            Domain::Window => domains::window::handle(services, envelope),
            Domain::Tray => domains::tray::handle(services, envelope),
            Domain::App => domains::app::handle(services, envelope),
            Domain::NativeUi => domains::native_ui::handle(services, envelope),
        }));

        match handled {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(failure)) => Outcome::Ready(Err(failure)),
            Err(_) => {
                error!(
                    target: DISPATCH_TARGET,
                    domain = domain.as_str(),
                    action = %envelope.action,
                    "handler panicked"
                );
                Outcome::Ready(Err(BridgeError::panicked(envelope.action.as_str())))
            }
        }
    }
}
