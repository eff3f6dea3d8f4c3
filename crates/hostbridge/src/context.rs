//! The per-session bridge value.
//!
//! A [`BridgeContext`] owns everything one embedded script session needs: the
//! handler collaborators, the component registry, the watch table, the
//! callback correlator and the I/O worker. The host creates one when the web
//! content is attached, feeds it every posted message through
//! [`dispatch`](BridgeContext::dispatch), calls [`pump`](BridgeContext::pump)
//! from its UI loop, and drops it (or calls
//! [`teardown`](BridgeContext::teardown)) when the content goes away.
//!
//! The context is `!Sync` and must stay on the UI thread; only filesystem
//! jobs leave it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use hostbridge_config::Config;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::correlator::{CallbackCorrelator, CallbackTicket};
use crate::domains::{Outcome, Services, tray};
use crate::envelope::{Envelope, ReplyAddress, recover_reply_address};
use crate::error::BridgeError;
use crate::filesystem::{FileSystem, NativeFileSystem};
use crate::health::HealthReporter;
use crate::host::headless::{HeadlessApp, HeadlessTray, HeadlessWindow};
use crate::host::{AppControl, DirectoryResolver, SystemDirectories, TrayControl, WindowControl};
use crate::registry::{
    ComponentRegistry, ComponentView, HeadlessToolkit, Interaction, NativeToolkit, RegistryError,
};
use crate::response::ResponseSink;
use crate::router::{DISPATCH_TARGET, Domain, DomainRouter};
use crate::watch::WatchTable;
use crate::worker::{Completion, CompletionWaker, IoWorker, WorkerError};

/// Native collaborators supplied by the embedding host.
///
/// Start from [`BridgeHost::headless`] and replace the pieces the host
/// actually provides.
pub struct BridgeHost {
    filesystem: Arc<dyn FileSystem>,
    directories: Box<dyn DirectoryResolver>,
    toolkit: Box<dyn NativeToolkit>,
    window: Box<dyn WindowControl>,
    tray: Box<dyn TrayControl>,
    app: Box<dyn AppControl>,
    waker: Option<CompletionWaker>,
}

impl BridgeHost {
    /// Real filesystem and directories; in-memory window, tray, app and
    /// toolkit.
    #[must_use]
    pub fn headless(config: &Config) -> Self {
        Self {
            filesystem: Arc::new(NativeFileSystem),
            directories: Box::new(SystemDirectories),
            toolkit: Box::new(HeadlessToolkit::new()),
            window: Box::new(HeadlessWindow::new()),
            tray: Box::new(HeadlessTray::new()),
            app: Box::new(HeadlessApp::new(
                config.app_name(),
                env!("CARGO_PKG_VERSION"),
            )),
            waker: None,
        }
    }

    /// Replaces the filesystem provider.
    #[must_use]
    pub fn with_filesystem(mut self, filesystem: impl FileSystem + 'static) -> Self {
        self.filesystem = Arc::new(filesystem);
        self
    }

    /// Replaces the directory resolver.
    #[must_use]
    pub fn with_directories(mut self, directories: impl DirectoryResolver + 'static) -> Self {
        self.directories = Box::new(directories);
        self
    }

    /// Replaces the widget toolkit.
    #[must_use]
    pub fn with_toolkit(mut self, toolkit: impl NativeToolkit + 'static) -> Self {
        self.toolkit = Box::new(toolkit);
        self
    }

    /// Replaces the window collaborator.
    #[must_use]
    pub fn with_window(mut self, window: impl WindowControl + 'static) -> Self {
        self.window = Box::new(window);
        self
    }

    /// Replaces the tray collaborator.
    #[must_use]
    pub fn with_tray(mut self, tray: impl TrayControl + 'static) -> Self {
        self.tray = Box::new(tray);
        self
    }

    /// Replaces the application collaborator.
    #[must_use]
    pub fn with_app(mut self, app: impl AppControl + 'static) -> Self {
        self.app = Box::new(app);
        self
    }

    /// Registers a callback run on the worker thread after each completion.
    #[must_use]
    pub fn with_waker(mut self, waker: CompletionWaker) -> Self {
        self.waker = Some(waker);
        self
    }
}

/// What [`BridgeContext::dispatch`] did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The handler finished; a response was delivered if one was owed.
    Completed,
    /// The work was queued on the I/O worker.
    Queued,
    /// The message was malformed; an error went to the recovered callback id.
    Rejected,
    /// The message was discarded without a response.
    Dropped,
    /// The bridge has been torn down.
    Ignored,
}

/// One script session's bridge.
pub struct BridgeContext {
    config: Config,
    router: DomainRouter,
    services: Services,
    correlator: CallbackCorrelator,
    worker: IoWorker,
    reporter: Option<Arc<dyn HealthReporter>>,
    destroyed: bool,
}

impl BridgeContext {
    /// Builds a context and starts its I/O worker.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Spawn`] when the worker thread cannot start.
    pub fn new(
        config: Config,
        host: BridgeHost,
        sink: Box<dyn ResponseSink>,
    ) -> Result<Self, WorkerError> {
        let worker = IoWorker::spawn(host.waker)?;
        let correlator = CallbackCorrelator::new(sink, config.callback_timeout());
        let services = Services {
            app_name: config.app_name().to_owned(),
            filesystem: host.filesystem,
            directories: host.directories,
            window: host.window,
            tray: host.tray,
            app: host.app,
            registry: ComponentRegistry::new(host.toolkit),
            watches: WatchTable::new(),
            events: Vec::new(),
            quit_requested: false,
        };
        Ok(Self {
            config,
            router: DomainRouter::new(),
            services,
            correlator,
            worker,
            reporter: None,
            destroyed: false,
        })
    }

    /// Attaches a lifecycle reporter notified at teardown.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn HealthReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Handles one message posted by script code.
    ///
    /// Never fails. Malformed input and handler errors are logged and, where
    /// a callback id is known, answered with an error. Traffic for unknown
    /// domains is logged and dropped.
    pub fn dispatch(&mut self, message: &[u8]) -> DispatchStatus {
        if self.destroyed {
            debug!(target: DISPATCH_TARGET, "ignoring message after teardown");
            return DispatchStatus::Ignored;
        }

        let envelope = match Envelope::decode(message, self.config.max_envelope_bytes()) {
            Ok(envelope) => envelope,
            Err(error) => return self.reject(message, error),
        };

        let Some(domain) = Domain::parse(&envelope.domain) else {
            warn!(
                target: DISPATCH_TARGET,
                domain = %envelope.domain,
                action = %envelope.action,
                "dropping message for unknown domain"
            );
            return DispatchStatus::Dropped;
        };

        let ticket = match envelope.callback_id.as_deref() {
            None => None,
            Some(callback_id) => {
                match self
                    .correlator
                    .issue(callback_id, domain.as_str(), &envelope.action)
                {
                    Ok(ticket) => Some(ticket),
                    Err(error) => {
                        warn!(target: DISPATCH_TARGET, %error, "dropping duplicate request");
                        return DispatchStatus::Dropped;
                    }
                }
            }
        };

        let status = match self.router.route(domain, &mut self.services, &envelope) {
            Outcome::Ready(result) => {
                self.settle(ticket, &envelope.action, result);
                DispatchStatus::Completed
            }
            Outcome::Deferred(job) => match self.worker.submit(ticket, &envelope.action, job) {
                Ok(()) => DispatchStatus::Queued,
                Err(completion) => {
                    self.settle_completion(completion);
                    DispatchStatus::Completed
                }
            },
        };

        self.flush_events();
        if self.services.quit_requested {
            self.quit();
        }
        status
    }

    /// Convenience wrapper around [`dispatch`](Self::dispatch).
    pub fn dispatch_str(&mut self, message: &str) -> DispatchStatus {
        self.dispatch(message.as_bytes())
    }

    /// Delivers finished worker results and expires overdue callbacks.
    ///
    /// Call from the UI loop, typically after the completion waker fires.
    /// Returns the number of completions processed.
    pub fn pump(&mut self) -> usize {
        if self.destroyed {
            return 0;
        }
        let completions = self.worker.try_completions();
        let processed = completions.len();
        for completion in completions {
            self.settle_completion(completion);
        }
        self.correlator.expire(Instant::now());
        processed
    }

    /// Pumps until no worker job is outstanding or `limit` elapses.
    ///
    /// Returns `true` when the worker went idle in time.
    pub fn pump_until_idle(&mut self, limit: Duration) -> bool {
        let deadline = Instant::now() + limit;
        loop {
            self.pump();
            if self.destroyed || self.worker.outstanding() == 0 {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let mut wait = deadline.saturating_duration_since(now);
            if let Some(expiry) = self.correlator.next_deadline() {
                wait = wait.min(expiry.saturating_duration_since(now));
            }
            if let Some(completion) = self.worker.wait_completion(wait) {
                self.settle_completion(completion);
            }
        }
    }

    /// Forwards a widget interaction to script code as an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `id` is not a live component and
    /// `InvalidEnvelope` when the row is not one of its rows.
    pub fn component_interaction(
        &mut self,
        id: &str,
        interaction: Interaction,
    ) -> Result<(), BridgeError> {
        if self.destroyed {
            return Err(BridgeError::destroyed(id));
        }
        let event = self
            .services
            .registry
            .interaction(id, interaction)
            .map_err(|error| match error {
                RegistryError::NotFound { id } => BridgeError::component_not_found(id),
                RegistryError::RowOutOfRange { .. } => {
                    BridgeError::invalid_envelope(error.to_string())
                }
                other => BridgeError::native(id, other.to_string()),
            })?;
        self.correlator.notify(&event);
        Ok(())
    }

    /// Forwards a tray menu click to script code as an event.
    pub fn tray_menu_clicked(&mut self, item_id: &str) {
        if self.destroyed {
            return;
        }
        self.correlator.notify(&tray::menu_click_event(item_id));
    }

    /// Data source for the component `id`, for toolkit redraws.
    #[must_use]
    pub fn data_source(&self, id: &str) -> Option<ComponentView<'_>> {
        self.services.registry.data_source(id)
    }

    /// Live components.
    #[must_use]
    pub const fn registry(&self) -> &ComponentRegistry {
        &self.services.registry
    }

    /// Active watch registrations.
    #[must_use]
    pub const fn watches(&self) -> &WatchTable {
        &self.services.watches
    }

    /// Calls awaiting a response.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.correlator.in_flight()
    }

    /// Earliest instant at which an in-flight call times out.
    ///
    /// Hosts without a frame loop bound their idle wait by this so
    /// [`pump`](Self::pump) runs in time to answer overdue calls.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.correlator.next_deadline()
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns `true` once [`teardown`](Self::teardown) has run.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Ends the session.
    ///
    /// Calls still in flight are failed with "Bridge destroyed", every
    /// component is destroyed, watches are cleared and the worker is
    /// stopped. Later messages are ignored. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        let failed = self.correlator.fail_all();
        let components = self.services.registry.destroy_all();
        let watches = self.services.watches.clear();
        if let Err(error) = self.worker.shutdown() {
            warn!(target: DISPATCH_TARGET, %error, "I/O worker did not stop cleanly");
        }
        self.destroyed = true;
        info!(
            target: DISPATCH_TARGET,
            failed,
            components,
            watches,
            "bridge torn down"
        );
        if let Some(reporter) = &self.reporter {
            reporter.bridge_torn_down(failed, components);
        }
    }

    fn reject(&mut self, message: &[u8], error: BridgeError) -> DispatchStatus {
        warn!(target: DISPATCH_TARGET, %error, "rejected malformed message");
        match recover_reply_address(message) {
            Some(ReplyAddress {
                domain: Some(domain),
                ..
            }) if Domain::parse(&domain).is_none() => {
                warn!(
                    target: DISPATCH_TARGET,
                    %domain,
                    "dropping malformed message for unknown domain"
                );
                DispatchStatus::Dropped
            }
            Some(address) => {
                self.correlator
                    .reject_untracked(address.callback_id, address.action, error);
                DispatchStatus::Rejected
            }
            None => DispatchStatus::Dropped,
        }
    }

    fn settle(
        &mut self,
        ticket: Option<CallbackTicket>,
        action: &str,
        outcome: Result<Value, BridgeError>,
    ) {
        match (ticket, outcome) {
            (Some(ticket), outcome) => {
                self.correlator.complete(ticket, outcome);
            }
            (None, Ok(_)) => {
                debug!(target: DISPATCH_TARGET, action, "fire-and-forget request completed");
            }
            (None, Err(error)) => {
                warn!(
                    target: DISPATCH_TARGET,
                    action,
                    kind = %error.kind(),
                    %error,
                    "fire-and-forget request failed"
                );
            }
        }
    }

    fn settle_completion(&mut self, completion: Completion) {
        let Completion {
            ticket,
            action,
            outcome,
        } = completion;
        self.settle(ticket, &action, outcome);
    }

    fn flush_events(&mut self) {
        for event in std::mem::take(&mut self.services.events) {
            self.correlator.notify(&event);
        }
    }

    fn quit(&mut self) {
        self.services.quit_requested = false;
        info!(target: DISPATCH_TARGET, "quit requested by script");
        self.services.app.quit();
        self.teardown();
    }
}

impl Drop for BridgeContext {
    fn drop(&mut self) {
        self.teardown();
    }
}
