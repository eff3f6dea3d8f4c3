//! Line-oriented bridge host.
//!
//! Reads one envelope per stdin line and writes responses and events to
//! stdout as JSONL. Diagnostics go to stderr. Window, tray and widget
//! collaborators are headless; the filesystem is real.
//!
//! Stdin is read on its own thread so worker completions and call
//! timeouts are delivered while the client is idle.

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use hostbridge::{
    BridgeContext, BridgeHost, CompletionWaker, HealthReporter, JsonlSink, ResponseSink,
    StructuredHealthReporter, SystemConfigLoader, bootstrap_with,
};
use tracing::{error, warn};

const STDIO_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::stdio");

/// Longest wait for queued work after stdin closes when timeouts are off.
const DRAIN_LIMIT: Duration = Duration::from_secs(30);

/// Idle wait between pumps when no call has a deadline.
const IDLE_WAIT: Duration = Duration::from_secs(1);

/// What wakes the main loop.
enum Input {
    Line(String),
    Wake,
    Closed,
}

fn main() -> ExitCode {
    let (input_tx, input_rx) = mpsc::channel();
    let reporter: Arc<dyn HealthReporter> = Arc::new(StructuredHealthReporter::new());
    let sink: Box<dyn ResponseSink> = Box::new(JsonlSink::new(io::stdout()));
    let waker = completion_waker(input_tx.clone());
    let Ok(mut bridge) = bootstrap_with(
        &SystemConfigLoader,
        reporter,
        move |config| BridgeHost::headless(config).with_waker(waker),
        sink,
    ) else {
        return ExitCode::FAILURE;
    };

    if let Err(error) = spawn_stdin_reader(input_tx) {
        error!(target: STDIO_TARGET, %error, "failed to spawn stdin reader");
        bridge.teardown();
        return ExitCode::FAILURE;
    }

    serve(&mut bridge, &input_rx);

    let limit = bridge.config().callback_timeout().unwrap_or(DRAIN_LIMIT);
    if !bridge.pump_until_idle(limit) {
        warn!(target: STDIO_TARGET, "exiting with work still queued");
    }
    bridge.teardown();
    ExitCode::SUCCESS
}

fn completion_waker(input_tx: Sender<Input>) -> CompletionWaker {
    Arc::new(move || {
        // The loop may already have exited; nothing is left to wake then.
        let _ = input_tx.send(Input::Wake);
    })
}

fn spawn_stdin_reader(input_tx: Sender<Input>) -> io::Result<()> {
    thread::Builder::new()
        .name("hostbridge-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if input_tx.send(Input::Line(line)).is_err() {
                            return;
                        }
                    }
                    Err(error) => {
                        error!(target: STDIO_TARGET, %error, "failed to read stdin");
                        break;
                    }
                }
            }
            let _ = input_tx.send(Input::Closed);
        })
        .map(|_| ())
}

/// Dispatches lines and pumps on every wake until stdin closes or the
/// bridge quits.
fn serve(bridge: &mut BridgeContext, input_rx: &Receiver<Input>) {
    loop {
        let wait = bridge
            .next_deadline()
            .map_or(IDLE_WAIT, |deadline| {
                deadline.saturating_duration_since(Instant::now())
            });
        match input_rx.recv_timeout(wait) {
            Ok(Input::Line(line)) => {
                if !line.trim().is_empty() {
                    bridge.dispatch_str(&line);
                }
            }
            Ok(Input::Wake) | Err(RecvTimeoutError::Timeout) => {}
            Ok(Input::Closed) | Err(RecvTimeoutError::Disconnected) => return,
        }
        bridge.pump();
        if bridge.is_destroyed() {
            return;
        }
    }
}
