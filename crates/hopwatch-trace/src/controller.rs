//! Run lifecycle: launch, feed the table, recompute verdicts, stop.

use crate::classify::classify;
use crate::error::RunError;
use crate::parser::{is_data_line, parse_hop_line};
use crate::runner::{ProbeHandle, ProbeLauncher, ProbeProcess, ProbeSettings};
use crate::table::HopTable;
use hopwatch_model::{HopRow, HopSample, RunOutcome, RunState, Verdicts};
use parking_lot::Mutex;
use std::sync::mpsc::{RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Upper bound on how long a cancelled producer keeps waiting for output.
const CANCEL_POLL: Duration = Duration::from_millis(50);

/// Updates for the presentation layer, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    State(RunState),
    Rows(Vec<HopRow>),
    Verdicts(Verdicts),
    Finished(RunOutcome),
}

struct Shared {
    table: Mutex<HopTable>,
    verdicts: Mutex<Verdicts>,
    state: Mutex<RunState>,
    outcome: Mutex<Option<RunOutcome>>,
    events: Sender<RunEvent>,
}

impl Shared {
    fn emit(&self, event: RunEvent) {
        let _ = self.events.send(event);
    }

    fn state(&self) -> RunState {
        *self.state.lock()
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock() = state;
        debug!(%state, "run state changed");
        self.emit(RunEvent::State(state));
    }

    fn apply(&self, sample: HopSample) {
        let (rows, verdicts) = {
            let mut table = self.table.lock();
            table.merge(sample);
            let rows = table.snapshot();
            let verdicts = classify(&rows);
            *self.verdicts.lock() = verdicts;
            (rows, verdicts)
        };
        self.emit(RunEvent::Rows(rows));
        self.emit(RunEvent::Verdicts(verdicts));
    }

    fn reset(&self) {
        self.table.lock().reset();
        *self.verdicts.lock() = Verdicts::NEUTRAL;
        *self.outcome.lock() = None;
        self.emit(RunEvent::Rows(Vec::new()));
        self.emit(RunEvent::Verdicts(Verdicts::NEUTRAL));
    }

    fn finish(&self, outcome: RunOutcome) {
        let (verdicts, hops) = {
            let table = self.table.lock();
            let verdicts = classify(table.rows());
            *self.verdicts.lock() = verdicts;
            (verdicts, table.len())
        };
        *self.outcome.lock() = Some(outcome);
        self.emit(RunEvent::Verdicts(verdicts));
        self.set_state(RunState::Finished);
        self.emit(RunEvent::Finished(outcome));
        info!(?outcome, hops, "run finished");
    }
}

struct ActiveRun {
    handle: Arc<dyn ProbeHandle>,
    producer: JoinHandle<()>,
}

/// Owns the hop table and run state for one run at a time.
///
/// `start` while a run is active is rejected with `AlreadyRunning`.
pub struct RunController<L: ProbeLauncher + 'static> {
    launcher: Arc<L>,
    settings: ProbeSettings,
    shared: Arc<Shared>,
    active: Option<ActiveRun>,
}

impl<L: ProbeLauncher + 'static> RunController<L> {
    pub fn new(launcher: Arc<L>, settings: ProbeSettings, events: Sender<RunEvent>) -> Self {
        Self {
            launcher,
            settings,
            shared: Arc::new(Shared {
                table: Mutex::new(HopTable::new()),
                verdicts: Mutex::new(Verdicts::NEUTRAL),
                state: Mutex::new(RunState::Idle),
                outcome: Mutex::new(None),
                events,
            }),
            active: None,
        }
    }

    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    pub fn state(&self) -> RunState {
        self.shared.state()
    }

    /// Current rows in display order.
    pub fn snapshot(&self) -> Vec<HopRow> {
        self.shared.table.lock().snapshot()
    }

    pub fn verdicts(&self) -> Verdicts {
        *self.shared.verdicts.lock()
    }

    /// How the most recent run ended, once it has.
    pub fn outcome(&self) -> Option<RunOutcome> {
        *self.shared.outcome.lock()
    }

    pub fn start(&mut self, target: &str) -> Result<(), RunError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(RunError::InvalidTarget);
        }
        if self.state().is_active() {
            return Err(RunError::AlreadyRunning);
        }
        self.join_producer();

        let ProbeProcess { lines, handle } = self
            .launcher
            .launch(target, &self.settings)
            .map_err(|source| RunError::ProcessUnavailable {
                program: self.settings.program.clone(),
                source,
            })?;

        self.shared.reset();
        self.shared.set_state(RunState::Running);
        info!(host = target, count = self.settings.count, "run started");

        let shared = Arc::clone(&self.shared);
        let producer_handle = Arc::clone(&handle);
        let producer = thread::spawn(move || {
            loop {
                if shared.state() == RunState::Stopping {
                    break;
                }
                let line = match lines.recv_timeout(CANCEL_POLL) {
                    Ok(line) => line,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };
                if !is_data_line(&line) {
                    continue;
                }
                match parse_hop_line(&line) {
                    Some(sample) => shared.apply(sample),
                    None => trace!(line = %line, "skipping unparsed line"),
                }
            }
            drop(lines);

            let status = producer_handle.reap();
            debug!(?status, "probe exited");

            let outcome = if shared.state() == RunState::Stopping {
                RunOutcome::Stopped
            } else {
                RunOutcome::Completed
            };
            shared.finish(outcome);
        });

        self.active = Some(ActiveRun { handle, producer });
        Ok(())
    }

    /// Cancels a running diagnostic and returns once the producer has exited.
    /// The producer stops reading even if the output stream stays open.
    /// Does nothing unless the state is `Running`.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.state.lock();
            if *state != RunState::Running {
                return;
            }
            *state = RunState::Stopping;
        }
        debug!("run state changed to stopping");
        self.shared.emit(RunEvent::State(RunState::Stopping));

        if let Some(active) = self.active.take() {
            active.handle.terminate();
            if active.producer.join().is_err() {
                warn!("producer thread panicked");
            }
        }
        if self.state() != RunState::Finished {
            self.shared.finish(RunOutcome::Stopped);
        }
    }

    /// Blocks until the current run finishes on its own.
    pub fn wait(&mut self) -> Option<RunOutcome> {
        self.join_producer();
        self.outcome()
    }

    fn join_producer(&mut self) {
        if let Some(active) = self.active.take() {
            if active.producer.join().is_err() {
                warn!("producer thread panicked");
            }
        }
    }
}

impl<L: ProbeLauncher + 'static> Drop for RunController<L> {
    fn drop(&mut self) {
        self.stop();
        self.join_producer();
    }
}
