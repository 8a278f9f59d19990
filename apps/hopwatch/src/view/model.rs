use hopwatch_model::{HopRow, RunOutcome, RunReport, RunState, Verdicts};
use hopwatch_trace::RunEvent;

/// What the terminal currently shows, rebuilt from controller events.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub target: String,
    pub count: u32,
    pub state: RunState,
    pub rows: Vec<HopRow>,
    pub verdicts: Verdicts,
    pub outcome: Option<RunOutcome>,
}

impl ViewState {
    pub fn new(target: &str, count: u32) -> Self {
        Self {
            target: target.trim().to_string(),
            count,
            state: RunState::Idle,
            rows: Vec::new(),
            verdicts: Verdicts::NEUTRAL,
            outcome: None,
        }
    }

    /// Returns true once the run has finished.
    pub fn apply(&mut self, event: RunEvent) -> bool {
        match event {
            RunEvent::State(state) => self.state = state,
            RunEvent::Rows(rows) => self.rows = rows,
            RunEvent::Verdicts(verdicts) => self.verdicts = verdicts,
            RunEvent::Finished(outcome) => {
                self.outcome = Some(outcome);
                return true;
            }
        }
        false
    }

    pub fn status_line(&self) -> String {
        match (self.state, self.outcome) {
            (RunState::Idle, _) => "Ready".to_string(),
            (RunState::Running, _) => {
                format!("Running {}-ping test to {}...", self.count, self.target)
            }
            (RunState::Stopping, _) => "Stopping...".to_string(),
            (RunState::Finished, Some(RunOutcome::Stopped)) => "Stopped by user".to_string(),
            (RunState::Finished, _) => format!("Test complete - {} pings sent", self.count),
        }
    }

    pub fn report(&self, started_at_utc: String, finished_at_utc: String) -> RunReport {
        RunReport {
            version: 1,
            target: self.target.clone(),
            started_at_utc,
            finished_at_utc,
            outcome: self.outcome.unwrap_or(RunOutcome::Stopped),
            hops: self.rows.clone(),
            verdicts: self.verdicts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopwatch_model::{HopSample, Performance};

    #[test]
    fn events_drive_status_line() {
        let mut view = ViewState::new(" 8.8.8.8 ", 10);
        assert_eq!(view.status_line(), "Ready");

        assert!(!view.apply(RunEvent::State(RunState::Running)));
        assert_eq!(view.status_line(), "Running 10-ping test to 8.8.8.8...");

        assert!(!view.apply(RunEvent::State(RunState::Finished)));
        assert!(view.apply(RunEvent::Finished(RunOutcome::Completed)));
        assert_eq!(view.status_line(), "Test complete - 10 pings sent");

        view.outcome = Some(RunOutcome::Stopped);
        assert_eq!(view.status_line(), "Stopped by user");
    }

    #[test]
    fn report_carries_latest_rows_and_verdicts() {
        let mut view = ViewState::new("1.1.1.1", 10);
        let row = HopRow {
            position: 0,
            sample: HopSample {
                hop: 1,
                host: "1.1.1.1".to_string(),
                loss_pct: 0.0,
                sent: 10,
                last_ms: 3.0,
                avg_ms: 3.2,
                best_ms: 2.9,
                worst_ms: 4.0,
                stdev_ms: 0.3,
            },
        };
        view.apply(RunEvent::Rows(vec![row.clone()]));
        view.apply(RunEvent::Verdicts(Verdicts {
            performance: Some(Performance::Excellent),
            stability: None,
        }));
        view.apply(RunEvent::Finished(RunOutcome::Completed));

        let report = view.report("start".to_string(), "end".to_string());
        assert_eq!(report.target, "1.1.1.1");
        assert_eq!(report.hops, vec![row]);
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.verdicts.performance, Some(Performance::Excellent));
    }
}
