//! Shared data structures for hopwatch.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Host token the diagnostic prints for a hop that never answered.
pub const UNKNOWN_HOST: &str = "???";

/// One parsed observation of a hop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HopSample {
    pub hop: u32,
    pub host: String,
    pub loss_pct: f64,
    pub sent: u32,
    pub last_ms: f64,
    pub avg_ms: f64,
    pub best_ms: f64,
    pub worst_ms: f64,
    pub stdev_ms: f64,
}

impl HopSample {
    pub fn is_unresponsive(&self) -> bool {
        self.host == UNKNOWN_HOST
    }
}

/// The latest sample for a hop number together with its display position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HopRow {
    pub position: usize,
    pub sample: HopSample,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Stopping,
    Finished,
}

impl RunState {
    /// True while a producer may still be feeding the table.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Stopping)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Stopping => "stopping",
            RunState::Finished => "finished",
        };
        f.write_str(name)
    }
}

/// How a run reached `Finished`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Stopped,
}

/// Overall connection quality, best first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
    Excellent,
    Good,
    Acceptable,
    Degraded,
    Poor,
}

impl Performance {
    pub fn name(self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent",
            Performance::Good => "Good",
            Performance::Acceptable => "Acceptable",
            Performance::Degraded => "Degraded",
            Performance::Poor => "Poor",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Performance::Excellent => "Excellent",
            Performance::Good => "Good",
            Performance::Acceptable => "Acceptable (minor issues)",
            Performance::Degraded => "Degraded (noticeable lag/loss)",
            Performance::Poor => "Poor (high loss or latency)",
        }
    }

    /// Severity rank, 1 (best) to 5 (worst).
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }
}

/// Path stability judged from jitter, best first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    ExtremelyStable,
    VeryStable,
    ModeratelyStable,
    Unstable,
    HighlyUnstable,
}

impl Stability {
    pub fn name(self) -> &'static str {
        match self {
            Stability::ExtremelyStable => "Extremely stable",
            Stability::VeryStable => "Very stable",
            Stability::ModeratelyStable => "Moderately stable",
            Stability::Unstable => "Unstable",
            Stability::HighlyUnstable => "Highly unstable",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stability::ExtremelyStable => "Extremely stable",
            Stability::VeryStable => "Very stable",
            Stability::ModeratelyStable => "Moderately stable (light jitter)",
            Stability::Unstable => "Unstable (noticeable jitter)",
            Stability::HighlyUnstable => "Highly unstable (severe jitter)",
        }
    }

    /// Severity rank, 1 (best) to 5 (worst).
    pub fn rank(self) -> u8 {
        self as u8 + 1
    }
}

/// Verdict pair for a table snapshot. Both halves are `None` when nothing
/// has been measured yet; callers should not display a neutral pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Verdicts {
    pub performance: Option<Performance>,
    pub stability: Option<Stability>,
}

impl Verdicts {
    pub const NEUTRAL: Verdicts = Verdicts {
        performance: None,
        stability: None,
    };

    pub fn is_neutral(&self) -> bool {
        self.performance.is_none() && self.stability.is_none()
    }
}

/// Highlight level for a single table cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CellShade {
    None,
    Notice,
    Warning,
    Critical,
}

/// Summary of one finished run, written as JSON by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    pub version: u32,
    pub target: String,
    pub started_at_utc: String,
    pub finished_at_utc: String,
    pub outcome: RunOutcome,
    pub hops: Vec<HopRow>,
    pub verdicts: Verdicts,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(hop: u32, host: &str) -> HopSample {
        HopSample {
            hop,
            host: host.to_string(),
            loss_pct: 10.0,
            sent: 10,
            last_ms: 12.5,
            avg_ms: 11.0,
            best_ms: 9.75,
            worst_ms: 14.0,
            stdev_ms: 1.25,
        }
    }

    #[test]
    fn run_report_round_trip_is_stable() {
        let report = RunReport {
            version: 1,
            target: "8.8.8.8".to_string(),
            started_at_utc: "2026-02-01T12:34:56Z".to_string(),
            finished_at_utc: "2026-02-01T12:35:06Z".to_string(),
            outcome: RunOutcome::Completed,
            hops: vec![
                HopRow {
                    position: 0,
                    sample: sample(1, "192.168.1.1"),
                },
                HopRow {
                    position: 1,
                    sample: sample(2, UNKNOWN_HOST),
                },
            ],
            verdicts: Verdicts {
                performance: Some(Performance::Degraded),
                stability: Some(Stability::VeryStable),
            },
        };

        let json = serde_json::to_string_pretty(&report).unwrap();
        let decoded: RunReport = serde_json::from_str(&json).unwrap();
        let json2 = serde_json::to_string_pretty(&decoded).unwrap();

        assert_eq!(report, decoded);
        assert_eq!(json, json2);
        assert!(json.contains("\"degraded\""));
        assert!(json.contains("\"very_stable\""));
    }

    #[test]
    fn ranks_follow_declaration_order() {
        assert_eq!(Performance::Excellent.rank(), 1);
        assert_eq!(Performance::Poor.rank(), 5);
        assert_eq!(Stability::ExtremelyStable.rank(), 1);
        assert_eq!(Stability::HighlyUnstable.rank(), 5);
        assert!(Performance::Good < Performance::Degraded);
    }

    #[test]
    fn unknown_host_sentinel_is_detected() {
        assert!(sample(4, "???").is_unresponsive());
        assert!(!sample(4, "10.0.0.1").is_unresponsive());
    }

    #[test]
    fn neutral_verdicts_are_default() {
        assert_eq!(Verdicts::default(), Verdicts::NEUTRAL);
        assert!(Verdicts::NEUTRAL.is_neutral());
        assert!(!RunState::Idle.is_active());
        assert!(RunState::Stopping.is_active());
    }
}
