//! Verdicts over a hop table snapshot.
//!
//! Each cascade is an ordered threshold table evaluated top-down; the first
//! tier whose bounds hold wins and the last tier has no bounds.

use hopwatch_model::{CellShade, HopRow, Performance, Stability, Verdicts};
use tracing::trace;

/// (max loss %, max average latency ms, verdict).
const PERFORMANCE_TIERS: &[(f64, f64, Performance)] = &[
    (0.0, 50.0, Performance::Excellent),
    (1.0, 80.0, Performance::Good),
    (5.0, 150.0, Performance::Acceptable),
    (20.0, 300.0, Performance::Degraded),
    (f64::INFINITY, f64::INFINITY, Performance::Poor),
];

/// (max stdev ms, verdict).
const STABILITY_TIERS: &[(f64, Stability)] = &[
    (5.0, Stability::ExtremelyStable),
    (15.0, Stability::VeryStable),
    (30.0, Stability::ModeratelyStable),
    (80.0, Stability::Unstable),
    (f64::INFINITY, Stability::HighlyUnstable),
];

/// Shade thresholds, highest first: (strictly greater than, shade).
const LOSS_SHADES: &[(f64, CellShade)] = &[
    (50.0, CellShade::Critical),
    (10.0, CellShade::Warning),
    (0.0, CellShade::Notice),
];

const LATENCY_SHADES: &[(f64, CellShade)] = &[
    (300.0, CellShade::Critical),
    (100.0, CellShade::Warning),
    (50.0, CellShade::Notice),
];

/// Worst values across all usable rows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aggregate {
    pub max_loss: f64,
    pub max_avg: f64,
    pub max_stdev: f64,
    pub rows: usize,
}

/// Rows whose loss, average or stdev is not a finite number are skipped.
pub fn aggregate(rows: &[HopRow]) -> Aggregate {
    rows.iter().fold(Aggregate::default(), |acc, row| {
        let s = &row.sample;
        if !(s.loss_pct.is_finite() && s.avg_ms.is_finite() && s.stdev_ms.is_finite()) {
            trace!(hop = s.hop, "skipping row with non-finite fields");
            return acc;
        }
        Aggregate {
            max_loss: acc.max_loss.max(s.loss_pct),
            max_avg: acc.max_avg.max(s.avg_ms),
            max_stdev: acc.max_stdev.max(s.stdev_ms),
            rows: acc.rows + 1,
        }
    })
}

pub fn performance(max_loss: f64, max_avg: f64) -> Performance {
    PERFORMANCE_TIERS
        .iter()
        .find(|(loss, avg, _)| max_loss <= *loss && max_avg <= *avg)
        .map(|(_, _, verdict)| *verdict)
        .unwrap_or(Performance::Poor)
}

pub fn stability(max_stdev: f64) -> Stability {
    STABILITY_TIERS
        .iter()
        .find(|(stdev, _)| max_stdev <= *stdev)
        .map(|(_, verdict)| *verdict)
        .unwrap_or(Stability::HighlyUnstable)
}

/// Classifies a snapshot. A snapshot with no usable rows gives
/// `Verdicts::NEUTRAL`.
pub fn classify(rows: &[HopRow]) -> Verdicts {
    let agg = aggregate(rows);
    if agg.rows == 0 {
        return Verdicts::NEUTRAL;
    }
    Verdicts {
        performance: Some(performance(agg.max_loss, agg.max_avg)),
        stability: Some(stability(agg.max_stdev)),
    }
}

pub fn loss_shade(loss_pct: f64) -> CellShade {
    shade(LOSS_SHADES, loss_pct)
}

/// Shade for any of the latency columns (last, avg, best, worst, stdev).
pub fn latency_shade(ms: f64) -> CellShade {
    shade(LATENCY_SHADES, ms)
}

fn shade(table: &[(f64, CellShade)], value: f64) -> CellShade {
    table
        .iter()
        .find(|(above, _)| value > *above)
        .map(|(_, shade)| *shade)
        .unwrap_or(CellShade::None)
}
