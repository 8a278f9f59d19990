use hopwatch_model::HopSample;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::str::FromStr;
use tracing::trace;

/// Substring present on every hop line of an mtr report and absent from the
/// `Start:` and `HOST:` header lines.
pub const DATA_LINE_MARKER: &str = "|--";

static HOP_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^\s*(\d+)\.\|--\s+",
        r"([\w.:?\[\]]+)\s+",
        r"([\d.]+)%\s+",
        r"(\d+)\s+",
        r"([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+([\d.]+)",
        r"(?:\s|$)",
    ))
    .unwrap()
});

/// Cheap pre-filter. A positive answer does not guarantee `parse_hop_line`
/// will accept the line.
pub fn is_data_line(line: &str) -> bool {
    line.contains(DATA_LINE_MARKER)
}

/// Parses one `--report-wide` hop line. Anything that is not a complete hop
/// line yields `None`.
pub fn parse_hop_line(line: &str) -> Option<HopSample> {
    let caps = HOP_LINE.captures(line)?;
    let sample = sample_from(&caps);
    if sample.is_none() {
        trace!(line, "rejected hop line with invalid numeric field");
    }
    sample
}

/// Parses every hop line of a complete report, in order of appearance.
pub fn parse_report(text: &str) -> Vec<HopSample> {
    text.lines()
        .filter(|line| is_data_line(line))
        .filter_map(parse_hop_line)
        .collect()
}

fn sample_from(caps: &Captures<'_>) -> Option<HopSample> {
    let hop: u32 = number(&caps[1])?;
    if hop == 0 {
        return None;
    }
    Some(HopSample {
        hop,
        host: caps[2].to_string(),
        loss_pct: percent(&caps[3])?,
        sent: number(&caps[4])?,
        last_ms: number(&caps[5])?,
        avg_ms: number(&caps[6])?,
        best_ms: number(&caps[7])?,
        worst_ms: number(&caps[8])?,
        stdev_ms: number(&caps[9])?,
    })
}

fn number<T: FromStr>(token: &str) -> Option<T> {
    token.parse().ok()
}

fn percent(token: &str) -> Option<f64> {
    let value: f64 = number(token)?;
    (0.0..=100.0).contains(&value).then_some(value)
}
