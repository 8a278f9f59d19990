use super::model::ViewState;
use crossterm::style::{style, Color, Stylize};
use hopwatch_model::{CellShade, HopRow};
use hopwatch_trace::{latency_shade, loss_shade};

#[derive(Debug, Clone, Copy)]
pub struct UiOpts {
    pub plain: bool,
}

const HOST_WIDTH: usize = 28;
const NUM_WIDTH: usize = 7;

pub fn render_frame(view: &ViewState, opts: &UiOpts, term_w: u16) -> String {
    let width = term_w as usize;
    let mut lines = Vec::new();

    lines.push(center_line(&format!("HOPWATCH  {}", view.target), width));
    lines.push("".to_string());
    lines.push(header());
    for row in &view.rows {
        lines.push(render_row(row, opts));
    }
    if view.rows.is_empty() {
        lines.push("  (waiting for hops)".to_string());
    }

    lines.push("".to_string());
    lines.push(legend(opts));
    lines.push("".to_string());

    if let Some(perf) = view.verdicts.performance {
        let text = format!("Overall: {}", perf.label());
        lines.push(paint(&center_line(&text, width), rank_color(perf.rank()), opts));
    }
    if let Some(stab) = view.verdicts.stability {
        let text = format!("Stability: {}", stab.label());
        lines.push(paint(&center_line(&text, width), rank_color(stab.rank()), opts));
    }

    lines.push("".to_string());
    lines.push(view.status_line());
    lines.join("\n")
}

fn header() -> String {
    let mut line = format!("{:>4}  {:<HOST_WIDTH$}", "Hop", "Host / IP");
    for title in ["Loss %", "Sent", "Last", "Avg", "Best", "Worst", "StDev"] {
        line.push_str(&format!(" {title:>NUM_WIDTH$}"));
    }
    line
}

fn render_row(row: &HopRow, opts: &UiOpts) -> String {
    let s = &row.sample;
    let mut line = format!("{:>4}  {:<HOST_WIDTH$}", s.hop, s.host);

    let loss = format!(" {:>NUM_WIDTH$}", format!("{:.1}%", s.loss_pct));
    line.push_str(&shaded(&loss, loss_shade(s.loss_pct), opts));
    line.push_str(&format!(" {:>NUM_WIDTH$}", s.sent));

    for ms in [s.last_ms, s.avg_ms, s.best_ms, s.worst_ms, s.stdev_ms] {
        let cell = format!(" {:>NUM_WIDTH$.1}", ms);
        line.push_str(&shaded(&cell, latency_shade(ms), opts));
    }
    line
}

fn legend(opts: &UiOpts) -> String {
    let items = [
        ("Loss > 50%", CellShade::Critical),
        ("Loss > 10%", CellShade::Warning),
        ("Loss > 0%", CellShade::Notice),
        ("Latency > 300ms", CellShade::Critical),
        ("Latency > 100ms", CellShade::Warning),
        ("Latency > 50ms", CellShade::Notice),
    ];
    let marks: Vec<String> = items
        .iter()
        .map(|(text, shade)| format!("{} {text}", shaded("###", *shade, opts)))
        .collect();
    format!("Legend: {}", marks.join("   "))
}

fn shaded(text: &str, shade: CellShade, opts: &UiOpts) -> String {
    match shade_color(shade) {
        Some(color) => paint(text, color, opts),
        None => text.to_string(),
    }
}

fn shade_color(shade: CellShade) -> Option<Color> {
    match shade {
        CellShade::None => None,
        CellShade::Notice => Some(Color::Yellow),
        CellShade::Warning => Some(Color::DarkYellow),
        CellShade::Critical => Some(Color::Red),
    }
}

fn rank_color(rank: u8) -> Color {
    match rank {
        1 | 2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::DarkYellow,
        _ => Color::Red,
    }
}

fn paint(text: &str, color: Color, opts: &UiOpts) -> String {
    if opts.plain {
        text.to_string()
    } else {
        format!("{}", style(text).with(color))
    }
}

fn center_line(text: &str, width: usize) -> String {
    if text.len() >= width {
        return text.to_string();
    }
    let pad = (width - text.len()) / 2;
    format!("{}{}", " ".repeat(pad), text)
}
