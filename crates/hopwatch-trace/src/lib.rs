//! Live mtr report parsing, hop table bookkeeping and verdicts.

pub mod classify;
pub mod controller;
pub mod error;
pub mod parser;
pub mod runner;
pub mod table;

pub use classify::{aggregate, classify, latency_shade, loss_shade, Aggregate};
pub use controller::{RunController, RunEvent};
pub use error::RunError;
pub use parser::{is_data_line, parse_hop_line, parse_report, DATA_LINE_MARKER};
pub use runner::{ProbeHandle, ProbeLauncher, ProbeProcess, ProbeSettings, SystemProbeLauncher};
pub use table::HopTable;
