mod output;
mod replay;
mod view;

use anyhow::{anyhow, Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType};
use hopwatch_model::RunState;
use hopwatch_trace::{
    ProbeLauncher, ProbeSettings, RunController, RunError, RunEvent, SystemProbeLauncher,
};
use replay::ReplayLauncher;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use view::{render_frame, UiOpts, ViewState};

const TICK: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(
    name = "hopwatch",
    version,
    about = "Live mtr hop table with connection quality and stability verdicts. Only target networks you own or have permission to test."
)]
struct Cli {
    /// Host name or address to diagnose.
    target: String,

    /// Probes sent to each hop.
    #[arg(long, default_value_t = 10)]
    count: u32,

    #[arg(long, env = "HOPWATCH_PROGRAM", default_value = "mtr")]
    program: String,

    /// Replay a saved `mtr --report-wide` output instead of running mtr.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Delay between replayed lines, in milliseconds.
    #[arg(long, default_value_t = 0)]
    replay_interval_ms: u64,

    /// Write a JSON report of the finished run.
    #[arg(long)]
    json: Option<PathBuf>,

    /// No colours or screen redraws; print the final table once.
    #[arg(long)]
    plain: bool,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = ProbeSettings {
        program: cli.program.clone(),
        count: cli.count,
        ..ProbeSettings::default()
    };
    let (tx, rx) = mpsc::channel();

    match &cli.replay {
        Some(path) => {
            let interval = Duration::from_millis(cli.replay_interval_ms);
            let launcher = Arc::new(ReplayLauncher::from_file(path, interval)?);
            watch(RunController::new(launcher, settings, tx), rx, &cli)
        }
        None => watch(
            RunController::new(Arc::new(SystemProbeLauncher), settings, tx),
            rx,
            &cli,
        ),
    }
}

fn watch<L: ProbeLauncher + 'static>(
    mut controller: RunController<L>,
    events: Receiver<RunEvent>,
    cli: &Cli,
) -> Result<()> {
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("failed to install Ctrl-C handler")?;
    }

    let started_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    controller.start(&cli.target).map_err(|err| {
        if matches!(err, RunError::ProcessUnavailable { .. }) {
            anyhow!("{err} (install it with e.g. `sudo apt install mtr`)")
        } else {
            anyhow!(err)
        }
    })?;

    let opts = UiOpts { plain: cli.plain };
    let mut view = ViewState::new(&cli.target, controller.settings().count);
    view.state = RunState::Running;
    let mut stdout = io::stdout();
    if opts.plain {
        eprintln!("{}", view.status_line());
    }

    loop {
        if interrupted.swap(false, Ordering::SeqCst) {
            debug!("interrupt received, stopping run");
            controller.stop();
        }

        let mut finished = match events.recv_timeout(TICK) {
            Ok(event) => view.apply(event),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => true,
        };
        for event in events.try_iter() {
            finished |= view.apply(event);
        }

        if !opts.plain {
            redraw(&mut stdout, &view, &opts)?;
        }
        if finished {
            break;
        }
    }
    controller.wait();

    if opts.plain {
        writeln!(stdout, "{}", render_frame(&view, &opts, terminal_width()))?;
    } else {
        writeln!(stdout)?;
    }

    if let Some(path) = &cli.json {
        let finished_at_utc = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        output::write_json(path, &view.report(started_at_utc, finished_at_utc))?;
        eprintln!("report: wrote {:?}", path);
    }
    Ok(())
}

fn redraw(out: &mut impl Write, view: &ViewState, opts: &UiOpts) -> Result<()> {
    let frame = render_frame(view, opts, terminal_width());
    execute!(out, MoveTo(0, 0), Clear(ClearType::All), Print(frame))
        .context("failed to draw to terminal")
}

fn terminal_width() -> u16 {
    terminal::size().map(|(width, _)| width).unwrap_or(100)
}
