use anyhow::{Context, Result};
use hopwatch_trace::{ProbeHandle, ProbeLauncher, ProbeProcess, ProbeSettings};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Feeds a saved report through the controller instead of running the
/// diagnostic program.
pub struct ReplayLauncher {
    lines: Arc<Vec<String>>,
    interval: Duration,
}

impl ReplayLauncher {
    pub fn from_file(path: &Path, interval: Duration) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay file {:?}", path))?;
        Ok(Self::from_text(&contents, interval))
    }

    pub fn from_text(text: &str, interval: Duration) -> Self {
        Self {
            lines: Arc::new(text.lines().map(|line| line.to_string()).collect()),
            interval,
        }
    }
}

struct ReplayHandle {
    cancelled: Arc<AtomicBool>,
}

impl ProbeHandle for ReplayHandle {
    fn terminate(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn reap(&self) -> Option<i32> {
        Some(0)
    }
}

impl ProbeLauncher for ReplayLauncher {
    fn launch(&self, _target: &str, _settings: &ProbeSettings) -> io::Result<ProbeProcess> {
        let (tx, rx) = mpsc::sync_channel(0);
        let cancelled = Arc::new(AtomicBool::new(false));
        let lines = Arc::clone(&self.lines);
        let interval = self.interval;
        let flag = Arc::clone(&cancelled);

        thread::spawn(move || {
            for line in lines.iter() {
                if flag.load(Ordering::SeqCst) || tx.send(line.clone()).is_err() {
                    break;
                }
                if !interval.is_zero() {
                    thread::sleep(interval);
                }
            }
        });

        Ok(ProbeProcess {
            lines: rx,
            handle: Arc::new(ReplayHandle { cancelled }),
        })
    }
}
