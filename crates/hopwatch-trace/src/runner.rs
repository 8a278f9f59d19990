use parking_lot::Mutex;
use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

const LINE_BUFFER: usize = 256;
const REAP_POLL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub program: String,
    pub count: u32,
    pub numeric: bool,
    pub wide: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            program: "mtr".to_string(),
            count: 10,
            numeric: true,
            wide: true,
        }
    }
}

impl ProbeSettings {
    pub fn args(&self, target: &str) -> Vec<String> {
        let mut args = Vec::new();
        if self.numeric {
            args.push("-n".to_string());
        }
        args.push("-c".to_string());
        args.push(self.count.max(1).to_string());
        args.push(if self.wide { "--report-wide" } else { "--report" }.to_string());
        args.push(target.to_string());
        args
    }
}

/// Control over a launched diagnostic process.
pub trait ProbeHandle: Send + Sync {
    /// Forcibly ends the process and anything it spawned. Callers must not
    /// rely on the output stream closing afterwards.
    fn terminate(&self);

    /// Waits for the process to exit and returns its exit code, if any.
    fn reap(&self) -> Option<i32>;
}

/// A running diagnostic: its combined output lines plus a handle to stop it.
pub struct ProbeProcess {
    pub lines: Receiver<String>,
    pub handle: Arc<dyn ProbeHandle>,
}

pub trait ProbeLauncher: Send + Sync {
    fn launch(&self, target: &str, settings: &ProbeSettings) -> io::Result<ProbeProcess>;
}

/// Launches the real program with piped stdout and stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbeLauncher;

impl ProbeLauncher for SystemProbeLauncher {
    fn launch(&self, target: &str, settings: &ProbeSettings) -> io::Result<ProbeProcess> {
        let args = settings.args(target);
        debug!(program = %settings.program, ?args, "launching probe");

        let mut command = Command::new(&settings.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        let mut child = command.spawn()?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "missing probe output pipes",
                ));
            }
        };

        let (tx, rx) = mpsc::sync_channel(LINE_BUFFER);
        forward_lines(stdout, tx.clone());
        forward_lines(stderr, tx);

        Ok(ProbeProcess {
            lines: rx,
            handle: Arc::new(ChildHandle {
                child: Mutex::new(child),
            }),
        })
    }
}

/// Both pipes feed the same channel, which disconnects once both reach EOF
/// or the receiver is dropped.
fn forward_lines<R: Read + Send + 'static>(reader: R, sender: SyncSender<String>) {
    thread::spawn(move || {
        let reader = BufReader::new(reader);
        for line in reader.lines().map_while(Result::ok) {
            if sender.send(line).is_err() {
                break;
            }
        }
    });
}

struct ChildHandle {
    child: Mutex<Child>,
}

impl ProbeHandle for ChildHandle {
    fn terminate(&self) {
        let mut child = self.child.lock();
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        kill_process_group(&child);
        if let Err(err) = child.kill() {
            warn!(%err, "failed to kill probe process");
        }
        let _ = child.wait();
    }

    fn reap(&self) -> Option<i32> {
        loop {
            {
                let mut child = self.child.lock();
                match child.try_wait() {
                    Ok(Some(status)) => return status.code(),
                    Ok(None) => {}
                    Err(err) => {
                        warn!(%err, "failed to reap probe process");
                        return None;
                    }
                }
            }
            thread::sleep(REAP_POLL);
        }
    }
}

/// Helpers the child forked share its process group and may still hold the
/// output pipes, so the whole group goes down with it.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    let pgid = child.id() as libc::pid_t;
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        debug!(pgid, err = %io::Error::last_os_error(), "failed to kill child process group");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_args_request_numeric_wide_report() {
        let args = ProbeSettings::default().args("8.8.8.8");
        assert_eq!(args, vec!["-n", "-c", "10", "--report-wide", "8.8.8.8"]);
    }

    #[test]
    fn count_is_at_least_one() {
        let settings = ProbeSettings {
            count: 0,
            numeric: false,
            wide: false,
            ..ProbeSettings::default()
        };
        assert_eq!(settings.args("host"), vec!["-c", "1", "--report", "host"]);
    }

    #[test]
    fn missing_program_fails_to_launch() {
        let settings = ProbeSettings {
            program: "hopwatch-no-such-program".to_string(),
            ..ProbeSettings::default()
        };
        let err = SystemProbeLauncher.launch("8.8.8.8", &settings).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
