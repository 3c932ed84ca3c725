use crate::domain::errors::AppError;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A program invocation, built up before it is handed to a [`ProcessRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// `0` means no limit.
    pub fn timeout_secs(mut self, seconds: u64) -> Self {
        self.timeout = (seconds > 0).then(|| Duration::from_secs(seconds));
        self
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    Success,
    NonZeroExit { code: Option<i32> },
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub program: String,
    pub outcome: ProcessOutcome,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
    pub timeout: Option<Duration>,
}

impl ProcessReport {
    pub fn success(program: impl Into<String>) -> Self {
        ProcessReport {
            program: program.into(),
            outcome: ProcessOutcome::Success,
            stdout: String::new(),
            stderr: String::new(),
            elapsed: Duration::ZERO,
            timeout: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == ProcessOutcome::Success
    }

    /// Turns a non-zero exit or a timeout into the matching [`AppError`].
    pub fn into_result(self) -> Result<ProcessReport, AppError> {
        match self.outcome {
            ProcessOutcome::Success => Ok(self),
            ProcessOutcome::NonZeroExit { code } => Err(AppError::ProcessFailed {
                program: self.program,
                code,
                stderr: tail(&self.stderr, 20),
            }),
            ProcessOutcome::TimedOut => Err(AppError::ProcessTimedOut {
                program: self.program,
                seconds: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }),
        }
    }
}

/// Last `lines` lines of a captured stream.
pub fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

pub trait ProcessRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessReport, AppError>;
}

/// How long captured output may keep draining after the child is gone.
/// Descendants that escaped the process group can hold the pipes open.
const OUTPUT_GRACE: Duration = Duration::from_secs(2);

/// Runs programs on the host, capturing their output. Each child leads its
/// own process group, and the whole group is killed once the timeout
/// elapses.
pub struct SystemRunner {
    poll_interval: Duration,
}

impl SystemRunner {
    pub fn new() -> Self {
        SystemRunner {
            poll_interval: Duration::from_millis(100),
        }
    }

    fn wait(&self, child: &mut Child, timeout: Option<Duration>, started: Instant) -> Result<ProcessOutcome, AppError> {
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(if status.success() {
                    ProcessOutcome::Success
                } else {
                    ProcessOutcome::NonZeroExit { code: status.code() }
                });
            }
            if timeout.is_some_and(|limit| started.elapsed() >= limit) {
                if let Err(e) = kill_group(child) {
                    warn!("failed to kill timed out process group: {}", e);
                }
                child.wait()?;
                return Ok(ProcessOutcome::TimedOut);
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessReport, AppError> {
        info!("Running {}", spec.command_line());
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let started = Instant::now();
        let mut child = command.spawn()?;
        let stdout = child.stdout.take().map(|s| Capture::start(s, "stdout"));
        let stderr = child.stderr.take().map(|s| Capture::start(s, "stderr"));

        let outcome = self.wait(&mut child, spec.timeout, started)?;
        let report = ProcessReport {
            program: spec.program.clone(),
            outcome,
            stdout: stdout.map(Capture::finish).unwrap_or_default(),
            stderr: stderr.map(Capture::finish).unwrap_or_default(),
            elapsed: started.elapsed(),
            timeout: spec.timeout,
        };
        debug!(program = %report.program, outcome = ?report.outcome, elapsed = ?report.elapsed, "process finished");
        Ok(report)
    }
}

#[cfg(unix)]
fn kill_group(child: &mut Child) -> io::Result<()> {
    let pgid = child.id() as libc::pid_t;
    // SAFETY: plain signal delivery to the group the child was spawned into.
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) -> io::Result<()> {
    child.kill()
}

/// Output read on a background thread into a shared buffer, so whatever
/// arrived is still available if the reader never reaches end of stream.
struct Capture {
    buffer: Arc<Mutex<Vec<u8>>>,
    done: mpsc::Receiver<()>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(mut stream: R, name: &'static str) -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let (tx, done) = mpsc::channel();
        let sink = buffer.clone();
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => match sink.lock() {
                        Ok(mut buf) => buf.extend_from_slice(&chunk[..n]),
                        Err(_) => break,
                    },
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        warn!("failed to read child {}: {}", name, e);
                        break;
                    }
                }
            }
            let _ = tx.send(());
        });
        Capture { buffer, done }
    }

    fn finish(self) -> String {
        if self.done.recv_timeout(OUTPUT_GRACE).is_err() {
            warn!("output still open {:?} after exit, keeping what was read", OUTPUT_GRACE);
        }
        match self.buffer.lock() {
            Ok(buf) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => String::new(),
        }
    }
}
