//! Running Maven as a supervised subprocess.
//!
//! Maven can be extremely chatty. Both output streams are drained by their own
//! thread while the caller waits for the process, so a child that fills one
//! pipe while we block on the other can never deadlock. The drains are joined
//! before a result is returned, so captured output is never truncated.
//!
//! On Unix the child leads its own process group, so a timeout kills every
//! process the launcher forked, not just the launcher itself.

use crate::error::{ItfError, Result};
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Poll cadence while waiting on a process with a timeout.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// File name of the Maven launcher below `<home>/bin`.
#[cfg(windows)]
pub const MAVEN_EXECUTABLE: &str = "mvn.cmd";
#[cfg(not(windows))]
pub const MAVEN_EXECUTABLE: &str = "mvn";

/// A full command invocation (cwd + program + args + extra environment).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    #[must_use]
    pub fn new(program: &Path, args: &[String], cwd: &Path) -> Self {
        Self {
            program: program.to_path_buf(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
            env: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') || arg.contains('\t') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Final state of a terminated process with fully drained output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `-1` when the process was ended by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

type Drain = JoinHandle<io::Result<Vec<u8>>>;

/// A running process and the threads draining its output.
///
/// Consumed by [`ProcessHandle::wait`]; a handle cannot outlive its process.
#[derive(Debug)]
pub struct ProcessHandle {
    child: Child,
    stdout: Drain,
    stderr: Drain,
    command: String,
    started: Instant,
}

impl ProcessHandle {
    /// Launch `spec` with piped output and a null stdin.
    ///
    /// # Errors
    ///
    /// Returns [`ItfError::Spawn`] if the process cannot be started.
    pub fn spawn(spec: &CommandSpec) -> Result<Self> {
        let command = spec.to_string();
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .current_dir(&spec.cwd)
            .envs(spec.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        let mut child = cmd.spawn().map_err(|source| ItfError::Spawn {
            command: command.clone(),
            source,
        })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ItfError::Spawn {
                    command,
                    source: io::Error::other("child output was not captured"),
                });
            }
        };

        debug!(pid = child.id(), command = %command, "Spawned process");
        Ok(Self {
            child,
            stdout: drain(stdout),
            stderr: drain(stderr),
            command,
            started: Instant::now(),
        })
    }

    /// Block until the process exits, then join both drains.
    ///
    /// With a timeout the process tree is killed once it is exceeded and
    /// [`ItfError::Timeout`] is returned; output captured so far is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, if waiting fails, or if a drain thread fails.
    pub fn wait(mut self, timeout: Option<Duration>) -> Result<ProcessOutput> {
        let status = match timeout {
            None => self.child.wait()?,
            Some(limit) => match self.wait_until(limit) {
                Ok(Some(status)) => status,
                Err(err) => {
                    self.terminate();
                    return Err(err);
                }
                Ok(None) => {
                    self.terminate();
                    warn!(command = %self.command, timeout_secs = limit.as_secs_f64(), "Process timed out and was killed");
                    // Drains finish on their own once the pipes close; their
                    // partial output is dropped with the handles.
                    return Err(ItfError::Timeout {
                        command: self.command,
                        timeout: limit,
                    });
                }
            },
        };

        let stdout = join_drain(self.stdout, "stdout")?;
        let stderr = join_drain(self.stderr, "stderr")?;
        let duration = self.started.elapsed();
        let exit_code = exit_code(status);

        debug!(
            command = %self.command,
            exit_code,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            elapsed_ms = duration.as_millis(),
            "Process finished"
        );

        Ok(ProcessOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            duration,
        })
    }

    /// Kill the process tree and reap the child.
    fn terminate(&mut self) {
        kill_process_tree(&mut self.child);
        let _ = self.child.wait();
    }

    fn wait_until(&mut self, limit: Duration) -> Result<Option<ExitStatus>> {
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(Some(status));
            }
            let elapsed = self.started.elapsed();
            if elapsed >= limit {
                return Ok(None);
            }
            thread::sleep(POLL_INTERVAL.min(limit.saturating_sub(elapsed)));
        }
    }
}

/// Spawn and wait in one step.
///
/// # Errors
///
/// See [`ProcessHandle::spawn`] and [`ProcessHandle::wait`].
pub fn run(spec: &CommandSpec, timeout: Option<Duration>) -> Result<ProcessOutput> {
    info!(cwd = %spec.cwd.display(), "Running {spec}");
    ProcessHandle::spawn(spec)?.wait(timeout)
}

/// Executes build commands; replaceable so the lifecycle can be driven without Maven.
pub trait ProcessRunner: Send + Sync + fmt::Debug {
    /// # Errors
    ///
    /// Returns an error if the process cannot be run to completion.
    fn run(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<ProcessOutput>;
}

/// Runs commands as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProcessRunner;

impl ProcessRunner for DefaultProcessRunner {
    fn run(&self, spec: &CommandSpec, timeout: Option<Duration>) -> Result<ProcessOutput> {
        run(spec, timeout)
    }
}

/// Location of the Maven launcher inside an installation.
#[must_use]
pub fn executable_in(home: &Path) -> PathBuf {
    home.join("bin").join(MAVEN_EXECUTABLE)
}

/// Find the Maven launcher: the environment-supplied installation first, then
/// the configured default.
///
/// # Errors
///
/// Returns [`ItfError::ExecutableNotFound`] listing every candidate tried.
pub fn resolve_executable(env_home: Option<&Path>, default_home: Option<&Path>) -> Result<PathBuf> {
    let candidates: Vec<PathBuf> = [env_home, default_home]
        .into_iter()
        .flatten()
        .map(executable_in)
        .collect();

    if let Some(found) = candidates.iter().find(|path| path.is_file()) {
        debug!(executable = %found.display(), "Resolved Maven executable");
        return Ok(found.clone());
    }
    Err(ItfError::ExecutableNotFound { candidates })
}

fn drain(mut pipe: impl Read + Send + 'static) -> Drain {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

#[cfg(unix)]
fn kill_process_tree(child: &mut Child) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    // The child's pid is its process group id, see `ProcessHandle::spawn`.
    let killed = i32::try_from(child.id())
        .is_ok_and(|pid| killpg(Pid::from_raw(pid), Signal::SIGKILL).is_ok());
    if !killed {
        debug!(pid = child.id(), "Process group kill failed; killing the child only");
        let _ = child.kill();
    }
}

#[cfg(windows)]
fn kill_process_tree(child: &mut Child) {
    // `mvn.cmd` starts java as a child; `/T` takes the whole tree down.
    let pid = child.id().to_string();
    let _ = Command::new("taskkill")
        .args(["/PID", &pid, "/T", "/F"])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    let _ = child.kill();
}

#[cfg(not(any(unix, windows)))]
fn kill_process_tree(child: &mut Child) {
    let _ = child.kill();
}

fn join_drain(handle: Drain, stream: &'static str) -> Result<Vec<u8>> {
    let bytes = handle
        .join()
        .map_err(|_| ItfError::Other(anyhow::anyhow!("{stream} reader thread panicked")))??;
    Ok(bytes)
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
