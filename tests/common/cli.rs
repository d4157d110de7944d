use assert_cmd::Command;
use std::ffi::OsStr;
use std::path::Path;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct ItfRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
}

impl ItfRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|err| panic!("stdout is not JSON ({err}): {}", self.stdout))
    }

    /// The structured error printed to stderr.
    pub fn error_json(&self) -> serde_json::Value {
        let start = self.stderr.find("{\n").or_else(|| self.stderr.find('{'));
        let payload = start.map_or("", |idx| &self.stderr[idx..]);
        serde_json::from_str(payload)
            .unwrap_or_else(|err| panic!("stderr has no JSON error ({err}): {}", self.stderr))
    }
}

/// Build an `itf` command isolated from the caller's Maven environment.
pub fn itf_command(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("itf"));
    cmd.current_dir(cwd);
    cmd.env_remove("BUILD_TOOL_HOME");
    cmd.env_remove("MAVEN_HOME");
    cmd.env_remove("ITF_TIMEOUT_SECS");
    cmd.env_remove("ITF_MAVEN_HOME");
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "maven_itf=debug");
    cmd
}

pub fn run_itf<I, S>(cwd: &Path, args: I) -> ItfRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = itf_command(cwd);
    cmd.args(args);

    let start = Instant::now();
    let output = cmd.output().expect("run itf");
    ItfRun {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        status: output.status,
        duration: start.elapsed(),
    }
}
