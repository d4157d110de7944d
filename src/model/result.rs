//! Execution results and their narrower projections.
//!
//! An [`ExecutionResult`] is assembled exactly once per test unit, right after
//! Maven terminated. Test bodies that only need part of it ask for a
//! projection ([`MavenLog`], [`CacheResult`], [`ProjectResult`]) through
//! [`ResultKind`] or the typed [`ResultProjection`] lookup.

use crate::project::ProjectModel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of a Maven run, derived from its exit code only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Successful,
    Failure,
}

impl ExecutionOutcome {
    #[must_use]
    pub const fn from_exit_code(exit_code: i32) -> Self {
        if exit_code == 0 {
            Self::Successful
        } else {
            Self::Failure
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Captured standard output and standard error of the build.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MavenLog {
    pub stdout: String,
    pub stderr: String,
}

impl MavenLog {
    #[must_use]
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    /// Does an `[INFO]` line contain `needle`?
    #[must_use]
    pub fn contains_info(&self, needle: &str) -> bool {
        self.contains_level("[INFO]", needle)
    }

    /// Does a `[WARNING]` line contain `needle`?
    #[must_use]
    pub fn contains_warning(&self, needle: &str) -> bool {
        self.contains_level("[WARNING]", needle)
    }

    /// Does an `[ERROR]` line contain `needle`?
    #[must_use]
    pub fn contains_error(&self, needle: &str) -> bool {
        self.contains_level("[ERROR]", needle)
    }

    fn contains_level(&self, prefix: &str, needle: &str) -> bool {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .filter_map(|line| line.trim_start().strip_prefix(prefix))
            .any(|rest| rest.contains(needle))
    }
}

/// Handle on the local repository a build used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheResult {
    pub cache_dir: PathBuf,
}

impl CacheResult {
    #[must_use]
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Repository directory of `group_id:artifact_id:version`.
    #[must_use]
    pub fn artifact_dir(&self, group_id: &str, artifact_id: &str, version: &str) -> PathBuf {
        let mut dir = self.cache_dir.clone();
        for segment in group_id.split('.').filter(|s| !s.is_empty()) {
            dir.push(segment);
        }
        dir.join(artifact_id).join(version)
    }

    #[must_use]
    pub fn contains_artifact(&self, group_id: &str, artifact_id: &str, version: &str) -> bool {
        self.artifact_dir(group_id, artifact_id, version).is_dir()
    }
}

/// The materialized project after the build ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectResult {
    /// Case directory holding `project/` and, in per-case mode, the repository.
    pub base_dir: PathBuf,
    pub project_dir: PathBuf,
    pub model: ProjectModel,
}

impl ProjectResult {
    #[must_use]
    pub fn target_dir(&self) -> PathBuf {
        self.project_dir.join("target")
    }

    /// Did the build leave `target/<relative>` behind?
    #[must_use]
    pub fn has_target_file(&self, relative: impl AsRef<Path>) -> bool {
        self.target_dir().join(relative).exists()
    }
}

/// Everything a test body can know about one Maven run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub outcome: ExecutionOutcome,
    pub exit_code: i32,
    pub log: MavenLog,
    pub project: ProjectResult,
    pub cache: CacheResult,
}

impl ExecutionResult {
    /// Package the observations of one run. Pure and total.
    #[must_use]
    pub fn assemble(
        exit_code: i32,
        log: MavenLog,
        cache: CacheResult,
        project: ProjectResult,
    ) -> Self {
        Self {
            outcome: ExecutionOutcome::from_exit_code(exit_code),
            exit_code,
            log,
            project,
            cache,
        }
    }

    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.outcome == ExecutionOutcome::Successful
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.outcome == ExecutionOutcome::Failure
    }

    /// # Panics
    ///
    /// Panics with the captured log when the build failed.
    pub fn assert_successful(&self) {
        assert!(
            self.is_successful(),
            "Maven build failed (exit {})\nstdout: {}\nstderr: {}",
            self.exit_code,
            self.log.stdout,
            self.log.stderr
        );
    }

    /// # Panics
    ///
    /// Panics with the captured log when the build succeeded.
    pub fn assert_failure(&self) {
        assert!(
            self.is_failure(),
            "Maven build succeeded unexpectedly\nstdout: {}\nstderr: {}",
            self.log.stdout,
            self.log.stderr
        );
    }
}

/// The shapes a stored result can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Execution,
    Log,
    Cache,
    Project,
}

impl ResultKind {
    pub const ALL: [Self; 4] = [Self::Execution, Self::Log, Self::Cache, Self::Project];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Execution => "execution result",
            Self::Log => "log result",
            Self::Cache => "cache result",
            Self::Project => "project result",
        }
    }

    /// Cut the requested projection out of a full result.
    #[must_use]
    pub fn project(self, result: &ExecutionResult) -> ResolvedResult {
        match self {
            Self::Execution => ResolvedResult::Execution(result.clone()),
            Self::Log => ResolvedResult::Log(result.log.clone()),
            Self::Cache => ResolvedResult::Cache(result.cache.clone()),
            Self::Project => ResolvedResult::Project(result.project.clone()),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A projection resolved by [`ResultKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedResult {
    Execution(ExecutionResult),
    Log(MavenLog),
    Cache(CacheResult),
    Project(ProjectResult),
}

impl ResolvedResult {
    #[must_use]
    pub const fn kind(&self) -> ResultKind {
        match self {
            Self::Execution(_) => ResultKind::Execution,
            Self::Log(_) => ResultKind::Log,
            Self::Cache(_) => ResultKind::Cache,
            Self::Project(_) => ResultKind::Project,
        }
    }
}

/// Types that can be looked up from a stored [`ExecutionResult`].
pub trait ResultProjection: Sized {
    const KIND: ResultKind;

    fn from_result(result: &ExecutionResult) -> Self;
}

impl ResultProjection for ExecutionResult {
    const KIND: ResultKind = ResultKind::Execution;

    fn from_result(result: &ExecutionResult) -> Self {
        result.clone()
    }
}

impl ResultProjection for MavenLog {
    const KIND: ResultKind = ResultKind::Log;

    fn from_result(result: &ExecutionResult) -> Self {
        result.log.clone()
    }
}

impl ResultProjection for CacheResult {
    const KIND: ResultKind = ResultKind::Cache;

    fn from_result(result: &ExecutionResult) -> Self {
        result.cache.clone()
    }
}

impl ResultProjection for ProjectResult {
    const KIND: ResultKind = ResultKind::Project;

    fn from_result(result: &ExecutionResult) -> Self {
        result.project.clone()
    }
}
