//! Error types and handling for `maven_itf`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Wraps foreign failures through `anyhow` where no structured variant fits
//! - Splits errors into the categories a test author cares about:
//!   configuration mistakes, provisioning failures, executable resolution,
//!   timeouts and project-model parsing
//! - A non-zero Maven exit code is never an error; it is reported as
//!   [`ExecutionOutcome::Failure`](crate::model::ExecutionOutcome)

mod context;
mod structured;

pub use context::ResultExt;
pub use structured::{ErrorCode, StructuredError};

use crate::model::{ResultKind, TestUnitIdentity};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Primary error type for harness operations.
#[derive(Error, Debug)]
pub enum ItfError {
    // === Configuration Errors ===
    /// Neither the case nor its suite declares any goal.
    #[error("No goals specified for {identity}")]
    NoGoalsSpecified { identity: TestUnitIdentity },

    /// A result projection was requested before the unit produced a result.
    #[error("No {kind} available for {identity}: the test unit has not completed")]
    ResultNotAvailable {
        identity: TestUnitIdentity,
        kind: ResultKind,
    },

    /// A lifecycle step was invoked in the wrong state.
    #[error("Lifecycle step out of order for {identity}: expected state {expected}, found {actual}")]
    LifecycleOutOfOrder {
        identity: TestUnitIdentity,
        expected: &'static str,
        actual: &'static str,
    },

    /// Suite or case name cannot be mapped onto a directory.
    #[error("Invalid test identity '{value}': {reason}")]
    InvalidIdentity { value: String, reason: String },

    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === Provisioning Errors ===
    /// The fixture project for a test unit does not exist.
    #[error("Fixture project not found at '{path}'")]
    FixtureNotFound { path: PathBuf },

    // === Execution Errors ===
    /// No Maven executable could be located.
    #[error("Maven executable not found (tried: {})", display_candidates(.candidates))]
    ExecutableNotFound { candidates: Vec<PathBuf> },

    /// The build did not finish within the configured timeout.
    #[error("`{command}` timed out after {}s", .timeout.as_secs_f64())]
    Timeout { command: String, timeout: Duration },

    /// The process could not be started.
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The build exited non-zero and the caller required success.
    #[error("Maven build of {identity} failed with exit code {exit_code}")]
    BuildFailed {
        identity: TestUnitIdentity,
        exit_code: i32,
    },

    // === Project Model Errors ===
    /// The project descriptor could not be read or parsed.
    #[error("Cannot read project model '{path}': {reason}")]
    ProjectModel { path: PathBuf, reason: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Error with additional context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn display_candidates(candidates: &[PathBuf]) -> String {
    if candidates.is_empty() {
        return "no candidate locations configured".to_string();
    }
    candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl ItfError {
    /// Is this a test-authoring mistake rather than an environment problem?
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoGoalsSpecified { .. }
                | Self::ResultNotAvailable { .. }
                | Self::LifecycleOutOfOrder { .. }
                | Self::InvalidIdentity { .. }
                | Self::Config(_)
        )
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NoGoalsSpecified { .. } => {
                Some("Declare goals on the suite or the case, e.g. --goal verify")
            }
            Self::ResultNotAvailable { .. } => {
                Some("Results can only be looked up after the test unit has run")
            }
            Self::FixtureNotFound { .. } => {
                Some("Run `itf resources` (or the test-resources phase) to copy fixtures first")
            }
            Self::ExecutableNotFound { .. } => {
                Some("Set BUILD_TOOL_HOME to a Maven installation or configure maven-home")
            }
            Self::Timeout { .. } => Some("Increase timeout-secs or check the build for hangs"),
            Self::BuildFailed { .. } => Some("Re-run with --json or -v to inspect the captured build log"),
            _ => None,
        }
    }

    /// Attach a context message to any error.
    #[must_use]
    pub fn with_context(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

/// Result type using `ItfError`.
pub type Result<T> = std::result::Result<T, ItfError>;
