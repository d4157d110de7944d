//! Structured error output for the `itf` command line.
//!
//! Errors are rendered either as a human-readable message with a hint or as a
//! JSON envelope, and mapped onto category exit codes so scripts driving the
//! harness can tell a test-authoring mistake from a broken environment.

use crate::error::ItfError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Configuration Errors (exit code 2) ===
    /// No goals on case or suite
    NoGoalsSpecified,
    /// Result requested before the unit completed
    ResultNotAvailable,
    /// Lifecycle step called in the wrong state
    LifecycleOutOfOrder,
    /// Suite or case name unusable as a path
    InvalidIdentity,
    /// Configuration value or file error
    ConfigError,

    // === Provisioning Errors (exit code 3) ===
    /// Fixture project missing
    FixtureNotFound,

    // === Executable Errors (exit code 4) ===
    /// Maven executable missing
    ExecutableNotFound,
    /// Maven could not be started
    SpawnFailed,

    // === Timeout (exit code 5) ===
    /// Build exceeded its timeout
    Timeout,

    // === Build Failure (exit code 7) ===
    /// Build exited non-zero while success was required
    BuildFailed,

    // === Project Model Errors (exit code 6) ===
    /// pom.xml unreadable
    ProjectModelError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NoGoalsSpecified => "NO_GOALS_SPECIFIED",
            Self::ResultNotAvailable => "RESULT_NOT_AVAILABLE",
            Self::LifecycleOutOfOrder => "LIFECYCLE_OUT_OF_ORDER",
            Self::InvalidIdentity => "INVALID_IDENTITY",
            Self::ConfigError => "CONFIG_ERROR",
            Self::FixtureNotFound => "FIXTURE_NOT_FOUND",
            Self::ExecutableNotFound => "EXECUTABLE_NOT_FOUND",
            Self::SpawnFailed => "SPAWN_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::BuildFailed => "BUILD_FAILED",
            Self::ProjectModelError => "PROJECT_MODEL_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Configuration errors
    /// - 3: Provisioning errors
    /// - 4: Executable errors
    /// - 5: Timeout
    /// - 6: Project model errors
    /// - 7: Required build success not met
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::NoGoalsSpecified
            | Self::ResultNotAvailable
            | Self::LifecycleOutOfOrder
            | Self::InvalidIdentity
            | Self::ConfigError => 2,
            Self::FixtureNotFound => 3,
            Self::ExecutableNotFound | Self::SpawnFailed => 4,
            Self::Timeout => 5,
            Self::ProjectModelError => 6,
            Self::BuildFailed => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from an `ItfError`.
    #[must_use]
    pub fn from_error(err: &ItfError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        Self {
            code,
            message: err.to_string(),
            hint: err.suggestion().map(str::to_string),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }
        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &ItfError) -> (ErrorCode, Option<Value>) {
        match err {
            ItfError::NoGoalsSpecified { identity } => (
                ErrorCode::NoGoalsSpecified,
                Some(json!({"suite": identity.suite(), "case": identity.case()})),
            ),
            ItfError::ResultNotAvailable { identity, kind } => (
                ErrorCode::ResultNotAvailable,
                Some(json!({"unit": identity.to_string(), "kind": kind.as_str()})),
            ),
            ItfError::LifecycleOutOfOrder {
                identity,
                expected,
                actual,
            } => (
                ErrorCode::LifecycleOutOfOrder,
                Some(json!({"unit": identity.to_string(), "expected": expected, "actual": actual})),
            ),
            ItfError::InvalidIdentity { value, .. } => {
                (ErrorCode::InvalidIdentity, Some(json!({"value": value})))
            }
            ItfError::Config(_) => (ErrorCode::ConfigError, None),
            ItfError::FixtureNotFound { path } => (
                ErrorCode::FixtureNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            ItfError::ExecutableNotFound { candidates } => (
                ErrorCode::ExecutableNotFound,
                Some(json!({
                    "candidates": candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                })),
            ),
            ItfError::Spawn { command, .. } => {
                (ErrorCode::SpawnFailed, Some(json!({"command": command})))
            }
            ItfError::Timeout { command, timeout } => (
                ErrorCode::Timeout,
                Some(json!({"command": command, "timeout_secs": timeout.as_secs_f64()})),
            ),
            ItfError::BuildFailed {
                identity,
                exit_code,
            } => (
                ErrorCode::BuildFailed,
                Some(json!({"unit": identity.to_string(), "exit_code": exit_code})),
            ),
            ItfError::ProjectModel { path, .. } => (
                ErrorCode::ProjectModelError,
                Some(json!({"path": path.display().to_string()})),
            ),
            ItfError::Io(_) | ItfError::WithContext { .. } => (ErrorCode::IoError, None),
            ItfError::Json(_) => (ErrorCode::JsonError, None),
            ItfError::Yaml(_) => (ErrorCode::YamlError, None),
            ItfError::Other(_) => (ErrorCode::InternalError, None),
        }
    }
}
