//! Core data types for `maven_itf`.
//!
//! This module defines the values a test unit is described by and produces:
//! - `TestUnitIdentity` - suite + case name of one test unit
//! - `CacheMode` - scoping of the private local repository
//! - `SuiteDirectives` / `CaseDirectives` - declarative build directives
//! - `DirectorySet` - the provisioned directory tree of one unit
//! - `ExecutionResult` and its projections (see [`result`])

pub mod result;

pub use result::{
    CacheResult, ExecutionOutcome, ExecutionResult, MavenLog, ProjectResult, ResolvedResult,
    ResultKind, ResultProjection,
};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Identity of one test unit: the qualified suite name plus the case name.
///
/// The suite name uses dots as package separators (`com.example.BasicIT`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TestUnitIdentity {
    suite: String,
    case: String,
}

impl TestUnitIdentity {
    #[must_use]
    pub fn new(suite: impl Into<String>, case: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            case: case.into(),
        }
    }

    /// Qualified suite name.
    #[must_use]
    pub fn suite(&self) -> &str {
        &self.suite
    }

    #[must_use]
    pub fn case(&self) -> &str {
        &self.case
    }

    /// Suite name without its package.
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.suite.rsplit('.').next().unwrap_or(&self.suite)
    }

    /// Package of the suite, empty for suites in the default package.
    #[must_use]
    pub fn package(&self) -> &str {
        self.suite
            .rsplit_once('.')
            .map_or("", |(package, _)| package)
    }
}

impl fmt::Display for TestUnitIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.suite, self.case)
    }
}

/// Scope of the local repository used by a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
    /// Every case gets its own repository below its case directory.
    #[default]
    PerCase,
    /// All cases of a suite share one repository below the suite directory.
    Shared,
}

impl CacheMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerCase => "per-case",
            Self::Shared => "shared",
        }
    }
}

impl fmt::Display for CacheMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheMode {
    type Err = crate::error::ItfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "per-case" | "percase" | "local" => Ok(Self::PerCase),
            "shared" | "global" => Ok(Self::Shared),
            other => Err(crate::error::ItfError::Config(format!(
                "unknown cache mode '{other}' (expected per-case or shared)"
            ))),
        }
    }
}

/// Suite-level (class-level) directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteDirectives {
    pub qualified_name: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub cache_mode: CacheMode,
}

impl SuiteDirectives {
    #[must_use]
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals = goals.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub const fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }
}

/// Case-level (method-level) directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseDirectives {
    pub name: String,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub debug: bool,
}

impl CaseDirectives {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_goals<I, S>(mut self, goals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.goals = goals.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_profiles<I, S>(mut self, profiles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.profiles = profiles.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Directory tree provisioned for one test unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySet {
    /// Suite directory (`<root>/<suite path>`).
    pub base_dir: PathBuf,
    /// Case directory (`<base_dir>/<case>`).
    pub case_dir: PathBuf,
    /// Local repository handed to Maven.
    pub cache_dir: PathBuf,
    /// Working directory of the build (`<case_dir>/project`).
    pub project_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_splits_package_and_simple_name() {
        let id = TestUnitIdentity::new("com.example.its.BasicIT", "first");
        assert_eq!(id.simple_name(), "BasicIT");
        assert_eq!(id.package(), "com.example.its");
        assert_eq!(id.to_string(), "com.example.its.BasicIT#first");
    }

    #[test]
    fn identity_in_default_package() {
        let id = TestUnitIdentity::new("BasicIT", "first");
        assert_eq!(id.simple_name(), "BasicIT");
        assert_eq!(id.package(), "");
    }

    #[test]
    fn cache_mode_parses_aliases() {
        assert_eq!("per-case".parse::<CacheMode>().unwrap(), CacheMode::PerCase);
        assert_eq!("PER_CASE".parse::<CacheMode>().unwrap(), CacheMode::PerCase);
        assert_eq!("shared".parse::<CacheMode>().unwrap(), CacheMode::Shared);
        assert_eq!("global".parse::<CacheMode>().unwrap(), CacheMode::Shared);
        assert!("sometimes".parse::<CacheMode>().is_err());
    }

    #[test]
    fn cache_mode_serde_is_kebab_case() {
        let json = serde_json::to_string(&CacheMode::PerCase).unwrap();
        assert_eq!(json, "\"per-case\"");
        let back: CacheMode = serde_json::from_str("\"shared\"").unwrap();
        assert_eq!(back, CacheMode::Shared);
    }

    #[test]
    fn directive_builders() {
        let suite = SuiteDirectives::new("com.example.BasicIT")
            .with_goals(["clean", "verify"])
            .with_cache_mode(CacheMode::Shared);
        assert_eq!(suite.goals, vec!["clean", "verify"]);
        assert_eq!(suite.cache_mode, CacheMode::Shared);
        assert!(!suite.debug);

        let case = CaseDirectives::new("first")
            .with_profiles(["run-its"])
            .with_debug(true);
        assert_eq!(case.profiles, vec!["run-its"]);
        assert!(case.debug);
        assert!(case.goals.is_empty());
    }
}
