//! Maven command-line construction.
//!
//! Suite and case directives are merged into an [`InvocationSpec`]:
//! case goals replace suite goals wholesale, profiles are the ordered union of
//! both, and debug output is enabled if either level asks for it.

use crate::error::{ItfError, Result};
use crate::model::{CaseDirectives, SuiteDirectives, TestUnitIdentity};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// System property naming the local repository.
pub const LOCAL_REPOSITORY_PROPERTY: &str = "maven.repo.local";
/// Non-interactive mode.
pub const BATCH_MODE_FLAG: &str = "--batch-mode";
/// Print version information before building.
pub const SHOW_VERSION_FLAG: &str = "-V";
/// Prefix of the active-profiles flag.
pub const PROFILES_PREFIX: &str = "-P";
/// Debug output.
pub const DEBUG_FLAG: &str = "-X";

/// The resolved directives of one Maven run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvocationSpec {
    pub goals: Vec<String>,
    /// Insertion ordered, no duplicates.
    pub profiles: Vec<String>,
    pub debug: bool,
    pub extra_flags: Vec<String>,
    pub cache_dir: PathBuf,
}

impl InvocationSpec {
    /// Merge suite and case directives.
    ///
    /// # Errors
    ///
    /// Returns [`ItfError::NoGoalsSpecified`] if neither level declares a goal.
    pub fn resolve(
        suite: &SuiteDirectives,
        case: &CaseDirectives,
        cache_dir: &Path,
        extra_flags: &[String],
    ) -> Result<Self> {
        let goals = resolve_goals(&suite.goals, &case.goals);
        if goals.is_empty() {
            return Err(ItfError::NoGoalsSpecified {
                identity: TestUnitIdentity::new(&suite.qualified_name, &case.name),
            });
        }

        let mut profiles: Vec<String> = Vec::new();
        for profile in suite.profiles.iter().chain(&case.profiles) {
            let profile = profile.trim();
            if !profile.is_empty() && !profiles.iter().any(|p| p == profile) {
                profiles.push(profile.to_string());
            }
        }

        Ok(Self {
            goals,
            profiles,
            debug: suite.debug || case.debug,
            extra_flags: extra_flags.to_vec(),
            cache_dir: cache_dir.to_path_buf(),
        })
    }

    /// Ordered argument list; goals always come last.
    #[must_use]
    pub fn arguments(&self) -> Vec<String> {
        build_arguments(self)
    }
}

/// Goal priority: case goals if any, otherwise suite goals.
#[must_use]
pub fn resolve_goals(suite_goals: &[String], case_goals: &[String]) -> Vec<String> {
    let chosen = if case_goals.iter().any(|g| !g.trim().is_empty()) {
        case_goals
    } else {
        suite_goals
    };
    chosen
        .iter()
        .map(|g| g.trim())
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the Maven argument list for `spec`.
#[must_use]
pub fn build_arguments(spec: &InvocationSpec) -> Vec<String> {
    let mut args = Vec::with_capacity(5 + spec.extra_flags.len() + spec.goals.len());

    args.push(format!(
        "-D{LOCAL_REPOSITORY_PROPERTY}={}",
        spec.cache_dir.display()
    ));
    args.push(BATCH_MODE_FLAG.to_string());
    args.push(SHOW_VERSION_FLAG.to_string());
    args.extend(spec.extra_flags.iter().cloned());

    if !spec.profiles.is_empty() {
        args.push(format!("{PROFILES_PREFIX}{}", spec.profiles.join(",")));
    }
    if spec.debug {
        args.push(DEBUG_FLAG.to_string());
    }

    args.extend(spec.goals.iter().cloned());
    args
}
