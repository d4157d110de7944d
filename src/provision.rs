//! Per-suite and per-case directory layout.
//!
//! ```text
//! <root>/<package path>/<SuiteName>/                     base_dir
//! <root>/<package path>/<SuiteName>/.m2/repository       cache_dir (shared)
//! <root>/<package path>/<SuiteName>/<case>/              case_dir
//! <root>/<package path>/<SuiteName>/<case>/.m2/repository cache_dir (per case)
//! <root>/<package path>/<SuiteName>/<case>/project       project_dir
//! ```

use crate::error::{ItfError, Result, ResultExt};
use crate::model::{CacheMode, DirectorySet, TestUnitIdentity};
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Name of the project directory inside a case directory.
pub const PROJECT_DIR: &str = "project";

/// Local repository location relative to the directory owning it.
pub const CACHE_DIR: &str = ".m2/repository";

/// Build output directory of a project.
pub const TARGET_DIR: &str = "target";

#[must_use]
pub fn target_dir(project_root: &Path) -> PathBuf {
    project_root.join(TARGET_DIR)
}

/// Map a qualified suite name onto a relative path (`a.b.FooIT` → `a/b/FooIT`).
#[must_use]
pub fn suite_path(qualified_name: &str) -> PathBuf {
    qualified_name
        .split('.')
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Compute the directory set of a unit without touching the filesystem.
///
/// # Errors
///
/// Returns [`ItfError::InvalidIdentity`] if the suite or case name cannot be
/// used as a path.
pub fn layout(identity: &TestUnitIdentity, cache_mode: CacheMode, root: &Path) -> Result<DirectorySet> {
    validate_identity(identity)?;

    let base_dir = root.join(suite_path(identity.suite()));
    let case_dir = base_dir.join(identity.case());
    let cache_dir = match cache_mode {
        CacheMode::PerCase => case_dir.join(CACHE_DIR),
        CacheMode::Shared => base_dir.join(CACHE_DIR),
    };
    let project_dir = case_dir.join(PROJECT_DIR);

    Ok(DirectorySet {
        base_dir,
        case_dir,
        cache_dir,
        project_dir,
    })
}

/// Compute and create the directory set of a unit.
///
/// Idempotent: provisioning an existing layout again yields the same set.
///
/// # Errors
///
/// Returns an error for an unusable identity or when a directory cannot be created.
pub fn provision(identity: &TestUnitIdentity, cache_mode: CacheMode, root: &Path) -> Result<DirectorySet> {
    let dirs = layout(identity, cache_mode, root)?;

    for dir in [&dirs.base_dir, &dirs.case_dir, &dirs.cache_dir, &dirs.project_dir] {
        fs::create_dir_all(dir).with_path("create directory", dir)?;
    }

    debug!(
        unit = %identity,
        cache_mode = %cache_mode,
        case_dir = %dirs.case_dir.display(),
        cache_dir = %dirs.cache_dir.display(),
        "Provisioned test unit directories"
    );
    Ok(dirs)
}

fn validate_identity(identity: &TestUnitIdentity) -> Result<()> {
    let suite = identity.suite();
    if suite.trim().is_empty() {
        return Err(invalid(suite, "suite name is empty"));
    }
    if suite.contains(['/', '\\']) {
        return Err(invalid(suite, "suite name must use '.' as package separator"));
    }
    if suite.split('.').any(|segment| segment.is_empty()) {
        return Err(invalid(suite, "suite name has an empty package segment"));
    }

    let case = identity.case();
    if case.trim().is_empty() {
        return Err(invalid(case, "case name is empty"));
    }
    let mut components = Path::new(case).components();
    let single_normal = matches!(components.next(), Some(Component::Normal(_)))
        && components.next().is_none();
    if !single_normal || case.contains(['/', '\\']) {
        return Err(invalid(case, "case name must be a single path segment"));
    }

    Ok(())
}

fn invalid(value: &str, reason: &str) -> ItfError {
    ItfError::InvalidIdentity {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
