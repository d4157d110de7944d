//! Fixture materialization.
//!
//! Before a build runs, the fixture project of the unit is copied into the
//! unit's project directory (replacing whatever a previous run left there), and
//! the seed repository is merged into the unit's cache directory. Merging is
//! additive so a shared cache keeps what earlier units downloaded.

use crate::error::{ItfError, Result, ResultExt};
use crate::model::TestUnitIdentity;
use crate::provision::suite_path;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Finds the fixture project of a test unit.
pub trait FixtureLocator: Send + Sync + Debug {
    /// Location of the fixture tree. The path need not exist; a missing tree is
    /// reported by [`materialize`].
    fn locate(&self, identity: &TestUnitIdentity) -> PathBuf;
}

/// Finds the repository every cache directory of a suite is seeded with.
pub trait CacheSeedLocator: Send + Sync + Debug {
    fn locate(&self, suite: &str) -> Option<PathBuf>;
}

/// Fixtures laid out as `<fixtures_dir>/<suite path>/<case>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryFixtureLocator {
    pub fixtures_dir: PathBuf,
}

impl DirectoryFixtureLocator {
    #[must_use]
    pub fn new(fixtures_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixtures_dir: fixtures_dir.into(),
        }
    }
}

impl FixtureLocator for DirectoryFixtureLocator {
    fn locate(&self, identity: &TestUnitIdentity) -> PathBuf {
        self.fixtures_dir
            .join(suite_path(identity.suite()))
            .join(identity.case())
    }
}

/// One seed repository for every suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryCacheSeedLocator {
    pub seed_dir: PathBuf,
}

impl DirectoryCacheSeedLocator {
    #[must_use]
    pub fn new(seed_dir: impl Into<PathBuf>) -> Self {
        Self {
            seed_dir: seed_dir.into(),
        }
    }
}

impl CacheSeedLocator for DirectoryCacheSeedLocator {
    fn locate(&self, _suite: &str) -> Option<PathBuf> {
        Some(self.seed_dir.clone())
    }
}

/// Files copied while materializing one unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub project_files: usize,
    pub cache_files: usize,
}

/// Copy the fixture into `project_dir` and merge the seed into `cache_dir`.
///
/// # Errors
///
/// Returns [`ItfError::FixtureNotFound`] when `fixture_source` is not a
/// directory, or an I/O error when copying fails.
pub fn materialize(
    fixture_source: &Path,
    project_dir: &Path,
    cache_seed: Option<&Path>,
    cache_dir: &Path,
) -> Result<MaterializeReport> {
    if !fixture_source.is_dir() {
        return Err(ItfError::FixtureNotFound {
            path: fixture_source.to_path_buf(),
        });
    }

    clear_dir(project_dir)?;
    let project_files = copy_tree(fixture_source, project_dir)?;

    let cache_files = match cache_seed {
        Some(seed) if seed.is_dir() => copy_tree(seed, cache_dir)?,
        Some(seed) => {
            warn!(seed = %seed.display(), "Cache seed directory missing; starting with an empty repository");
            0
        }
        None => 0,
    };

    debug!(
        fixture = %fixture_source.display(),
        project_files,
        cache_files,
        "Materialized fixture"
    );
    Ok(MaterializeReport {
        project_files,
        cache_files,
    })
}

/// Recursively copy `src` into `dst`, overwriting files and keeping anything
/// already in `dst` that `src` does not contain. Returns the number of files copied.
///
/// # Errors
///
/// Returns an error if a directory cannot be walked or created, or a file cannot be copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst).with_path("create directory", dst)?;

    let mut copied = 0;
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.context(format!("walk '{}'", src.display()))?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).with_path("create directory", &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).with_path("create directory", parent)?;
            }
            fs::copy(entry.path(), &target).with_path("copy file to", &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

fn clear_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).with_path("create directory", dir)?;
        return Ok(());
    }
    for entry in fs::read_dir(dir).with_path("read directory", dir)? {
        let path = entry?.path();
        if path.is_dir() && !path.is_symlink() {
            fs::remove_dir_all(&path).with_path("remove directory", &path)?;
        } else {
            fs::remove_file(&path).with_path("remove file", &path)?;
        }
    }
    Ok(())
}
