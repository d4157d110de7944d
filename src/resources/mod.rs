//! Copying integration-test resources into the build output.
//!
//! Fixture projects live in `src/test/resources-its` and are copied to
//! `target/test-classes` before the tests run, where the fixture locator
//! picks them up. Resource sets marked for filtering get `@token@` values
//! (project coordinates, filter files, explicit properties) interpolated on
//! the way.

pub mod filter;

pub use filter::{Delimiter, Interpolator};

use crate::error::{ItfError, Result, ResultExt};
use crate::project::{self, POM_FILE};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Source directory of fixture projects, relative to the project root.
pub const DEFAULT_RESOURCES_DIR: &str = "src/test/resources-its";

/// Output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIR: &str = "target/test-classes";

/// Files with these extensions are never filtered.
pub const DEFAULT_NON_FILTERED_EXTENSIONS: &[&str] =
    &["jpg", "jar", "war", "ear", "aar", "rar", "zip", "tar", "tar.gz"];

/// Patterns excluded when `add_default_excludes` is set.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS",
    "**/CVS/**",
    "**/.cvsignore",
    "**/.svn",
    "**/.svn/**",
    "**/.git",
    "**/.git/**",
    "**/.gitignore",
    "**/.gitattributes",
    "**/.hg",
    "**/.hg/**",
    "**/.DS_Store",
];

/// One directory of resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSet {
    pub directory: PathBuf,
    pub filtering: bool,
    /// Glob patterns relative to `directory`; everything when empty.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Sub-directory of the output directory to copy into.
    pub target_path: Option<PathBuf>,
}

impl ResourceSet {
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            filtering: false,
            includes: Vec::new(),
            excludes: Vec::new(),
            target_path: None,
        }
    }

    #[must_use]
    pub const fn with_filtering(mut self, filtering: bool) -> Self {
        self.filtering = filtering;
        self
    }

    #[must_use]
    pub fn with_includes<I, S>(mut self, includes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.includes = includes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_excludes<I, S>(mut self, excludes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excludes = excludes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_target_path(mut self, target_path: impl Into<PathBuf>) -> Self {
        self.target_path = Some(target_path.into());
        self
    }
}

/// Everything one resources run needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcesExecution {
    pub resources: Vec<ResourceSet>,
    pub output_dir: PathBuf,
    /// `@` or `begin*end` forms such as `${*}`.
    pub delimiters: Vec<String>,
    pub escape_string: Option<String>,
    pub properties: BTreeMap<String, String>,
    /// Replaces [`DEFAULT_NON_FILTERED_EXTENSIONS`].
    pub non_filtered_extensions: Vec<String>,
    /// Copy even when the target is newer than the source.
    pub overwrite: bool,
    pub include_empty_dirs: bool,
    pub add_default_excludes: bool,
    /// Interpolate tokens in file names too.
    pub filter_filenames: bool,
    pub encoding: Option<String>,
}

impl ResourcesExecution {
    #[must_use]
    pub fn new(resources: Vec<ResourceSet>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            resources,
            output_dir: output_dir.into(),
            delimiters: vec![filter::DEFAULT_DELIMITER.to_string()],
            escape_string: None,
            properties: BTreeMap::new(),
            non_filtered_extensions: DEFAULT_NON_FILTERED_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
            overwrite: false,
            include_empty_dirs: false,
            add_default_excludes: false,
            filter_filenames: false,
            encoding: None,
        }
    }

    #[must_use]
    pub fn is_filtering_enabled(&self) -> bool {
        self.resources.iter().any(|r| r.filtering)
    }

    fn is_non_filtered(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        self.non_filtered_extensions
            .iter()
            .any(|ext| name.ends_with(&format!(".{}", ext.trim_start_matches('.').to_lowercase())))
    }
}

/// What a resources run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResourcesReport {
    /// Files copied byte for byte.
    pub copied: usize,
    /// Files written with interpolated content.
    pub filtered: usize,
    /// Files left alone because the target was newer.
    pub skipped: usize,
}

/// Properties for filtering: project coordinates from `<project_dir>/pom.xml`,
/// then filter files in order, then explicit pairs. Later sources win.
///
/// # Errors
///
/// Returns an error if the descriptor or a filter file cannot be read.
pub fn collect_properties(
    project_dir: &Path,
    filter_files: &[PathBuf],
    explicit: &[(String, String)],
) -> Result<BTreeMap<String, String>> {
    let mut properties = if project_dir.join(POM_FILE).is_file() {
        filter::project_properties(&project::read_project(project_dir)?)
    } else {
        BTreeMap::new()
    };
    for file in filter_files {
        properties.extend(filter::read_properties_file(file)?);
    }
    properties.extend(explicit.iter().cloned());
    Ok(properties)
}

/// Copy every resource set into the output directory.
///
/// # Errors
///
/// Returns [`ItfError::Config`] for bad delimiters, globs or encodings, and
/// I/O errors from copying.
pub fn execute(execution: &ResourcesExecution) -> Result<ResourcesReport> {
    let filtering = execution.is_filtering_enabled();
    match execution.encoding.as_deref().map(str::trim) {
        None | Some("") if filtering => {
            warn!("File encoding has not been set, reading filtered resources as UTF-8");
        }
        Some(enc) if !enc.is_empty() && !is_supported_encoding(enc) => {
            return Err(ItfError::Config(format!(
                "unsupported resource encoding '{enc}' (only UTF-8 is supported)"
            )));
        }
        _ => {}
    }

    let interpolator = if filtering || execution.filter_filenames {
        let delimiters = execution
            .delimiters
            .iter()
            .map(|d| Delimiter::parse(d))
            .collect::<Result<Vec<_>>>()?;
        Some(Interpolator::new(
            &delimiters,
            execution.escape_string.as_deref(),
            execution.properties.clone(),
        )?)
    } else {
        None
    };

    let mut report = ResourcesReport::default();
    for resource in &execution.resources {
        copy_resource(execution, resource, interpolator.as_ref(), &mut report)?;
    }

    info!(
        copied = report.copied,
        filtered = report.filtered,
        skipped = report.skipped,
        output = %execution.output_dir.display(),
        "Copied resources"
    );
    Ok(report)
}

fn copy_resource(
    execution: &ResourcesExecution,
    resource: &ResourceSet,
    interpolator: Option<&Interpolator>,
    report: &mut ResourcesReport,
) -> Result<()> {
    let source_root = &resource.directory;
    if !source_root.is_dir() {
        debug!(directory = %source_root.display(), "Skipping missing resource directory");
        return Ok(());
    }
    let dest_root = resource
        .target_path
        .as_ref()
        .map_or_else(|| execution.output_dir.clone(), |t| execution.output_dir.join(t));

    let includes = if resource.includes.is_empty() {
        compile_globs(&["**".to_string()])?
    } else {
        compile_globs(&resource.includes)?
    };
    let mut exclude_patterns = resource.excludes.clone();
    if execution.add_default_excludes {
        exclude_patterns.extend(DEFAULT_EXCLUDES.iter().map(|p| (*p).to_string()));
    }
    let excludes = compile_globs(&exclude_patterns)?;

    let walker = WalkDir::new(source_root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir() && excludes.is_match(relative_slash(source_root, entry.path())))
        });

    for entry in walker {
        let entry = entry.context(format!("walk '{}'", source_root.display()))?;
        let relative = relative_slash(source_root, entry.path());
        let target_relative = match interpolator {
            Some(interp) if execution.filter_filenames => interp.interpolate(&relative),
            _ => relative.clone(),
        };
        let target = dest_root.join(&target_relative);

        if entry.file_type().is_dir() {
            if execution.include_empty_dirs {
                fs::create_dir_all(&target).with_path("create directory", &target)?;
            }
            continue;
        }
        if !includes.is_match(&relative) || excludes.is_match(&relative) {
            continue;
        }

        if !execution.overwrite && is_newer(&target, entry.path()) {
            debug!(target = %target.display(), "Target is newer than source; skipping");
            report.skipped += 1;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).with_path("create directory", parent)?;
        }

        match interpolator {
            Some(interp) if resource.filtering && !execution.is_non_filtered(entry.path()) => {
                if filter_file(interp, entry.path(), &target)? {
                    report.filtered += 1;
                } else {
                    report.copied += 1;
                }
            }
            _ => {
                fs::copy(entry.path(), &target).with_path("copy file to", &target)?;
                report.copied += 1;
            }
        }
    }
    Ok(())
}

/// Returns `false` when the file was not UTF-8 and was copied verbatim instead.
fn filter_file(interpolator: &Interpolator, source: &Path, target: &Path) -> Result<bool> {
    let bytes = fs::read(source).with_path("read resource", source)?;
    match String::from_utf8(bytes) {
        Ok(text) => {
            fs::write(target, interpolator.interpolate(&text)).with_path("write resource", target)?;
            Ok(true)
        }
        Err(err) => {
            warn!(file = %source.display(), "Resource is not valid UTF-8; copying without filtering");
            fs::write(target, err.into_bytes()).with_path("write resource", target)?;
            Ok(false)
        }
    }
}

fn compile_globs(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.trim().replace('\\', "/");
        // Maven treats a trailing slash as "everything below".
        let pattern = if pattern.ends_with('/') {
            format!("{pattern}**")
        } else {
            pattern
        };
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| ItfError::Config(format!("invalid pattern '{pattern}': {err}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|err| ItfError::Config(format!("invalid patterns: {err}")))
}

fn relative_slash(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_newer(target: &Path, source: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    match (modified(target), modified(source)) {
        (Some(target), Some(source)) => target > source,
        _ => false,
    }
}

fn is_supported_encoding(encoding: &str) -> bool {
    matches!(
        encoding.to_ascii_lowercase().replace('_', "-").as_str(),
        "utf-8" | "utf8" | "us-ascii" | "ascii"
    )
}
