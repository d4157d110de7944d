//! Configuration management for `maven_itf`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`ITF_*`, `BUILD_TOOL_HOME`, `MAVEN_HOME`)
//! 3. Project config (`itf.yaml` in the project root, or `--config <file>`)
//! 4. Defaults
//!
//! Relative `target-dir` and `maven-home` values are resolved against the
//! project root; `it-dir`, `fixtures-dir` and `cache-seed-dir` against the
//! target directory.

use crate::error::{ItfError, Result};
use crate::provision;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Project config file looked up in the project root.
pub const CONFIG_FILE: &str = "itf.yaml";

/// Environment variable naming a Maven installation.
pub const BUILD_TOOL_HOME_ENV: &str = "BUILD_TOOL_HOME";

/// Conventional Maven environment variable, consulted when `BUILD_TOOL_HOME` is unset.
pub const MAVEN_HOME_ENV: &str = "MAVEN_HOME";

const DEFAULT_IT_DIR: &str = "maven-it";
const DEFAULT_FIXTURES_DIR: &str = "test-classes/maven-its";
const DEFAULT_CACHE_SEED_DIR: &str = "invoker-repo";

/// Keys understood by the harness.
pub const KNOWN_KEYS: &[&str] = &[
    "target-dir",
    "it-dir",
    "fixtures-dir",
    "cache-seed-dir",
    "maven-home",
    "build-tool-home",
    "timeout-secs",
    "extra-flags",
];

/// Resolved harness configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Root of the project whose integration tests are run.
    pub project_root: PathBuf,
    /// Build output directory (`<project_root>/target`).
    pub target_dir: PathBuf,
    /// Root below which test units are provisioned (`<target>/maven-it`).
    pub it_dir: PathBuf,
    /// Where fixture projects were copied by the resources step.
    pub fixtures_dir: PathBuf,
    /// Pre-populated repository seeding every cache directory.
    pub cache_seed_dir: PathBuf,
    /// Maven installation supplied by the environment or CLI.
    pub build_tool_home: Option<PathBuf>,
    /// Configured fallback Maven installation.
    pub default_build_tool_home: Option<PathBuf>,
    /// Optional wall-clock limit for one build.
    pub timeout: Option<Duration>,
    /// Flags added after the default ones, before profiles and goals.
    pub extra_flags: Vec<String>,
}

impl HarnessConfig {
    /// Defaults for a project rooted at `project_root`.
    #[must_use]
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let target_dir = provision::target_dir(&project_root);
        Self {
            it_dir: target_dir.join(DEFAULT_IT_DIR),
            fixtures_dir: target_dir.join(DEFAULT_FIXTURES_DIR),
            cache_seed_dir: target_dir.join(DEFAULT_CACHE_SEED_DIR),
            target_dir,
            project_root,
            build_tool_home: None,
            default_build_tool_home: None,
            timeout: None,
            extra_flags: Vec::new(),
        }
    }

    /// Apply a merged layer on top of the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ItfError::Config`] for values that do not parse.
    pub fn from_layer(project_root: impl Into<PathBuf>, layer: &ConfigLayer) -> Result<Self> {
        let mut config = Self::for_project(project_root);

        if let Some(target) = layer.get("target-dir") {
            config.target_dir = resolve_against(&config.project_root, target);
            config.it_dir = config.target_dir.join(DEFAULT_IT_DIR);
            config.fixtures_dir = config.target_dir.join(DEFAULT_FIXTURES_DIR);
            config.cache_seed_dir = config.target_dir.join(DEFAULT_CACHE_SEED_DIR);
        }
        if let Some(dir) = layer.get("it-dir") {
            config.it_dir = resolve_against(&config.target_dir, dir);
        }
        if let Some(dir) = layer.get("fixtures-dir") {
            config.fixtures_dir = resolve_against(&config.target_dir, dir);
        }
        if let Some(dir) = layer.get("cache-seed-dir") {
            config.cache_seed_dir = resolve_against(&config.target_dir, dir);
        }
        if let Some(home) = layer.get("maven-home") {
            config.default_build_tool_home = Some(resolve_against(&config.project_root, home));
        }
        if let Some(home) = layer.get("build-tool-home") {
            config.build_tool_home = Some(resolve_against(&config.project_root, home));
        }
        if let Some(secs) = layer.get("timeout-secs") {
            config.timeout = parse_timeout(secs)?;
        }
        if let Some(flags) = layer.get("extra-flags") {
            config.extra_flags = flags.split_whitespace().map(str::to_string).collect();
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_build_tool_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.build_tool_home = Some(home.into());
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_extra_flags<I, S>(mut self, flags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_flags = flags.into_iter().map(Into::into).collect();
        self
    }
}

/// A flat configuration layer (normalized kebab-case keys).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: HashMap<String, String>,
}

impl ConfigLayer {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Merge multiple layers in precedence order (lowest to highest).
    #[must_use]
    pub fn merge_layers(layers: &[Self]) -> Self {
        let mut merged = Self::default();
        for layer in layers {
            merged.merge_from(layer);
        }
        merged
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// # Errors
    ///
    /// Returns an error if the text is not a YAML mapping of scalars or lists.
    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let mut layer = Self::default();
        match value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(map) => {
                for (key, value) in map {
                    let Some(key) = key.as_str() else {
                        continue;
                    };
                    let key = normalize_key(key);
                    if !KNOWN_KEYS.contains(&key.as_str()) {
                        tracing::warn!(key = %key, "Ignoring unknown configuration key");
                        continue;
                    }
                    if let Some(value) = yaml_value_to_string(&value) {
                        layer.values.insert(key, value);
                    }
                }
            }
            _ => {
                return Err(ItfError::Config(
                    "configuration file must contain a mapping".to_string(),
                ));
            }
        }
        Ok(layer)
    }

    /// Build a layer from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from explicit `(name, value)` pairs.
    ///
    /// `ITF_TIMEOUT_SECS` maps to `timeout-secs` and so on; `BUILD_TOOL_HOME`
    /// beats `MAVEN_HOME` for `build-tool-home`.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        let mut maven_home = None;
        let mut build_tool_home = None;

        for (key, value) in vars {
            if value.trim().is_empty() {
                continue;
            }
            if key == BUILD_TOOL_HOME_ENV {
                build_tool_home = Some(value);
            } else if key == MAVEN_HOME_ENV {
                maven_home = Some(value);
            } else if let Some(stripped) = key.strip_prefix("ITF_") {
                let normalized = normalize_key(stripped);
                if KNOWN_KEYS.contains(&normalized.as_str()) {
                    layer.values.insert(normalized, value);
                }
            }
        }

        if let Some(home) = build_tool_home.or(maven_home) {
            layer.insert("build-tool-home", home);
        }

        layer
    }
}

/// CLI overrides for config loading (optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub target_dir: Option<PathBuf>,
    pub maven_home: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        if let Some(path) = &self.target_dir {
            layer.insert("target-dir", path.to_string_lossy());
        }
        if let Some(path) = &self.maven_home {
            layer.insert("build-tool-home", path.to_string_lossy());
        }
        if let Some(secs) = self.timeout_secs {
            layer.insert("timeout-secs", secs.to_string());
        }

        layer
    }
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or a value is invalid.
pub fn load_config(
    project_root: &Path,
    config_file: Option<&Path>,
    cli: &CliOverrides,
) -> Result<HarnessConfig> {
    let file_layer = match config_file {
        Some(path) => {
            if !path.is_file() {
                return Err(ItfError::Config(format!(
                    "config file '{}' does not exist",
                    path.display()
                )));
            }
            ConfigLayer::from_yaml(path)?
        }
        None => ConfigLayer::from_yaml(&project_root.join(CONFIG_FILE))?,
    };

    let merged = ConfigLayer::merge_layers(&[file_layer, ConfigLayer::from_env(), cli.as_layer()]);
    HarnessConfig::from_layer(project_root, &merged)
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace(['_', '.'], "-")
}

fn resolve_against(base: &Path, value: &str) -> PathBuf {
    let path = PathBuf::from(value);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn parse_timeout(value: &str) -> Result<Option<Duration>> {
    let secs: u64 = value
        .trim()
        .parse()
        .map_err(|_| ItfError::Config(format!("timeout-secs must be a whole number, got '{value}'")))?;
    Ok((secs > 0).then(|| Duration::from_secs(secs)))
}

fn yaml_value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(yaml_value_to_string)
                .collect::<Vec<_>>()
                .join(" "),
        ),
        _ => None,
    }
}
