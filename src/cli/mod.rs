//! CLI definitions and entry point.

use crate::config::{self, CliOverrides, HarnessConfig};
use crate::error::{ItfError, Result};
use crate::model::CacheMode;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod progress;

/// Integration-test harness for Maven plugins
#[derive(Parser, Debug)]
#[command(name = "itf", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Configuration file (default: <project>/itf.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maven installation to use (overrides BUILD_TOOL_HOME)
    #[arg(long, global = true, value_name = "DIR")]
    pub maven_home: Option<PathBuf>,

    /// Build output directory (default: <project>/target)
    #[arg(long, global = true, value_name = "DIR")]
    pub target_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one test unit (suite + case) and report its outcome
    Run(RunArgs),

    /// Show the directory layout of a test unit
    Paths(PathsArgs),

    /// Copy integration-test resources into the build output
    Resources(ResourcesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Qualified suite name (e.g. com.example.BasicIT)
    #[arg(long)]
    pub suite: String,

    /// Case name inside the suite
    #[arg(long)]
    pub case: String,

    /// Suite-level goal (repeatable)
    #[arg(long = "goal", value_name = "GOAL")]
    pub goals: Vec<String>,

    /// Case-level goal (repeatable, replaces suite goals)
    #[arg(long = "case-goal", value_name = "GOAL")]
    pub case_goals: Vec<String>,

    /// Profile to activate (repeatable)
    #[arg(long = "profile", short = 'P', value_name = "PROFILE")]
    pub profiles: Vec<String>,

    /// Run Maven with debug output (-X)
    #[arg(long)]
    pub debug: bool,

    /// Scope of the local repository
    #[arg(long, default_value = "per-case")]
    pub cache_mode: CacheMode,

    /// Kill the build after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Exit non-zero when the build itself fails
    #[arg(long)]
    pub require_success: bool,
}

#[derive(Args, Debug, Clone)]
pub struct PathsArgs {
    /// Qualified suite name
    #[arg(long)]
    pub suite: String,

    /// Case name inside the suite
    #[arg(long)]
    pub case: String,

    /// Scope of the local repository
    #[arg(long, default_value = "per-case")]
    pub cache_mode: CacheMode,

    /// Create the directories as well
    #[arg(long)]
    pub create: bool,
}

#[derive(Args, Debug, Clone, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct ResourcesArgs {
    /// Resource directory (repeatable, default: src/test/resources-its)
    #[arg(long = "source", value_name = "DIR")]
    pub sources: Vec<PathBuf>,

    /// Output directory (default: target/test-classes)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Interpolate tokens in copied files
    #[arg(long)]
    pub filtering: bool,

    /// Include pattern (repeatable)
    #[arg(long = "include", value_name = "GLOB")]
    pub includes: Vec<String>,

    /// Exclude pattern (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    pub excludes: Vec<String>,

    /// Token delimiter, `@` or `begin*end` (repeatable, default: @)
    #[arg(long = "delimiter", value_name = "DELIM")]
    pub delimiters: Vec<String>,

    /// Prefix that keeps a token from being interpolated
    #[arg(long, value_name = "STRING")]
    pub escape_string: Option<String>,

    /// Filter property (repeatable)
    #[arg(long = "property", short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_val)]
    pub properties: Vec<(String, String)>,

    /// Properties file supplying filter values (repeatable)
    #[arg(long = "filter", value_name = "FILE")]
    pub filters: Vec<PathBuf>,

    /// Extension never filtered (repeatable, replaces the defaults)
    #[arg(long = "non-filtered-extension", value_name = "EXT")]
    pub non_filtered_extensions: Vec<String>,

    /// Copy even when the target is newer
    #[arg(long)]
    pub overwrite: bool,

    /// Copy empty directories too
    #[arg(long)]
    pub include_empty_dirs: bool,

    /// Skip VCS and editor files
    #[arg(long)]
    pub add_default_excludes: bool,

    /// Interpolate tokens in file names
    #[arg(long)]
    pub filter_filenames: bool,

    /// Encoding of filtered files
    #[arg(long)]
    pub encoding: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    Elvish,
}

/// Global options every command needs.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub overrides: CliOverrides,
    pub json: bool,
    pub quiet: bool,
}

impl CommandContext {
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let project_root = match &cli.project_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(Self {
            project_root,
            config_file: cli.config.clone(),
            overrides: CliOverrides {
                target_dir: cli.target_dir.clone(),
                maven_home: cli.maven_home.clone(),
                timeout_secs: None,
            },
            json: cli.json,
            quiet: cli.quiet,
        })
    }

    /// Load the layered configuration for this invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is missing, unreadable or invalid.
    pub fn load_config(&self, timeout_secs: Option<u64>) -> Result<HarnessConfig> {
        let overrides = CliOverrides {
            timeout_secs: timeout_secs.or(self.overrides.timeout_secs),
            ..self.overrides.clone()
        };
        config::load_config(&self.project_root, self.config_file.as_deref(), &overrides)
    }
}

fn parse_key_val(raw: &str) -> std::result::Result<(String, String), ItfError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ItfError::Config(format!("expected KEY=VALUE, got '{raw}'")))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ItfError::Config(format!("empty key in '{raw}'")));
    }
    Ok((key.to_string(), value.to_string()))
}
