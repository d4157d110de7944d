//! Paths command implementation.

use crate::cli::{CommandContext, PathsArgs};
use crate::error::Result;
use crate::model::{DirectorySet, TestUnitIdentity};
use crate::provision::{layout, provision};
use serde::Serialize;

#[derive(Serialize)]
struct PathsOutput<'a> {
    unit: String,
    cache_mode: &'static str,
    created: bool,
    #[serde(flatten)]
    dirs: &'a DirectorySet,
}

/// Execute the paths command.
///
/// # Errors
///
/// Returns an error for an unusable identity, a bad config, or when
/// `--create` fails to create a directory.
pub fn execute(args: &PathsArgs, ctx: &CommandContext) -> Result<()> {
    let config = ctx.load_config(None)?;
    let identity = TestUnitIdentity::new(&args.suite, &args.case);
    let dirs = if args.create {
        provision(&identity, args.cache_mode, &config.it_dir)?
    } else {
        layout(&identity, args.cache_mode, &config.it_dir)?
    };

    if ctx.json {
        let output = PathsOutput {
            unit: identity.to_string(),
            cache_mode: args.cache_mode.as_str(),
            created: args.create,
            dirs: &dirs,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{identity} ({})", args.cache_mode);
        println!("  base:    {}", dirs.base_dir.display());
        println!("  case:    {}", dirs.case_dir.display());
        println!("  project: {}", dirs.project_dir.display());
        println!("  cache:   {}", dirs.cache_dir.display());
    }
    Ok(())
}
