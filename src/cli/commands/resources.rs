//! Resources command implementation.

use crate::cli::{CommandContext, ResourcesArgs};
use crate::error::Result;
use crate::resources::{
    self, DEFAULT_OUTPUT_DIR, DEFAULT_RESOURCES_DIR, ResourceSet, ResourcesExecution,
};
use std::path::{Path, PathBuf};

/// Execute the resources command.
///
/// # Errors
///
/// Returns an error if properties cannot be collected or copying fails.
pub fn execute(args: &ResourcesArgs, ctx: &CommandContext) -> Result<()> {
    let execution = build_execution(args, &ctx.project_root)?;
    let report = resources::execute(&execution)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !ctx.quiet {
        println!(
            "Copied {} resource(s) to {} ({} filtered, {} copied, {} up to date)",
            report.copied + report.filtered,
            execution.output_dir.display(),
            report.filtered,
            report.copied,
            report.skipped
        );
    }
    Ok(())
}

fn build_execution(args: &ResourcesArgs, project_root: &Path) -> Result<ResourcesExecution> {
    let sources: Vec<PathBuf> = if args.sources.is_empty() {
        vec![project_root.join(DEFAULT_RESOURCES_DIR)]
    } else {
        args.sources.iter().map(|s| project_root.join(s)).collect()
    };
    let resources = sources
        .into_iter()
        .map(|dir| {
            ResourceSet::new(dir)
                .with_filtering(args.filtering)
                .with_includes(args.includes.iter().cloned())
                .with_excludes(args.excludes.iter().cloned())
        })
        .collect();
    let output_dir = project_root.join(args.output.as_deref().unwrap_or(Path::new(DEFAULT_OUTPUT_DIR)));

    let filters: Vec<PathBuf> = args.filters.iter().map(|f| project_root.join(f)).collect();
    let mut execution = ResourcesExecution::new(resources, output_dir);
    execution.properties = resources::collect_properties(project_root, &filters, &args.properties)?;
    if !args.delimiters.is_empty() {
        execution.delimiters.clone_from(&args.delimiters);
    }
    if !args.non_filtered_extensions.is_empty() {
        execution
            .non_filtered_extensions
            .clone_from(&args.non_filtered_extensions);
    }
    execution.escape_string.clone_from(&args.escape_string);
    execution.overwrite = args.overwrite;
    execution.include_empty_dirs = args.include_empty_dirs;
    execution.add_default_excludes = args.add_default_excludes;
    execution.filter_filenames = args.filter_filenames;
    execution.encoding.clone_from(&args.encoding);
    Ok(execution)
}
