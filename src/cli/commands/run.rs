//! Run command implementation.

use crate::cli::progress::{create_spinner, should_show_progress};
use crate::cli::{CommandContext, RunArgs};
use crate::error::{ItfError, Result};
use crate::lifecycle::Harness;
use crate::model::{CaseDirectives, ExecutionResult, SuiteDirectives, TestUnitIdentity};
use serde::Serialize;
use tracing::info;

/// Lines of build output echoed after a failed build.
const FAILURE_TAIL_LINES: usize = 30;

#[derive(Serialize)]
struct RunOutput<'a> {
    unit: String,
    #[serde(flatten)]
    result: &'a ExecutionResult,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the unit cannot be run to completion, or if
/// `--require-success` was given and the build failed.
pub fn execute(args: &RunArgs, ctx: &CommandContext) -> Result<()> {
    let config = ctx.load_config(args.timeout)?;
    let suite = suite_directives(args);
    let case = case_directives(args);
    let identity = TestUnitIdentity::new(&suite.qualified_name, &case.name);
    info!(unit = %identity, it_dir = %config.it_dir.display(), "Running test unit");

    let harness = Harness::new(config);
    let spinner = create_spinner(
        &format!("Running {identity}"),
        should_show_progress(ctx.json, ctx.quiet),
    );
    let outcome = harness.run(&suite, &case);
    spinner.finish_and_clear();
    let result = outcome?;

    if ctx.json {
        let output = RunOutput {
            unit: identity.to_string(),
            result: &result,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        print_human(&identity, &result);
    }

    if args.require_success && result.is_failure() {
        return Err(ItfError::BuildFailed {
            identity,
            exit_code: result.exit_code,
        });
    }
    Ok(())
}

fn suite_directives(args: &RunArgs) -> SuiteDirectives {
    SuiteDirectives::new(args.suite.clone())
        .with_goals(args.goals.iter().cloned())
        .with_profiles(args.profiles.iter().cloned())
        .with_debug(args.debug)
        .with_cache_mode(args.cache_mode)
}

fn case_directives(args: &RunArgs) -> CaseDirectives {
    CaseDirectives::new(args.case.clone()).with_goals(args.case_goals.iter().cloned())
}

fn print_human(identity: &TestUnitIdentity, result: &ExecutionResult) {
    println!(
        "{identity}: {} (exit code {})",
        result.outcome, result.exit_code
    );
    println!("  project: {}", result.project.project_dir.display());
    println!("  cache:   {}", result.cache.cache_dir.display());

    if result.is_failure() {
        let lines: Vec<&str> = result.log.stdout_lines().collect();
        let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
        if !lines.is_empty() {
            println!("\nLast {} lines of build output:", lines.len() - start);
            for line in &lines[start..] {
                println!("  {line}");
            }
        }
        if !result.log.stderr.trim().is_empty() {
            println!("\nstderr:");
            for line in result.log.stderr.lines() {
                println!("  {line}");
            }
        }
    }
}
