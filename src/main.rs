use clap::Parser;
use maven_itf::cli::commands;
use maven_itf::cli::{Cli, CommandContext, Commands};
use maven_itf::logging::init_logging;
use maven_itf::{ItfError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.json) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let result = CommandContext::from_cli(&cli).and_then(|ctx| match &cli.command {
        Commands::Run(args) => commands::run::execute(args, &ctx),
        Commands::Paths(args) => commands::paths::execute(args, &ctx),
        Commands::Resources(args) => commands::resources::execute(args, &ctx),
        Commands::Completions(args) => commands::completions::execute(args),
    });

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Report an error and exit with its category code.
///
/// JSON goes to stderr when --json is set or stdout is not a terminal;
/// otherwise a human-readable message, colored if stderr is a terminal.
fn handle_error(err: &ItfError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    if json_mode || !io::stdout().is_terminal() {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        eprintln!("{}", structured.to_human(io::stderr().is_terminal()));
    }

    std::process::exit(exit_code);
}
