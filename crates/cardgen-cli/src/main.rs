//! Cardgen CLI - batch card generator
//!
//! This is the command-line interface for Cardgen. It loads configuration,
//! installs the logger and drives the core pipeline.

mod cli;
mod commands;
mod constants;
mod errors;
mod logging;
mod output;

use clap::Parser;

use cli::{Cli, Commands};
use commands::GlobalArgs;

fn run(cli: Cli) -> anyhow::Result<()> {
    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
    };
    match &cli.command {
        Commands::Generate(args) => commands::handle_generate(args, global),
        Commands::Check(args) => commands::handle_check(args, global),
        Commands::Config(args) => commands::handle_config(args),
        Commands::Completions(args) => commands::handle_completions(args.shell),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::logger().flush();
        eprintln!("Error: {:#}", err);
        std::process::exit(errors::exit_code(&err));
    }
}
