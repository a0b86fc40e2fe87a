use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use cardgen_core::VERSION;

/// Cardgen - batch card generator: CSV definitions in, stored cards, images
/// and a JSON catalog out
#[derive(Parser)]
#[command(name = "cardgen")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (no summary output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,
}

/// Environment selection shared by commands that load configuration.
#[derive(Args, Clone, Debug, Default)]
pub struct EnvArgs {
    /// Configuration environment; selects config.<ENV>.toml
    #[arg(short, long = "env", value_name = "ENV")]
    pub environment: Option<String>,
}

/// Arguments for the `generate` command
#[derive(Args)]
pub struct GenerateArgs {
    /// Input CSV file containing card definitions
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Card type of every row (creature, spell, artifact, incantation, anthem)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "creature")]
    pub card_type: String,

    /// Output JSON file for processed cards
    #[arg(short, long, value_name = "FILE", default_value = "output/cards.json")]
    pub output: PathBuf,

    /// Output directory for card images
    #[arg(long, value_name = "DIR", default_value = "output/cards")]
    pub images: PathBuf,

    /// Clean output locations before generation
    #[arg(long)]
    pub clean: bool,

    #[command(flatten)]
    pub env: EnvArgs,
}

/// Arguments for the `check` command
#[derive(Args)]
pub struct CheckArgs {
    /// Input CSV file containing card definitions
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Card type of every row
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "creature")]
    pub card_type: String,

    /// Output the materialized cards as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub env: EnvArgs,
}

/// Arguments for the `config` command
#[derive(Args)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub env: EnvArgs,
}

/// Arguments for the `completions` command
#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_name = "SHELL")]
    pub shell: Shell,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Materialize cards, store them, render images and write the catalog
    Generate(GenerateArgs),

    /// Materialize and validate cards without writing anything
    Check(CheckArgs),

    /// Print the effective configuration as TOML
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
