//! Subcommand handlers.

mod check;
mod config;
mod generate;
mod misc;

pub use check::handle_check;
pub use config::handle_config;
pub use generate::handle_generate;
pub use misc::handle_completions;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use anyhow::Context;
use cardgen_core::config::{Config, ConfigLoader};
use cardgen_core::{Application, CardType};

use crate::cli::EnvArgs;
use crate::errors::CliError;
use crate::logging;

/// Global flags every handler receives.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalArgs {
    pub quiet: bool,
    pub verbose: bool,
}

/// Load configuration for the selected environment.
fn load_config(env: &EnvArgs) -> anyhow::Result<Config> {
    ConfigLoader::default()
        .load(env.environment.as_deref())
        .context("Failed to load configuration")
}

/// Load configuration, install the logger and assemble the application.
///
/// `stdout_reserved` keeps log lines off stdout for commands that print
/// machine-readable output there.
fn bootstrap(
    env: &EnvArgs,
    global: GlobalArgs,
    stdout_reserved: bool,
) -> anyhow::Result<Application> {
    let config = load_config(env)?;
    logging::init(&config.logging, global.verbose, stdout_reserved)?;
    Application::from_config(config).context("Failed to bootstrap application")
}

fn open_input(path: &Path) -> anyhow::Result<BufReader<File>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(CliError::InputNotFound(path.to_path_buf()).into())
        }
        Err(err) => Err(err).with_context(|| format!("Failed to open input file {}", path.display())),
    }
}

/// Reject unknown card types before any work is done.
fn check_card_type(card_type: &str) -> anyhow::Result<()> {
    card_type.parse::<CardType>().map(|_| ()).map_err(|value| {
        CliError::InvalidArgument(format!(
            "unsupported card type '{}' (expected one of: {})",
            value,
            CardType::ALL.map(|t| t.as_str()).join(", ")
        ))
        .into()
    })
}

/// Tear down the application, keeping the first error.
fn finish(app: &Application, result: anyhow::Result<()>) -> anyhow::Result<()> {
    let shutdown = app.shutdown().context("Failed to shut down cleanly");
    result.and(shutdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_card_type() {
        assert!(check_card_type("Spell").is_ok());
        let err = check_card_type("land").unwrap_err();
        assert!(err.to_string().contains("creature, spell, artifact, incantation, anthem"));
    }

    #[test]
    fn test_missing_input_is_typed() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_input(&dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InputNotFound(_))
        ));
    }
}
