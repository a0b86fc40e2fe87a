//! CLI error types and exit code mapping.

use std::path::PathBuf;

use cardgen_core::CardgenError;
use thiserror::Error;

use crate::constants::exit_codes;

/// Failures raised by the CLI itself rather than the core library.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Exit code for a failed run.
///
/// The first typed error found in the chain decides the code; anything else
/// exits with 1.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return match cli {
                CliError::InputNotFound(_) => exit_codes::NOT_FOUND,
                CliError::InvalidArgument(_) => exit_codes::INVALID_INPUT,
            };
        }
        if let Some(core) = cause.downcast_ref::<CardgenError>() {
            return core_exit_code(core.root_cause());
        }
    }
    1
}

fn core_exit_code(err: &CardgenError) -> i32 {
    match err {
        CardgenError::NotFound(_) => exit_codes::NOT_FOUND,
        CardgenError::MissingRequiredColumn(_)
        | CardgenError::FieldRequired { .. }
        | CardgenError::FieldMalformed { .. }
        | CardgenError::UnsupportedCardType { .. }
        | CardgenError::Input(_)
        | CardgenError::Validation { .. } => exit_codes::INVALID_INPUT,
        CardgenError::ConfigFileInvalid { .. }
        | CardgenError::ConfigInvalid { .. }
        | CardgenError::UnsupportedStorageType(_) => exit_codes::INVALID_CONFIG,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_cli_errors_map_to_codes() {
        let err = anyhow::Error::new(CliError::InputNotFound(PathBuf::from("cards.csv")));
        assert_eq!(exit_code(&err), exit_codes::NOT_FOUND);

        let err = anyhow::Error::new(CliError::InvalidArgument("--type".into()));
        assert_eq!(exit_code(&err), exit_codes::INVALID_INPUT);
    }

    #[test]
    fn test_wrapped_core_errors_use_root_cause() {
        let inner = CardgenError::FieldMalformed {
            field: "Attack".into(),
            value: "big".into(),
            line: 3,
        };
        let err: anyhow::Result<()> = Err(CardgenError::downstream("Failed to process", inner).into());
        let err = err.context("Generation failed").unwrap_err();
        assert_eq!(exit_code(&err), exit_codes::INVALID_INPUT);
    }

    #[test]
    fn test_config_errors() {
        let err = anyhow::Error::new(CardgenError::config_invalid("server.port", "out of range"));
        assert_eq!(exit_code(&err), exit_codes::INVALID_CONFIG);
    }

    #[test]
    fn test_other_errors_exit_one() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code(&err), 1);

        let err = anyhow::Error::new(CardgenError::Generator("encode".into()));
        assert_eq!(exit_code(&err), 1);
    }
}
