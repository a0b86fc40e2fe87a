//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by shells, and by clap for usage errors)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Input file or stored card not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid card input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Configuration could not be loaded or assembled.
    pub const INVALID_CONFIG: i32 = 5;
}

/// Column headers of the generation summary table.
pub const SUMMARY_COLUMNS: [&str; 5] = ["ID", "Type", "Cost", "Keywords", "Image"];
