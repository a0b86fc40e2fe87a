use anyhow::Context;

use super::load_config;
use crate::cli::ConfigArgs;

/// Print the effective configuration (defaults, file and environment merged).
pub fn handle_config(args: &ConfigArgs) -> anyhow::Result<()> {
    let config = load_config(&args.env)?;
    let rendered = config
        .to_toml()
        .context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
