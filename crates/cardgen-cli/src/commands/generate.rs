use std::fs;

use anyhow::Context;
use cardgen_core::{catalog, fs as core_fs, Application};
use log::{info, warn};

use super::{bootstrap, check_card_type, finish, open_input, GlobalArgs};
use crate::cli::GenerateArgs;
use crate::output;

/// Remove the previous catalog and everything in the image directory.
fn clean_outputs(args: &GenerateArgs) -> anyhow::Result<()> {
    core_fs::remove_if_exists(&args.output)
        .with_context(|| format!("Failed to clean catalog {}", args.output.display()))?;
    let removed = core_fs::clean_dir(&args.images)
        .with_context(|| format!("Failed to clean image directory {}", args.images.display()))?;
    info!("Cleaned output directories ({} image entries removed)", removed);
    Ok(())
}

fn run(app: &Application, args: &GenerateArgs, global: GlobalArgs) -> anyhow::Result<()> {
    let input = open_input(&args.input)?;

    fs::create_dir_all(&args.images).with_context(|| {
        format!(
            "Failed to create image output directory {}",
            args.images.display()
        )
    })?;

    let entries = catalog::process_cards(app, input, &args.card_type, &args.images)
        .with_context(|| format!("Failed to process cards from {}", args.input.display()))?;

    catalog::write_catalog(&args.output, &entries)
        .with_context(|| format!("Failed to write catalog {}", args.output.display()))?;

    if !global.quiet {
        if !entries.is_empty() {
            println!("{}", output::summary_table(&entries, &args.images));
        }
        println!("Successfully processed {} cards", entries.len());
        println!("Output written to: {}", args.output.display());
        println!("Card images written to: {}", args.images.display());
    }
    Ok(())
}

pub fn handle_generate(args: &GenerateArgs, global: GlobalArgs) -> anyhow::Result<()> {
    check_card_type(&args.card_type)?;
    let app = bootstrap(&args.env, global, false)?;

    if args.clean {
        if let Err(err) = clean_outputs(args) {
            warn!("Cleanup failed: {:#}", err);
        }
    }

    let result = run(&app, args, global);
    finish(&app, result)
}
