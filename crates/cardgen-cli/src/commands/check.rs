use anyhow::Context;
use cardgen_core::Application;

use super::{bootstrap, check_card_type, finish, open_input, GlobalArgs};
use crate::cli::CheckArgs;
use crate::output;

fn run(app: &Application, args: &CheckArgs, global: GlobalArgs) -> anyhow::Result<()> {
    let input = open_input(&args.input)?;
    let cards = app
        .card_reader(input)
        .and_then(|mut reader| reader.read_all(&args.card_type))
        .with_context(|| format!("Failed to read cards from {}", args.input.display()))?;

    for card in &cards {
        card.validate()
            .with_context(|| format!("Card {} is invalid", card.id()))?;
    }

    if args.json {
        let cards = output::cards_json(&cards).context("Failed to serialize cards")?;
        let json = serde_json::to_string_pretty(&cards)?;
        println!("{}", json);
    } else if !global.quiet {
        if !cards.is_empty() {
            println!("{}", output::cards_table(&cards));
        }
        println!("{} cards are valid", cards.len());
    }
    Ok(())
}

/// Materialize and validate the input without storing or rendering.
pub fn handle_check(args: &CheckArgs, global: GlobalArgs) -> anyhow::Result<()> {
    check_card_type(&args.card_type)?;
    let app = bootstrap(&args.env, global, args.json)?;
    let result = run(&app, args, global);
    finish(&app, result)
}
