//! Output formatting helpers for the CLI.

use std::io::IsTerminal;
use std::path::Path;

use cardgen_core::catalog::{image_path, CatalogEntry};
use cardgen_core::Card;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{ASCII_MARKDOWN, UTF8_FULL};
use comfy_table::{ContentArrangement, Table};

use crate::constants::SUMMARY_COLUMNS;

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    if std::io::stdout().is_terminal() {
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(ASCII_MARKDOWN);
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.to_vec());
    table
}

fn cost_label(cost: i64) -> String {
    if cost == -1 {
        "X".to_string()
    } else {
        cost.to_string()
    }
}

fn keyword_label<K: ToString>(keywords: &[K]) -> String {
    if keywords.is_empty() {
        "-".to_string()
    } else {
        keywords
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Table of generated cards and their image files.
pub fn summary_table(entries: &[CatalogEntry], image_dir: &Path) -> String {
    let mut table = new_table(&SUMMARY_COLUMNS);
    for entry in entries {
        table.add_row(vec![
            entry.id.clone(),
            entry.card.card_type.to_string(),
            cost_label(entry.card.cost),
            keyword_label(&entry.card.keywords),
            image_path(image_dir, &entry.id).display().to_string(),
        ]);
    }
    table.to_string()
}

/// Table of materialized cards for `check`.
pub fn cards_table(cards: &[Card]) -> String {
    let mut table = new_table(&SUMMARY_COLUMNS[..4]);
    for card in cards {
        table.add_row(vec![
            card.id(),
            card.card_type().to_string(),
            cost_label(card.cost()),
            keyword_label(card.keywords()),
        ]);
    }
    table.to_string()
}

/// Materialized cards as a JSON array of transport forms.
pub fn cards_json(cards: &[Card]) -> serde_json::Result<serde_json::Value> {
    cards
        .iter()
        .map(|card| serde_json::to_value(card.to_dto()))
        .collect::<serde_json::Result<Vec<_>>>()
        .map(serde_json::Value::Array)
}
