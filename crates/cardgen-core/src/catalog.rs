//! Batch pipeline from delimited input to a stored, rendered card catalog.

use std::io::Read;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::bootstrap::Application;
use crate::card::CardDto;
use crate::error::{CardgenError, Result};

/// One processed card in the output catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub card: CardDto,
}

/// Image location for a card id: `<image_dir>/<id>.png`.
pub fn image_path(image_dir: &Path, id: &str) -> PathBuf {
    image_dir.join(format!("{}.png", id))
}

/// Materialize `input` as `card_type` cards, then save and render each one.
///
/// Stops at the first failure. Store and generator failures are wrapped in
/// `CardgenError::Downstream` naming the card.
pub fn process_cards<R: Read>(
    app: &Application,
    input: R,
    card_type: &str,
    image_dir: &Path,
) -> Result<Vec<CatalogEntry>> {
    let store = app.card_store()?;
    let generator = app.card_generator()?;
    let cards = app.card_reader(input)?.read_all(card_type)?;

    let mut entries = Vec::with_capacity(cards.len());
    for card in cards {
        let id = store.save(&card).map_err(|err| {
            CardgenError::downstream(format!("Failed to save card {}", card.name()), err)
        })?;

        let dto = card.to_dto();
        generator
            .generate(&dto, &image_path(image_dir, &id))
            .map_err(|err| {
                CardgenError::downstream(
                    format!("Failed to generate image for card {}", card.name()),
                    err,
                )
            })?;

        info!("Processed card: {} (ID: {})", card.name(), id);
        entries.push(CatalogEntry { id, card: dto });
    }
    Ok(entries)
}

/// Render the catalog as a JSON array indented with four spaces.
pub fn to_json(entries: &[CatalogEntry]) -> Result<String> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    entries.serialize(&mut serializer)?;
    buffer.push(b'\n');
    String::from_utf8(buffer).map_err(|err| CardgenError::Storage(err.to_string()))
}

/// Atomically write the catalog JSON to `path`.
pub fn write_catalog(path: &Path, entries: &[CatalogEntry]) -> Result<()> {
    let json = to_json(entries)?;
    crate::fs::write_atomic(path, json.as_bytes()).map_err(|err| {
        CardgenError::downstream(
            format!("Failed to write catalog {}", path.display()),
            CardgenError::Io(err),
        )
    })
}
