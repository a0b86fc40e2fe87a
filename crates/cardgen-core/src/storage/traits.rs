//! Card store trait definition.

use std::fmt;

use super::types::StoredCard;
use crate::card::Card;
use crate::error::Result;

/// Storage interface for materialized cards.
///
/// Cards are keyed by [`Card::id`], so two cards of the same type and name
/// occupy the same slot. Implementations are shared across threads behind an
/// `Arc`, so every operation takes `&self`.
pub trait CardStore: fmt::Debug + Send + Sync {
    /// Validate and store a card, returning its id.
    ///
    /// Saving a card whose id is already present replaces the stored card
    /// and keeps its original `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::Validation` if the card fails self-validation,
    /// or `CardgenError::Storage` if the store is closed.
    fn save(&self, card: &Card) -> Result<String>;

    /// Load a card by id.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::NotFound` for unknown ids.
    fn load(&self, id: &str) -> Result<Card>;

    /// List stored cards ordered by id.
    fn list(&self) -> Result<Vec<StoredCard>>;

    /// Delete a card by id.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::NotFound` for unknown ids.
    fn delete(&self, id: &str) -> Result<()>;

    /// Release the store. Every later operation fails.
    fn close(&self) -> Result<()>;
}
