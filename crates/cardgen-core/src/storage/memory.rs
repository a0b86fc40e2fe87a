//! In-memory card store.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use super::traits::CardStore;
use super::types::StoredCard;
use crate::card::Card;
use crate::error::{CardgenError, Result};

/// Card store held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cards: RwLock<BTreeMap<String, StoredCard>>,
    closed: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read_cards()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read_cards()?.is_empty())
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CardgenError::Storage("Card store is closed".to_string()));
        }
        Ok(())
    }

    fn read_cards(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, StoredCard>>> {
        self.ensure_open()?;
        self.cards
            .read()
            .map_err(|_| CardgenError::Storage("Card store lock poisoned".to_string()))
    }

    fn write_cards(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, StoredCard>>> {
        self.ensure_open()?;
        self.cards
            .write()
            .map_err(|_| CardgenError::Storage("Card store lock poisoned".to_string()))
    }
}

impl CardStore for MemoryStore {
    fn save(&self, card: &Card) -> Result<String> {
        card.validate()?;
        let id = card.id();
        let mut cards = self.write_cards()?;
        match cards.get_mut(&id) {
            Some(stored) => {
                debug!("Replacing stored card {}", id);
                stored.replace(card.clone());
            }
            None => {
                cards.insert(id.clone(), StoredCard::new(card.clone()));
            }
        }
        Ok(id)
    }

    fn load(&self, id: &str) -> Result<Card> {
        self.read_cards()?
            .get(id)
            .map(|stored| stored.card.clone())
            .ok_or_else(|| CardgenError::NotFound(format!("card {}", id)))
    }

    fn list(&self) -> Result<Vec<StoredCard>> {
        Ok(self.read_cards()?.values().cloned().collect())
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.write_cards()?
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CardgenError::NotFound(format!("card {}", id)))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(CardgenError::Storage("Card store already closed".to_string()));
        }
        if let Ok(mut cards) = self.cards.write() {
            cards.clear();
        }
        debug!("Closed in-memory card store");
        Ok(())
    }
}
