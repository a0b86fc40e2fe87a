use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::card::Card;

/// A card together with its storage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCard {
    pub id: String,
    pub card: Card,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCard {
    pub fn new(card: Card) -> Self {
        let now = Utc::now();
        Self {
            id: card.id(),
            card,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the stored card, keeping the creation time.
    pub fn replace(&mut self, card: Card) {
        self.card = card;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Spell;

    #[test]
    fn test_replace_keeps_created_at() {
        let mut stored = StoredCard::new(Spell::new("Bolt", 1, "Zap").into());
        let created = stored.created_at;

        stored.replace(Spell::new("Bolt", 2, "Zap harder").into());

        assert_eq!(stored.created_at, created);
        assert!(stored.updated_at >= created);
        assert_eq!(stored.card.cost(), 2);
        assert_eq!(stored.id, "spell-Bolt");
    }
}
