use serde::{Deserialize, Serialize};

use super::{
    Anthem, Artifact, Card, CardType, Creature, Incantation, Keyword, Spell, TargetType, Timing,
};
use crate::error::{CardgenError, Result};

/// Flat transport form of a card.
///
/// Variant-specific fields are present only for the variant that owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDto {
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub name: String,
    pub cost: i64,
    pub effect: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<Keyword>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#trait: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_type: Option<TargetType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_equipment: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<Timing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous: Option<bool>,
}

impl Default for CardDto {
    fn default() -> Self {
        Self {
            card_type: CardType::Creature,
            name: String::new(),
            cost: 0,
            effect: String::new(),
            keywords: Vec::new(),
            attack: None,
            defense: None,
            r#trait: None,
            target_type: None,
            is_equipment: None,
            timing: None,
            continuous: None,
        }
    }
}

impl CardDto {
    /// Rebuild a card from its transport form.
    ///
    /// Derived fields are recomputed from the effect text rather than trusted
    /// from the DTO.
    pub fn into_card(self) -> Result<Card> {
        let card = match self.card_type {
            CardType::Creature => {
                let attack = self
                    .attack
                    .ok_or_else(|| CardgenError::validation("attack", "attack is required"))?;
                let defense = self
                    .defense
                    .ok_or_else(|| CardgenError::validation("defense", "defense is required"))?;
                Creature::new(
                    self.name,
                    self.cost,
                    self.effect,
                    attack,
                    defense,
                    self.r#trait.unwrap_or_default(),
                )
                .into()
            }
            CardType::Spell => Spell::new(self.name, self.cost, self.effect).into(),
            CardType::Artifact => Artifact::new(self.name, self.cost, self.effect).into(),
            CardType::Incantation => Incantation::new(self.name, self.cost, self.effect).into(),
            CardType::Anthem => Anthem::new(self.name, self.cost, self.effect).into(),
        };
        Ok(card)
    }
}
