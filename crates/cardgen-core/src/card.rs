//! Card domain model.
//!
//! A [`Card`] is one of five variants sharing a [`BaseCard`]. Derived fields
//! (keywords, spell target, equipment flag, incantation timing) are computed
//! from the effect text by the free functions in [`effect`] when a card is
//! constructed.

mod dto;
pub mod effect;

pub use dto::CardDto;
pub use effect::{Keyword, TargetType, Timing};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CardgenError, Result};

/// Lowest permitted cost; `-1` encodes an "X" cost.
pub const MIN_COST: i64 = -1;

/// Discriminates the five card variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardType {
    Creature,
    Spell,
    Artifact,
    Incantation,
    Anthem,
}

impl CardType {
    pub const ALL: [CardType; 5] = [
        CardType::Creature,
        CardType::Spell,
        CardType::Artifact,
        CardType::Incantation,
        CardType::Anthem,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CardType::Creature => "creature",
            CardType::Spell => "spell",
            CardType::Artifact => "artifact",
            CardType::Incantation => "incantation",
            CardType::Anthem => "anthem",
        }
    }
}

impl FromStr for CardType {
    type Err = String;

    /// Case-insensitive.
    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let value = value.trim();
        CardType::ALL
            .into_iter()
            .find(|card_type| card_type.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| value.to_string())
    }
}

impl fmt::Display for CardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields shared by every card variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseCard {
    pub name: String,
    pub cost: i64,
    pub effect: String,
    pub keywords: Vec<Keyword>,
}

impl BaseCard {
    /// Create base fields, extracting keywords from `effect`.
    pub fn new(name: impl Into<String>, cost: i64, effect: impl Into<String>) -> Self {
        let effect = effect.into();
        Self {
            name: name.into(),
            cost,
            keywords: effect::extract_keywords(&effect),
            effect,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CardgenError::validation("name", "name cannot be empty"));
        }
        // The name becomes part of the image file name.
        if self.name.contains(['/', '\\']) {
            return Err(CardgenError::validation(
                "name",
                "name cannot contain path separators",
            ));
        }
        if self.effect.trim().is_empty() {
            return Err(CardgenError::validation("effect", "effect cannot be empty"));
        }
        if self.cost < MIN_COST {
            return Err(CardgenError::validation(
                "cost",
                "cost cannot be negative (except -1 for X costs)",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub base: BaseCard,
    pub attack: i64,
    pub defense: i64,
    /// Free-form creature trait; may be empty.
    pub r#trait: String,
}

impl Creature {
    pub fn new(
        name: impl Into<String>,
        cost: i64,
        effect: impl Into<String>,
        attack: i64,
        defense: i64,
        r#trait: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseCard::new(name, cost, effect),
            attack,
            defense,
            r#trait: r#trait.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub base: BaseCard,
    pub target_type: TargetType,
}

impl Spell {
    pub fn new(name: impl Into<String>, cost: i64, effect: impl Into<String>) -> Self {
        let base = BaseCard::new(name, cost, effect);
        let target_type = effect::determine_target_type(&base.effect);
        Self { base, target_type }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub base: BaseCard,
    pub is_equipment: bool,
}

impl Artifact {
    pub fn new(name: impl Into<String>, cost: i64, effect: impl Into<String>) -> Self {
        let base = BaseCard::new(name, cost, effect);
        let is_equipment = effect::determine_is_equipment(&base.effect);
        Self { base, is_equipment }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incantation {
    pub base: BaseCard,
    pub timing: Option<Timing>,
}

impl Incantation {
    pub fn new(name: impl Into<String>, cost: i64, effect: impl Into<String>) -> Self {
        let base = BaseCard::new(name, cost, effect);
        let timing = effect::determine_timing(&base.effect);
        Self { base, timing }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anthem {
    pub base: BaseCard,
    pub continuous: bool,
}

impl Anthem {
    /// Anthems are always continuous.
    pub fn new(name: impl Into<String>, cost: i64, effect: impl Into<String>) -> Self {
        Self {
            base: BaseCard::new(name, cost, effect),
            continuous: true,
        }
    }
}

/// A materialized card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Card {
    Creature(Creature),
    Spell(Spell),
    Artifact(Artifact),
    Incantation(Incantation),
    Anthem(Anthem),
}

impl Card {
    pub fn base(&self) -> &BaseCard {
        match self {
            Card::Creature(c) => &c.base,
            Card::Spell(c) => &c.base,
            Card::Artifact(c) => &c.base,
            Card::Incantation(c) => &c.base,
            Card::Anthem(c) => &c.base,
        }
    }

    pub fn card_type(&self) -> CardType {
        match self {
            Card::Creature(_) => CardType::Creature,
            Card::Spell(_) => CardType::Spell,
            Card::Artifact(_) => CardType::Artifact,
            Card::Incantation(_) => CardType::Incantation,
            Card::Anthem(_) => CardType::Anthem,
        }
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    pub fn cost(&self) -> i64 {
        self.base().cost
    }

    pub fn effect(&self) -> &str {
        &self.base().effect
    }

    pub fn keywords(&self) -> &[Keyword] {
        &self.base().keywords
    }

    /// Storage identity: `<type>-<name>`.
    ///
    /// Two cards of the same type and name share an identity.
    pub fn id(&self) -> String {
        format!("{}-{}", self.card_type(), self.name())
    }

    /// Check the card's own invariants.
    ///
    /// # Errors
    ///
    /// Returns `CardgenError::Validation` naming the offending field.
    pub fn validate(&self) -> Result<()> {
        self.base().validate()?;
        match self {
            Card::Creature(creature) => {
                if creature.attack < 0 {
                    return Err(CardgenError::validation(
                        "attack",
                        "attack cannot be negative",
                    ));
                }
                if creature.defense < 0 {
                    return Err(CardgenError::validation(
                        "defense",
                        "defense cannot be negative",
                    ));
                }
            }
            Card::Artifact(artifact) => {
                if artifact.is_equipment && !effect::determine_is_equipment(&artifact.base.effect)
                {
                    return Err(CardgenError::validation(
                        "effect",
                        "equipment artifact must contain equip effect",
                    ));
                }
            }
            Card::Anthem(anthem) => {
                if !anthem.continuous {
                    return Err(CardgenError::validation(
                        "continuous",
                        "anthems must be continuous",
                    ));
                }
            }
            Card::Spell(_) | Card::Incantation(_) => {}
        }
        Ok(())
    }

    /// Project to the flat transport form used by storage and rendering.
    pub fn to_dto(&self) -> CardDto {
        let base = self.base();
        let mut dto = CardDto {
            card_type: self.card_type(),
            name: base.name.clone(),
            cost: base.cost,
            effect: base.effect.clone(),
            keywords: base.keywords.clone(),
            ..CardDto::default()
        };
        match self {
            Card::Creature(creature) => {
                dto.attack = Some(creature.attack);
                dto.defense = Some(creature.defense);
                dto.r#trait = Some(creature.r#trait.clone()).filter(|t| !t.is_empty());
            }
            Card::Spell(spell) => dto.target_type = Some(spell.target_type),
            Card::Artifact(artifact) => dto.is_equipment = Some(artifact.is_equipment),
            Card::Incantation(incantation) => dto.timing = incantation.timing,
            Card::Anthem(anthem) => dto.continuous = Some(anthem.continuous),
        }
        dto
    }
}

impl From<Creature> for Card {
    fn from(card: Creature) -> Self {
        Card::Creature(card)
    }
}

impl From<Spell> for Card {
    fn from(card: Spell) -> Self {
        Card::Spell(card)
    }
}

impl From<Artifact> for Card {
    fn from(card: Artifact) -> Self {
        Card::Artifact(card)
    }
}

impl From<Incantation> for Card {
    fn from(card: Incantation) -> Self {
        Card::Incantation(card)
    }
}

impl From<Anthem> for Card {
    fn from(card: Anthem) -> Self {
        Card::Anthem(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_type_parsing() {
        assert_eq!("Creature".parse::<CardType>(), Ok(CardType::Creature));
        assert_eq!("ANTHEM".parse::<CardType>(), Ok(CardType::Anthem));
        assert_eq!("land".parse::<CardType>(), Err("land".to_string()));
    }

    #[test]
    fn test_id_uses_type_and_name() {
        let card: Card = Creature::new("Demon Pup", 1, "Bites", 1, 1, "Demon").into();
        assert_eq!(card.id(), "creature-Demon Pup");

        let card: Card = Spell::new("Bolt", 1, "Deal 3 DAMAGE").into();
        assert_eq!(card.id(), "spell-Bolt");
    }

    #[test]
    fn test_derived_fields_depend_only_on_effect() {
        let effect = "Equipped creature gains HASTE. ON ATTACK: deal DAMAGE to target creature";
        let a = Artifact::new("Sword", 2, effect);
        let b = Artifact::new("Other Sword", 5, effect);
        assert_eq!(a.base.keywords, b.base.keywords);
        assert_eq!(a.is_equipment, b.is_equipment);
        assert!(a.is_equipment);

        let spell = Spell::new("Strike", 1, effect);
        assert_eq!(spell.target_type, TargetType::Creature);
        let incantation = Incantation::new("Strike", 1, effect);
        assert_eq!(incantation.timing, Some(Timing::OnAttack));
        assert_eq!(
            spell.base.keywords,
            vec![Keyword::Haste, Keyword::Damage]
        );
    }

    #[test]
    fn test_anthem_is_always_continuous() {
        let anthem = Anthem::new("Rally", 3, "Creatures get +1/+1");
        assert!(anthem.continuous);

        let mut card = Card::from(anthem);
        assert!(card.validate().is_ok());
        if let Card::Anthem(anthem) = &mut card {
            anthem.continuous = false;
        }
        assert!(card.validate().is_err());
    }

    #[test]
    fn test_validation_rules() {
        let card: Card = Creature::new("Wolf", -1, "Howls", 2, 2, "").into();
        assert!(card.validate().is_ok(), "-1 encodes an X cost");

        let card: Card = Creature::new("Wolf", -2, "Howls", 2, 2, "").into();
        let err = card.validate().unwrap_err();
        assert!(matches!(err, CardgenError::Validation { ref field, .. } if field == "cost"));

        let card: Card = Creature::new("Wolf", 1, "Howls", -1, 2, "").into();
        assert!(card.validate().is_err());

        let card: Card = Spell::new(" ", 1, "Zap").into();
        assert!(card.validate().is_err());

        for name in ["../../escaped", "a/b", "dir\\file"] {
            let card: Card = Spell::new(name, 1, "Zap").into();
            let err = card.validate().unwrap_err();
            assert!(matches!(err, CardgenError::Validation { ref field, .. } if field == "name"));
        }
        let card: Card = Spell::new("Bolt..Again", 1, "Zap").into();
        assert!(card.validate().is_ok());

        let mut artifact = Artifact::new("Relic", 1, "Gain 1 life");
        artifact.is_equipment = true;
        assert!(Card::from(artifact).validate().is_err());
    }

    #[test]
    fn test_dto_carries_variant_fields() {
        let card: Card = Creature::new("Demon Pup", 1, "Each time you OFFER", 1, 2, "Demon").into();
        let dto = card.to_dto();
        assert_eq!(dto.card_type, CardType::Creature);
        assert_eq!(dto.attack, Some(1));
        assert_eq!(dto.defense, Some(2));
        assert_eq!(dto.r#trait.as_deref(), Some("Demon"));
        assert_eq!(dto.target_type, None);

        let card: Card = Incantation::new("Ward", 0, "Prevent damage").into();
        let dto = card.to_dto();
        assert_eq!(dto.timing, None);
        assert_eq!(dto.continuous, None);
    }
}
