//! Effect text analysis.
//!
//! Every derived card field is a pure function of the effect text, so two
//! cards with the same effect always carry the same derived values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A keyword from the fixed card vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Keyword {
    Critical,
    Haste,
    Damage,
    Buff,
    Equipment,
    Counter,
    Draw,
    Direct,
    Flying,
    Immune,
}

impl Keyword {
    /// The vocabulary in extraction order.
    pub const VOCABULARY: [Keyword; 10] = [
        Keyword::Critical,
        Keyword::Haste,
        Keyword::Damage,
        Keyword::Buff,
        Keyword::Equipment,
        Keyword::Counter,
        Keyword::Draw,
        Keyword::Direct,
        Keyword::Flying,
        Keyword::Immune,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Critical => "CRITICAL",
            Keyword::Haste => "HASTE",
            Keyword::Damage => "DAMAGE",
            Keyword::Buff => "BUFF",
            Keyword::Equipment => "EQUIPMENT",
            Keyword::Counter => "COUNTER",
            Keyword::Draw => "DRAW",
            Keyword::Direct => "DIRECT",
            Keyword::Flying => "FLYING",
            Keyword::Immune => "IMMUNE",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a spell may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    Creature,
    Player,
    Any,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Creature => "Creature",
            TargetType::Player => "Player",
            TargetType::Any => "Any",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// When an incantation may be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timing {
    #[serde(rename = "ON ANY CLASH")]
    OnAnyClash,
    #[serde(rename = "ON ATTACK")]
    OnAttack,
}

impl Timing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timing::OnAnyClash => "ON ANY CLASH",
            Timing::OnAttack => "ON ATTACK",
        }
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords whose names appear in the uppercased effect text, in
/// vocabulary order.
pub fn extract_keywords(effect: &str) -> Vec<Keyword> {
    let upper = effect.to_uppercase();
    Keyword::VOCABULARY
        .into_iter()
        .filter(|keyword| upper.contains(keyword.as_str()))
        .collect()
}

pub fn determine_target_type(effect: &str) -> TargetType {
    let lower = effect.to_lowercase();
    if lower.contains("target creature") {
        TargetType::Creature
    } else if lower.contains("target player") {
        TargetType::Player
    } else {
        TargetType::Any
    }
}

/// Whether the effect text describes equipment ("equip", "equipped", ...).
pub fn determine_is_equipment(effect: &str) -> bool {
    effect.to_lowercase().contains("equip")
}

/// Timing markers are matched case-sensitively.
pub fn determine_timing(effect: &str) -> Option<Timing> {
    if effect.contains(Timing::OnAnyClash.as_str()) {
        Some(Timing::OnAnyClash)
    } else if effect.contains(Timing::OnAttack.as_str()) {
        Some(Timing::OnAttack)
    } else {
        None
    }
}
