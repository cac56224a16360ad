//! Card, Deck and Combatant Definitions
//!
//! Cards are immutable values. The only per-round quantity, effective
//! damage, is computed by the effectiveness resolver and never stored here.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::rating::PlayerStats;
use crate::MAX_DECK_SIZE;

// =============================================================================
// CARD
// =============================================================================

/// Elemental affinity of a card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementType {
    /// Fire element.
    Fire,
    /// Water element.
    Water,
    /// No particular element.
    Normal,
}

impl ElementType {
    /// Whether this element has the advantage over `other`.
    ///
    /// Water beats Fire, Fire beats Normal, Normal beats Water.
    pub fn beats(self, other: ElementType) -> bool {
        matches!(
            (self, other),
            (ElementType::Water, ElementType::Fire)
                | (ElementType::Fire, ElementType::Normal)
                | (ElementType::Normal, ElementType::Water)
        )
    }

    /// Derive the element from a card name.
    pub fn from_name(name: &str) -> Self {
        if name.contains("Water") {
            ElementType::Water
        } else if name.contains("Fire") {
            ElementType::Fire
        } else {
            ElementType::Normal
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Fire => write!(f, "Fire"),
            ElementType::Water => write!(f, "Water"),
            ElementType::Normal => write!(f, "Normal"),
        }
    }
}

/// Card variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Creature card; elements are ignored between two monsters.
    Monster,
    /// Spell card; elements always apply.
    Spell,
}

impl CardKind {
    /// Derive the variant from a card name.
    pub fn from_name(name: &str) -> Self {
        if name.contains("Spell") {
            CardKind::Spell
        } else {
            CardKind::Monster
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardKind::Monster => write!(f, "Monster"),
            CardKind::Spell => write!(f, "Spell"),
        }
    }
}

/// A single card.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Unique card identifier.
    pub id: String,
    /// Display name. Substrings drive specialty rules.
    pub name: String,
    /// Base damage (non-negative).
    pub base_damage: f64,
    /// Elemental affinity.
    pub element: ElementType,
    /// Monster or spell.
    pub kind: CardKind,
}

impl Card {
    /// Create a card with an explicit element and kind.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        base_damage: f64,
        element: ElementType,
        kind: CardKind,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_damage: base_damage.max(0.0),
            element,
            kind,
        }
    }

    /// Create a card whose element and kind are derived from its name.
    ///
    /// ```
    /// use card_arena::game::card::{Card, CardKind, ElementType};
    ///
    /// let card = Card::from_name("c1", "WaterSpell", 20.0);
    /// assert_eq!(card.element, ElementType::Water);
    /// assert_eq!(card.kind, CardKind::Spell);
    /// ```
    pub fn from_name(id: impl Into<String>, name: impl Into<String>, base_damage: f64) -> Self {
        let name = name.into();
        let element = ElementType::from_name(&name);
        let kind = CardKind::from_name(&name);
        Self::new(id, name, base_damage, element, kind)
    }

    /// Whether this card is a monster.
    #[inline]
    pub fn is_monster(&self) -> bool {
        self.kind == CardKind::Monster
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {}, {} damage)",
            self.name, self.kind, self.element, self.base_damage
        )
    }
}

// =============================================================================
// DECK
// =============================================================================

/// Deck construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeckError {
    /// More cards than a deck may hold.
    #[error("deck holds at most {max} cards, got {got}")]
    TooManyCards {
        /// Allowed maximum.
        max: usize,
        /// Number of cards supplied.
        got: usize,
    },
}

/// A player's battle deck (at most [`MAX_DECK_SIZE`] cards).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build a deck, rejecting oversized card lists.
    pub fn new(cards: Vec<Card>) -> Result<Self, DeckError> {
        if cards.len() > MAX_DECK_SIZE {
            return Err(DeckError::TooManyCards {
                max: MAX_DECK_SIZE,
                got: cards.len(),
            });
        }
        Ok(Self { cards })
    }

    /// An empty deck.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck has no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards in deck order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

// =============================================================================
// COMBATANT
// =============================================================================

/// A player entering a battle together with their deck.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    /// Player identity.
    pub username: String,
    /// The deck taken into battle.
    pub deck: Deck,
    /// Statistics as of authentication.
    pub stats: PlayerStats,
}

impl Combatant {
    /// Create a combatant with fresh statistics.
    pub fn new(username: impl Into<String>, deck: Deck) -> Self {
        let username = username.into();
        let stats = PlayerStats::new(username.clone());
        Self { username, deck, stats }
    }

    /// Replace the statistics snapshot.
    pub fn with_stats(mut self, stats: PlayerStats) -> Self {
        self.stats = stats;
        self
    }
}
