//! Game Logic Module
//!
//! All battle rules. Deterministic given the draw source.
//!
//! ## Module Structure
//!
//! - `card`: Cards, elements, decks and combatants
//! - `effectiveness`: Single-round resolution
//! - `combat`: The round loop
//! - `rating`: Post-battle statistics
//! - `events`: Battle event sink

pub mod card;
pub mod combat;
pub mod effectiveness;
pub mod events;
pub mod rating;

// Re-export key types
pub use card::{Card, CardKind, Combatant, Deck, DeckError, ElementType};
pub use combat::{BattleConfig, BattleOutcome, BattleResult, CombatEngine, CombatError};
pub use effectiveness::{resolve_round, RoundResolution, RoundWinner};
pub use events::{EventLog, LogLevel, MemoryEventLog, TracingEventLog};
pub use rating::{PlayerStats, RatingReport, RatingUpdater};
