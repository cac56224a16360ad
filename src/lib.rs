//! # Card Arena Battle Server
//!
//! Battle subsystem for a trading-card game: pairs two players' battle
//! requests, fights their decks against each other and settles ratings.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CARD ARENA SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/               - Deterministic primitives              │
//! │  └── rng.rs          - Xorshift128+ draws, battle seeds      │
//! │                                                              │
//! │  game/               - Battle rules (deterministic)          │
//! │  ├── card.rs         - Cards, elements, decks                │
//! │  ├── effectiveness.rs- Single-round resolution               │
//! │  ├── combat.rs       - Round loop and battle log             │
//! │  ├── rating.rs       - Post-battle statistics                │
//! │  └── events.rs       - Battle event sink                     │
//! │                                                              │
//! │  store/              - User records and stat persistence     │
//! │                                                              │
//! │  network/            - Networking (non-deterministic)        │
//! │  ├── server.rs       - HTTP front, POST /battles             │
//! │  ├── auth.rs         - Bearer JWT validation                 │
//! │  ├── matchmaking.rs  - Two-player rendezvous                 │
//! │  └── protocol.rs     - Error bodies and status codes         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! Given the same decks and the same draw source, [`CombatEngine`]
//! produces the same battle log and outcome. All randomness comes from a
//! [`DrawSource`]; production battles seed a [`DeterministicRng`] from the
//! battle id and both usernames, so any battle can be replayed.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod store;

// Re-export commonly used types
pub use core::rng::{derive_battle_seed, DeterministicRng, DrawSource};
pub use game::card::{Card, CardKind, Combatant, Deck, ElementType};
pub use game::combat::{BattleConfig, BattleOutcome, BattleResult, CombatEngine};
pub use game::rating::{PlayerStats, RatingUpdater};
pub use network::matchmaking::{BattleError, MatchmakingRendezvous};
pub use store::{InMemoryUserStore, UserRepository};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round cap per battle
pub const MAX_ROUNDS: u32 = 100;

/// Cards in a battle deck
pub const MAX_DECK_SIZE: usize = 4;

/// Rating gained for a win
pub const WIN_RATING_DELTA: i32 = 3;

/// Rating lost for a loss
pub const LOSS_RATING_DELTA: i32 = 5;

/// Rating of a fresh player
pub const STARTING_RATING: i32 = 100;
