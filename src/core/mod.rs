//! Core deterministic primitives.
//!
//! Everything a battle needs in order to be replayable from a seed.

pub mod rng;

pub use rng::{derive_battle_seed, DeterministicRng, DrawSource};
