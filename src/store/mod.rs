//! User Persistence
//!
//! The battle core only needs two things from storage: the record behind
//! an authenticated username and a place to write updated statistics.

use std::collections::BTreeMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::game::card::Deck;
use crate::game::rating::PlayerStats;

/// Persistence errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No such user.
    #[error("unknown user: {0}")]
    UnknownUser(String),

    /// Storage lock was poisoned by a panicking writer.
    #[error("user store unavailable")]
    Poisoned,
}

/// Everything stored about a player that a battle needs.
#[derive(Clone, Debug, PartialEq)]
pub struct UserRecord {
    /// Player identity.
    pub username: String,
    /// Current battle deck.
    pub deck: Deck,
    /// Battle statistics.
    pub stats: PlayerStats,
}

/// User storage collaborator.
pub trait UserRepository: Send + Sync {
    /// Load a user.
    fn find(&self, username: &str) -> Option<UserRecord>;

    /// Durably store updated statistics for one player.
    fn persist_stats(&self, stats: &PlayerStats) -> Result<(), StoreError>;
}

/// Process-local user store.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<BTreeMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user with an empty deck. Existing users are left alone.
    pub fn insert_user(&self, username: &str) {
        let mut users = self.users.write().unwrap_or_else(|p| p.into_inner());
        users.entry(username.to_string()).or_insert_with(|| UserRecord {
            username: username.to_string(),
            deck: Deck::empty(),
            stats: PlayerStats::new(username),
        });
    }

    /// Replace a user's deck.
    pub fn set_deck(&self, username: &str, deck: Deck) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let record = users
            .get_mut(username)
            .ok_or_else(|| StoreError::UnknownUser(username.to_string()))?;
        record.deck = deck;
        Ok(())
    }

    /// Current statistics for a user.
    pub fn stats(&self, username: &str) -> Option<PlayerStats> {
        self.find(username).map(|r| r.stats)
    }
}

impl UserRepository for InMemoryUserStore {
    fn find(&self, username: &str) -> Option<UserRecord> {
        let users = self.users.read().unwrap_or_else(|p| p.into_inner());
        users.get(username).cloned()
    }

    fn persist_stats(&self, stats: &PlayerStats) -> Result<(), StoreError> {
        let mut users = self.users.write().map_err(|_| StoreError::Poisoned)?;
        let record = users
            .get_mut(&stats.username)
            .ok_or_else(|| StoreError::UnknownUser(stats.username.clone()))?;
        record.stats = stats.clone();
        Ok(())
    }
}
