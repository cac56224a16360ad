//! Player Statistics and Rating Updates
//!
//! After every battle both players' counters move and, unless the battle
//! was a tie, their ratings too. Persistence goes through the
//! [`UserRepository`]; a failed write is logged and reported but never
//! undoes the battle.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::game::combat::{BattleConfig, BattleOutcome};
use crate::game::events::{EventLog, LogLevel};
use crate::store::UserRepository;
use crate::STARTING_RATING;

/// Persistent per-player battle statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Player identity.
    pub username: String,
    /// Elo-like rating.
    pub rating: i32,
    /// Battles won.
    pub wins: u32,
    /// Battles lost.
    pub losses: u32,
    /// Battles tied.
    pub ties: u32,
}

impl PlayerStats {
    /// Fresh statistics at the starting rating.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            rating: STARTING_RATING,
            wins: 0,
            losses: 0,
            ties: 0,
        }
    }

    /// Total battles recorded.
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.ties
    }
}

/// What happened when the new statistics were written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RatingReport {
    /// Usernames whose statistics could not be persisted.
    pub failed: Vec<String>,
}

impl RatingReport {
    /// Whether both players' statistics were stored.
    pub fn is_persisted(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies win/loss/tie deltas and persists them.
pub struct RatingUpdater {
    win_delta: i32,
    loss_delta: i32,
    users: Arc<dyn UserRepository>,
    log: Arc<dyn EventLog>,
}

impl RatingUpdater {
    /// Create an updater using the deltas from `config`.
    pub fn new(config: &BattleConfig, users: Arc<dyn UserRepository>, log: Arc<dyn EventLog>) -> Self {
        Self {
            win_delta: config.win_rating_delta,
            loss_delta: config.loss_rating_delta,
            users,
            log,
        }
    }

    /// Apply the result of a battle and persist both players.
    ///
    /// With `tie` set, `winner` and `loser` are simply the two participants.
    pub fn apply(&self, winner: &mut PlayerStats, loser: &mut PlayerStats, tie: bool) -> RatingReport {
        if tie {
            winner.ties += 1;
            loser.ties += 1;
        } else {
            winner.rating += self.win_delta;
            winner.wins += 1;
            loser.rating -= self.loss_delta;
            loser.losses += 1;
        }

        let mut report = RatingReport::default();
        for stats in [&*winner, &*loser] {
            if let Err(e) = self.users.persist_stats(stats) {
                self.log.record(
                    LogLevel::Error,
                    &format!("failed to persist statistics for {}: {}", stats.username, e),
                );
                report.failed.push(stats.username.clone());
            }
        }
        report
    }

    /// Map a battle outcome onto [`RatingUpdater::apply`].
    pub fn settle(
        &self,
        first: &mut PlayerStats,
        second: &mut PlayerStats,
        outcome: BattleOutcome,
    ) -> RatingReport {
        match outcome {
            BattleOutcome::WinnerA => self.apply(first, second, false),
            BattleOutcome::WinnerB => self.apply(second, first, false),
            BattleOutcome::Tie => self.apply(first, second, true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::MemoryEventLog;
    use crate::store::{InMemoryUserStore, StoreError};

    struct FailingStore;

    impl UserRepository for FailingStore {
        fn find(&self, _username: &str) -> Option<crate::store::UserRecord> {
            None
        }

        fn persist_stats(&self, stats: &PlayerStats) -> Result<(), StoreError> {
            Err(StoreError::UnknownUser(stats.username.clone()))
        }
    }

    fn updater_with(store: Arc<dyn UserRepository>) -> (RatingUpdater, Arc<MemoryEventLog>) {
        let log = Arc::new(MemoryEventLog::new());
        let updater = RatingUpdater::new(&BattleConfig::default(), store, log.clone());
        (updater, log)
    }

    #[test]
    fn test_win_and_loss_deltas() {
        let store = Arc::new(InMemoryUserStore::new());
        store.insert_user("alice");
        store.insert_user("bob");
        let (updater, _) = updater_with(store.clone());

        let mut alice = PlayerStats::new("alice");
        let mut bob = PlayerStats::new("bob");

        let report = updater.apply(&mut alice, &mut bob, false);
        assert!(report.is_persisted());

        assert_eq!(alice.rating, STARTING_RATING + 3);
        assert_eq!(alice.wins, 1);
        assert_eq!(bob.rating, STARTING_RATING - 5);
        assert_eq!(bob.losses, 1);

        // Persisted values match
        assert_eq!(store.stats("alice"), Some(alice));
        assert_eq!(store.stats("bob"), Some(bob));
    }

    #[test]
    fn test_tie_leaves_ratings() {
        let store = Arc::new(InMemoryUserStore::new());
        store.insert_user("alice");
        store.insert_user("bob");
        let (updater, _) = updater_with(store);

        let mut alice = PlayerStats::new("alice");
        let mut bob = PlayerStats::new("bob");
        updater.apply(&mut alice, &mut bob, true);

        assert_eq!(alice.ties, 1);
        assert_eq!(bob.ties, 1);
        assert_eq!(alice.rating, STARTING_RATING);
        assert_eq!(bob.rating, STARTING_RATING);
        assert_eq!(alice.wins + alice.losses, 0);
    }

    #[test]
    fn test_settle_second_wins() {
        let store = Arc::new(InMemoryUserStore::new());
        store.insert_user("alice");
        store.insert_user("bob");
        let (updater, _) = updater_with(store);

        let mut alice = PlayerStats::new("alice");
        let mut bob = PlayerStats::new("bob");
        updater.settle(&mut alice, &mut bob, BattleOutcome::WinnerB);

        assert_eq!(bob.wins, 1);
        assert_eq!(alice.losses, 1);
        assert_eq!(alice.games_played(), 1);
    }

    #[test]
    fn test_persistence_failure_is_logged_not_fatal() {
        let (updater, log) = updater_with(Arc::new(FailingStore));

        let mut alice = PlayerStats::new("alice");
        let mut bob = PlayerStats::new("bob");
        let report = updater.apply(&mut alice, &mut bob, false);

        // In-memory stats still updated
        assert_eq!(alice.wins, 1);
        assert_eq!(report.failed, vec!["alice".to_string(), "bob".to_string()]);
        assert_eq!(log.messages_at(LogLevel::Error).len(), 2);
    }
}
