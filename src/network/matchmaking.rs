//! Battle Matchmaking
//!
//! Pairs two battle requests. The first caller parks a ticket and waits;
//! the second claims that ticket, runs the battle, settles ratings and
//! hands the result back through the ticket's channel before returning
//! the same result itself.
//!
//! ```text
//!   caller A                 waiting slot               caller B
//!   ────────                 ────────────               ────────
//!   join_or_start ──park──▶  Some(ticket A)
//!   (awaits ticket)                       ◀──claim──── join_or_start
//!                            None                       fight + settle
//!   ◀───────────────────── result via oneshot ───────── return result
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::rng::{derive_battle_seed, DeterministicRng, DrawSource};
use crate::game::card::Combatant;
use crate::game::combat::{BattleConfig, BattleResult, CombatEngine};
use crate::game::events::{EventLog, LogLevel};
use crate::game::rating::RatingUpdater;
use crate::store::UserRepository;

/// How battle draw seeds are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStrategy {
    /// Derive from the battle id and both usernames.
    PerBattle,
    /// Use the same seed for every battle.
    Fixed(u64),
}

/// Matchmaking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchmakingConfig {
    /// How long a lone challenger waits. `None` waits forever.
    pub wait_timeout: Option<Duration>,
    /// Draw seed selection.
    pub seed: SeedStrategy,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        Self {
            wait_timeout: None,
            seed: SeedStrategy::PerBattle,
        }
    }
}

/// Errors returned to a battle caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BattleError {
    /// The battle was aborted by an internal invariant violation.
    #[error("internal battle error: {0}")]
    Internal(String),

    /// The player already has a pending battle request.
    #[error("{0} is already waiting for an opponent")]
    AlreadyWaiting(String),

    /// The player has no cards to fight with.
    #[error("{0} has an empty deck")]
    EmptyDeck(String),

    /// No opponent arrived before the wait timeout.
    #[error("no opponent arrived in time")]
    WaitTimedOut,

    /// The pending request was withdrawn.
    #[error("battle request cancelled")]
    Cancelled,
}

type TicketReply = Result<BattleResult, BattleError>;

/// Builds the draw source for one battle from its seed.
pub type DrawFactory = Arc<dyn Fn(u64) -> Box<dyn DrawSource> + Send + Sync>;

/// Seeded Xorshift draws, the production source.
fn seeded_draws() -> DrawFactory {
    Arc::new(|seed: u64| -> Box<dyn DrawSource> { Box::new(DeterministicRng::new(seed)) })
}

/// The waiting side of a parked ticket, held in the waiting slot.
struct PendingTicket {
    ticket_id: Uuid,
    combatant: Combatant,
    reply: oneshot::Sender<TicketReply>,
}

impl PendingTicket {
    /// Whether the owner is still waiting for the result.
    fn is_live(&self) -> bool {
        !self.reply.is_closed()
    }
}

/// A parked challenger's claim on a future battle result.
///
/// Owned by the waiting caller. The pairing caller only ever writes the
/// result into the other half of the channel.
#[derive(Debug)]
pub struct MatchTicket {
    id: Uuid,
    username: String,
    receiver: oneshot::Receiver<TicketReply>,
}

/// What an arrival found in the waiting slot.
enum Arrival {
    /// Nobody was waiting; the caller's ticket is now parked.
    Parked(MatchTicket),
    /// A peer was waiting and has been claimed.
    Claimed(PendingTicket),
}

/// Engine and rating updater, shared with the blocking pool.
struct Arena {
    engine: CombatEngine,
    rating: RatingUpdater,
}

impl Arena {
    /// Run the battle and settle ratings.
    fn fight(
        &self,
        battle_id: Uuid,
        first: &Combatant,
        second: &Combatant,
        draws: &mut dyn DrawSource,
    ) -> Result<BattleResult, BattleError> {
        let result = self
            .engine
            .run_with_id(battle_id, first, second, draws)
            .map_err(|e| BattleError::Internal(e.to_string()))?;

        let mut first_stats = first.stats.clone();
        let mut second_stats = second.stats.clone();
        let report = self.rating.settle(&mut first_stats, &mut second_stats, result.outcome);
        if !report.is_persisted() {
            warn!(battle = %battle_id, "Statistics not persisted for {:?}", report.failed);
        }

        info!(
            battle = %battle_id,
            rounds = result.rounds,
            "Battle finished: {:?}",
            result.outcome
        );
        Ok(result)
    }
}

/// Rendezvous point for battle requests.
pub struct MatchmakingRendezvous {
    arena: Arc<Arena>,
    draws: DrawFactory,
    config: MatchmakingConfig,
    log: Arc<dyn EventLog>,
    /// At most one parked challenger.
    waiting: Mutex<Option<PendingTicket>>,
    battles_fought: AtomicU64,
}

impl MatchmakingRendezvous {
    /// Create a rendezvous from its collaborators.
    pub fn new(
        engine: CombatEngine,
        rating: RatingUpdater,
        config: MatchmakingConfig,
        log: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            arena: Arc::new(Arena { engine, rating }),
            draws: seeded_draws(),
            config,
            log,
            waiting: Mutex::new(None),
            battles_fought: AtomicU64::new(0),
        }
    }

    /// Wire an engine and rating updater over `users`.
    pub fn with_store(
        battle: BattleConfig,
        config: MatchmakingConfig,
        users: Arc<dyn UserRepository>,
        log: Arc<dyn EventLog>,
    ) -> Self {
        let rating = RatingUpdater::new(&battle, users, log.clone());
        let engine = CombatEngine::new(battle, log.clone());
        Self::new(engine, rating, config, log)
    }

    /// Replace the draw source used for each battle.
    pub fn with_draws(mut self, draws: DrawFactory) -> Self {
        self.draws = draws;
        self
    }

    /// Start a battle for `combatant`, or join the one already waiting.
    ///
    /// Resolves once the battle has been fought and both players'
    /// statistics have been written. Both paired callers receive the same
    /// result.
    pub async fn join_or_start(&self, combatant: Combatant) -> Result<BattleResult, BattleError> {
        if combatant.deck.is_empty() {
            return Err(BattleError::EmptyDeck(combatant.username));
        }

        match self.arrive(combatant.clone()).await? {
            Arrival::Parked(ticket) => {
                debug!("{} parked ticket {}", ticket.username, ticket.id);
                self.await_result(ticket).await
            }
            Arrival::Claimed(peer) => {
                let outcome = self.fight(peer.combatant.clone(), combatant).await;
                if peer.reply.send(outcome.clone()).is_err() {
                    self.log.record(
                        LogLevel::Warning,
                        &format!(
                            "{} left before the battle result could be delivered",
                            peer.combatant.username
                        ),
                    );
                }
                outcome
            }
        }
    }

    /// Withdraw `username`'s parked ticket. The waiting caller receives
    /// [`BattleError::Cancelled`].
    pub async fn cancel(&self, username: &str) -> bool {
        let mut slot = self.waiting.lock().await;
        if slot.as_ref().is_some_and(|p| p.combatant.username == username) {
            *slot = None;
            info!("Withdrew battle request for {}", username);
            true
        } else {
            false
        }
    }

    /// Whether `username` is currently parked and still waiting.
    pub async fn is_waiting(&self, username: &str) -> bool {
        let slot = self.waiting.lock().await;
        slot.as_ref()
            .is_some_and(|p| p.combatant.username == username && p.is_live())
    }

    /// Number of battles started so far.
    pub fn battles_fought(&self) -> u64 {
        self.battles_fought.load(Ordering::SeqCst)
    }

    /// The single check-then-park-or-claim decision.
    async fn arrive(&self, combatant: Combatant) -> Result<Arrival, BattleError> {
        let mut slot = self.waiting.lock().await;

        match slot.take() {
            Some(peer) if !peer.is_live() => {
                warn!("Discarding abandoned ticket from {}", peer.combatant.username);
            }
            Some(peer) if peer.combatant.username == combatant.username => {
                *slot = Some(peer);
                return Err(BattleError::AlreadyWaiting(combatant.username));
            }
            Some(peer) => return Ok(Arrival::Claimed(peer)),
            None => {}
        }

        let (reply, receiver) = oneshot::channel();
        let id = Uuid::new_v4();
        let username = combatant.username.clone();
        *slot = Some(PendingTicket {
            ticket_id: id,
            combatant,
            reply,
        });

        Ok(Arrival::Parked(MatchTicket { id, username, receiver }))
    }

    async fn await_result(&self, ticket: MatchTicket) -> Result<BattleResult, BattleError> {
        let MatchTicket { id, username, mut receiver } = ticket;

        let delivered = match self.config.wait_timeout {
            None => receiver.await,
            Some(limit) => match tokio::time::timeout(limit, &mut receiver).await {
                Ok(delivered) => delivered,
                Err(_) => {
                    if self.withdraw(id).await {
                        info!("{} gave up waiting after {:?}", username, limit);
                        return Err(BattleError::WaitTimedOut);
                    }
                    // Claimed while the timer fired; the result is on its way
                    receiver.await
                }
            },
        };

        delivered.unwrap_or(Err(BattleError::Cancelled))
    }

    /// Remove ticket `id` if it is still parked.
    async fn withdraw(&self, id: Uuid) -> bool {
        let mut slot = self.waiting.lock().await;
        if slot.as_ref().is_some_and(|p| p.ticket_id == id) {
            *slot = None;
            true
        } else {
            false
        }
    }

    /// Fight a claimed pairing. Called by the claiming caller.
    ///
    /// Runs on the blocking pool since rating persistence may block on
    /// storage.
    async fn fight(&self, first: Combatant, second: Combatant) -> Result<BattleResult, BattleError> {
        let battle_id = Uuid::new_v4();
        let seed = match self.config.seed {
            SeedStrategy::Fixed(seed) => seed,
            SeedStrategy::PerBattle => {
                derive_battle_seed(&battle_id, &first.username, &second.username)
            }
        };

        self.battles_fought.fetch_add(1, Ordering::SeqCst);
        info!(
            battle = %battle_id,
            seed = %hex::encode(seed.to_le_bytes()),
            "Battle starting: {} vs {}",
            first.username,
            second.username
        );

        let arena = self.arena.clone();
        let draws = self.draws.clone();
        tokio::task::spawn_blocking(move || {
            let mut source = (*draws)(seed);
            arena.fight(battle_id, &first, &second, &mut *source)
        })
        .await
        .map_err(|e| BattleError::Internal(format!("battle task failed: {}", e)))?
    }
}

// =============================================================================
// TESTS
// =============================================================================
