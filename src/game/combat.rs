//! Battle Simulation
//!
//! Runs one battle between two combatants: draw a card from each deck,
//! resolve the round, move the losing card to the winner's deck, repeat
//! until a deck is empty or the round cap is hit. The final deck sizes
//! decide the outcome.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::rng::DrawSource;
use crate::game::card::{Card, Combatant};
use crate::game::effectiveness::{resolve_round, RoundWinner};
use crate::game::events::{EventLog, LogLevel};
use crate::{LOSS_RATING_DELTA, MAX_ROUNDS, WIN_RATING_DELTA};

/// Battle tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleConfig {
    /// Round cap.
    pub max_rounds: u32,
    /// Rating gained by the winner.
    pub win_rating_delta: i32,
    /// Rating lost by the loser.
    pub loss_rating_delta: i32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            win_rating_delta: WIN_RATING_DELTA,
            loss_rating_delta: LOSS_RATING_DELTA,
        }
    }
}

/// How a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// The first combatant finished with more cards.
    WinnerA,
    /// The second combatant finished with more cards.
    WinnerB,
    /// Both decks finished the same size.
    Tie,
}

/// Result of a completed battle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    /// Battle identifier.
    pub battle_id: Uuid,
    /// First combatant's username.
    pub first: String,
    /// Second combatant's username.
    pub second: String,
    /// Narration, one entry per logged event.
    pub log: Vec<String>,
    /// Final outcome.
    pub outcome: BattleOutcome,
    /// Rounds played.
    pub rounds: u32,
    /// Deck sizes at the end: `[first, second]`.
    pub final_deck_sizes: [usize; 2],
    /// When the battle finished.
    pub finished_at: DateTime<Utc>,
}

impl BattleResult {
    /// Username of the winner, `None` on a tie.
    pub fn winner(&self) -> Option<&str> {
        match self.outcome {
            BattleOutcome::WinnerA => Some(&self.first),
            BattleOutcome::WinnerB => Some(&self.second),
            BattleOutcome::Tie => None,
        }
    }

    /// The battle log as a JSON array of strings.
    pub fn log_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.log)
    }
}

/// Internal invariant violations. Fatal for the battle in progress.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombatError {
    /// Tried to draw from an empty deck.
    #[error("attempted to draw from {username}'s empty deck")]
    EmptyDeck {
        /// Deck owner.
        username: String,
    },

    /// The draw source returned an index outside the deck.
    #[error("draw index {index} out of range for {username}'s deck of {len}")]
    DrawOutOfRange {
        /// Deck owner.
        username: String,
        /// Index returned.
        index: usize,
        /// Deck length.
        len: usize,
    },
}

/// Runs battles.
pub struct CombatEngine {
    config: BattleConfig,
    log: Arc<dyn EventLog>,
}

impl CombatEngine {
    /// Create an engine.
    pub fn new(config: BattleConfig, log: Arc<dyn EventLog>) -> Self {
        Self { config, log }
    }

    /// Engine configuration.
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Run a battle under a fresh id.
    pub fn run(
        &self,
        first: &Combatant,
        second: &Combatant,
        draws: &mut dyn DrawSource,
    ) -> Result<BattleResult, CombatError> {
        self.run_with_id(Uuid::new_v4(), first, second, draws)
    }

    /// Run a battle.
    ///
    /// # Arguments
    ///
    /// * `battle_id` - Identifier recorded in the result
    /// * `first`, `second` - The combatants; their decks are copied, not consumed
    /// * `draws` - Source of card-draw indices
    ///
    /// # Errors
    ///
    /// Returns [`CombatError`] if a draw is impossible. The error is also
    /// recorded at [`LogLevel::Error`].
    pub fn run_with_id(
        &self,
        battle_id: Uuid,
        first: &Combatant,
        second: &Combatant,
        draws: &mut dyn DrawSource,
    ) -> Result<BattleResult, CombatError> {
        self.fight(battle_id, first, second, draws).map_err(|e| {
            self.log
                .record(LogLevel::Error, &format!("battle {} aborted: {}", battle_id, e));
            e
        })
    }

    fn fight(
        &self,
        battle_id: Uuid,
        first: &Combatant,
        second: &Combatant,
        draws: &mut dyn DrawSource,
    ) -> Result<BattleResult, CombatError> {
        let names = [first.username.as_str(), second.username.as_str()];
        let mut decks: [Vec<Card>; 2] = [first.deck.cards().to_vec(), second.deck.cards().to_vec()];
        let total_cards = decks[0].len() + decks[1].len();
        let mut log = Vec::new();
        let mut rounds = 0u32;

        self.narrate(
            &mut log,
            LogLevel::Highlight,
            format!("Battle {}: {} vs {}", battle_id, names[0], names[1]),
        );

        while rounds < self.config.max_rounds && !decks[0].is_empty() && !decks[1].is_empty() {
            rounds += 1;

            let first_idx = draw_card(&decks[0], draws, names[0])?;
            let second_idx = draw_card(&decks[1], draws, names[1])?;

            let first_card = &decks[0][first_idx];
            let second_card = &decks[1][second_idx];

            self.narrate(
                &mut log,
                LogLevel::Info,
                format!(
                    "Round {}: {} plays {} | {} plays {}",
                    rounds, names[0], first_card, names[1], second_card
                ),
            );

            let resolution = resolve_round(first_card, second_card);
            for line in resolution.narration {
                self.narrate(&mut log, LogLevel::Info, line);
            }

            let (winner, loser, taken_idx) = match resolution.winner {
                RoundWinner::First => (0, 1, second_idx),
                RoundWinner::Second => (1, 0, first_idx),
                RoundWinner::Draw => continue,
            };

            let card = decks[loser].remove(taken_idx);
            self.narrate(
                &mut log,
                LogLevel::Highlight,
                format!("{} takes {} from {}", names[winner], card.name, names[loser]),
            );
            decks[winner].push(card);

            debug_assert_eq!(decks[0].len() + decks[1].len(), total_cards);
        }

        let final_deck_sizes = [decks[0].len(), decks[1].len()];
        let outcome = match final_deck_sizes[0].cmp(&final_deck_sizes[1]) {
            Ordering::Greater => BattleOutcome::WinnerA,
            Ordering::Less => BattleOutcome::WinnerB,
            Ordering::Equal => BattleOutcome::Tie,
        };

        let summary = match outcome {
            BattleOutcome::WinnerA | BattleOutcome::WinnerB => {
                let (w, l) = if outcome == BattleOutcome::WinnerA { (0, 1) } else { (1, 0) };
                format!(
                    "{} wins the battle after {} rounds ({} cards vs {} cards)",
                    names[w], rounds, final_deck_sizes[w], final_deck_sizes[l]
                )
            }
            BattleOutcome::Tie => format!(
                "The battle ends in a tie after {} rounds ({} cards each)",
                rounds, final_deck_sizes[0]
            ),
        };
        self.narrate(&mut log, LogLevel::Highlight, summary);

        Ok(BattleResult {
            battle_id,
            first: first.username.clone(),
            second: second.username.clone(),
            log,
            outcome,
            rounds,
            final_deck_sizes,
            finished_at: Utc::now(),
        })
    }

    fn narrate(&self, log: &mut Vec<String>, level: LogLevel, line: String) {
        self.log.record(level, &line);
        log.push(line);
    }
}

/// Pick a card index from `deck`, validating what the draw source returned.
fn draw_card(deck: &[Card], draws: &mut dyn DrawSource, username: &str) -> Result<usize, CombatError> {
    if deck.is_empty() {
        return Err(CombatError::EmptyDeck {
            username: username.to_string(),
        });
    }

    let index = draws.draw_index(deck.len());
    if index >= deck.len() {
        return Err(CombatError::DrawOutOfRange {
            username: username.to_string(),
            index,
            len: deck.len(),
        });
    }
    Ok(index)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::DeterministicRng;
    use crate::game::card::{CardKind, Deck, ElementType};
    use crate::game::events::MemoryEventLog;
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Replays a fixed list of indices, then always 0.
    struct ScriptedDraws(VecDeque<usize>);

    impl ScriptedDraws {
        fn new(indices: &[usize]) -> Self {
            Self(indices.iter().copied().collect())
        }
    }

    impl DrawSource for ScriptedDraws {
        fn draw_index(&mut self, _len: usize) -> usize {
            self.0.pop_front().unwrap_or(0)
        }
    }

    fn engine() -> (CombatEngine, Arc<MemoryEventLog>) {
        let log = Arc::new(MemoryEventLog::new());
        (CombatEngine::new(BattleConfig::default(), log.clone()), log)
    }

    fn combatant(name: &str, cards: Vec<Card>) -> Combatant {
        Combatant::new(name, Deck::new(cards).unwrap())
    }

    fn monster(name: &str, damage: f64, element: ElementType) -> Card {
        Card::new(name, name, damage, element, CardKind::Monster)
    }

    #[test]
    fn test_goblin_vs_dragon_end_to_end() {
        let (engine, _) = engine();
        let a = combatant("alice", vec![monster("Goblin", 10.0, ElementType::Normal)]);
        let b = combatant("bob", vec![monster("Dragon", 15.0, ElementType::Fire)]);

        let result = engine.run(&a, &b, &mut DeterministicRng::new(1)).unwrap();

        assert_eq!(result.outcome, BattleOutcome::WinnerB);
        assert_eq!(result.rounds, 1);
        assert_eq!(result.final_deck_sizes, [0, 2]);
        assert_eq!(result.winner(), Some("bob"));
        assert!(result.log.iter().any(|l| l == "bob takes Goblin from alice"));
    }

    #[test]
    fn test_equal_monsters_hit_round_cap() {
        let (engine, _) = engine();
        let a = combatant("alice", vec![monster("FireTroll", 10.0, ElementType::Fire)]);
        let b = combatant("bob", vec![monster("WaterTroll", 10.0, ElementType::Water)]);

        let result = engine.run(&a, &b, &mut DeterministicRng::new(7)).unwrap();

        assert_eq!(result.rounds, MAX_ROUNDS);
        assert_eq!(result.outcome, BattleOutcome::Tie);
        assert_eq!(result.final_deck_sizes, [1, 1]);
        assert_eq!(result.winner(), None);
    }

    #[test]
    fn test_custom_round_cap() {
        let log = Arc::new(MemoryEventLog::new());
        let config = BattleConfig {
            max_rounds: 3,
            ..Default::default()
        };
        let engine = CombatEngine::new(config, log);
        let a = combatant("alice", vec![monster("Ork", 10.0, ElementType::Normal)]);
        let b = combatant("bob", vec![monster("Ork", 10.0, ElementType::Normal)]);

        let result = engine.run(&a, &b, &mut DeterministicRng::new(0)).unwrap();
        assert_eq!(result.rounds, 3);
    }

    #[test]
    fn test_scripted_draws_move_cards() {
        let (engine, _) = engine();
        let a = combatant(
            "alice",
            vec![
                monster("Ork", 50.0, ElementType::Normal),
                monster("Elf", 5.0, ElementType::Normal),
            ],
        );
        let b = combatant(
            "bob",
            vec![
                monster("Troll", 20.0, ElementType::Normal),
                monster("Imp", 1.0, ElementType::Normal),
            ],
        );

        // Round 1: Ork(50) vs Imp(1) -> alice takes Imp (alice: 3, bob: 1)
        // Round 2: Elf(5) vs Troll(20) -> bob takes Elf (alice: 2, bob: 2)
        // Round 3: Ork(50) vs Troll(20) -> alice takes Troll (alice: 3, bob: 1)
        // Round 4: Ork(50) vs Elf(5) -> alice takes Elf (alice: 4, bob: 0)
        let mut draws = ScriptedDraws::new(&[0, 1, 1, 0, 0, 0, 0, 0]);
        let result = engine.run(&a, &b, &mut draws).unwrap();

        assert_eq!(result.rounds, 4);
        assert_eq!(result.final_deck_sizes, [4, 0]);
        assert_eq!(result.outcome, BattleOutcome::WinnerA);
    }

    #[test]
    fn test_bad_draw_aborts_battle() {
        let (engine, log) = engine();
        let a = combatant("alice", vec![monster("Ork", 10.0, ElementType::Normal)]);
        let b = combatant("bob", vec![monster("Ork", 10.0, ElementType::Normal)]);

        let result = engine.run(&a, &b, &mut ScriptedDraws::new(&[5]));

        assert_eq!(
            result,
            Err(CombatError::DrawOutOfRange {
                username: "alice".into(),
                index: 5,
                len: 1,
            })
        );
        assert_eq!(log.messages_at(LogLevel::Error).len(), 1);
    }

    #[test]
    fn test_empty_deck_plays_no_rounds() {
        let (engine, _) = engine();
        let a = combatant("alice", vec![]);
        let b = combatant("bob", vec![monster("Ork", 10.0, ElementType::Normal)]);

        let result = engine.run(&a, &b, &mut DeterministicRng::new(3)).unwrap();
        assert_eq!(result.rounds, 0);
        assert_eq!(result.outcome, BattleOutcome::WinnerB);
    }

    #[test]
    fn test_same_seed_same_battle() {
        let (engine, _) = engine();
        let a = combatant(
            "alice",
            vec![
                Card::from_name("1", "WaterSpell", 20.0),
                Card::from_name("2", "FireElf", 15.0),
                Card::from_name("3", "Knight", 25.0),
            ],
        );
        let b = combatant(
            "bob",
            vec![
                Card::from_name("4", "FireSpell", 30.0),
                Card::from_name("5", "Dragon", 40.0),
                Card::from_name("6", "Kraken", 10.0),
            ],
        );
        let id = Uuid::from_bytes([4; 16]);

        let r1 = engine.run_with_id(id, &a, &b, &mut DeterministicRng::new(42)).unwrap();
        let r2 = engine.run_with_id(id, &a, &b, &mut DeterministicRng::new(42)).unwrap();

        assert_eq!(r1.log, r2.log);
        assert_eq!(r1.outcome, r2.outcome);
        assert_eq!(r1.rounds, r2.rounds);
    }

    #[test]
    fn test_log_json_is_string_array() {
        let (engine, _) = engine();
        let a = combatant("alice", vec![monster("Goblin", 10.0, ElementType::Normal)]);
        let b = combatant("bob", vec![monster("Dragon", 15.0, ElementType::Fire)]);

        let result = engine.run(&a, &b, &mut DeterministicRng::new(1)).unwrap();
        let parsed: Vec<String> = serde_json::from_str(&result.log_json().unwrap()).unwrap();
        assert_eq!(parsed, result.log);
    }

    fn arb_card() -> impl Strategy<Value = Card> {
        let names = prop::sample::select(vec![
            "Goblin", "Dragon", "Wizard", "Ork", "Knight", "WaterSpell", "FireSpell",
            "RegularSpell", "Kraken", "FireElf", "WaterGoblin", "Troll",
        ]);
        (names, 0.0f64..100.0).prop_map(|(name, damage)| Card::from_name(name, name, damage))
    }

    proptest! {
        #[test]
        fn prop_battle_terminates_and_conserves_cards(
            first in prop::collection::vec(arb_card(), 1..=4),
            second in prop::collection::vec(arb_card(), 1..=4),
            seed in any::<u64>(),
        ) {
            let (engine, _) = engine();
            let total = first.len() + second.len();
            let a = combatant("alice", first);
            let b = combatant("bob", second);

            let result = engine.run(&a, &b, &mut DeterministicRng::new(seed)).unwrap();

            prop_assert!(result.rounds >= 1 && result.rounds <= MAX_ROUNDS);
            prop_assert_eq!(result.final_deck_sizes[0] + result.final_deck_sizes[1], total);

            let expected = match result.final_deck_sizes[0].cmp(&result.final_deck_sizes[1]) {
                Ordering::Greater => BattleOutcome::WinnerA,
                Ordering::Less => BattleOutcome::WinnerB,
                Ordering::Equal => BattleOutcome::Tie,
            };
            prop_assert_eq!(result.outcome, expected);

            // Ended early only because a deck ran dry
            if result.rounds < MAX_ROUNDS {
                prop_assert!(result.final_deck_sizes.contains(&0));
            }
        }
    }
}
