//! Round Resolution
//!
//! Decides a single round between two cards. Pure: no state, no I/O.
//!
//! Precedence:
//! 1. Specialty rules (name substrings, case-sensitive) win outright.
//! 2. Monster vs monster compares base damage.
//! 3. Anything involving a spell applies the elemental cycle
//!    (x2 for the advantaged card, x0.5 for the other).

use crate::game::card::Card;

/// Which card took the round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundWinner {
    /// The first card passed to [`resolve_round`].
    First,
    /// The second card passed to [`resolve_round`].
    Second,
    /// Neither card prevailed.
    Draw,
}

/// Outcome of one round.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundResolution {
    /// Winning side.
    pub winner: RoundWinner,
    /// Effective damage of the first card. `None` when a specialty rule decided.
    pub first_damage: Option<f64>,
    /// Effective damage of the second card. `None` when a specialty rule decided.
    pub second_damage: Option<f64>,
    /// Narration for the battle log.
    pub narration: Vec<String>,
}

/// A named-pair rule that decides a round without comparing damage.
#[derive(Clone, Copy, Debug)]
pub struct SpecialtyRule {
    /// Substring identifying the subject card.
    pub subject: &'static str,
    /// Substring identifying the opposing card.
    pub opponent: &'static str,
    /// Whether the subject side wins (otherwise the opponent side does).
    pub subject_wins: bool,
    /// Flavour text.
    pub reason: &'static str,
}

/// Specialty rules in evaluation order.
pub const SPECIALTY_RULES: [SpecialtyRule; 5] = [
    SpecialtyRule {
        subject: "Goblin",
        opponent: "Dragon",
        subject_wins: false,
        reason: "goblins are too afraid of dragons to attack",
    },
    SpecialtyRule {
        subject: "Wizard",
        opponent: "Ork",
        subject_wins: true,
        reason: "wizards control orks, so the ork cannot attack",
    },
    SpecialtyRule {
        subject: "Knight",
        opponent: "WaterSpell",
        subject_wins: false,
        reason: "the knight's heavy armor drags him under instantly",
    },
    SpecialtyRule {
        subject: "Kraken",
        opponent: "Spell",
        subject_wins: true,
        reason: "the kraken is immune against spells",
    },
    SpecialtyRule {
        subject: "FireElf",
        opponent: "Dragon",
        subject_wins: true,
        reason: "fire elves have known dragons since they were little and evade their attacks",
    },
];

/// Resolve one round between `first` and `second`.
pub fn resolve_round(first: &Card, second: &Card) -> RoundResolution {
    if let Some(resolution) = specialty_override(first, second) {
        return resolution;
    }

    let (first_damage, second_damage) = effective_damage(first, second);

    let winner = if first_damage > second_damage {
        RoundWinner::First
    } else if second_damage > first_damage {
        RoundWinner::Second
    } else {
        RoundWinner::Draw
    };

    let mut narration = vec![format!(
        "{} vs {} => {} VS {} -> {} VS {}",
        first.name, second.name, first.base_damage, second.base_damage, first_damage, second_damage,
    )];
    narration.push(match winner {
        RoundWinner::First => format!("{} wins the round", first.name),
        RoundWinner::Second => format!("{} wins the round", second.name),
        RoundWinner::Draw => "The round is a draw".to_string(),
    });

    RoundResolution {
        winner,
        first_damage: Some(first_damage),
        second_damage: Some(second_damage),
        narration,
    }
}

/// Check the specialty rules in both orderings.
fn specialty_override(first: &Card, second: &Card) -> Option<RoundResolution> {
    for rule in &SPECIALTY_RULES {
        let side = if first.name.contains(rule.subject) && second.name.contains(rule.opponent) {
            // first is the subject
            Some(if rule.subject_wins { RoundWinner::First } else { RoundWinner::Second })
        } else if second.name.contains(rule.subject) && first.name.contains(rule.opponent) {
            Some(if rule.subject_wins { RoundWinner::Second } else { RoundWinner::First })
        } else {
            None
        };

        if let Some(winner) = side {
            let (won, lost) = match winner {
                RoundWinner::First => (first, second),
                _ => (second, first),
            };
            return Some(RoundResolution {
                winner,
                first_damage: None,
                second_damage: None,
                narration: vec![format!("{} beats {}: {}", won.name, lost.name, rule.reason)],
            });
        }
    }
    None
}

/// Effective damage of both cards for this matchup.
pub fn effective_damage(first: &Card, second: &Card) -> (f64, f64) {
    let (a, b) = (first.base_damage, second.base_damage);

    if first.is_monster() && second.is_monster() {
        return (a, b);
    }

    if first.element.beats(second.element) {
        (a * 2.0, b / 2.0)
    } else if second.element.beats(first.element) {
        (a / 2.0, b * 2.0)
    } else {
        (a, b)
    }
}
