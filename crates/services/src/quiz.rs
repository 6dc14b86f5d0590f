//! Multiple-choice option generation for quiz-style review.

use flashcard_core::model::Card;
use rand::Rng;
use rand::seq::SliceRandom;

/// Filler answers used when a deck has too few distinct backs to fill out
/// a four-option question.
pub const GENERIC_DISTRACTORS: [&str; 6] = [
    "Not sure",
    "A different answer",
    "Needs review",
    "Not studied yet",
    "Cannot recall",
    "None of the above",
];

/// Maximum number of options per question: the correct answer plus up to
/// three distractors.
pub const MAX_OPTIONS: usize = 4;

fn normalized(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Build a shuffled set of answer options for a card.
///
/// Distractors come from the other cards' backs, deduplicated
/// case-insensitively and never matching the correct answer. When fewer
/// than three distinct distractors exist, generic fillers pad the set.
/// The result always contains the correct answer exactly once at a random
/// position, holds no case-insensitive duplicates, and has at least two
/// entries.
pub fn generate_options<R: Rng + ?Sized>(card: &Card, pool: &[Card], rng: &mut R) -> Vec<String> {
    let correct = card.back().to_owned();
    let correct_key = normalized(&correct);

    let mut seen: Vec<String> = vec![correct_key.clone()];
    let mut candidates: Vec<String> = Vec::new();
    for other in pool {
        if other.id() == card.id() {
            continue;
        }
        let key = normalized(other.back());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        candidates.push(other.back().to_owned());
    }

    candidates.shuffle(rng);
    candidates.truncate(MAX_OPTIONS - 1);
    let mut distractors = candidates;

    if distractors.len() < MAX_OPTIONS - 1 {
        let mut fillers: Vec<&str> = GENERIC_DISTRACTORS
            .iter()
            .copied()
            .filter(|f| {
                let key = normalized(f);
                key != correct_key && !distractors.iter().any(|d| normalized(d) == key)
            })
            .collect();
        fillers.shuffle(rng);

        for filler in fillers {
            if distractors.len() >= MAX_OPTIONS - 1 {
                break;
            }
            distractors.push(filler.to_owned());
        }
    }

    let mut options = Vec::with_capacity(distractors.len() + 1);
    options.push(correct);
    options.extend(distractors);
    options.shuffle(rng);
    options
}

/// Verdict on whether a deck supports quiz mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizDeckCheck {
    /// Fewer cards than the required minimum; quiz mode is unavailable.
    TooFewCards { required: usize },
    /// Quiz works but some options will be generic fillers.
    UsableWithFillers,
    /// Enough distinct answers for fully card-drawn options.
    Ready,
}

impl QuizDeckCheck {
    #[must_use]
    pub fn is_usable(self) -> bool {
        !matches!(self, QuizDeckCheck::TooFewCards { .. })
    }
}

/// Check whether a deck's cards can back a multiple-choice quiz.
///
/// Two cards are enough to run a quiz; four cards with four distinct
/// backs (case-insensitive) avoid generic fillers entirely.
#[must_use]
pub fn validate_quiz_deck(cards: &[Card], min_cards: usize) -> QuizDeckCheck {
    if cards.len() < min_cards {
        return QuizDeckCheck::TooFewCards {
            required: min_cards,
        };
    }

    if cards.len() < MAX_OPTIONS {
        return QuizDeckCheck::UsableWithFillers;
    }

    let mut unique: Vec<String> = Vec::new();
    for card in cards {
        let key = normalized(card.back());
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    if unique.len() < MAX_OPTIONS {
        return QuizDeckCheck::UsableWithFillers;
    }

    QuizDeckCheck::Ready
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
