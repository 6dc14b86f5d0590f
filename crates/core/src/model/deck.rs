use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::card::Card;
use crate::model::ids::DeckId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,
}

//
// ─── STATS ─────────────────────────────────────────────────────────────────────
//

/// Cached aggregate counts for a deck.
///
/// Always derived from the deck's card list by `from_cards`; never mutated
/// independently. Because a mastered card is always studied,
/// `mastered_cards <= studied_cards <= total_cards` holds for any recompute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckStats {
    pub total_cards: u32,
    pub studied_cards: u32,
    pub mastered_cards: u32,
}

impl DeckStats {
    /// Pure fold over a card list: count total, studied, and mastered.
    #[must_use]
    pub fn from_cards(cards: &[Card]) -> Self {
        let mut stats = Self::default();
        for card in cards {
            stats.total_cards += 1;
            if card.studied() {
                stats.studied_cards += 1;
            }
            if card.mastered() {
                stats.mastered_cards += 1;
            }
        }
        stats
    }
}

//
// ─── DECK UPDATE ───────────────────────────────────────────────────────────────
//

/// Partial update for a deck: only the provided fields are merged.
///
/// The outer `Option` on `description` distinguishes "leave unchanged"
/// (`None`) from "clear it" (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl DeckUpdate {
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

//
// ─── DECK ──────────────────────────────────────────────────────────────────────
//

/// A named collection of flashcards with derived statistics.
///
/// The deck owns its cards through the repository; `stats` is a cache
/// refreshed by recomputing over the current card list after mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    id: DeckId,
    name: String,
    description: Option<String>,
    stats: DeckStats,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Deck {
    /// Creates a new deck with zeroed stats.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if name is empty or whitespace-only.
    pub fn new(
        id: DeckId,
        name: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DeckError> {
        let name = validated_name(name.into())?;
        let description = normalized_description(description);

        Ok(Self {
            id,
            name,
            description,
            stats: DeckStats::default(),
            created_at,
            updated_at: created_at,
        })
    }

    /// Rebuilds a deck from persisted state.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` for an invalid stored name.
    pub fn from_persisted(
        id: DeckId,
        name: String,
        description: Option<String>,
        stats: DeckStats,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DeckError> {
        let name = validated_name(name)?;
        let description = normalized_description(description);

        Ok(Self {
            id,
            name,
            description,
            stats,
            created_at,
            updated_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> DeckId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn stats(&self) -> DeckStats {
        self.stats
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Shallow-merges the provided fields and refreshes `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `DeckError::EmptyName` if a new name fails validation; the
    /// deck is left unchanged in that case.
    pub fn apply_update(&mut self, update: DeckUpdate, now: DateTime<Utc>) -> Result<(), DeckError> {
        let name = update.name.map(validated_name).transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = normalized_description(description);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Replaces the cached stats snapshot and refreshes `updated_at`.
    pub fn set_stats(&mut self, stats: DeckStats, now: DateTime<Utc>) {
        self.stats = stats;
        self.updated_at = now;
    }
}

fn validated_name(name: String) -> Result<String, DeckError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DeckError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

fn normalized_description(description: Option<String>) -> Option<String> {
    description
        .map(|d| d.trim().to_owned())
        .filter(|d| !d.is_empty())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CardId, Difficulty, ReviewEntry};
    use crate::scheduler::Scheduler;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_card(id: u64) -> Card {
        Card::new(CardId::new(id), DeckId::new(1), "Q", "A", fixed_now()).unwrap()
    }

    fn reviewed_card(id: u64, difficulty: Difficulty, mastered: bool) -> Card {
        let mut card = build_card(id);
        let scheduler = Scheduler::new();
        let now = fixed_now();
        let scheduled = scheduler.next_interval(difficulty, 2, now);
        card.apply_review(
            &scheduled,
            mastered,
            ReviewEntry::new(now, difficulty, difficulty == Difficulty::Easy),
        );
        card
    }

    #[test]
    fn deck_new_rejects_empty_name() {
        let err = Deck::new(DeckId::new(1), "   ", None, fixed_now()).unwrap_err();
        assert_eq!(err, DeckError::EmptyName);
    }

    #[test]
    fn deck_new_starts_with_zero_stats() {
        let deck = Deck::new(DeckId::new(1), "Spanish", None, fixed_now()).unwrap();
        assert_eq!(deck.stats(), DeckStats::default());
        assert_eq!(deck.updated_at(), deck.created_at());
    }

    #[test]
    fn deck_trims_name_and_description() {
        let deck = Deck::new(
            DeckId::new(1),
            "  Spanish  ",
            Some("  grammar  ".into()),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(deck.name(), "Spanish");
        assert_eq!(deck.description(), Some("grammar"));
    }

    #[test]
    fn deck_filters_empty_description() {
        let deck = Deck::new(DeckId::new(1), "French", Some("   ".into()), fixed_now()).unwrap();
        assert_eq!(deck.description(), None);
    }

    #[test]
    fn stats_fold_counts_studied_and_mastered() {
        let cards = vec![
            build_card(1),
            reviewed_card(2, Difficulty::Hard, false),
            reviewed_card(3, Difficulty::Easy, true),
        ];

        let stats = DeckStats::from_cards(&cards);
        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.studied_cards, 2);
        assert_eq!(stats.mastered_cards, 1);
    }

    #[test]
    fn stats_ordering_invariant_holds() {
        let cards = vec![
            build_card(1),
            reviewed_card(2, Difficulty::Medium, false),
            reviewed_card(3, Difficulty::Easy, true),
            reviewed_card(4, Difficulty::Easy, true),
        ];

        let stats = DeckStats::from_cards(&cards);
        assert!(stats.mastered_cards <= stats.studied_cards);
        assert!(stats.studied_cards <= stats.total_cards);
    }

    #[test]
    fn stats_of_empty_deck_are_zero() {
        assert_eq!(DeckStats::from_cards(&[]), DeckStats::default());
    }

    #[test]
    fn apply_update_merges_only_provided_fields() {
        let now = fixed_now();
        let mut deck = Deck::new(DeckId::new(1), "Old", Some("desc".into()), now).unwrap();

        let later = now + Duration::hours(1);
        deck.apply_update(DeckUpdate::rename("New"), later).unwrap();

        assert_eq!(deck.name(), "New");
        assert_eq!(deck.description(), Some("desc"));
        assert_eq!(deck.updated_at(), later);
        assert_eq!(deck.created_at(), now);
    }

    #[test]
    fn apply_update_can_clear_description() {
        let now = fixed_now();
        let mut deck = Deck::new(DeckId::new(1), "Deck", Some("desc".into()), now).unwrap();

        let update = DeckUpdate {
            name: None,
            description: Some(None),
        };
        deck.apply_update(update, now).unwrap();
        assert_eq!(deck.description(), None);
    }

    #[test]
    fn apply_update_rejects_empty_name_without_changes() {
        let now = fixed_now();
        let mut deck = Deck::new(DeckId::new(1), "Keep", None, now).unwrap();

        let err = deck
            .apply_update(DeckUpdate::rename("  "), now + Duration::hours(1))
            .unwrap_err();
        assert_eq!(err, DeckError::EmptyName);
        assert_eq!(deck.name(), "Keep");
        assert_eq!(deck.updated_at(), now);
    }

    #[test]
    fn set_stats_refreshes_updated_at() {
        let now = fixed_now();
        let mut deck = Deck::new(DeckId::new(1), "Deck", None, now).unwrap();

        let later = now + Duration::minutes(5);
        let stats = DeckStats {
            total_cards: 2,
            studied_cards: 1,
            mastered_cards: 0,
        };
        deck.set_stats(stats, later);

        assert_eq!(deck.stats(), stats);
        assert_eq!(deck.updated_at(), later);
    }
}
