use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{CardId, DeckId};
use crate::model::review::{Difficulty, ReviewEntry};
use crate::scheduler::{ScheduledReview, SCHEDULE_STEPS};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("card front cannot be empty")]
    EmptyFront,

    #[error("card back cannot be empty")]
    EmptyBack,

    #[error("invalid persisted card state: {0}")]
    InvalidPersistedState(String),
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// A front/back question-answer pair with review metadata.
///
/// A card belongs to exactly one deck. Its scheduling state advances through
/// `apply_review`: the interval index steps through the scheduler's tables,
/// `next_review_at` moves forward, and every review appends to the
/// append-only history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: CardId,
    deck_id: DeckId,
    front: String,
    back: String,
    studied: bool,
    mastered: bool,
    difficulty: Difficulty,
    interval_index: u8,
    next_review_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    review_history: Vec<ReviewEntry>,
}

impl Card {
    /// Creates a new, never-reviewed card.
    ///
    /// The card starts unstudied at interval index 0 with a medium rating
    /// and is due immediately.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyFront`/`EmptyBack` if either side is empty
    /// or whitespace-only.
    pub fn new(
        id: CardId,
        deck_id: DeckId,
        front: impl Into<String>,
        back: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CardError> {
        let front = validated_text(front.into(), CardError::EmptyFront)?;
        let back = validated_text(back.into(), CardError::EmptyBack)?;

        Ok(Self {
            id,
            deck_id,
            front,
            back,
            studied: false,
            mastered: false,
            difficulty: Difficulty::Medium,
            interval_index: 0,
            next_review_at: created_at,
            created_at,
            review_history: Vec::new(),
        })
    }

    /// Rebuilds a card from persisted state, re-validating invariants.
    ///
    /// # Errors
    ///
    /// Returns `CardError::InvalidPersistedState` if the interval index is
    /// out of table range or the due date precedes creation, and the usual
    /// text validation errors for empty front/back.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: CardId,
        deck_id: DeckId,
        front: String,
        back: String,
        studied: bool,
        mastered: bool,
        difficulty: Difficulty,
        interval_index: u8,
        next_review_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        review_history: Vec<ReviewEntry>,
    ) -> Result<Self, CardError> {
        let front = validated_text(front, CardError::EmptyFront)?;
        let back = validated_text(back, CardError::EmptyBack)?;

        if usize::from(interval_index) >= SCHEDULE_STEPS {
            return Err(CardError::InvalidPersistedState(format!(
                "interval index {interval_index} out of range"
            )));
        }
        if next_review_at < created_at {
            return Err(CardError::InvalidPersistedState(
                "next review precedes creation".into(),
            ));
        }
        if mastered && !studied {
            return Err(CardError::InvalidPersistedState(
                "mastered card must be studied".into(),
            ));
        }

        Ok(Self {
            id,
            deck_id,
            front,
            back,
            studied,
            mastered,
            difficulty,
            interval_index,
            next_review_at,
            created_at,
            review_history,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CardId {
        self.id
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn front(&self) -> &str {
        &self.front
    }

    #[must_use]
    pub fn back(&self) -> &str {
        &self.back
    }

    #[must_use]
    pub fn studied(&self) -> bool {
        self.studied
    }

    #[must_use]
    pub fn mastered(&self) -> bool {
        self.mastered
    }

    /// Last difficulty rating the card received (medium until first review).
    #[must_use]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Current position in the per-difficulty interval tables.
    #[must_use]
    pub fn interval_index(&self) -> u8 {
        self.interval_index
    }

    #[must_use]
    pub fn next_review_at(&self) -> DateTime<Utc> {
        self.next_review_at
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn review_history(&self) -> &[ReviewEntry] {
        &self.review_history
    }

    /// Whether the card is due for review at the given time.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Applies a graded review to the card's scheduling state.
    ///
    /// Marks the card studied, records the rating and mastery outcome,
    /// advances to the scheduled interval and due date, and appends the
    /// entry to the review history. Mastery is never revoked here; a later
    /// hard rating keeps the flag (the caller decides resets).
    pub fn apply_review(&mut self, scheduled: &ScheduledReview, mastered: bool, entry: ReviewEntry) {
        self.studied = true;
        self.mastered = self.mastered || mastered;
        self.difficulty = entry.difficulty;
        self.interval_index = scheduled.interval_index;
        self.next_review_at = scheduled.due_at;
        self.review_history.push(entry);
    }

    /// Replaces the card's text while preserving scheduling state.
    ///
    /// # Errors
    ///
    /// Returns `CardError::EmptyFront`/`EmptyBack` for invalid text.
    pub fn edit_content(
        &mut self,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Result<(), CardError> {
        let front = validated_text(front.into(), CardError::EmptyFront)?;
        let back = validated_text(back.into(), CardError::EmptyBack)?;
        self.front = front;
        self.back = back;
        Ok(())
    }
}

fn validated_text(text: String, err: CardError) -> Result<String, CardError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(err);
    }
    Ok(trimmed.to_owned())
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_card() -> Card {
        Card::new(CardId::new(1), DeckId::new(1), "front", "back", fixed_now()).unwrap()
    }

    #[test]
    fn new_card_starts_unstudied_and_due() {
        let now = fixed_now();
        let card = build_card();

        assert!(!card.studied());
        assert!(!card.mastered());
        assert_eq!(card.difficulty(), Difficulty::Medium);
        assert_eq!(card.interval_index(), 0);
        assert_eq!(card.next_review_at(), now);
        assert!(card.is_due(now));
        assert!(card.review_history().is_empty());
    }

    #[test]
    fn new_card_rejects_empty_sides() {
        let err = Card::new(CardId::new(1), DeckId::new(1), "  ", "back", fixed_now()).unwrap_err();
        assert_eq!(err, CardError::EmptyFront);

        let err = Card::new(CardId::new(1), DeckId::new(1), "front", "\t", fixed_now()).unwrap_err();
        assert_eq!(err, CardError::EmptyBack);
    }

    #[test]
    fn new_card_trims_text() {
        let card =
            Card::new(CardId::new(1), DeckId::new(1), "  Q  ", " A ", fixed_now()).unwrap();
        assert_eq!(card.front(), "Q");
        assert_eq!(card.back(), "A");
    }

    #[test]
    fn apply_review_advances_state_and_appends_history() {
        let now = fixed_now();
        let mut card = build_card();
        let scheduler = Scheduler::new();

        let scheduled = scheduler.next_interval(Difficulty::Easy, card.interval_index(), now);
        let entry = ReviewEntry::new(now, Difficulty::Easy, true);
        card.apply_review(&scheduled, false, entry);

        assert!(card.studied());
        assert!(!card.mastered());
        assert_eq!(card.difficulty(), Difficulty::Easy);
        assert_eq!(card.interval_index(), 1);
        assert_eq!(card.next_review_at(), now + Duration::days(3));
        assert_eq!(card.review_history().len(), 1);
        assert!(!card.is_due(now));
    }

    #[test]
    fn history_is_append_only_across_reviews() {
        let now = fixed_now();
        let mut card = build_card();
        let scheduler = Scheduler::new();

        for (i, difficulty) in [Difficulty::Hard, Difficulty::Medium, Difficulty::Easy]
            .into_iter()
            .enumerate()
        {
            let at = now + Duration::days(i as i64);
            let scheduled = scheduler.next_interval(difficulty, card.interval_index(), at);
            card.apply_review(
                &scheduled,
                false,
                ReviewEntry::new(at, difficulty, difficulty == Difficulty::Easy),
            );
            assert_eq!(card.review_history().len(), i + 1);
        }

        assert_eq!(card.review_history()[0].difficulty, Difficulty::Hard);
        assert_eq!(card.review_history()[2].difficulty, Difficulty::Easy);
    }

    #[test]
    fn mastery_sticks_once_earned() {
        let now = fixed_now();
        let mut card = build_card();
        let scheduler = Scheduler::new();

        let scheduled = scheduler.next_interval(Difficulty::Easy, 2, now);
        card.apply_review(&scheduled, true, ReviewEntry::new(now, Difficulty::Easy, true));
        assert!(card.mastered());

        let scheduled = scheduler.next_interval(Difficulty::Hard, card.interval_index(), now);
        card.apply_review(&scheduled, false, ReviewEntry::new(now, Difficulty::Hard, false));
        assert!(card.mastered());
        assert_eq!(card.difficulty(), Difficulty::Hard);
    }

    #[test]
    fn from_persisted_rejects_bad_interval_index() {
        let now = fixed_now();
        let err = Card::from_persisted(
            CardId::new(1),
            DeckId::new(1),
            "Q".into(),
            "A".into(),
            false,
            false,
            Difficulty::Medium,
            9,
            now,
            now,
            Vec::new(),
        )
        .unwrap_err();

        assert!(matches!(err, CardError::InvalidPersistedState(_)));
    }

    #[test]
    fn from_persisted_rejects_due_before_creation() {
        let now = fixed_now();
        let err = Card::from_persisted(
            CardId::new(1),
            DeckId::new(1),
            "Q".into(),
            "A".into(),
            false,
            false,
            Difficulty::Medium,
            0,
            now - Duration::hours(1),
            now,
            Vec::new(),
        )
        .unwrap_err();

        assert!(matches!(err, CardError::InvalidPersistedState(_)));
    }

    #[test]
    fn from_persisted_rejects_mastered_without_studied() {
        let now = fixed_now();
        let err = Card::from_persisted(
            CardId::new(1),
            DeckId::new(1),
            "Q".into(),
            "A".into(),
            false,
            true,
            Difficulty::Easy,
            3,
            now,
            now,
            Vec::new(),
        )
        .unwrap_err();

        assert!(matches!(err, CardError::InvalidPersistedState(_)));
    }

    #[test]
    fn edit_content_preserves_scheduling_state() {
        let now = fixed_now();
        let mut card = build_card();
        let scheduler = Scheduler::new();

        let scheduled = scheduler.next_interval(Difficulty::Easy, 0, now);
        card.apply_review(&scheduled, false, ReviewEntry::new(now, Difficulty::Easy, true));

        card.edit_content("new front", "new back").unwrap();
        assert_eq!(card.front(), "new front");
        assert_eq!(card.interval_index(), 1);
        assert_eq!(card.review_history().len(), 1);

        let err = card.edit_content("", "x").unwrap_err();
        assert_eq!(err, CardError::EmptyFront);
    }
}
