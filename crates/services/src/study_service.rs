use std::sync::Arc;

use flashcard_core::model::{Card, CardId, DeckId, Difficulty, ReviewEntry};
use flashcard_core::scheduler::{ScheduledReview, Scheduler};
use rand::rng;
use rand::seq::SliceRandom;
use storage::repository::{CardRepository, DeckRepository};

use crate::Clock;
use crate::deck_service::refresh_deck_stats;
use crate::error::StudyServiceError;

//
// ─── STUDY SERVICE ─────────────────────────────────────────────────────────────
//

/// Outcome of answering a card: the updated card plus what the scheduler
/// decided for it.
#[derive(Debug, Clone)]
pub struct AnsweredCard {
    pub card: Card,
    pub scheduled: ScheduledReview,
    pub correct: bool,
    pub mastered: bool,
}

/// Runs the review loop: rates cards, advances their schedule, and keeps
/// deck stats in step.
#[derive(Clone)]
pub struct StudyService {
    clock: Clock,
    scheduler: Scheduler,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
}

impl StudyService {
    #[must_use]
    pub fn new(
        clock: Clock,
        scheduler: Scheduler,
        decks: Arc<dyn DeckRepository>,
        cards: Arc<dyn CardRepository>,
    ) -> Self {
        Self {
            clock,
            scheduler,
            decks,
            cards,
        }
    }

    #[must_use]
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler
    }

    /// Rate a card and persist the advanced scheduling state.
    ///
    /// An easy rating counts as a correct answer. Mastery is judged against
    /// the interval index the card held before this review advanced it, so a
    /// card must have climbed the table across earlier sessions before an
    /// easy rating promotes it. Returns `Ok(None)` when the card does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if repository access fails.
    pub async fn answer_card(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        difficulty: Difficulty,
    ) -> Result<Option<AnsweredCard>, StudyServiceError> {
        let Some(mut card) = self.cards.get_card(deck_id, card_id).await? else {
            return Ok(None);
        };

        let now = self.clock.now();
        let current_index = card.interval_index();
        let scheduled = self.scheduler.next_interval(difficulty, current_index, now);
        let correct = difficulty == Difficulty::Easy;
        let mastered = self.scheduler.is_mastered(difficulty, current_index);

        card.apply_review(&scheduled, mastered, ReviewEntry::new(now, difficulty, correct));
        self.cards.upsert_card(&card).await?;

        tracing::debug!(
            deck_id = %deck_id,
            card_id = %card_id,
            difficulty = %difficulty,
            interval_index = scheduled.interval_index,
            mastered,
            "card reviewed"
        );

        refresh_deck_stats(&*self.decks, &*self.cards, deck_id, now).await?;

        Ok(Some(AnsweredCard {
            card,
            scheduled,
            correct,
            mastered,
        }))
    }

    /// Start a study session over a deck's cards.
    ///
    /// Prefers cards that are due now, then unmastered cards, then the whole
    /// deck, and shuffles the chosen set. Returns `Ok(None)` when the deck
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if repository access fails.
    pub async fn start_session(
        &self,
        deck_id: DeckId,
    ) -> Result<Option<StudySession>, StudyServiceError> {
        if self.decks.get_deck(deck_id).await?.is_none() {
            return Ok(None);
        }

        let now = self.clock.now();
        let all = self.cards.cards_for_deck(deck_id).await?;

        let mut pool: Vec<Card> = all.iter().filter(|c| c.is_due(now)).cloned().collect();
        if pool.is_empty() {
            pool = all.iter().filter(|c| !c.mastered()).cloned().collect();
        }
        if pool.is_empty() {
            pool = all;
        }
        pool.shuffle(&mut rng());

        Ok(Some(StudySession::new(deck_id, pool)))
    }
}

//
// ─── STUDY SESSION ─────────────────────────────────────────────────────────────
//

/// Running tallies for one study session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub total: u32,
    pub studied: u32,
    pub correct: u32,
    pub wrong: u32,
}

impl SessionStats {
    /// Fraction of studied cards answered correctly, 0.0 when none studied.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.studied == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.studied)
    }
}

/// An in-memory walk over a shuffled card queue.
///
/// The session only tracks position and tallies; scheduling side effects go
/// through `StudyService::answer_card`.
#[derive(Debug, Clone)]
pub struct StudySession {
    deck_id: DeckId,
    cards: Vec<Card>,
    position: usize,
    stats: SessionStats,
}

impl StudySession {
    fn new(deck_id: DeckId, cards: Vec<Card>) -> Self {
        let total = u32::try_from(cards.len()).unwrap_or(u32::MAX);
        Self {
            deck_id,
            cards,
            position: 0,
            stats: SessionStats {
                total,
                ..SessionStats::default()
            },
        }
    }

    #[must_use]
    pub fn deck_id(&self) -> DeckId {
        self.deck_id
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Card currently shown, or `None` once the queue is exhausted.
    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        self.cards.get(self.position)
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position >= self.cards.len()
    }

    /// Tally an answer for the current card and advance the queue.
    pub fn record_answer(&mut self, correct: bool) {
        if self.is_finished() {
            return;
        }
        self.stats.studied += 1;
        if correct {
            self.stats.correct += 1;
        } else {
            self.stats.wrong += 1;
        }
        self.position += 1;
    }

    /// Rewind to the start of the queue with fresh tallies.
    pub fn restart(&mut self) {
        self.position = 0;
        self.stats = SessionStats {
            total: self.stats.total,
            ..SessionStats::default()
        };
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
