use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Difficulty;

//
// ─── INTERVAL TABLES ───────────────────────────────────────────────────────────
//

/// Number of entries in every per-difficulty interval table.
pub const SCHEDULE_STEPS: usize = 6;

const EASY_DAYS: [i64; SCHEDULE_STEPS] = [1, 3, 7, 14, 30, 60];
const MEDIUM_DAYS: [i64; SCHEDULE_STEPS] = [1, 2, 5, 10, 21, 45];
const HARD_DAYS: [i64; SCHEDULE_STEPS] = [1, 1, 3, 7, 14, 30];

/// Day offsets for a difficulty rating, from shortest to longest.
///
/// Easy grows fastest, hard grows slowest. All tables share
/// `SCHEDULE_STEPS` entries so a card's interval index is valid for any
/// rating it may receive later.
#[must_use]
pub fn day_offsets(difficulty: Difficulty) -> &'static [i64; SCHEDULE_STEPS] {
    match difficulty {
        Difficulty::Easy => &EASY_DAYS,
        Difficulty::Medium => &MEDIUM_DAYS,
        Difficulty::Hard => &HARD_DAYS,
    }
}

//
// ─── SCHEDULED REVIEW ──────────────────────────────────────────────────────────
//

/// Result of scheduling a review: the advanced interval index and due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReview {
    pub interval_index: u8,
    pub due_at: DateTime<Utc>,
}

//
// ─── MASTERY POLICY ────────────────────────────────────────────────────────────
//

/// Business rule for when a card counts as mastered.
///
/// A card is mastered when it was rated easy while already at or past the
/// configured interval index. The threshold is a policy knob rather than a
/// hard-coded rule; the default of 2 means the card must have survived two
/// interval advances before an easy rating promotes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryPolicy {
    pub min_interval_index: u8,
}

impl MasteryPolicy {
    #[must_use]
    pub fn new(min_interval_index: u8) -> Self {
        Self { min_interval_index }
    }

    /// Whether a rating at the given (pre-advance) interval index masters the card.
    #[must_use]
    pub fn is_mastered(&self, difficulty: Difficulty, interval_index: u8) -> bool {
        difficulty == Difficulty::Easy && interval_index >= self.min_interval_index
    }
}

impl Default for MasteryPolicy {
    fn default() -> Self {
        Self {
            min_interval_index: 2,
        }
    }
}

//
// ─── SCHEDULER ─────────────────────────────────────────────────────────────────
//

/// Interval-table scheduler for spaced repetition.
///
/// Maps a difficulty rating and a card's current interval index to the next
/// index and due date using fixed per-difficulty day-offset tables. The
/// index advances monotonically and saturates at the last table entry; it
/// never resets here. Pure and deterministic: the current time is injected
/// by the caller.
///
/// # Examples
///
/// ```
/// # use flashcard_core::scheduler::Scheduler;
/// # use flashcard_core::model::Difficulty;
/// let scheduler = Scheduler::new();
/// let now = chrono::Utc::now();
/// let next = scheduler.next_interval(Difficulty::Easy, 0, now);
///
/// assert_eq!(next.interval_index, 1);
/// assert_eq!(next.due_at, now + chrono::Duration::days(3));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    mastery: MasteryPolicy,
}

impl Scheduler {
    /// Create a scheduler with the default mastery policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scheduler with a custom mastery policy.
    #[must_use]
    pub fn with_mastery_policy(mastery: MasteryPolicy) -> Self {
        Self { mastery }
    }

    #[must_use]
    pub fn mastery_policy(&self) -> MasteryPolicy {
        self.mastery
    }

    /// Compute the next interval index and due date for a review.
    ///
    /// `new_index = min(current_index + 1, SCHEDULE_STEPS - 1)`; the due
    /// date is `now` plus the day offset at the new index. An out-of-range
    /// `current_index` is clamped into the table before advancing, so the
    /// function is total.
    #[must_use]
    pub fn next_interval(
        &self,
        difficulty: Difficulty,
        current_index: u8,
        now: DateTime<Utc>,
    ) -> ScheduledReview {
        let table = day_offsets(difficulty);
        let current = usize::from(current_index).min(SCHEDULE_STEPS - 1);
        let new_index = (current + 1).min(SCHEDULE_STEPS - 1);

        ScheduledReview {
            // new_index < SCHEDULE_STEPS <= u8::MAX, so the cast is lossless
            #[allow(clippy::cast_possible_truncation)]
            interval_index: new_index as u8,
            due_at: now + Duration::days(table[new_index]),
        }
    }

    /// Whether a rating at the card's current interval index masters it.
    ///
    /// Delegates to the configured `MasteryPolicy`; the index is the one the
    /// card held before this review advanced it.
    #[must_use]
    pub fn is_mastered(&self, difficulty: Difficulty, current_index: u8) -> bool {
        self.mastery.is_mastered(difficulty, current_index)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
