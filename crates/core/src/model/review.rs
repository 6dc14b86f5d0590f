use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur while handling review data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("invalid difficulty rating: {0}")]
    InvalidDifficulty(String),
}

//
// ─── DIFFICULTY ───────────────────────────────────────────────────────────────
//

/// Three-level difficulty rating for card reviews.
///
/// Each level selects its own interval table in the scheduler:
/// - `Easy`: answer was known; intervals grow fastest
/// - `Medium`: default rating for new cards; moderate growth
/// - `Hard`: answer was not known; intervals grow slowest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Storage encoding of the rating.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Parses a rating, falling back to `Medium` for unrecognized input.
    ///
    /// Used at storage and input boundaries where an unknown rating must not
    /// abort the operation; scheduling then uses the medium interval table.
    #[must_use]
    pub fn parse_lossy(s: &str) -> Self {
        Self::from_str(s).unwrap_or(Difficulty::Medium)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Medium
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ReviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(ReviewError::InvalidDifficulty(other.to_string())),
        }
    }
}

//
// ─── REVIEW ENTRY ─────────────────────────────────────────────────────────────
//

/// One element of a card's append-only review history.
///
/// Records when the card was reviewed, the rating given, and whether the
/// answer counted as correct (rated easy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEntry {
    pub reviewed_at: DateTime<Utc>,
    pub difficulty: Difficulty,
    pub correct: bool,
}

impl ReviewEntry {
    #[must_use]
    pub fn new(reviewed_at: DateTime<Utc>, difficulty: Difficulty, correct: bool) -> Self {
        Self {
            reviewed_at,
            difficulty,
            correct,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_round_trips_through_str() {
        for d in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), d);
        }
    }

    #[test]
    fn strict_parse_rejects_unknown_rating() {
        let err = "impossible".parse::<Difficulty>().unwrap_err();
        assert!(matches!(err, ReviewError::InvalidDifficulty(s) if s == "impossible"));
    }

    #[test]
    fn lossy_parse_falls_back_to_medium() {
        assert_eq!(Difficulty::parse_lossy("easy"), Difficulty::Easy);
        assert_eq!(Difficulty::parse_lossy("impossible"), Difficulty::Medium);
        assert_eq!(Difficulty::parse_lossy(""), Difficulty::Medium);
    }

    #[test]
    fn default_rating_is_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn entry_creation_works() {
        let now = Utc::now();
        let entry = ReviewEntry::new(now, Difficulty::Easy, true);
        assert_eq!(entry.reviewed_at, now);
        assert_eq!(entry.difficulty, Difficulty::Easy);
        assert!(entry.correct);
    }
}
