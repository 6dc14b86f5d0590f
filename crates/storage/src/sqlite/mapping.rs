use flashcard_core::model::{Card, CardId, Deck, DeckId, DeckStats, Difficulty, ReviewEntry};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps a failed query to `StorageError::Connection`, logging the failure.
pub(crate) fn conn(e: sqlx::Error) -> StorageError {
    tracing::warn!(error = %e, "sqlite query failed");
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn deck_id_from_i64(v: i64) -> Result<DeckId, StorageError> {
    Ok(DeckId::new(i64_to_u64("deck_id", v)?))
}

pub(crate) fn card_id_from_i64(v: i64) -> Result<CardId, StorageError> {
    Ok(CardId::new(i64_to_u64("card_id", v)?))
}

pub(crate) fn deck_id_to_i64(id: DeckId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("deck_id overflow".into()))
}

pub(crate) fn card_id_to_i64(id: CardId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("card_id overflow".into()))
}

pub(crate) fn map_deck_row(row: &SqliteRow) -> Result<Deck, StorageError> {
    let stats = DeckStats {
        total_cards: i64_to_u32("total_cards", row.try_get("total_cards").map_err(ser)?)?,
        studied_cards: i64_to_u32("studied_cards", row.try_get("studied_cards").map_err(ser)?)?,
        mastered_cards: i64_to_u32("mastered_cards", row.try_get("mastered_cards").map_err(ser)?)?,
    };

    Deck::from_persisted(
        deck_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        stats,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}

/// Rebuilds a card from its row plus the stitched-on review history.
pub(crate) fn map_card_row(
    row: &SqliteRow,
    review_history: Vec<ReviewEntry>,
) -> Result<Card, StorageError> {
    let difficulty_str: String = row.try_get("difficulty").map_err(ser)?;

    let interval_index_i64: i64 = row.try_get("interval_index").map_err(ser)?;
    let interval_index = u8::try_from(interval_index_i64).map_err(|_| {
        StorageError::Serialization(format!("invalid interval_index: {interval_index_i64}"))
    })?;

    Card::from_persisted(
        card_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        deck_id_from_i64(row.try_get::<i64, _>("deck_id").map_err(ser)?)?,
        row.try_get::<String, _>("front").map_err(ser)?,
        row.try_get::<String, _>("back").map_err(ser)?,
        row.try_get::<i64, _>("studied").map_err(ser)? != 0,
        row.try_get::<i64, _>("mastered").map_err(ser)? != 0,
        // Unknown ratings from older data degrade to medium rather than
        // failing the whole read.
        Difficulty::parse_lossy(&difficulty_str),
        interval_index,
        row.try_get("next_review_at").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        review_history,
    )
    .map_err(ser)
}

pub(crate) fn map_history_row(row: &SqliteRow) -> Result<ReviewEntry, StorageError> {
    let difficulty_str: String = row.try_get("difficulty").map_err(ser)?;
    Ok(ReviewEntry {
        reviewed_at: row.try_get("reviewed_at").map_err(ser)?,
        difficulty: Difficulty::parse_lossy(&difficulty_str),
        correct: row.try_get::<i64, _>("correct").map_err(ser)? != 0,
    })
}
