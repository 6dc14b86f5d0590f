use std::collections::HashMap;

use chrono::{DateTime, Utc};
use flashcard_core::model::{Card, CardId, DeckId, ReviewEntry};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    card_id_from_i64, card_id_to_i64, conn, deck_id_to_i64, map_card_row, map_history_row, ser,
};
use crate::repository::{CardRepository, NewCardRecord, StorageError};

impl SqliteRepository {
    /// All review history rows of a deck, grouped by card ID in recorded order.
    async fn history_for_deck(
        &self,
        deck: i64,
    ) -> Result<HashMap<i64, Vec<ReviewEntry>>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT card_id, reviewed_at, difficulty, correct
            FROM review_history
            WHERE deck_id = ?1
            ORDER BY card_id ASC, id ASC
            ",
        )
        .bind(deck)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_card: HashMap<i64, Vec<ReviewEntry>> = HashMap::new();
        for row in rows {
            let card_id: i64 = row.try_get("card_id").map_err(ser)?;
            by_card.entry(card_id).or_default().push(map_history_row(&row)?);
        }
        Ok(by_card)
    }
}

#[async_trait::async_trait]
impl CardRepository for SqliteRepository {
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO cards (deck_id, front, back, studied, mastered, difficulty, interval_index, next_review_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ",
        )
        .bind(deck_id_to_i64(card.deck_id)?)
        .bind(card.front)
        .bind(card.back)
        .bind(i64::from(card.studied))
        .bind(i64::from(card.mastered))
        .bind(card.difficulty.as_str())
        .bind(i64::from(card.interval_index))
        .bind(card.next_review_at)
        .bind(card.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        card_id_from_i64(res.last_insert_rowid())
    }

    async fn get_card(&self, deck_id: DeckId, id: CardId) -> Result<Option<Card>, StorageError> {
        let deck = deck_id_to_i64(deck_id)?;
        let card = card_id_to_i64(id)?;

        let row = sqlx::query(
            r"
            SELECT id, deck_id, front, back, studied, mastered, difficulty, interval_index, next_review_at, created_at
            FROM cards
            WHERE deck_id = ?1 AND id = ?2
            ",
        )
        .bind(deck)
        .bind(card)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let history_rows = sqlx::query(
            r"
            SELECT card_id, reviewed_at, difficulty, correct
            FROM review_history
            WHERE deck_id = ?1 AND card_id = ?2
            ORDER BY id ASC
            ",
        )
        .bind(deck)
        .bind(card)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut history = Vec::with_capacity(history_rows.len());
        for row in history_rows {
            history.push(map_history_row(&row)?);
        }

        map_card_row(&row, history).map(Some)
    }

    async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
        let deck = deck_id_to_i64(deck_id)?;

        let rows = sqlx::query(
            r"
            SELECT id, deck_id, front, back, studied, mastered, difficulty, interval_index, next_review_at, created_at
            FROM cards
            WHERE deck_id = ?1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(deck)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_card = self.history_for_deck(deck).await?;

        let mut cards = Vec::with_capacity(rows.len());
        for row in rows {
            let card_id: i64 = row.try_get("id").map_err(ser)?;
            let history = by_card.remove(&card_id).unwrap_or_default();
            cards.push(map_card_row(&row, history)?);
        }
        Ok(cards)
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), StorageError> {
        let deck = deck_id_to_i64(card.deck_id())?;
        let id = card_id_to_i64(card.id())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO cards (id, deck_id, front, back, studied, mastered, difficulty, interval_index, next_review_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                front = excluded.front,
                back = excluded.back,
                studied = excluded.studied,
                mastered = excluded.mastered,
                difficulty = excluded.difficulty,
                interval_index = excluded.interval_index,
                next_review_at = excluded.next_review_at
            ",
        )
        .bind(id)
        .bind(deck)
        .bind(card.front().to_owned())
        .bind(card.back().to_owned())
        .bind(i64::from(card.studied()))
        .bind(i64::from(card.mastered()))
        .bind(card.difficulty().as_str())
        .bind(i64::from(card.interval_index()))
        .bind(card.next_review_at())
        .bind(card.created_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        // History is append-only: persist only the entries past what is
        // already stored.
        let stored: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM review_history WHERE deck_id = ?1 AND card_id = ?2",
        )
        .bind(deck)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?;

        let stored = usize::try_from(stored)
            .map_err(|_| StorageError::Serialization("history count overflow".into()))?;
        if stored > card.review_history().len() {
            return Err(StorageError::Conflict);
        }

        for entry in &card.review_history()[stored..] {
            sqlx::query(
                r"
                INSERT INTO review_history (deck_id, card_id, reviewed_at, difficulty, correct)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
            )
            .bind(deck)
            .bind(id)
            .bind(entry.reviewed_at)
            .bind(entry.difficulty.as_str())
            .bind(i64::from(entry.correct))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn delete_card(&self, deck_id: DeckId, id: CardId) -> Result<bool, StorageError> {
        // History rows go with the card via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM cards WHERE deck_id = ?1 AND id = ?2")
            .bind(deck_id_to_i64(deck_id)?)
            .bind(card_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }

    async fn due_cards(
        &self,
        deck_id: DeckId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>, StorageError> {
        let deck = deck_id_to_i64(deck_id)?;

        let rows = sqlx::query(
            r"
            SELECT id, deck_id, front, back, studied, mastered, difficulty, interval_index, next_review_at, created_at
            FROM cards
            WHERE deck_id = ?1
              AND next_review_at <= ?2
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(deck)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut by_card = self.history_for_deck(deck).await?;

        let mut cards = Vec::with_capacity(rows.len());
        for row in rows {
            let card_id: i64 = row.try_get("id").map_err(ser)?;
            let history = by_card.remove(&card_id).unwrap_or_default();
            cards.push(map_card_row(&row, history)?);
        }
        Ok(cards)
    }
}
