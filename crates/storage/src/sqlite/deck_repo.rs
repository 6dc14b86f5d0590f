use flashcard_core::model::{Deck, DeckId};

use super::SqliteRepository;
use super::mapping::{conn, deck_id_from_i64, deck_id_to_i64, map_deck_row};
use crate::repository::{DeckRepository, NewDeckRecord, StorageError};

#[async_trait::async_trait]
impl DeckRepository for SqliteRepository {
    async fn insert_new_deck(&self, deck: NewDeckRecord) -> Result<DeckId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO decks (name, description, total_cards, studied_cards, mastered_cards, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(deck.name)
        .bind(deck.description)
        .bind(i64::from(deck.stats.total_cards))
        .bind(i64::from(deck.stats.studied_cards))
        .bind(i64::from(deck.stats.mastered_cards))
        .bind(deck.created_at)
        .bind(deck.updated_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        deck_id_from_i64(res.last_insert_rowid())
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, name, description, total_cards, studied_cards, mastered_cards, created_at, updated_at
            FROM decks WHERE id = ?1
            ",
        )
        .bind(deck_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_deck_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_decks(&self, limit: u32) -> Result<Vec<Deck>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, name, description, total_cards, studied_cards, mastered_cards, created_at, updated_at
            FROM decks
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut decks = Vec::with_capacity(rows.len());
        for row in rows {
            decks.push(map_deck_row(&row)?);
        }
        Ok(decks)
    }

    async fn upsert_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO decks (id, name, description, total_cards, studied_cards, mastered_cards, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                -- keep created_at from the original insert; only update mutable fields
                name = excluded.name,
                description = excluded.description,
                total_cards = excluded.total_cards,
                studied_cards = excluded.studied_cards,
                mastered_cards = excluded.mastered_cards,
                updated_at = excluded.updated_at
            ",
        )
        .bind(deck_id_to_i64(deck.id())?)
        .bind(deck.name().to_owned())
        .bind(deck.description().map(ToOwned::to_owned))
        .bind(i64::from(deck.stats().total_cards))
        .bind(i64::from(deck.stats().studied_cards))
        .bind(i64::from(deck.stats().mastered_cards))
        .bind(deck.created_at())
        .bind(deck.updated_at())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<bool, StorageError> {
        // Cards and their history go with the deck via ON DELETE CASCADE.
        let res = sqlx::query("DELETE FROM decks WHERE id = ?1")
            .bind(deck_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        Ok(res.rows_affected() > 0)
    }
}
