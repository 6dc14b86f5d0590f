use std::sync::Arc;

use chrono::{DateTime, Utc};
use flashcard_core::model::{Deck, DeckId, DeckStats, DeckUpdate};
use storage::repository::{CardRepository, DeckRepository, NewDeckRecord, StorageError};

use crate::Clock;
use crate::error::DeckServiceError;

/// Orchestrates deck creation, updates, and stats maintenance.
#[derive(Clone)]
pub struct DeckService {
    clock: Clock,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
}

impl DeckService {
    #[must_use]
    pub fn new(clock: Clock, decks: Arc<dyn DeckRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self { clock, decks, cards }
    }

    /// Create a new deck and persist it.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Deck` for validation failures.
    /// Returns `DeckServiceError::Storage` if persistence fails.
    pub async fn create_deck(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<DeckId, DeckServiceError> {
        let now = self.clock.now();
        // The repository assigns the real ID on insert.
        let deck = Deck::new(DeckId::new(1), name, description, now)?;
        let deck_id = self
            .decks
            .insert_new_deck(NewDeckRecord::from_deck(&deck))
            .await?;
        Ok(deck_id)
    }

    /// List decks ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn list_decks(&self, limit: u32) -> Result<Vec<Deck>, DeckServiceError> {
        let decks = self.decks.list_decks(limit).await?;
        Ok(decks)
    }

    /// Fetch a deck by ID.
    ///
    /// Returns `Ok(None)` when the deck does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn get_deck(&self, deck_id: DeckId) -> Result<Option<Deck>, DeckServiceError> {
        let deck = self.decks.get_deck(deck_id).await?;
        Ok(deck)
    }

    /// Apply a partial update to a deck and persist it.
    ///
    /// Returns the updated deck, or `Ok(None)` when the deck does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Deck` if validation fails.
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn update_deck(
        &self,
        deck_id: DeckId,
        update: DeckUpdate,
    ) -> Result<Option<Deck>, DeckServiceError> {
        let Some(mut deck) = self.decks.get_deck(deck_id).await? else {
            return Ok(None);
        };

        deck.apply_update(update, self.clock.now())?;
        self.decks.upsert_deck(&deck).await?;
        Ok(Some(deck))
    }

    /// Delete a deck and, through the repository, all of its cards.
    ///
    /// Returns `false` when no such deck existed.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn delete_deck(&self, deck_id: DeckId) -> Result<bool, DeckServiceError> {
        let deleted = self.decks.delete_deck(deck_id).await?;
        if deleted {
            tracing::info!(deck_id = %deck_id, "deck deleted with its cards");
        }
        Ok(deleted)
    }

    /// Recompute a deck's cached stats from its current card list.
    ///
    /// Returns the fresh stats, or `Ok(None)` when the deck does not exist.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::Storage` if repository access fails.
    pub async fn refresh_stats(
        &self,
        deck_id: DeckId,
    ) -> Result<Option<DeckStats>, DeckServiceError> {
        let stats =
            refresh_deck_stats(&*self.decks, &*self.cards, deck_id, self.clock.now()).await?;
        Ok(stats)
    }
}

/// Recomputes and persists a deck's stats from its card list.
///
/// Shared by every service that mutates cards, so the cached counts never
/// drift from the card table for long.
pub(crate) async fn refresh_deck_stats(
    decks: &dyn DeckRepository,
    cards: &dyn CardRepository,
    deck_id: DeckId,
    now: DateTime<Utc>,
) -> Result<Option<DeckStats>, StorageError> {
    let Some(mut deck) = decks.get_deck(deck_id).await? else {
        return Ok(None);
    };

    let card_list = cards.cards_for_deck(deck_id).await?;
    let stats = DeckStats::from_cards(&card_list);
    deck.set_stats(stats, now);
    decks.upsert_deck(&deck).await?;
    Ok(Some(stats))
}

#[cfg(test)]
mod tests {
    use super::*;

    use flashcard_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: InMemoryRepository) -> DeckService {
        let repo = Arc::new(repo);
        DeckService::new(fixed_clock(), repo.clone(), repo)
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let service = service(InMemoryRepository::new());

        let deck_id = service
            .create_deck("Spanish".to_string(), Some("vocab".to_string()))
            .await
            .unwrap();

        let fetched = service.get_deck(deck_id).await.unwrap().unwrap();
        assert_eq!(fetched.name(), "Spanish");
        assert_eq!(fetched.description(), Some("vocab"));
        assert_eq!(fetched.stats(), DeckStats::default());
    }

    #[tokio::test]
    async fn get_unknown_deck_returns_none() {
        let service = service(InMemoryRepository::new());
        let fetched = service.get_deck(DeckId::new(404)).await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn update_merges_only_provided_fields() {
        let service = service(InMemoryRepository::new());
        let deck_id = service
            .create_deck("Before".to_string(), Some("keep me".to_string()))
            .await
            .unwrap();

        let updated = service
            .update_deck(deck_id, DeckUpdate::rename("After"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name(), "After");
        assert_eq!(updated.description(), Some("keep me"));

        let cleared = service
            .update_deck(
                deck_id,
                DeckUpdate {
                    name: None,
                    description: Some(None),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.name(), "After");
        assert_eq!(cleared.description(), None);
    }

    #[tokio::test]
    async fn update_unknown_deck_returns_none() {
        let service = service(InMemoryRepository::new());
        let result = service
            .update_deck(DeckId::new(404), DeckUpdate::rename("x"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_rejects_empty_name() {
        let service = service(InMemoryRepository::new());
        let deck_id = service.create_deck("Keep".to_string(), None).await.unwrap();

        let err = service
            .update_deck(deck_id, DeckUpdate::rename("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, DeckServiceError::Deck(_)));

        let untouched = service.get_deck(deck_id).await.unwrap().unwrap();
        assert_eq!(untouched.name(), "Keep");
    }

    #[tokio::test]
    async fn delete_reports_whether_deck_existed() {
        let service = service(InMemoryRepository::new());
        let deck_id = service.create_deck("Doomed".to_string(), None).await.unwrap();

        assert!(service.delete_deck(deck_id).await.unwrap());
        assert!(!service.delete_deck(deck_id).await.unwrap());
        assert!(service.get_deck(deck_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refresh_stats_on_unknown_deck_returns_none() {
        let service = service(InMemoryRepository::new());
        let stats = service.refresh_stats(DeckId::new(404)).await.unwrap();
        assert!(stats.is_none());
    }

    #[tokio::test]
    async fn refresh_stats_counts_from_card_list() {
        let repo = InMemoryRepository::new();
        let service = service(repo.clone());
        let deck_id = service.create_deck("Counted".to_string(), None).await.unwrap();

        use flashcard_core::model::{Card, CardId, Difficulty, ReviewEntry};
        use flashcard_core::scheduler::Scheduler;
        use storage::repository::{CardRepository, NewCardRecord};

        let now = fixed_now();
        let scheduler = Scheduler::new();
        for i in 0..3 {
            let card = Card::new(CardId::new(1), deck_id, format!("Q{i}"), "A", now).unwrap();
            let id = repo
                .insert_new_card(NewCardRecord::from_card(&card))
                .await
                .unwrap();
            if i > 0 {
                let mut stored = repo.get_card(deck_id, id).await.unwrap().unwrap();
                let scheduled = scheduler.next_interval(Difficulty::Easy, 2, now);
                stored.apply_review(
                    &scheduled,
                    i == 2,
                    ReviewEntry::new(now, Difficulty::Easy, true),
                );
                repo.upsert_card(&stored).await.unwrap();
            }
        }

        let stats = service.refresh_stats(deck_id).await.unwrap().unwrap();
        assert_eq!(stats.total_cards, 3);
        assert_eq!(stats.studied_cards, 2);
        assert_eq!(stats.mastered_cards, 1);
        assert!(stats.mastered_cards <= stats.studied_cards);
        assert!(stats.studied_cards <= stats.total_cards);

        let persisted = service.get_deck(deck_id).await.unwrap().unwrap();
        assert_eq!(persisted.stats(), stats);
    }
}
