use std::sync::Arc;

use flashcard_core::model::{Card, CardId, DeckId};
use storage::repository::{CardRepository, DeckRepository, NewCardRecord};

use crate::Clock;
use crate::deck_service::refresh_deck_stats;
use crate::error::CardServiceError;

/// Orchestrates card CRUD and keeps the owning deck's stats current.
#[derive(Clone)]
pub struct CardService {
    clock: Clock,
    decks: Arc<dyn DeckRepository>,
    cards: Arc<dyn CardRepository>,
}

impl CardService {
    #[must_use]
    pub fn new(clock: Clock, decks: Arc<dyn DeckRepository>, cards: Arc<dyn CardRepository>) -> Self {
        Self { clock, decks, cards }
    }

    /// Add a card to a deck and refresh the deck's stats.
    ///
    /// Returns `Ok(None)` when the deck does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Card` for validation failures.
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn add_card(
        &self,
        deck_id: DeckId,
        front: String,
        back: String,
    ) -> Result<Option<CardId>, CardServiceError> {
        let now = self.clock.now();
        if self.decks.get_deck(deck_id).await?.is_none() {
            return Ok(None);
        }

        // The repository assigns the real ID on insert.
        let card = Card::new(CardId::new(1), deck_id, front, back, now)?;
        let card_id = self
            .cards
            .insert_new_card(NewCardRecord::from_card(&card))
            .await?;

        refresh_deck_stats(&*self.decks, &*self.cards, deck_id, now).await?;
        Ok(Some(card_id))
    }

    /// Fetch a card by deck and card ID; unknown IDs yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn get_card(
        &self,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<Option<Card>, CardServiceError> {
        let card = self.cards.get_card(deck_id, card_id).await?;
        Ok(card)
    }

    /// List all cards of a deck in insertion order.
    ///
    /// An unknown deck yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn list_cards(&self, deck_id: DeckId) -> Result<Vec<Card>, CardServiceError> {
        let cards = self.cards.cards_for_deck(deck_id).await?;
        Ok(cards)
    }

    /// Replace a card's front and back text, preserving its scheduling state.
    ///
    /// Returns the updated card, or `Ok(None)` when the card does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Card` for validation failures.
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn update_card(
        &self,
        deck_id: DeckId,
        card_id: CardId,
        front: String,
        back: String,
    ) -> Result<Option<Card>, CardServiceError> {
        let Some(mut card) = self.cards.get_card(deck_id, card_id).await? else {
            return Ok(None);
        };

        card.edit_content(front, back)?;
        self.cards.upsert_card(&card).await?;
        Ok(Some(card))
    }

    /// Delete a card and refresh the deck's stats.
    ///
    /// Returns `false` when no such card existed.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn delete_card(
        &self,
        deck_id: DeckId,
        card_id: CardId,
    ) -> Result<bool, CardServiceError> {
        let deleted = self.cards.delete_card(deck_id, card_id).await?;
        if deleted {
            refresh_deck_stats(&*self.decks, &*self.cards, deck_id, self.clock.now()).await?;
        }
        Ok(deleted)
    }

    /// Cards of a deck that are due for review right now.
    ///
    /// An unknown deck yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `CardServiceError::Storage` if repository access fails.
    pub async fn cards_for_review(&self, deck_id: DeckId) -> Result<Vec<Card>, CardServiceError> {
        let due = self.cards.due_cards(deck_id, self.clock.now()).await?;
        Ok(due)
    }
}
