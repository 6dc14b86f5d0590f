use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flashcard_core::model::{Card, CardId, Deck, DeckId, DeckStats, Difficulty};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a deck before storage has assigned its identifier.
#[derive(Debug, Clone)]
pub struct NewDeckRecord {
    pub name: String,
    pub description: Option<String>,
    pub stats: DeckStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewDeckRecord {
    #[must_use]
    pub fn from_deck(deck: &Deck) -> Self {
        Self {
            name: deck.name().to_owned(),
            description: deck.description().map(str::to_owned),
            stats: deck.stats(),
            created_at: deck.created_at(),
            updated_at: deck.updated_at(),
        }
    }
}

/// Insert shape for a card before storage has assigned its identifier.
///
/// New cards carry no review history, so none is included here.
#[derive(Debug, Clone)]
pub struct NewCardRecord {
    pub deck_id: DeckId,
    pub front: String,
    pub back: String,
    pub studied: bool,
    pub mastered: bool,
    pub difficulty: Difficulty,
    pub interval_index: u8,
    pub next_review_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewCardRecord {
    #[must_use]
    pub fn from_card(card: &Card) -> Self {
        Self {
            deck_id: card.deck_id(),
            front: card.front().to_owned(),
            back: card.back().to_owned(),
            studied: card.studied(),
            mastered: card.mastered(),
            difficulty: card.difficulty(),
            interval_index: card.interval_index(),
            next_review_at: card.next_review_at(),
            created_at: card.created_at(),
        }
    }
}

/// Repository contract for decks.
#[async_trait]
pub trait DeckRepository: Send + Sync {
    /// Persist a new deck and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deck cannot be stored.
    async fn insert_new_deck(&self, deck: NewDeckRecord) -> Result<DeckId, StorageError>;

    /// Fetch a deck by ID.
    ///
    /// Unknown IDs yield `Ok(None)` rather than an error; callers decide the
    /// fallback.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError>;

    /// List decks ordered by ID, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_decks(&self, limit: u32) -> Result<Vec<Deck>, StorageError>;

    /// Persist or update a deck.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the deck cannot be stored.
    async fn upsert_deck(&self, deck: &Deck) -> Result<(), StorageError>;

    /// Delete a deck, cascading to its cards and their review history.
    ///
    /// Returns `false` when no deck with the ID existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_deck(&self, id: DeckId) -> Result<bool, StorageError>;
}

/// Repository contract for cards.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Persist a new card and return its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the card cannot be stored.
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError>;

    /// Fetch a card by deck and card ID; unknown IDs yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_card(&self, deck_id: DeckId, id: CardId) -> Result<Option<Card>, StorageError>;

    /// List all cards of a deck in insertion order.
    ///
    /// An unknown deck yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError>;

    /// Persist or update a card, appending any new review history entries.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the card cannot be stored.
    async fn upsert_card(&self, card: &Card) -> Result<(), StorageError>;

    /// Delete a card and its review history.
    ///
    /// Returns `false` when no such card existed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn delete_card(&self, deck_id: DeckId, id: CardId) -> Result<bool, StorageError>;

    /// Cards of a deck whose next review is at or before `now`.
    ///
    /// A plain filter in insertion order; no priority ordering is implied.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn due_cards(
        &self,
        deck_id: DeckId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    decks: Arc<Mutex<HashMap<DeckId, Deck>>>,
    cards: Arc<Mutex<HashMap<(DeckId, CardId), Card>>>,
    next_deck_id: Arc<Mutex<u64>>,
    next_card_id: Arc<Mutex<u64>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(counter: &Arc<Mutex<u64>>) -> Result<u64, StorageError> {
        let mut guard = counter
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard += 1;
        Ok(*guard)
    }
}

#[async_trait]
impl DeckRepository for InMemoryRepository {
    async fn insert_new_deck(&self, deck: NewDeckRecord) -> Result<DeckId, StorageError> {
        let id = DeckId::new(Self::next_id(&self.next_deck_id)?);
        let stored = Deck::from_persisted(
            id,
            deck.name,
            deck.description,
            deck.stats,
            deck.created_at,
            deck.updated_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, stored);
        Ok(id)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Option<Deck>, StorageError> {
        let guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_decks(&self, limit: u32) -> Result<Vec<Deck>, StorageError> {
        let guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut decks: Vec<Deck> = guard.values().cloned().collect();
        decks.sort_by_key(|d| d.id().value());
        decks.truncate(limit as usize);
        Ok(decks)
    }

    async fn upsert_deck(&self, deck: &Deck) -> Result<(), StorageError> {
        let mut guard = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(deck.id(), deck.clone());
        Ok(())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<bool, StorageError> {
        let mut decks = self
            .decks
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let existed = decks.remove(&id).is_some();
        drop(decks);

        if existed {
            let mut cards = self
                .cards
                .lock()
                .map_err(|e| StorageError::Connection(e.to_string()))?;
            cards.retain(|(deck_id, _), _| *deck_id != id);
        }
        Ok(existed)
    }
}

#[async_trait]
impl CardRepository for InMemoryRepository {
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError> {
        let id = CardId::new(Self::next_id(&self.next_card_id)?);
        let stored = Card::from_persisted(
            id,
            card.deck_id,
            card.front,
            card.back,
            card.studied,
            card.mastered,
            card.difficulty,
            card.interval_index,
            card.next_review_at,
            card.created_at,
            Vec::new(),
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((stored.deck_id(), id), stored);
        Ok(id)
    }

    async fn get_card(&self, deck_id: DeckId, id: CardId) -> Result<Option<Card>, StorageError> {
        let guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(deck_id, id)).cloned())
    }

    async fn cards_for_deck(&self, deck_id: DeckId) -> Result<Vec<Card>, StorageError> {
        let guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut cards: Vec<Card> = guard
            .values()
            .filter(|card| card.deck_id() == deck_id)
            .cloned()
            .collect();
        cards.sort_by_key(|card| card.id().value());
        Ok(cards)
    }

    async fn upsert_card(&self, card: &Card) -> Result<(), StorageError> {
        let mut guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((card.deck_id(), card.id()), card.clone());
        Ok(())
    }

    async fn delete_card(&self, deck_id: DeckId, id: CardId) -> Result<bool, StorageError> {
        let mut guard = self
            .cards
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.remove(&(deck_id, id)).is_some())
    }

    async fn due_cards(
        &self,
        deck_id: DeckId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Card>, StorageError> {
        let mut cards = self.cards_for_deck(deck_id).await?;
        cards.retain(|card| card.is_due(now));
        Ok(cards)
    }
}

/// Aggregates deck and card repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub decks: Arc<dyn DeckRepository>,
    pub cards: Arc<dyn CardRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let decks: Arc<dyn DeckRepository> = Arc::new(repo.clone());
        let cards: Arc<dyn CardRepository> = Arc::new(repo);
        Self { decks, cards }
    }
}
