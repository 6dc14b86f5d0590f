use thiserror::Error;

use crate::model::{CardError, DeckError, ReviewError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Deck(#[from] DeckError),
    #[error(transparent)]
    Card(#[from] CardError),
    #[error(transparent)]
    Review(#[from] ReviewError),
}
