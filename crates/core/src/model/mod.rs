mod card;
mod deck;
mod ids;
mod review;

pub use ids::{CardId, DeckId, ParseIdError};

pub use card::{Card, CardError};
pub use deck::{Deck, DeckError, DeckStats, DeckUpdate};
pub use review::{Difficulty, ReviewEntry, ReviewError};
