#![forbid(unsafe_code)]

pub mod card_service;
pub mod deck_service;
pub mod error;
pub mod quiz;
pub mod study_service;

pub use flashcard_core::Clock;

pub use error::{CardServiceError, DeckServiceError, StudyServiceError};

pub use card_service::CardService;
pub use deck_service::DeckService;
pub use quiz::{QuizDeckCheck, generate_options, validate_quiz_deck};
pub use study_service::{AnsweredCard, SessionStats, StudyService, StudySession};
