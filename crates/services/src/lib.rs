#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod history_service;
pub mod session;
pub mod source;

pub use trivia_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, HistoryServiceError, ProviderError, SessionError};
pub use history_service::{HistoryListItem, HistoryService};
pub use session::SessionController;
pub use source::{
    BatchedTriviaSource, OpenTriviaConfig, OpenTriviaFetcher, QuestionSource, RawQuestion,
    TriviaFetcher,
};
