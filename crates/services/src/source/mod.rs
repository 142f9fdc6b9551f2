//! Question supply: the `QuestionSource` capability and its batched,
//! HTTP-backed implementation.

mod batched;
mod open_trivia;

use async_trait::async_trait;
use serde::Deserialize;
use trivia_core::model::Question;

use crate::error::ProviderError;

pub use batched::BatchedTriviaSource;
pub use open_trivia::{DEFAULT_OPEN_TRIVIA_URL, OpenTriviaConfig, OpenTriviaFetcher};

/// Produces one normalized question per call.
///
/// Every successful call returns a question that satisfies the
/// `Question` invariant. Implementations may cache internally but must not
/// have other side effects.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `ProviderError` when fetching or decoding fails.
    async fn fetch_question(&self) -> Result<Question, ProviderError>;
}

/// One undecoded record as served by the trivia endpoint.
///
/// Strings may still contain HTML entities.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawQuestion {
    pub question: String,
    pub correct_answer: String,
    pub incorrect_answers: Vec<String>,
}

/// Transport seam: fetch `amount` raw records in one round trip.
#[async_trait]
pub trait TriviaFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns `ProviderError` for network, status, or payload failures.
    async fn fetch_raw(&self, amount: u32) -> Result<Vec<RawQuestion>, ProviderError>;
}
