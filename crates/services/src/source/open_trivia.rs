use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{RawQuestion, TriviaFetcher};
use crate::error::ProviderError;

pub const DEFAULT_OPEN_TRIVIA_URL: &str = "https://opentdb.com/api.php";

#[derive(Clone, Debug)]
pub struct OpenTriviaConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for OpenTriviaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OPEN_TRIVIA_URL.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetches multiple-choice questions from the Open Trivia DB API.
#[derive(Clone)]
pub struct OpenTriviaFetcher {
    client: Client,
    config: OpenTriviaConfig,
}

impl OpenTriviaFetcher {
    /// # Errors
    ///
    /// Returns `ProviderError::Http` if the HTTP client cannot be built.
    pub fn new(config: OpenTriviaConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TriviaFetcher for OpenTriviaFetcher {
    async fn fetch_raw(&self, amount: u32) -> Result<Vec<RawQuestion>, ProviderError> {
        debug!(amount, url = %self.config.base_url, "requesting trivia batch");
        let amount = amount.to_string();
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("amount", amount.as_str()), ("type", "multiple")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: TriviaResponse = response.json().await?;
        body.into_results()
    }
}

#[derive(Debug, Deserialize)]
struct TriviaResponse {
    response_code: u8,
    #[serde(default)]
    results: Vec<RawQuestion>,
}

impl TriviaResponse {
    fn into_results(self) -> Result<Vec<RawQuestion>, ProviderError> {
        if self.response_code != 0 {
            return Err(ProviderError::ResponseCode {
                code: self.response_code,
                reason: response_code_reason(self.response_code),
            });
        }
        if self.results.is_empty() {
            return Err(ProviderError::EmptyBatch);
        }
        Ok(self.results)
    }
}

fn response_code_reason(code: u8) -> &'static str {
    match code {
        1 => "not enough questions for the query",
        2 => "invalid parameter",
        3 => "session token not found",
        4 => "session token exhausted",
        5 => "rate limited",
        _ => "unknown response code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "response_code": 0,
        "results": [
            {
                "type": "multiple",
                "difficulty": "easy",
                "category": "Science &amp; Nature",
                "question": "What is the chemical symbol for &quot;gold&quot;?",
                "correct_answer": "Au",
                "incorrect_answers": ["Ag", "Gd", "Go"]
            }
        ]
    }"#;

    #[test]
    fn parses_successful_payload() {
        let body: TriviaResponse = serde_json::from_str(SAMPLE).unwrap();
        let results = body.into_results().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].correct_answer, "Au");
        assert_eq!(results[0].incorrect_answers, vec!["Ag", "Gd", "Go"]);
        assert!(results[0].question.contains("&quot;"));
    }

    #[test]
    fn non_zero_response_code_is_an_error() {
        let body: TriviaResponse =
            serde_json::from_str(r#"{"response_code": 5, "results": []}"#).unwrap();
        let err = body.into_results().unwrap_err();
        assert!(matches!(
            err,
            ProviderError::ResponseCode {
                code: 5,
                reason: "rate limited"
            }
        ));
    }

    #[test]
    fn empty_results_are_an_error() {
        let body: TriviaResponse = serde_json::from_str(r#"{"response_code": 0}"#).unwrap();
        assert!(matches!(
            body.into_results(),
            Err(ProviderError::EmptyBatch)
        ));
    }

    #[test]
    fn default_config_points_at_open_trivia() {
        let config = OpenTriviaConfig::default();
        assert_eq!(config.base_url, DEFAULT_OPEN_TRIVIA_URL);
        assert_eq!(config.timeout, Duration::from_secs(10));
    }
}
