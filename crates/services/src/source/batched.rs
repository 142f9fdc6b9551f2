use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use trivia_core::model::{DEFAULT_BATCH_SIZE, Question};

use super::{QuestionSource, RawQuestion, TriviaFetcher};
use crate::error::ProviderError;

/// Questions from the last fetch plus a read cursor.
#[derive(Debug, Default)]
struct QuestionBatch {
    questions: Vec<Question>,
    cursor: usize,
}

impl QuestionBatch {
    fn is_exhausted(&self) -> bool {
        self.cursor >= self.questions.len()
    }

    fn remaining(&self) -> usize {
        self.questions.len().saturating_sub(self.cursor)
    }

    fn take_next(&mut self) -> Option<Question> {
        let question = self.questions.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(question)
    }
}

/// `QuestionSource` that fetches questions in batches and serves them in order.
///
/// A new batch is requested only once the current one is fully consumed. The
/// batch lock is held across the refill, so concurrent callers wait on the
/// single in-flight request instead of issuing their own.
pub struct BatchedTriviaSource {
    fetcher: Arc<dyn TriviaFetcher>,
    batch_size: u32,
    batch: Mutex<QuestionBatch>,
    rng: StdMutex<StdRng>,
}

impl BatchedTriviaSource {
    #[must_use]
    pub fn new(fetcher: Arc<dyn TriviaFetcher>) -> Self {
        Self {
            fetcher,
            batch_size: DEFAULT_BATCH_SIZE,
            batch: Mutex::new(QuestionBatch::default()),
            rng: StdMutex::new(StdRng::from_os_rng()),
        }
    }

    /// Amount requested on automatic refills. Zero is ignored.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size;
        }
        self
    }

    /// Use a seeded RNG so answer order is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdMutex::new(StdRng::seed_from_u64(seed));
        self
    }

    #[must_use]
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Number of loaded questions not yet handed out.
    pub async fn remaining(&self) -> usize {
        self.batch.lock().await.remaining()
    }

    /// Fetch `amount` questions and replace the current batch.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if `amount` is zero, the fetch fails, or no
    /// record can be turned into a valid question. The previous batch is kept
    /// on failure.
    pub async fn load_batch(&self, amount: u32) -> Result<(), ProviderError> {
        let mut batch = self.batch.lock().await;
        self.load_into(&mut batch, amount).await
    }

    async fn load_into(&self, batch: &mut QuestionBatch, amount: u32) -> Result<(), ProviderError> {
        if amount == 0 {
            return Err(ProviderError::InvalidAmount);
        }

        let raw = self.fetcher.fetch_raw(amount).await.inspect_err(|err| {
            warn!(amount, error = %err, "trivia batch fetch failed");
        })?;
        if raw.is_empty() {
            return Err(ProviderError::EmptyBatch);
        }

        let questions = self.normalize(raw)?;
        debug!(count = questions.len(), "loaded trivia batch");
        *batch = QuestionBatch {
            questions,
            cursor: 0,
        };
        Ok(())
    }

    /// Build questions from raw records, skipping records that do not form a
    /// valid question. Fails only when no record in the batch is usable.
    fn normalize(&self, raw: Vec<RawQuestion>) -> Result<Vec<Question>, ProviderError> {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut questions = Vec::with_capacity(raw.len());
        let mut first_rejected = None;
        for (index, record) in raw.into_iter().enumerate() {
            let built = Question::shuffled(
                decode(&record.question),
                decode(&record.correct_answer),
                record.incorrect_answers.iter().map(|a| decode(a)),
                &mut *rng,
            );
            match built {
                Ok(question) => questions.push(question),
                Err(source) => {
                    warn!(index, error = %source, "skipping malformed trivia record");
                    if first_rejected.is_none() {
                        first_rejected = Some(ProviderError::MalformedRecord { index, source });
                    }
                }
            }
        }

        match first_rejected {
            Some(err) if questions.is_empty() => Err(err),
            _ => Ok(questions),
        }
    }
}

fn decode(text: &str) -> String {
    html_escape::decode_html_entities(text).trim().to_string()
}

#[async_trait]
impl QuestionSource for BatchedTriviaSource {
    async fn fetch_question(&self) -> Result<Question, ProviderError> {
        let mut batch = self.batch.lock().await;
        if batch.is_exhausted() {
            self.load_into(&mut batch, self.batch_size).await?;
        }
        batch.take_next().ok_or(ProviderError::EmptyBatch)
    }
}
