use std::sync::Arc;

use storage::repository::Storage;
use trivia_core::model::GameSettings;

use crate::Clock;
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::session::SessionController;
use crate::source::{BatchedTriviaSource, OpenTriviaConfig, OpenTriviaFetcher, QuestionSource};

/// Assembles the session controller and history service for a front end.
#[derive(Clone)]
pub struct AppServices {
    session: SessionController,
    history: Arc<HistoryService>,
}

impl AppServices {
    /// Build services backed by `SQLite` history and the Open Trivia API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails or the HTTP
    /// client cannot be built.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: GameSettings,
        api: OpenTriviaConfig,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let fetcher = Arc::new(OpenTriviaFetcher::new(api)?);
        let source: Arc<dyn QuestionSource> =
            Arc::new(BatchedTriviaSource::new(fetcher).with_batch_size(settings.batch_size()));
        Ok(Self::with_storage(storage, clock, settings, source))
    }

    /// Wire services over an existing storage and question source.
    #[must_use]
    pub fn with_storage(
        storage: Storage,
        clock: Clock,
        settings: GameSettings,
        source: Arc<dyn QuestionSource>,
    ) -> Self {
        let history = Arc::new(HistoryService::new(Arc::clone(&storage.history)));
        let session = SessionController::new(clock, settings, source, storage.history);
        Self { session, history }
    }

    #[must_use]
    pub fn session(&self) -> SessionController {
        self.session.clone()
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }
}
