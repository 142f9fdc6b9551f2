use thiserror::Error;

use crate::model::{QuestionError, SettingsError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_domain_errors_transparently() {
        let err: Error = SettingsError::InvalidStartingLives.into();
        assert_eq!(err.to_string(), SettingsError::InvalidStartingLives.to_string());

        let err: Error = QuestionError::EmptyText.into();
        assert!(matches!(err, Error::Question(QuestionError::EmptyText)));
    }
}
