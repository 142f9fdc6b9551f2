mod history;
mod ids;
mod question;
mod session;
mod settings;

pub use history::HistoryRecord;
pub use ids::HistoryRecordId;
pub use question::{ANSWER_COUNT, Question, QuestionError};
pub use session::{AnswerOutcome, EndReason, SessionSnapshot, SessionStatus, Tally};
pub use settings::{
    DEFAULT_ANSWER_DISPLAY_DELAY_MS, DEFAULT_BATCH_SIZE, DEFAULT_QUESTION_TIME_SECS,
    DEFAULT_REWARD_PER_CORRECT, DEFAULT_STARTING_LIVES, GameMode, GameSettings,
    GameSettingsDraft, MAX_BATCH_SIZE, REDUCED_QUESTION_TIME_SECS, SettingsError,
};
