use crate::types::{GameId, HelpKind, UserId};

pub type GameResult<T> = Result<T, GameError>;

/// Rule violations and lookups that failed. Losing or timing out is not an
/// error; those come back as an ordinary [`crate::session::Outcome`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Game is already over")]
    InactiveSession,

    #[error("Help {0} was already used in this game")]
    AlreadyUsedHelp(HelpKind),

    #[error("No questions available for level {level}")]
    InsufficientQuestions { level: usize },

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("User already has a game in progress: {0}")]
    GameInProgress(GameId),
}

impl GameError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InactiveSession => "INACTIVE_SESSION",
            GameError::AlreadyUsedHelp(_) => "ALREADY_USED_HELP",
            GameError::InsufficientQuestions { .. } => "INSUFFICIENT_QUESTIONS",
            GameError::GameNotFound(_) => "GAME_NOT_FOUND",
            GameError::UserNotFound(_) => "USER_NOT_FOUND",
            GameError::GameInProgress(_) => "GAME_IN_PROGRESS",
        }
    }
}
