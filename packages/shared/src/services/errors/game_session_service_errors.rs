use crate::repositories::errors::game_repository_errors::GameSessionRepositoryError;
use crate::services::errors::othello_service_errors::OthelloServiceError;

/// Failures of a matchmaking or gameplay operation. The `Display` text is
/// what the originating connection receives in its `error` message, except
/// for repository failures which are reported generically.
#[derive(Debug)]
pub enum GameSessionServiceError {
    NotFound(String),
    GameFull(String),
    AlreadyExists(String),
    AlreadyPlaying,
    NotInGame,
    WrongGame(String),
    Othello(OthelloServiceError),
    Contention,
    RepositoryError(GameSessionRepositoryError),
    ValidationError(String),
}

impl GameSessionServiceError {
    pub fn is_version_conflict(&self) -> bool {
        matches!(
            self,
            GameSessionServiceError::RepositoryError(GameSessionRepositoryError::VersionConflict)
        )
    }

    /// Text sent back to the client.
    pub fn client_message(&self) -> String {
        match self {
            GameSessionServiceError::RepositoryError(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl std::fmt::Display for GameSessionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameSessionServiceError::NotFound(host) => write!(f, "game {:?} not found", host),
            GameSessionServiceError::GameFull(host) => write!(f, "game {:?} is full", host),
            GameSessionServiceError::AlreadyExists(host) => {
                write!(f, "game {:?} already exists", host)
            }
            GameSessionServiceError::AlreadyPlaying => write!(f, "already playing"),
            GameSessionServiceError::NotInGame => write!(f, "not in a game"),
            GameSessionServiceError::WrongGame(host) => {
                write!(f, "not playing in game {:?}", host)
            }
            GameSessionServiceError::Othello(err) => write!(f, "{}", err),
            GameSessionServiceError::Contention => {
                write!(f, "server is busy, please try again")
            }
            GameSessionServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            GameSessionServiceError::ValidationError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for GameSessionServiceError {}

impl From<GameSessionRepositoryError> for GameSessionServiceError {
    fn from(err: GameSessionRepositoryError) -> Self {
        GameSessionServiceError::RepositoryError(err)
    }
}

impl From<OthelloServiceError> for GameSessionServiceError {
    fn from(err: OthelloServiceError) -> Self {
        GameSessionServiceError::Othello(err)
    }
}
