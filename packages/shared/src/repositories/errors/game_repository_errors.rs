#[derive(Debug)]
pub enum GameSessionRepositoryError {
    /// A conditional write found a different version than the one expected.
    VersionConflict,
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for GameSessionRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameSessionRepositoryError::VersionConflict => {
                write!(f, "Game session was modified concurrently")
            }
            GameSessionRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            GameSessionRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for GameSessionRepositoryError {}
