#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OthelloServiceError {
    NotYourTurn,
    IllegalMove { x: i32, y: i32 },
    GameOver,
}

impl std::fmt::Display for OthelloServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OthelloServiceError::NotYourTurn => write!(f, "not your turn"),
            OthelloServiceError::IllegalMove { x, y } => {
                write!(f, "illegal move at ({}, {})", x, y)
            }
            OthelloServiceError::GameOver => write!(f, "game is over"),
        }
    }
}

impl std::error::Error for OthelloServiceError {}
