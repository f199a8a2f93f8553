use chrono::Utc;

use crate::{
    models::{board::Disk, game_session::GameSession},
    services::errors::othello_service_errors::OthelloServiceError,
};

/// Final score of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub player1: usize,
    pub player2: usize,
}

impl GameResult {
    pub fn winner(&self) -> Option<Disk> {
        match self.player1.cmp(&self.player2) {
            std::cmp::Ordering::Greater => Some(Disk::Player1),
            std::cmp::Ordering::Less => Some(Disk::Player2),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.winner() {
            Some(Disk::Player1) => write!(f, "Player 1 wins {} to {}", self.player1, self.player2),
            Some(Disk::Player2) => write!(f, "Player 2 wins {} to {}", self.player2, self.player1),
            None => write!(f, "Draw at {} to {}", self.player1, self.player2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The game goes on with `Disk` to move. Equal to the mover when the
    /// opponent had to pass.
    NextTurn(Disk),
    Finished(GameResult),
}

#[derive(Clone, Default)]
pub struct OthelloService;

impl OthelloService {
    pub fn new() -> Self {
        OthelloService
    }

    /// Validate and play `disk` at `(x, y)` on the session.
    /// Updates the board, the turn and `updated_at`.
    pub fn place_disk(
        &self,
        game_session: &mut GameSession,
        disk: Disk,
        x: i32,
        y: i32,
    ) -> Result<MoveOutcome, OthelloServiceError> {
        if game_session.is_over() {
            return Err(OthelloServiceError::GameOver);
        }
        if game_session.player != disk {
            return Err(OthelloServiceError::NotYourTurn);
        }

        let (board, changed) = game_session.board.apply_move(x, y, disk);
        if !changed {
            return Err(OthelloServiceError::IllegalMove { x, y });
        }

        game_session.board = board;
        game_session.updated_at = Utc::now();

        // pass rule: the mover keeps the turn while the opponent is blocked
        let opponent = disk.opponent();
        let outcome = if game_session.board.has_legal_move(opponent) {
            game_session.player = opponent;
            MoveOutcome::NextTurn(opponent)
        } else if game_session.board.has_legal_move(disk) {
            MoveOutcome::NextTurn(disk)
        } else {
            game_session.player = opponent;
            MoveOutcome::Finished(Self::result(game_session))
        };

        Ok(outcome)
    }

    pub fn result(game_session: &GameSession) -> GameResult {
        let (player1, player2) = game_session.board.keep_score();
        GameResult { player1, player2 }
    }
}
