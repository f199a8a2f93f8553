use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    models::{
        game_session::{GameMode, GameSession},
        messages::{Message, Outbound},
    },
    repositories::game_repository::{GameSessionRepository, GameWrite, StoreCommit},
    services::{
        errors::game_session_service_errors::GameSessionServiceError,
        opponent_service::OpponentStrategy,
        othello_service::{MoveOutcome, OthelloService},
        retry::{retry_on_conflict, DEFAULT_MAX_COMMIT_ATTEMPTS},
    },
};

/// Gameplay: human moves and, in solo games, the AI replies that follow.
#[derive(Clone)]
pub struct GameSessionService {
    repository: Arc<dyn GameSessionRepository + Send + Sync>,
    opponent: Arc<dyn OpponentStrategy>,
    othello_service: OthelloService,
    max_commit_attempts: u32,
}

impl GameSessionService {
    pub fn new(
        repository: Arc<dyn GameSessionRepository + Send + Sync>,
        opponent: Arc<dyn OpponentStrategy>,
    ) -> Self {
        Self::with_max_commit_attempts(repository, opponent, DEFAULT_MAX_COMMIT_ATTEMPTS)
    }

    pub fn with_max_commit_attempts(
        repository: Arc<dyn GameSessionRepository + Send + Sync>,
        opponent: Arc<dyn OpponentStrategy>,
        max_commit_attempts: u32,
    ) -> Self {
        GameSessionService {
            repository,
            opponent,
            othello_service: OthelloService::new(),
            max_commit_attempts,
        }
    }

    /// Plays the connection's disk at `(x, y)` in game `host`. In a solo
    /// game the AI then moves for as long as it holds the turn, each move
    /// committed and reported on its own.
    pub async fn place_disk(
        &self,
        connection_id: &str,
        host: &str,
        x: i32,
        y: i32,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        let (mut outbound, mode) = retry_on_conflict(self.max_commit_attempts, move || {
            self.try_place_disk(connection_id, host, x, y)
        })
        .await?;

        if mode == GameMode::Solo {
            outbound.extend(self.play_ai_turns(connection_id, host).await);
        }
        Ok(outbound)
    }

    async fn try_place_disk(
        &self,
        connection_id: &str,
        host: &str,
        x: i32,
        y: i32,
    ) -> Result<(Vec<Outbound>, GameMode), GameSessionServiceError> {
        let record = self
            .repository
            .get_connection(connection_id)
            .await?
            .ok_or(GameSessionServiceError::NotInGame)?;
        if record.host != host {
            return Err(GameSessionServiceError::WrongGame(host.to_string()));
        }
        let mut game_session = self
            .repository
            .get_game_session(host)
            .await?
            .ok_or_else(|| GameSessionServiceError::NotFound(host.to_string()))?;
        let disk = game_session
            .disk_of(connection_id)
            .ok_or(GameSessionServiceError::NotInGame)?;

        let outcome = self
            .othello_service
            .place_disk(&mut game_session, disk, x, y)?;
        debug!("{} played ({}, {}) in game {}", disk, x, y, host);

        let mode = game_session.mode;
        let outbound = self.commit_move(game_session, outcome).await?;
        Ok((outbound, mode))
    }

    /// Runs AI moves until the turn is back with the human or the game is
    /// gone. A failed AI move is reported to `connection_id` and ends the run.
    async fn play_ai_turns(&self, connection_id: &str, host: &str) -> Vec<Outbound> {
        let mut outbound = Vec::new();
        loop {
            let result = retry_on_conflict(self.max_commit_attempts, move || {
                self.try_ai_move(host)
            })
            .await;
            match result {
                Ok(Some(messages)) => outbound.extend(messages),
                Ok(None) => break,
                Err(err) => {
                    error!("AI move in game {} failed: {}", host, err);
                    outbound.push(Outbound::new(
                        connection_id,
                        Message::error(err.client_message()),
                    ));
                    break;
                }
            }
        }
        outbound
    }

    /// One AI move, or `None` when it is not the AI's turn.
    async fn try_ai_move(
        &self,
        host: &str,
    ) -> Result<Option<Vec<Outbound>>, GameSessionServiceError> {
        let Some(mut game_session) = self.repository.get_game_session(host).await? else {
            return Ok(None);
        };
        let Some(ai_disk) = game_session.ai_disk() else {
            return Ok(None);
        };
        if game_session.player != ai_disk || game_session.is_over() {
            return Ok(None);
        }

        let difficulty = game_session.difficulty.unwrap_or_default();
        let Some((x, y)) = self
            .opponent
            .choose_move(&game_session.board, ai_disk, difficulty)
        else {
            return Ok(None);
        };

        let outcome =
            self.othello_service
                .place_disk(&mut game_session, ai_disk, x as i32, y as i32)?;
        debug!("AI played ({}, {}) in game {}", x, y, host);

        self.commit_move(game_session, outcome).await.map(Some)
    }

    /// Stores the session after a move. A finished game is deleted with its
    /// connection entries; every human then gets the final board and the
    /// result.
    async fn commit_move(
        &self,
        game_session: GameSession,
        outcome: MoveOutcome,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        let update = Message::update_board(game_session.board, game_session.player);
        let connection_ids = game_session.connection_ids();

        match outcome {
            MoveOutcome::NextTurn(_) => {
                self.repository
                    .commit(StoreCommit::new(GameWrite::Update(game_session)))
                    .await?;
                Ok(connection_ids
                    .iter()
                    .map(|id| Outbound::new(id, update.clone()))
                    .collect())
            }
            MoveOutcome::Finished(result) => {
                let mut commit = StoreCommit::new(GameWrite::Delete {
                    host: game_session.host.clone(),
                    version: game_session.version,
                });
                for id in &connection_ids {
                    commit = commit.delete_connection(id);
                }
                self.repository.commit(commit).await?;

                info!("Game {} finished: {}", game_session.host, result);
                Ok(connection_ids
                    .iter()
                    .flat_map(|id| {
                        [
                            Outbound::new(id, update.clone()),
                            Outbound::new(id, Message::game_over(result.to_string())),
                        ]
                    })
                    .collect())
            }
        }
    }
}
