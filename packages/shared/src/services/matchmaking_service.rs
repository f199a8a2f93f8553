use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::{
    models::{
        board::Disk,
        connection::ConnectionRecord,
        game_session::{GameMode, GameSession, Seat},
        messages::{Message, Outbound},
    },
    repositories::game_repository::{GameSessionRepository, GameWrite, StoreCommit},
    services::{
        errors::game_session_service_errors::GameSessionServiceError,
        retry::{retry_on_conflict, DEFAULT_MAX_COMMIT_ATTEMPTS},
    },
};

/// Lobby operations: hosting, solo games, joining, leaving and listing.
/// Each operation is one read-mutate-commit cycle, retried on version
/// conflicts.
#[derive(Clone)]
pub struct MatchmakingService {
    repository: Arc<dyn GameSessionRepository + Send + Sync>,
    max_commit_attempts: u32,
}

impl MatchmakingService {
    pub fn new(repository: Arc<dyn GameSessionRepository + Send + Sync>) -> Self {
        Self::with_max_commit_attempts(repository, DEFAULT_MAX_COMMIT_ATTEMPTS)
    }

    pub fn with_max_commit_attempts(
        repository: Arc<dyn GameSessionRepository + Send + Sync>,
        max_commit_attempts: u32,
    ) -> Self {
        MatchmakingService {
            repository,
            max_commit_attempts,
        }
    }

    pub async fn host_game(
        &self,
        connection_id: &str,
        nickname: &str,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        validate_nickname(nickname)?;
        retry_on_conflict(self.max_commit_attempts, move || {
            self.create_game(
                connection_id,
                GameSession::new_multiplayer(nickname, connection_id),
            )
        })
        .await
    }

    pub async fn start_solo_game(
        &self,
        connection_id: &str,
        nickname: &str,
        difficulty: u8,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        validate_nickname(nickname)?;
        retry_on_conflict(self.max_commit_attempts, move || {
            self.create_game(
                connection_id,
                GameSession::new_solo(nickname, connection_id, difficulty),
            )
        })
        .await
    }

    pub async fn join_game(
        &self,
        connection_id: &str,
        nickname: &str,
        host: &str,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        validate_nickname(nickname)?;
        retry_on_conflict(self.max_commit_attempts, move || {
            self.try_join_game(connection_id, nickname, host)
        })
        .await
    }

    /// Leaves the game `host`. Errors when the connection is not seated there.
    pub async fn leave_game(
        &self,
        connection_id: &str,
        host: &str,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        retry_on_conflict(self.max_commit_attempts, move || async move {
            let (record, game_session) = self
                .seated_record(connection_id)
                .await?
                .ok_or(GameSessionServiceError::NotInGame)?;
            if record.host != host {
                return Err(GameSessionServiceError::WrongGame(host.to_string()));
            }
            self.end_game_for(connection_id, game_session).await
        })
        .await
    }

    /// Same as leaving, but a connection that is not in a game is a no-op.
    pub async fn disconnect(
        &self,
        connection_id: &str,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        retry_on_conflict(self.max_commit_attempts, move || async move {
            match self.seated_record(connection_id).await? {
                Some((_, session)) => self.end_game_for(connection_id, session).await,
                None => {
                    debug!("Connection {} was not in a game", connection_id);
                    Ok(Vec::new())
                }
            }
        })
        .await
    }

    pub async fn list_open_games(
        &self,
        connection_id: &str,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        let mut hosts: Vec<String> = self
            .repository
            .list_open_game_sessions()
            .await?
            .into_iter()
            .map(|session| session.host)
            .collect();
        hosts.sort();

        Ok(vec![Outbound::new(
            connection_id,
            Message::OpenGames { hosts },
        )])
    }

    async fn create_game(
        &self,
        connection_id: &str,
        game_session: GameSession,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        if self
            .repository
            .get_game_session(&game_session.host)
            .await?
            .is_some()
        {
            return Err(GameSessionServiceError::AlreadyExists(
                game_session.host.clone(),
            ));
        }
        let replaces = self.ensure_not_playing(connection_id).await?;

        let record = ConnectionRecord::new(
            connection_id,
            &game_session.host,
            Disk::Player1,
            &game_session.host,
        );
        self.repository
            .commit(
                StoreCommit::new(GameWrite::Create(game_session.clone()))
                    .replace_connection(record, replaces),
            )
            .await?;

        info!(
            "Created {:?} game {} for connection {}",
            game_session.mode, game_session.host, connection_id
        );
        Ok(vec![Outbound::new(
            connection_id,
            Message::update_board(game_session.board, game_session.player),
        )])
    }

    async fn try_join_game(
        &self,
        connection_id: &str,
        nickname: &str,
        host: &str,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        let mut game_session = self
            .repository
            .get_game_session(host)
            .await?
            .ok_or_else(|| GameSessionServiceError::NotFound(host.to_string()))?;
        if game_session.is_full() {
            return Err(GameSessionServiceError::GameFull(host.to_string()));
        }
        let replaces = self.ensure_not_playing(connection_id).await?;

        game_session.player2 = Some(Seat::human(nickname, connection_id));
        game_session.open = false;
        game_session.updated_at = Utc::now();

        let record = ConnectionRecord::new(connection_id, host, Disk::Player2, nickname);
        self.repository
            .commit(
                StoreCommit::new(GameWrite::Update(game_session.clone()))
                    .replace_connection(record, replaces),
            )
            .await?;

        info!("{} joined game {}", nickname, host);
        let board = Message::update_board(game_session.board, game_session.player);
        let mut outbound = Vec::new();
        if let Some(host_connection) = game_session
            .player1
            .as_ref()
            .and_then(|seat| seat.connection_id.as_deref())
        {
            outbound.push(Outbound::new(
                host_connection,
                Message::Joined {
                    nickname: nickname.to_string(),
                },
            ));
            outbound.push(Outbound::new(host_connection, board.clone()));
        }
        outbound.push(Outbound::new(connection_id, board));
        Ok(outbound)
    }

    /// The connection's index entry together with the game it is seated in.
    /// Entries whose game is gone or no longer seats the connection count as
    /// not seated.
    async fn seated_record(
        &self,
        connection_id: &str,
    ) -> Result<Option<(ConnectionRecord, GameSession)>, GameSessionServiceError> {
        let Some(record) = self.repository.get_connection(connection_id).await? else {
            return Ok(None);
        };
        let Some(game_session) = self.repository.get_game_session(&record.host).await? else {
            debug!("Stale connection entry for {}", connection_id);
            return Ok(None);
        };
        if game_session.disk_of(connection_id).is_none() {
            debug!("Stale connection entry for {}", connection_id);
            return Ok(None);
        }
        Ok(Some((record, game_session)))
    }

    /// Errors when the connection is seated in a live game. Otherwise returns
    /// the host of its stale index entry, if any, for the commit to replace.
    async fn ensure_not_playing(
        &self,
        connection_id: &str,
    ) -> Result<Option<String>, GameSessionServiceError> {
        let Some(record) = self.repository.get_connection(connection_id).await? else {
            return Ok(None);
        };
        match self.repository.get_game_session(&record.host).await? {
            Some(game_session) if game_session.disk_of(connection_id).is_some() => {
                Err(GameSessionServiceError::AlreadyPlaying)
            }
            _ => {
                debug!("Stale connection entry for {}", connection_id);
                Ok(Some(record.host))
            }
        }
    }

    /// Deletes the game `connection_id` is leaving along with every index
    /// entry pointing at it. A human opponent is told the game is over.
    async fn end_game_for(
        &self,
        connection_id: &str,
        game_session: GameSession,
    ) -> Result<Vec<Outbound>, GameSessionServiceError> {
        let leaver = game_session
            .disk_of(connection_id)
            .and_then(|disk| game_session.seat(disk))
            .map(|seat| seat.nickname.clone())
            .unwrap_or_default();

        let mut commit = StoreCommit::new(GameWrite::Delete {
            host: game_session.host.clone(),
            version: game_session.version,
        });
        for id in game_session.connection_ids() {
            commit = commit.delete_connection(&id);
        }
        self.repository.commit(commit).await?;

        info!("{} left game {}", leaver, game_session.host);
        if game_session.mode != GameMode::Multiplayer {
            return Ok(Vec::new());
        }
        Ok(game_session
            .connection_ids()
            .into_iter()
            .filter(|id| id != connection_id)
            .map(|id| Outbound::new(&id, Message::game_over(format!("{} left the game", leaver))))
            .collect())
    }
}

fn validate_nickname(nickname: &str) -> Result<(), GameSessionServiceError> {
    if nickname.trim().is_empty() {
        return Err(GameSessionServiceError::ValidationError(
            "nickname cannot be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::errors::game_repository_errors::GameSessionRepositoryError;
    use crate::repositories::game_repository::MockGameSessionRepository;
    use crate::repositories::memory_game_repository::InMemoryGameSessionRepository;

    fn service() -> (Arc<InMemoryGameSessionRepository>, MatchmakingService) {
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        (repository.clone(), MatchmakingService::new(repository))
    }

    #[tokio::test]
    async fn test_host_game_creates_open_game() {
        let (repository, service) = service();

        let outbound = service.host_game("conn-a", "alice").await.unwrap();

        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].connection_id, "conn-a");
        assert!(matches!(
            outbound[0].message,
            Message::UpdateBoard {
                player: Disk::Player1,
                ..
            }
        ));
        let stored = repository.get_game_session("alice").await.unwrap().unwrap();
        assert!(stored.open);
        assert_eq!(stored.version, 1);
        let record = repository.get_connection("conn-a").await.unwrap().unwrap();
        assert_eq!(record.disk, Disk::Player1);
    }

    #[tokio::test]
    async fn test_host_game_rejects_existing_host() {
        let (_, service) = service();
        service.host_game("conn-a", "alice").await.unwrap();

        let result = service.host_game("conn-b", "alice").await;

        assert!(matches!(
            result,
            Err(GameSessionServiceError::AlreadyExists(ref host)) if host == "alice"
        ));
    }

    #[tokio::test]
    async fn test_seated_connection_cannot_host_again() {
        let (_, service) = service();
        service.host_game("conn-a", "alice").await.unwrap();

        let result = service.host_game("conn-a", "alice2").await;

        assert!(matches!(result, Err(GameSessionServiceError::AlreadyPlaying)));
    }

    #[tokio::test]
    async fn test_empty_nickname_is_rejected() {
        let (repository, service) = service();

        let result = service.start_solo_game("conn-a", "  ", 1).await;

        assert!(matches!(
            result,
            Err(GameSessionServiceError::ValidationError(_))
        ));
        assert_eq!(repository.game_count(), 0);
    }

    #[tokio::test]
    async fn test_solo_game_is_closed_and_full() {
        let (repository, service) = service();
        service.start_solo_game("conn-b", "bob", 2).await.unwrap();

        let stored = repository.get_game_session("bob").await.unwrap().unwrap();
        assert!(!stored.open);
        assert_eq!(stored.ai_disk(), Some(Disk::Player2));

        let result = service.join_game("conn-c", "carol", "bob").await;
        assert!(matches!(result, Err(GameSessionServiceError::GameFull(_))));
        let after = repository.get_game_session("bob").await.unwrap().unwrap();
        assert_eq!(after.version, stored.version);
        assert_eq!(after.player2, stored.player2);
        assert!(!after.open);
        assert!(repository.get_connection("conn-c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_connection_entry_is_replaced() {
        let (repository, service) = service();
        // a game that went away without clearing the index entry of conn-a
        repository
            .commit(
                StoreCommit::new(GameWrite::Create(GameSession::new_multiplayer("ghost", "conn-g")))
                    .put_connection(ConnectionRecord::new("conn-a", "ghost", Disk::Player2, "alice")),
            )
            .await
            .unwrap();
        repository
            .commit(StoreCommit::new(GameWrite::Delete {
                host: "ghost".to_string(),
                version: 1,
            }))
            .await
            .unwrap();

        service.host_game("conn-a", "alice").await.unwrap();

        let record = repository.get_connection("conn-a").await.unwrap().unwrap();
        assert_eq!(record.host, "alice");
        assert_eq!(record.disk, Disk::Player1);
    }

    #[tokio::test]
    async fn test_join_game_message_order() {
        let (repository, service) = service();
        service.host_game("conn-a", "alice").await.unwrap();

        let outbound = service.join_game("conn-b", "bob", "alice").await.unwrap();

        let targets: Vec<(&str, &str)> = outbound
            .iter()
            .map(|o| (o.connection_id.as_str(), o.message.action()))
            .collect();
        assert_eq!(
            targets,
            vec![
                ("conn-a", "joined"),
                ("conn-a", "updateBoard"),
                ("conn-b", "updateBoard"),
            ]
        );
        let stored = repository.get_game_session("alice").await.unwrap().unwrap();
        assert!(!stored.open);
        assert_eq!(stored.version, 2);
        assert_eq!(stored.disk_of("conn-b"), Some(Disk::Player2));
    }

    #[tokio::test]
    async fn test_join_missing_game() {
        let (_, service) = service();

        let result = service.join_game("conn-b", "bob", "nobody").await;

        assert!(matches!(result, Err(GameSessionServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_leave_started_game_notifies_opponent() {
        let (repository, service) = service();
        service.host_game("conn-a", "alice").await.unwrap();
        service.join_game("conn-b", "bob", "alice").await.unwrap();

        let outbound = service.leave_game("conn-b", "alice").await.unwrap();

        assert_eq!(
            outbound,
            vec![Outbound::new(
                "conn-a",
                Message::game_over("bob left the game")
            )]
        );
        assert_eq!(repository.game_count(), 0);
        assert_eq!(repository.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_leave_wrong_game() {
        let (_, service) = service();
        service.host_game("conn-a", "alice").await.unwrap();

        let result = service.leave_game("conn-a", "bob").await;

        assert!(matches!(result, Err(GameSessionServiceError::WrongGame(_))));
    }

    #[tokio::test]
    async fn test_leave_without_game() {
        let (_, service) = service();

        let result = service.leave_game("conn-a", "alice").await;

        assert!(matches!(result, Err(GameSessionServiceError::NotInGame)));
    }

    #[tokio::test]
    async fn test_disconnect_without_game_is_noop() {
        let (_, service) = service();

        assert!(service.disconnect("conn-z").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disconnect_host_of_open_game_removes_it() {
        let (repository, service) = service();
        service.host_game("conn-a", "alice").await.unwrap();

        let outbound = service.disconnect("conn-a").await.unwrap();

        assert!(outbound.is_empty());
        assert_eq!(repository.game_count(), 0);
        assert!(repository.get_connection("conn-a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_open_games_sorted() {
        let (_, service) = service();
        service.host_game("conn-c", "carol").await.unwrap();
        service.host_game("conn-a", "alice").await.unwrap();
        service.start_solo_game("conn-b", "bob", 0).await.unwrap();

        let outbound = service.list_open_games("conn-z").await.unwrap();

        assert_eq!(
            outbound,
            vec![Outbound::new(
                "conn-z",
                Message::OpenGames {
                    hosts: vec!["alice".to_string(), "carol".to_string()]
                }
            )]
        );
    }

    #[tokio::test]
    async fn test_persistent_conflicts_surface_contention() {
        let mut repository = MockGameSessionRepository::new();
        repository.expect_get_game_session().returning(|_| Ok(None));
        repository.expect_get_connection().returning(|_| Ok(None));
        repository
            .expect_commit()
            .times(3)
            .returning(|_| Err(GameSessionRepositoryError::VersionConflict));
        let service = MatchmakingService::new(Arc::new(repository));

        let result = service.host_game("conn-a", "alice").await;

        assert!(matches!(result, Err(GameSessionServiceError::Contention)));
    }
}
