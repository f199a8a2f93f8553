use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::connection::ConnectionRecord;
use crate::models::game_session::GameSession;
use crate::repositories::errors::game_repository_errors::GameSessionRepositoryError;
use crate::repositories::game_repository::{
    ConnectionWrite, GameSessionRepository, GameWrite, StoreCommit,
};

#[derive(Default)]
struct StoreState {
    games: HashMap<String, GameSession>,
    connections: HashMap<String, ConnectionRecord>,
}

/// Process-local store with the same conditional semantics as the DynamoDB
/// repository. Used by tests and local runs.
#[derive(Default)]
pub struct InMemoryGameSessionRepository {
    state: Mutex<StoreState>,
}

impl InMemoryGameSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, GameSessionRepositoryError> {
        self.state
            .lock()
            .map_err(|_| GameSessionRepositoryError::DynamoDb("store lock poisoned".to_string()))
    }

    pub fn game_count(&self) -> usize {
        self.lock().map(|state| state.games.len()).unwrap_or(0)
    }

    pub fn connection_count(&self) -> usize {
        self.lock().map(|state| state.connections.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GameSessionRepository for InMemoryGameSessionRepository {
    async fn get_game_session(
        &self,
        host: &str,
    ) -> Result<Option<GameSession>, GameSessionRepositoryError> {
        Ok(self.lock()?.games.get(host).cloned())
    }

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, GameSessionRepositoryError> {
        Ok(self.lock()?.connections.get(connection_id).cloned())
    }

    async fn list_open_game_sessions(&self) -> Result<Vec<GameSession>, GameSessionRepositoryError> {
        Ok(self
            .lock()?
            .games
            .values()
            .filter(|session| session.open)
            .cloned()
            .collect())
    }

    async fn commit(&self, commit: StoreCommit) -> Result<(), GameSessionRepositoryError> {
        let mut state = self.lock()?;

        let stored_version = state
            .games
            .get(commit.game.host())
            .map(|session| session.version);
        let game_matches = match &commit.game {
            GameWrite::Create(_) => stored_version.is_none(),
            GameWrite::Update(session) => stored_version == Some(session.version),
            GameWrite::Delete { version, .. } => stored_version == Some(*version),
        };
        let connections_match = commit.connections.iter().all(|write| match write {
            ConnectionWrite::Put { record, replaces } => {
                state
                    .connections
                    .get(&record.connection_id)
                    .map(|stored| &stored.host)
                    == replaces.as_ref()
            }
            ConnectionWrite::Delete(_) => true,
        });
        if !game_matches || !connections_match {
            return Err(GameSessionRepositoryError::VersionConflict);
        }

        match commit.game {
            GameWrite::Create(mut session) => {
                session.version = 1;
                state.games.insert(session.host.clone(), session);
            }
            GameWrite::Update(mut session) => {
                session.version += 1;
                state.games.insert(session.host.clone(), session);
            }
            GameWrite::Delete { host, .. } => {
                state.games.remove(&host);
            }
        }

        for write in commit.connections {
            match write {
                ConnectionWrite::Put { record, .. } => {
                    state.connections.insert(record.connection_id.clone(), record);
                }
                ConnectionWrite::Delete(connection_id) => {
                    state.connections.remove(&connection_id);
                }
            }
        }

        Ok(())
    }
}
