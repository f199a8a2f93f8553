#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use shared::config::Config;
use shared::models::board::{Board, Disk};
use shared::models::connection::ConnectionRecord;
use shared::models::event::InboundEvent;
use shared::models::game_session::GameSession;
use shared::models::messages::Message;
use shared::repositories::errors::game_repository_errors::GameSessionRepositoryError;
use shared::repositories::game_repository::{GameSessionRepository, StoreCommit};
use shared::repositories::memory_game_repository::InMemoryGameSessionRepository;
use shared::repositories::memory_websocket_repository::RecordingWebSocketRepository;
use shared::services::dispatcher::Dispatcher;
use shared::services::opponent_service::OpponentService;
use shared::services::websocket_service::WebSocketService;

/// Dispatcher wired to an in-memory store and a recording socket, the same
/// way the Lambda handler wires the real adapters.
pub struct TestHarness {
    pub store: Arc<InMemoryGameSessionRepository>,
    pub sockets: Arc<RecordingWebSocketRepository>,
    pub dispatcher: Dispatcher,
    pub websocket_service: WebSocketService,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    pub fn with_config(config: &Config) -> Self {
        let store = Arc::new(InMemoryGameSessionRepository::new());
        Self::with_store(store.clone(), store, config)
    }

    /// `repository` is what the dispatcher talks to; `store` is the backing
    /// state the assertions look at. They differ when `repository` wraps it.
    pub fn with_store(
        store: Arc<InMemoryGameSessionRepository>,
        repository: Arc<dyn GameSessionRepository + Send + Sync>,
        config: &Config,
    ) -> Self {
        let sockets = Arc::new(RecordingWebSocketRepository::new());
        TestHarness {
            store,
            sockets: sockets.clone(),
            dispatcher: Dispatcher::new(repository, Arc::new(OpponentService::new()), config),
            websocket_service: WebSocketService::new(sockets),
        }
    }

    pub async fn send(&self, connection_id: &str, body: Value) {
        let outbound = self
            .dispatcher
            .handle(InboundEvent::message(connection_id, &body.to_string()))
            .await;
        self.websocket_service.deliver(outbound).await;
    }

    pub async fn send_raw(&self, connection_id: &str, body: &str) {
        let outbound = self
            .dispatcher
            .handle(InboundEvent::message(connection_id, body))
            .await;
        self.websocket_service.deliver(outbound).await;
    }

    pub async fn disconnect(&self, connection_id: &str) {
        let outbound = self
            .dispatcher
            .handle(InboundEvent::disconnect(connection_id))
            .await;
        self.websocket_service.deliver(outbound).await;
    }

    pub fn messages(&self, connection_id: &str) -> Vec<Message> {
        self.sockets.messages(connection_id)
    }

    pub fn board_updates(&self, connection_id: &str) -> Vec<(Board, Disk)> {
        self.messages(connection_id)
            .into_iter()
            .filter_map(|message| match message {
                Message::UpdateBoard { board, player } => Some((board, player)),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self, connection_id: &str) -> Vec<String> {
        self.messages(connection_id)
            .into_iter()
            .filter_map(|message| match message {
                Message::Error { error } => Some(error),
                _ => None,
            })
            .collect()
    }

    pub async fn game(&self, host: &str) -> Option<GameSession> {
        self.store.get_game_session(host).await.unwrap()
    }
}

pub fn disk_total(board: &Board) -> usize {
    let (player1, player2) = board.keep_score();
    player1 + player2
}

/// Delegates to an in-memory store but yields before every read so that
/// concurrent requests interleave their read and commit phases.
pub struct YieldingStore {
    pub inner: Arc<InMemoryGameSessionRepository>,
}

#[async_trait]
impl GameSessionRepository for YieldingStore {
    async fn get_game_session(
        &self,
        host: &str,
    ) -> Result<Option<GameSession>, GameSessionRepositoryError> {
        tokio::task::yield_now().await;
        self.inner.get_game_session(host).await
    }

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, GameSessionRepositoryError> {
        self.inner.get_connection(connection_id).await
    }

    async fn list_open_game_sessions(
        &self,
    ) -> Result<Vec<GameSession>, GameSessionRepositoryError> {
        self.inner.list_open_game_sessions().await
    }

    async fn commit(&self, commit: StoreCommit) -> Result<(), GameSessionRepositoryError> {
        tokio::task::yield_now().await;
        self.inner.commit(commit).await
    }
}

/// Loses the version race on the first `conflicts` commits, then behaves
/// like the wrapped store.
pub struct ConflictingStore {
    pub inner: Arc<InMemoryGameSessionRepository>,
    pub conflicts: u32,
    pub attempts: AtomicU32,
}

impl ConflictingStore {
    pub fn new(inner: Arc<InMemoryGameSessionRepository>, conflicts: u32) -> Self {
        ConflictingStore {
            inner,
            conflicts,
            attempts: AtomicU32::new(0),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GameSessionRepository for ConflictingStore {
    async fn get_game_session(
        &self,
        host: &str,
    ) -> Result<Option<GameSession>, GameSessionRepositoryError> {
        self.inner.get_game_session(host).await
    }

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, GameSessionRepositoryError> {
        self.inner.get_connection(connection_id).await
    }

    async fn list_open_game_sessions(
        &self,
    ) -> Result<Vec<GameSession>, GameSessionRepositoryError> {
        self.inner.list_open_game_sessions().await
    }

    async fn commit(&self, commit: StoreCommit) -> Result<(), GameSessionRepositoryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.conflicts {
            return Err(GameSessionRepositoryError::VersionConflict);
        }
        self.inner.commit(commit).await
    }
}
