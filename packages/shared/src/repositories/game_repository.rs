use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::{AttributeValue, Delete, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client;
use serde_dynamo::aws_sdk_dynamodb_1::{from_item, to_item};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::models::connection::ConnectionRecord;
use crate::models::game_session::GameSession;
use crate::repositories::errors::game_repository_errors::GameSessionRepositoryError;

/// Write applied to a game record as part of a [`StoreCommit`].
#[derive(Debug, Clone, PartialEq)]
pub enum GameWrite {
    /// Store a new record. Fails if a record already exists under the host.
    Create(GameSession),
    /// Replace the stored record. `session.version` must match the stored version.
    Update(GameSession),
    /// Remove the stored record if it is still at `version`.
    Delete { host: String, version: u64 },
}

impl GameWrite {
    pub fn host(&self) -> &str {
        match self {
            GameWrite::Create(session) | GameWrite::Update(session) => &session.host,
            GameWrite::Delete { host, .. } => host,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionWrite {
    /// Store `record`. `replaces` is the host of the entry read before the
    /// commit, `None` when there was no entry. Fails if the stored entry no
    /// longer matches.
    Put {
        record: ConnectionRecord,
        replaces: Option<String>,
    },
    Delete(String),
}

/// A game write plus the connection index changes that go with it. Applied
/// atomically: either everything is stored or nothing is.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCommit {
    pub game: GameWrite,
    pub connections: Vec<ConnectionWrite>,
}

impl StoreCommit {
    pub fn new(game: GameWrite) -> Self {
        StoreCommit {
            game,
            connections: Vec::new(),
        }
    }

    /// Adds an index entry for a connection that had none.
    pub fn put_connection(self, record: ConnectionRecord) -> Self {
        self.replace_connection(record, None)
    }

    /// Adds an index entry over the one read for the same connection.
    pub fn replace_connection(mut self, record: ConnectionRecord, replaces: Option<String>) -> Self {
        self.connections
            .push(ConnectionWrite::Put { record, replaces });
        self
    }

    pub fn delete_connection(mut self, connection_id: &str) -> Self {
        self.connections
            .push(ConnectionWrite::Delete(connection_id.to_string()));
        self
    }
}

/// Versioned store for game records and the connection index.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GameSessionRepository: Send + Sync {
    async fn get_game_session(
        &self,
        host: &str,
    ) -> Result<Option<GameSession>, GameSessionRepositoryError>;

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, GameSessionRepositoryError>;

    async fn list_open_game_sessions(&self) -> Result<Vec<GameSession>, GameSessionRepositoryError>;

    /// Applies `commit` atomically. Returns `VersionConflict` when the stored
    /// game record or a replaced connection entry is not in the expected state.
    async fn commit(&self, commit: StoreCommit) -> Result<(), GameSessionRepositoryError>;
}

pub struct DynamoDbGameSessionRepository {
    pub client: Client,
    pub games_table: String,
    pub connections_table: String,
}

impl DynamoDbGameSessionRepository {
    pub fn new(client: Client, games_table: &str, connections_table: &str) -> Self {
        Self {
            client,
            games_table: games_table.to_string(),
            connections_table: connections_table.to_string(),
        }
    }

    fn game_write_item(
        &self,
        write: &GameWrite,
    ) -> Result<TransactWriteItem, GameSessionRepositoryError> {
        let item = match write {
            GameWrite::Create(session) => {
                let mut stored = session.clone();
                stored.version = 1;
                let put = Put::builder()
                    .table_name(&self.games_table)
                    .set_item(Some(session_item(&stored)?))
                    .condition_expression("attribute_not_exists(host)")
                    .build()
                    .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;
                TransactWriteItem::builder().put(put).build()
            }
            GameWrite::Update(session) => {
                let mut stored = session.clone();
                stored.version = session.version + 1;
                let put = Put::builder()
                    .table_name(&self.games_table)
                    .set_item(Some(session_item(&stored)?))
                    .condition_expression("version = :expected")
                    .expression_attribute_values(
                        ":expected",
                        AttributeValue::N(session.version.to_string()),
                    )
                    .build()
                    .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;
                TransactWriteItem::builder().put(put).build()
            }
            GameWrite::Delete { host, version } => {
                let delete = Delete::builder()
                    .table_name(&self.games_table)
                    .key("host", AttributeValue::S(host.clone()))
                    .condition_expression("version = :expected")
                    .expression_attribute_values(":expected", AttributeValue::N(version.to_string()))
                    .build()
                    .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;
                TransactWriteItem::builder().delete(delete).build()
            }
        };
        Ok(item)
    }

    fn connection_write_item(
        &self,
        write: &ConnectionWrite,
    ) -> Result<TransactWriteItem, GameSessionRepositoryError> {
        let item = match write {
            ConnectionWrite::Put { record, replaces } => {
                let item: HashMap<String, AttributeValue> = to_item(record)
                    .map_err(|e| GameSessionRepositoryError::Serialization(e.to_string()))?;
                let put = Put::builder()
                    .table_name(&self.connections_table)
                    .set_item(Some(item));
                let put = match replaces {
                    None => put.condition_expression("attribute_not_exists(connection_id)"),
                    Some(host) => put
                        .condition_expression("#host = :replaced")
                        .expression_attribute_names("#host", "host")
                        .expression_attribute_values(":replaced", AttributeValue::S(host.clone())),
                };
                let put = put
                    .build()
                    .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;
                TransactWriteItem::builder().put(put).build()
            }
            ConnectionWrite::Delete(connection_id) => {
                let delete = Delete::builder()
                    .table_name(&self.connections_table)
                    .key("connection_id", AttributeValue::S(connection_id.clone()))
                    .build()
                    .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;
                TransactWriteItem::builder().delete(delete).build()
            }
        };
        Ok(item)
    }
}

fn session_item(
    session: &GameSession,
) -> Result<HashMap<String, AttributeValue>, GameSessionRepositoryError> {
    to_item(session).map_err(|e| GameSessionRepositoryError::Serialization(e.to_string()))
}

#[async_trait]
impl GameSessionRepository for DynamoDbGameSessionRepository {
    async fn get_game_session(
        &self,
        host: &str,
    ) -> Result<Option<GameSession>, GameSessionRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.games_table)
            .key("host", AttributeValue::S(host.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;

        if let Some(item) = result.item {
            let session: GameSession = from_item(item)
                .map_err(|e| GameSessionRepositoryError::Serialization(e.to_string()))?;
            Ok(Some(session))
        } else {
            Ok(None)
        }
    }

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionRecord>, GameSessionRepositoryError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.connections_table)
            .key("connection_id", AttributeValue::S(connection_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;

        match result.item {
            Some(item) => from_item(item)
                .map(Some)
                .map_err(|e| GameSessionRepositoryError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn list_open_game_sessions(&self) -> Result<Vec<GameSession>, GameSessionRepositoryError> {
        let mut sessions = Vec::new();
        let mut start_key = None;

        loop {
            let page = self
                .client
                .scan()
                .table_name(&self.games_table)
                .filter_expression("#open = :open")
                .expression_attribute_names("#open", "open")
                .expression_attribute_values(":open", AttributeValue::Bool(true))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| GameSessionRepositoryError::DynamoDb(e.to_string()))?;

            for item in page.items.unwrap_or_default() {
                let session: GameSession = from_item(item)
                    .map_err(|e| GameSessionRepositoryError::Serialization(e.to_string()))?;
                sessions.push(session);
            }

            match page.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!("Found {} open game sessions", sessions.len());
        Ok(sessions)
    }

    async fn commit(&self, commit: StoreCommit) -> Result<(), GameSessionRepositoryError> {
        let mut items = vec![self.game_write_item(&commit.game)?];
        for write in &commit.connections {
            items.push(self.connection_write_item(write)?);
        }

        let result = self
            .client
            .transact_write_items()
            .set_transact_items(Some(items))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                // a failed condition cancels the whole transaction
                if let SdkError::ServiceError(service_err) = &e {
                    if service_err.err().is_transaction_canceled_exception() {
                        debug!(
                            "Commit for game {} cancelled: {:?}",
                            commit.game.host(),
                            service_err.err()
                        );
                        return Err(GameSessionRepositoryError::VersionConflict);
                    }
                }
                Err(GameSessionRepositoryError::DynamoDb(e.to_string()))
            }
        }
    }
}
