use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::messages::Message;
use crate::repositories::errors::websocket_repository_errors::WebSocketRepositoryError;
use crate::repositories::websocket_repository::WebSocketRepository;

/// Records every payload per connection instead of sending it.
/// Connections marked gone reject delivery the way a stale gateway
/// connection does.
#[derive(Default)]
pub struct RecordingWebSocketRepository {
    sent: Mutex<HashMap<String, Vec<String>>>,
    gone: Mutex<HashSet<String>>,
}

impl RecordingWebSocketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_gone(&self, connection_id: &str) {
        if let Ok(mut gone) = self.gone.lock() {
            gone.insert(connection_id.to_string());
        }
    }

    /// Raw payloads delivered to `connection_id`, oldest first.
    pub fn payloads(&self, connection_id: &str) -> Vec<String> {
        self.sent
            .lock()
            .map(|sent| sent.get(connection_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Delivered payloads decoded back into messages; undecodable payloads are skipped.
    pub fn messages(&self, connection_id: &str) -> Vec<Message> {
        self.payloads(connection_id)
            .iter()
            .filter_map(|payload| Message::decode(payload).ok())
            .collect()
    }
}

#[async_trait]
impl WebSocketRepository for RecordingWebSocketRepository {
    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        let is_gone = self
            .gone
            .lock()
            .map(|gone| gone.contains(connection_id))
            .unwrap_or(false);
        if is_gone {
            return Err(WebSocketRepositoryError::Gone(connection_id.to_string()));
        }

        self.sent
            .lock()
            .map_err(|_| WebSocketRepositoryError::ApiGateway("recorder lock poisoned".to_string()))?
            .entry(connection_id.to_string())
            .or_default()
            .push(message.to_string());
        Ok(())
    }
}
