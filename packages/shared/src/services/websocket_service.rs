use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::messages::Outbound;
use crate::repositories::errors::websocket_repository_errors::WebSocketRepositoryError;
use crate::repositories::websocket_repository::WebSocketRepository;

#[derive(Clone)]
pub struct WebSocketService {
    repository: Arc<dyn WebSocketRepository>,
}

impl WebSocketService {
    pub fn new(repository: Arc<dyn WebSocketRepository>) -> Self {
        Self { repository }
    }

    /// Sends every message in order. State is already committed when this
    /// runs, so failures are logged and skipped. Returns how many were
    /// delivered.
    pub async fn deliver(&self, outbound: Vec<Outbound>) -> usize {
        let mut delivered = 0;
        for Outbound {
            connection_id,
            message,
        } in outbound
        {
            let payload = match message.encode() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Could not encode {} message: {}", message.action(), e);
                    continue;
                }
            };

            match self.send_message(&connection_id, &payload).await {
                Ok(()) => delivered += 1,
                Err(WebSocketRepositoryError::Gone(_)) => {
                    info!("Connection {} is gone, dropping {}", connection_id, message.action());
                }
                Err(e) => {
                    warn!(
                        "Failed to send {} to {}: {}",
                        message.action(),
                        connection_id,
                        e
                    );
                }
            }
        }
        delivered
    }

    pub async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        debug!("Sending message to connection: {}", connection_id);
        self.repository.send_message(connection_id, message).await
    }
}
