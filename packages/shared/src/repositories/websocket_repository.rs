use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::error::SdkError;
use aws_sdk_apigatewaymanagement::{primitives::Blob, Client as ApiGatewayClient};
use tracing::debug;

#[cfg(test)]
use mockall::automock;

use crate::repositories::errors::websocket_repository_errors::WebSocketRepositoryError;

/// Delivers raw payloads to websocket connections.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait WebSocketRepository: Send + Sync {
    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError>;
}

pub struct ApiGatewayWebSocketRepository {
    client: ApiGatewayClient,
}

impl ApiGatewayWebSocketRepository {
    pub fn new(client: ApiGatewayClient) -> Self {
        Self { client }
    }

    /// Builds a management API client for a websocket API endpoint, e.g.
    /// `https://{api-id}.execute-api.{region}.amazonaws.com/{stage}`.
    pub fn for_endpoint(config: &aws_config::SdkConfig, endpoint: &str) -> Self {
        let api_gateway_config = aws_sdk_apigatewaymanagement::config::Builder::from(config)
            .endpoint_url(endpoint)
            .build();
        Self::new(ApiGatewayClient::from_conf(api_gateway_config))
    }
}

#[async_trait]
impl WebSocketRepository for ApiGatewayWebSocketRepository {
    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), WebSocketRepositoryError> {
        let result = self
            .client
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(message.as_bytes()))
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("Sent message to connection: {}", connection_id);
                Ok(())
            }
            Err(e) => {
                if let SdkError::ServiceError(service_err) = &e {
                    if service_err.err().is_gone_exception() {
                        return Err(WebSocketRepositoryError::Gone(connection_id.to_string()));
                    }
                }
                Err(WebSocketRepositoryError::ApiGateway(e.to_string()))
            }
        }
    }
}
