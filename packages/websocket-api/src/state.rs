use std::sync::Arc;

use aws_config::SdkConfig;
use shared::repositories::websocket_repository::ApiGatewayWebSocketRepository;
use shared::services::dispatcher::Dispatcher;
use shared::services::websocket_service::WebSocketService;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub sdk_config: SdkConfig,
    /// Set when the endpoint is configured; otherwise a service is built per
    /// request from the request's domain and stage.
    pub websocket_service: Option<Arc<WebSocketService>>,
}

impl AppState {
    pub fn websocket_service_for(&self, endpoint: Option<&str>) -> Option<Arc<WebSocketService>> {
        if let Some(service) = &self.websocket_service {
            return Some(service.clone());
        }
        endpoint.map(|endpoint| Arc::new(websocket_service(&self.sdk_config, endpoint)))
    }
}

pub fn websocket_service(sdk_config: &SdkConfig, endpoint: &str) -> WebSocketService {
    WebSocketService::new(Arc::new(ApiGatewayWebSocketRepository::for_endpoint(
        sdk_config, endpoint,
    )))
}
