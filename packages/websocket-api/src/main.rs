use aws_lambda_events::apigw::ApiGatewayWebsocketProxyRequest;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

pub mod event;
pub mod state;

use shared::config::Config;
use shared::repositories::game_repository::DynamoDbGameSessionRepository;
use shared::services::dispatcher::Dispatcher;
use shared::services::opponent_service::OpponentService;

#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // the Lambda runtime timestamps every line itself
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    info!(
        "Starting with games table {} and connections table {}",
        config.games_table, config.connections_table
    );

    let sdk_config = aws_config::load_from_env().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&sdk_config);
    let game_repository = Arc::new(DynamoDbGameSessionRepository::new(
        dynamodb_client,
        &config.games_table,
        &config.connections_table,
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        game_repository,
        Arc::new(OpponentService::new()),
        &config,
    ));
    let websocket_service = config
        .websocket_endpoint
        .as_deref()
        .map(|endpoint| Arc::new(state::websocket_service(&sdk_config, endpoint)));

    let app_state = state::AppState {
        dispatcher,
        sdk_config,
        websocket_service,
    };

    run(service_fn(
        |event: LambdaEvent<ApiGatewayWebsocketProxyRequest>| {
            websocket_handler(event, app_state.clone())
        },
    ))
    .await
}

async fn websocket_handler(
    event: LambdaEvent<ApiGatewayWebsocketProxyRequest>,
    state: state::AppState,
) -> Result<WebSocketResponse, Error> {
    let request = event.payload;
    let inbound = match event::inbound_event(&request) {
        Ok(inbound) => inbound,
        Err(e) => {
            error!("Rejected gateway event: {}", e);
            return Ok(WebSocketResponse { status_code: 400 });
        }
    };
    debug!(
        "Processing {:?} for connection {}",
        inbound.kind, inbound.connection_id
    );

    let outbound = state.dispatcher.handle(inbound).await;
    if outbound.is_empty() {
        return Ok(WebSocketResponse { status_code: 200 });
    }

    let endpoint = event::callback_endpoint(&request);
    match state.websocket_service_for(endpoint.as_deref()) {
        Some(websocket_service) => {
            let total = outbound.len();
            let delivered = websocket_service.deliver(outbound).await;
            debug!("Delivered {}/{} messages", delivered, total);
        }
        None => warn!("No callback endpoint, dropping {} messages", outbound.len()),
    }

    Ok(WebSocketResponse { status_code: 200 })
}
