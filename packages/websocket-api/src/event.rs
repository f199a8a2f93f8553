use aws_lambda_events::apigw::ApiGatewayWebsocketProxyRequest;
use shared::models::event::InboundEvent;

#[derive(Debug, PartialEq, Eq)]
pub enum EventError {
    MissingConnectionId,
    UnknownEventType(String),
}

impl std::fmt::Display for EventError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventError::MissingConnectionId => write!(f, "Event has no connection id"),
            EventError::UnknownEventType(event_type) => {
                write!(f, "Unknown event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for EventError {}

/// Maps a gateway event onto the handler's event model by `eventType`.
pub fn inbound_event(request: &ApiGatewayWebsocketProxyRequest) -> Result<InboundEvent, EventError> {
    let context = &request.request_context;
    let connection_id = context
        .connection_id
        .as_deref()
        .ok_or(EventError::MissingConnectionId)?;

    match context.event_type.as_deref().unwrap_or_default() {
        "CONNECT" => Ok(InboundEvent::connect(connection_id)),
        "DISCONNECT" => Ok(InboundEvent::disconnect(connection_id)),
        "MESSAGE" => Ok(InboundEvent::message(
            connection_id,
            request.body.as_deref().unwrap_or_default(),
        )),
        other => Err(EventError::UnknownEventType(other.to_string())),
    }
}

/// Management API endpoint for the stage that delivered `request`.
pub fn callback_endpoint(request: &ApiGatewayWebsocketProxyRequest) -> Option<String> {
    let context = &request.request_context;
    match (context.domain_name.as_deref(), context.stage.as_deref()) {
        (Some(domain_name), Some(stage)) => Some(format!("https://{}/{}", domain_name, stage)),
        _ => None,
    }
}
