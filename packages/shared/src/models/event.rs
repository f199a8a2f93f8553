/// An inbound websocket event, independent of the gateway that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub connection_id: String,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Connect,
    Disconnect,
    Message(String),
}

impl InboundEvent {
    pub fn connect(connection_id: &str) -> Self {
        InboundEvent {
            connection_id: connection_id.to_string(),
            kind: EventKind::Connect,
        }
    }

    pub fn disconnect(connection_id: &str) -> Self {
        InboundEvent {
            connection_id: connection_id.to_string(),
            kind: EventKind::Disconnect,
        }
    }

    pub fn message(connection_id: &str, body: &str) -> Self {
        InboundEvent {
            connection_id: connection_id.to_string(),
            kind: EventKind::Message(body.to_string()),
        }
    }
}
