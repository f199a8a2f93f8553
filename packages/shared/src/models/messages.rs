use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::board::{Board, Disk};

/// Every message of the websocket protocol, tagged by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    Hello {
        #[serde(default)]
        version: String,
    },
    HostGame {
        #[serde(rename = "host")]
        nickname: String,
    },
    StartSoloGame {
        nickname: String,
        difficulty: u8,
    },
    JoinGame {
        nickname: String,
        host: String,
    },
    Joined {
        nickname: String,
    },
    LeaveGame {
        nickname: String,
        host: String,
    },
    GameOver {
        message: String,
    },
    ListOpenGames,
    OpenGames {
        hosts: Vec<String>,
    },
    PlaceDisk {
        nickname: String,
        host: String,
        x: i32,
        y: i32,
    },
    UpdateBoard {
        board: Board,
        player: Disk,
    },
    Error {
        error: String,
    },
    Decorate {
        decoration: String,
    },
}

const ACTIONS: [&str; 13] = [
    "hello",
    "hostGame",
    "startSoloGame",
    "joinGame",
    "joined",
    "leaveGame",
    "gameOver",
    "listOpenGames",
    "openGames",
    "placeDisk",
    "updateBoard",
    "error",
    "decorate",
];

impl Message {
    /// Decodes a JSON payload. The `action` discriminator is checked before
    /// the body is parsed so unknown actions are reported as such.
    pub fn decode(payload: &str) -> Result<Message, MessageDecodeError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| MessageDecodeError::InvalidJson(e.to_string()))?;

        let action = match value.get("action").and_then(Value::as_str) {
            Some(action) if !action.is_empty() => action.to_string(),
            _ => return Err(MessageDecodeError::MissingAction(payload.to_string())),
        };

        if !ACTIONS.contains(&action.as_str()) {
            return Err(MessageDecodeError::UnsupportedAction(action));
        }

        serde_json::from_value(value).map_err(|e| MessageDecodeError::InvalidPayload {
            action,
            reason: e.to_string(),
        })
    }

    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Message::Hello { .. } => "hello",
            Message::HostGame { .. } => "hostGame",
            Message::StartSoloGame { .. } => "startSoloGame",
            Message::JoinGame { .. } => "joinGame",
            Message::Joined { .. } => "joined",
            Message::LeaveGame { .. } => "leaveGame",
            Message::GameOver { .. } => "gameOver",
            Message::ListOpenGames => "listOpenGames",
            Message::OpenGames { .. } => "openGames",
            Message::PlaceDisk { .. } => "placeDisk",
            Message::UpdateBoard { .. } => "updateBoard",
            Message::Error { .. } => "error",
            Message::Decorate { .. } => "decorate",
        }
    }

    pub fn update_board(board: Board, player: Disk) -> Self {
        Message::UpdateBoard { board, player }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Message::Error {
            error: error.into(),
        }
    }

    pub fn game_over(message: impl Into<String>) -> Self {
        Message::GameOver {
            message: message.into(),
        }
    }
}

/// A message addressed to one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub connection_id: String,
    pub message: Message,
}

impl Outbound {
    pub fn new(connection_id: &str, message: Message) -> Self {
        Outbound {
            connection_id: connection_id.to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageDecodeError {
    InvalidJson(String),
    MissingAction(String),
    UnsupportedAction(String),
    InvalidPayload { action: String, reason: String },
}

impl std::fmt::Display for MessageDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageDecodeError::InvalidJson(msg) => write!(f, "invalid JSON: {}", msg),
            MessageDecodeError::MissingAction(payload) => {
                write!(f, "invalid message {:?}", payload)
            }
            MessageDecodeError::UnsupportedAction(action) => {
                write!(f, "unsupported message action {:?}", action)
            }
            MessageDecodeError::InvalidPayload { action, reason } => {
                write!(f, "invalid {} message: {}", action, reason)
            }
        }
    }
}

impl std::error::Error for MessageDecodeError {}
