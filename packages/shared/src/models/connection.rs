use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::board::Disk;

/// Index entry mapping a websocket connection to the game seat it occupies.
/// Written in the same commit as the game record it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub connection_id: String,
    pub host: String,
    pub disk: Disk,
    pub nickname: String,
    pub joined_at: DateTime<Utc>,
}

impl ConnectionRecord {
    pub fn new(connection_id: &str, host: &str, disk: Disk, nickname: &str) -> Self {
        ConnectionRecord {
            connection_id: connection_id.to_string(),
            host: host.to_string(),
            disk,
            nickname: nickname.to_string(),
            joined_at: Utc::now(),
        }
    }
}
