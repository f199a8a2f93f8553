use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::board::{Board, Disk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Solo,
    Multiplayer,
}

/// A participant bound to one disk color. The AI seat of a solo game has no
/// connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub nickname: String,
    pub connection_id: Option<String>,
}

impl Seat {
    pub fn human(nickname: &str, connection_id: &str) -> Self {
        Seat {
            nickname: nickname.to_string(),
            connection_id: Some(connection_id.to_string()),
        }
    }

    pub fn ai() -> Self {
        Seat {
            nickname: "AI".to_string(),
            connection_id: None,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.connection_id.is_none()
    }
}

/// Durable record of one game, keyed by the host's nickname.
///
/// `version` is the optimistic concurrency revision: 0 for a record that has
/// not been stored yet, incremented by every successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    pub host: String,
    pub board: Board,
    pub player: Disk,
    pub mode: GameMode,
    pub difficulty: Option<u8>,
    pub player1: Option<Seat>,
    pub player2: Option<Seat>,
    pub open: bool,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSession {
    pub fn new_multiplayer(host: &str, connection_id: &str) -> Self {
        let now = Utc::now();
        GameSession {
            host: host.to_string(),
            board: Board::new(),
            player: Disk::Player1,
            mode: GameMode::Multiplayer,
            difficulty: None,
            player1: Some(Seat::human(host, connection_id)),
            player2: None,
            open: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn new_solo(nickname: &str, connection_id: &str, difficulty: u8) -> Self {
        let now = Utc::now();
        GameSession {
            host: nickname.to_string(),
            board: Board::new(),
            player: Disk::Player1,
            mode: GameMode::Solo,
            difficulty: Some(difficulty),
            player1: Some(Seat::human(nickname, connection_id)),
            player2: Some(Seat::ai()),
            open: false,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn seat(&self, disk: Disk) -> Option<&Seat> {
        match disk {
            Disk::Player1 => self.player1.as_ref(),
            Disk::Player2 => self.player2.as_ref(),
        }
    }

    pub fn seat_mut(&mut self, disk: Disk) -> &mut Option<Seat> {
        match disk {
            Disk::Player1 => &mut self.player1,
            Disk::Player2 => &mut self.player2,
        }
    }

    pub fn is_full(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }

    /// Disk held by `connection_id`, if it is seated in this game.
    pub fn disk_of(&self, connection_id: &str) -> Option<Disk> {
        [Disk::Player1, Disk::Player2].into_iter().find(|&disk| {
            self.seat(disk)
                .and_then(|seat| seat.connection_id.as_deref())
                .is_some_and(|id| id == connection_id)
        })
    }

    /// Connection ids of every human participant, player 1 first.
    pub fn connection_ids(&self) -> Vec<String> {
        [&self.player1, &self.player2]
            .into_iter()
            .flatten()
            .filter_map(|seat| seat.connection_id.clone())
            .collect()
    }

    /// The AI's disk in a solo game.
    pub fn ai_disk(&self) -> Option<Disk> {
        [Disk::Player1, Disk::Player2]
            .into_iter()
            .find(|&disk| self.seat(disk).is_some_and(Seat::is_ai))
    }

    pub fn is_over(&self) -> bool {
        self.board.game_over()
    }
}
