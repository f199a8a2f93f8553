pub mod board;
pub mod connection;
pub mod event;
pub mod game_session;
pub mod messages;
