pub mod errors;
pub mod game_repository;
pub mod memory_game_repository;
pub mod memory_websocket_repository;
pub mod websocket_repository;
