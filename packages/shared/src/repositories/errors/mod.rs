pub mod game_repository_errors;
pub mod websocket_repository_errors;
