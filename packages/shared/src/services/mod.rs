pub mod dispatcher;
pub mod errors;
pub mod game_session_service;
pub mod matchmaking_service;
pub mod opponent_service;
pub mod othello_service;
pub mod retry;
pub mod websocket_service;
