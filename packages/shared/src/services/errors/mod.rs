pub mod game_session_service_errors;
pub mod othello_service_errors;
