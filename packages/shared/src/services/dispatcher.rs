use std::sync::Arc;

use tracing::{debug, error, info};

use crate::{
    config::{is_older_version, Config},
    models::{
        event::{EventKind, InboundEvent},
        messages::{Message, MessageDecodeError, Outbound},
    },
    repositories::game_repository::GameSessionRepository,
    services::{
        errors::game_session_service_errors::GameSessionServiceError,
        game_session_service::GameSessionService, matchmaking_service::MatchmakingService,
        opponent_service::OpponentStrategy,
    },
};

/// Routes one inbound event to the services and collects the replies.
/// Never fails: every problem becomes an `error` message to the sender.
#[derive(Clone)]
pub struct Dispatcher {
    matchmaking_service: MatchmakingService,
    game_session_service: GameSessionService,
    min_client_version: Option<String>,
    decoration: Option<String>,
}

impl Dispatcher {
    pub fn new(
        repository: Arc<dyn GameSessionRepository + Send + Sync>,
        opponent: Arc<dyn OpponentStrategy>,
        config: &Config,
    ) -> Self {
        Dispatcher {
            matchmaking_service: MatchmakingService::with_max_commit_attempts(
                repository.clone(),
                config.max_commit_attempts,
            ),
            game_session_service: GameSessionService::with_max_commit_attempts(
                repository,
                opponent,
                config.max_commit_attempts,
            ),
            min_client_version: config.min_client_version.clone(),
            decoration: config.decoration.clone(),
        }
    }

    pub async fn handle(&self, event: InboundEvent) -> Vec<Outbound> {
        let connection_id = event.connection_id.as_str();
        match &event.kind {
            EventKind::Connect => {
                info!("Connection {} opened", connection_id);
                Vec::new()
            }
            EventKind::Disconnect => {
                info!("Connection {} closed", connection_id);
                match self.matchmaking_service.disconnect(connection_id).await {
                    Ok(outbound) => outbound,
                    Err(e) => {
                        error!("Cleanup after {} disconnected failed: {}", connection_id, e);
                        Vec::new()
                    }
                }
            }
            EventKind::Message(body) => match Message::decode(body) {
                Ok(message) => self.handle_message(connection_id, message).await,
                Err(e) => {
                    debug!("Rejected payload from {}: {}", connection_id, e);
                    vec![Outbound::new(connection_id, Message::error(e.to_string()))]
                }
            },
        }
    }

    async fn handle_message(&self, connection_id: &str, message: Message) -> Vec<Outbound> {
        debug!("{} from {}", message.action(), connection_id);
        let result = match message {
            Message::Hello { version } => Ok(self.hello(connection_id, &version)),
            Message::HostGame { nickname } => {
                self.matchmaking_service
                    .host_game(connection_id, &nickname)
                    .await
            }
            Message::StartSoloGame {
                nickname,
                difficulty,
            } => {
                self.matchmaking_service
                    .start_solo_game(connection_id, &nickname, difficulty)
                    .await
            }
            Message::JoinGame { nickname, host } => {
                self.matchmaking_service
                    .join_game(connection_id, &nickname, &host)
                    .await
            }
            Message::LeaveGame { host, .. } => {
                self.matchmaking_service
                    .leave_game(connection_id, &host)
                    .await
            }
            Message::ListOpenGames => self.matchmaking_service.list_open_games(connection_id).await,
            Message::PlaceDisk { host, x, y, .. } => {
                self.game_session_service
                    .place_disk(connection_id, &host, x, y)
                    .await
            }
            // server to client only
            other => {
                let err = MessageDecodeError::UnsupportedAction(other.action().to_string());
                return vec![Outbound::new(connection_id, Message::error(err.to_string()))];
            }
        };

        match result {
            Ok(outbound) => outbound,
            Err(e) => {
                match &e {
                    GameSessionServiceError::RepositoryError(_) => {
                        error!("Request from {} failed: {}", connection_id, e)
                    }
                    _ => info!("Request from {} rejected: {}", connection_id, e),
                }
                vec![Outbound::new(connection_id, Message::error(e.client_message()))]
            }
        }
    }

    fn hello(&self, connection_id: &str, version: &str) -> Vec<Outbound> {
        if let Some(minimum) = &self.min_client_version {
            if is_older_version(version, minimum) {
                return vec![Outbound::new(
                    connection_id,
                    Message::error(format!(
                        "client version {} is too old, please upgrade to {} or newer",
                        version, minimum
                    )),
                )];
            }
        }
        match &self.decoration {
            Some(decoration) => vec![Outbound::new(
                connection_id,
                Message::Decorate {
                    decoration: decoration.clone(),
                },
            )],
            None => Vec::new(),
        }
    }
}
