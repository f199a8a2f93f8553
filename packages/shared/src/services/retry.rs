use std::future::Future;

use tracing::{debug, warn};

use crate::services::errors::game_session_service_errors::GameSessionServiceError;

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Runs a whole read-mutate-commit cycle, re-running it from the read when
/// the commit loses a version race. Gives up with `Contention` after
/// `max_attempts` lost races; every other result is returned as is.
pub async fn retry_on_conflict<T, F, Fut>(
    max_attempts: u32,
    mut operation: F,
) -> Result<T, GameSessionServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GameSessionServiceError>>,
{
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match operation().await {
            Err(err) if err.is_version_conflict() => {
                debug!("Version conflict on attempt {}/{}", attempt, max_attempts);
            }
            result => return result,
        }
    }

    warn!("Giving up after {} conflicting commits", max_attempts);
    Err(GameSessionServiceError::Contention)
}
