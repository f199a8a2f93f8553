use std::env;

const DEFAULT_GAMES_TABLE: &str = "othello-games";
const DEFAULT_CONNECTIONS_TABLE: &str = "othello-connections";
const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Handler settings, read from the environment once per cold start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub games_table: String,
    pub connections_table: String,
    /// Management API endpoint. When unset it is derived from the request's
    /// domain name and stage.
    pub websocket_endpoint: Option<String>,
    pub max_commit_attempts: u32,
    pub min_client_version: Option<String>,
    pub decoration: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            games_table: DEFAULT_GAMES_TABLE.to_string(),
            connections_table: DEFAULT_CONNECTIONS_TABLE.to_string(),
            websocket_endpoint: None,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
            min_client_version: None,
            decoration: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        let max_commit_attempts = match non_empty("MAX_COMMIT_ATTEMPTS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(0) | Err(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "MAX_COMMIT_ATTEMPTS".to_string(),
                        value: raw,
                    })
                }
                Ok(attempts) => attempts,
            },
            None => defaults.max_commit_attempts,
        };

        let min_client_version = non_empty("MIN_CLIENT_VERSION");
        if let Some(version) = &min_client_version {
            if parse_version(version).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: "MIN_CLIENT_VERSION".to_string(),
                    value: version.clone(),
                });
            }
        }

        Ok(Config {
            games_table: non_empty("GAMES_TABLE").unwrap_or(defaults.games_table),
            connections_table: non_empty("CONNECTIONS_TABLE")
                .unwrap_or(defaults.connections_table),
            websocket_endpoint: non_empty("WEBSOCKET_API_ENDPOINT"),
            max_commit_attempts,
            min_client_version,
            decoration: non_empty("DECORATION"),
        })
    }
}

/// Parses a dotted numeric version such as `1.4.2`.
pub fn parse_version(version: &str) -> Option<Vec<u64>> {
    let version = version.trim().trim_start_matches('v');
    if version.is_empty() {
        return None;
    }
    version
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// True when `version` is older than `minimum`. Unparseable client versions
/// count as older.
pub fn is_older_version(version: &str, minimum: &str) -> bool {
    match (parse_version(version), parse_version(minimum)) {
        (Some(mut version), Some(mut minimum)) => {
            let len = version.len().max(minimum.len());
            version.resize(len, 0);
            minimum.resize(len, 0);
            version < minimum
        }
        (None, Some(_)) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { key: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: {:?}", key, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
