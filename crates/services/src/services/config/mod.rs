use std::{env, path::PathBuf};

use chrono::Duration;
use db::rules::EventTypeRules;
use secrecy::SecretString;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://business.sqlite?mode=rwc";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8001;

/// Only used by debug builds started without `JWT_SECRET_KEY`.
const DEV_JWT_SECRET: &str = "dev-only-insecure-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

/// Account created on start when it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: SecretString,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: SecretString,
    pub token_ttl: Duration,
    pub cors_origins: CorsOrigins,
    pub host: String,
    pub port: u16,
    pub rules: EventTypeRules,
    pub admin: Option<AdminSeed>,
}

impl Config {
    /// Reads the process environment after loading a `.env` file if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
            Err(err) if err.not_found() => {}
            Err(err) => tracing::warn!("Failed to load .env file: {}", err),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let jwt_secret = match get("JWT_SECRET_KEY") {
            Some(secret) => SecretString::from(secret),
            None if cfg!(debug_assertions) => {
                tracing::warn!("JWT_SECRET_KEY not set, using an insecure development secret");
                SecretString::from(DEV_JWT_SECRET)
            }
            None => return Err(ConfigError::Missing("JWT_SECRET_KEY")),
        };

        let token_ttl = match get("TOKEN_TTL_MINUTES") {
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => Duration::minutes(minutes),
                _ => {
                    return Err(ConfigError::ValidationError(format!(
                        "TOKEN_TTL_MINUTES must be a positive integer, got {raw:?}"
                    )));
                }
            },
            None => Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        };

        let cors_origins = get("CORS_ORIGINS")
            .map(|raw| CorsOrigins::parse(&raw))
            .unwrap_or(CorsOrigins::Any);

        let host = get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                ConfigError::ValidationError(format!("PORT must be a port number, got {raw:?}"))
            })?,
            None => DEFAULT_PORT,
        };

        let rules = match get("EVENT_TYPE_RULES_PATH") {
            Some(path) => load_rules(&PathBuf::from(path))?,
            None => EventTypeRules::default(),
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password: SecretString::from(password),
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::ValidationError(
                    "ADMIN_EMAIL and ADMIN_PASSWORD must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            database_url,
            jwt_secret,
            token_ttl,
            cors_origins,
            host,
            port,
            rules,
            admin,
        })
    }
}

fn load_rules(path: &PathBuf) -> Result<EventTypeRules, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let rules = EventTypeRules::from_json(&raw)?;
    tracing::info!("Loaded event type rules from {}", path.display());
    Ok(rules)
}
