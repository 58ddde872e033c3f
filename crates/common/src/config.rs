//! Application configuration.

use serde::Deserialize;
use std::path::Path;

use crate::id::IdFormat;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Voting configuration.
    pub voting: VotingConfig,
    /// API configuration.
    #[serde(default)]
    pub api: ApiConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Format for generated vote primary keys.
    #[serde(default)]
    pub id_format: IdFormat,
}

/// Voting configuration.
///
/// Seeds the feedback catalog and registers which polymorphic kinds are
/// allowed on each side of a vote. The catalog remains mutable at runtime
/// through the admin API; this is only the boot-time value.
#[derive(Debug, Clone, Deserialize)]
pub struct VotingConfig {
    /// Allowed feedback tags. Empty disables the feedback-tag feature.
    #[serde(default)]
    pub feedback_options: Vec<String>,
    /// Entity kinds that can receive votes.
    pub votable_kinds: Vec<String>,
    /// Entity kinds that can cast votes.
    pub voter_kinds: Vec<String>,
}

/// API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Bearer token required for admin endpoints. Unset disables them.
    #[serde(default)]
    pub admin_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `UPDOWN_ENV`)
    /// 3. Environment variables with `UPDOWN_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("UPDOWN_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("UPDOWN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("UPDOWN")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 3000);
        assert_eq!(default_max_connections(), 100);
        assert_eq!(default_min_connections(), 5);
    }

    #[test]
    fn test_voting_config_deserialize() {
        let config: VotingConfig = serde_json::from_value(serde_json::json!({
            "feedback_options": ["like", "dislike"],
            "votable_kinds": ["post"],
            "voter_kinds": ["user"],
        }))
        .unwrap();
        assert_eq!(config.feedback_options, vec!["like", "dislike"]);
        assert_eq!(config.votable_kinds, vec!["post"]);
        assert_eq!(config.voter_kinds, vec!["user"]);
    }

    #[test]
    fn test_voting_config_feedback_options_default_empty() {
        let config: VotingConfig = serde_json::from_value(serde_json::json!({
            "votable_kinds": ["post"],
            "voter_kinds": ["user"],
        }))
        .unwrap();
        assert!(config.feedback_options.is_empty());
    }

    #[test]
    fn test_api_config_default() {
        let config = ApiConfig::default();
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_database_config_id_format_defaults_to_ulid() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "url": "postgres://localhost/updown",
        }))
        .unwrap();
        assert_eq!(config.id_format, IdFormat::Ulid);
    }
}
