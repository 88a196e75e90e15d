//! Configuration management

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;
use crate::infrastructure::llm::LLMConfig;

/// Upper bound for `chat.session-ttl-hours` (ten years)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365 * 10;

/// Service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub llm: LLMConfig,
    pub chat: ChatConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    pub bind: String,
    /// Allow any origin (the web front end is served separately)
    pub permissive_cors: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

/// Tunables for sessions and listing search
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ChatConfig {
    pub session_ttl_hours: i64,
    pub max_sessions_per_user: usize,
    pub cbd_radius_km: f64,
    pub nearby_limit: usize,
    pub search_limit: usize,
    /// Minimum fuzzy score for `/api/sql-query` rows
    pub fuzzy_threshold: f64,
    pub history_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
            permissive_cors: true,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("tourwise.db"),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24,
            max_sessions_per_user: 10,
            cbd_radius_km: 10.0,
            nearby_limit: 20,
            search_limit: 50,
            fuzzy_threshold: 40.0,
            history_limit: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            llm: LLMConfig::default(),
            chat: ChatConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_env() -> Self {
        // Load from environment variables
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// Environment variables take precedence over file values
    pub fn apply_env(&mut self) {
        if let Ok(bind) = std::env::var("TOURWISE_BIND") {
            self.server.bind = bind;
        }

        if let Ok(path) = std::env::var("TOURWISE_DB") {
            self.database.path = PathBuf::from(path);
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.log_level = level;
        }

        self.llm.apply_env();
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::MissingField("server.bind".to_string()));
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.chat.session_ttl_hours) {
            return Err(ConfigError::InvalidValue(format!(
                "chat.session-ttl-hours must be within 1..={}, got {}",
                MAX_SESSION_TTL_HOURS, self.chat.session_ttl_hours
            )));
        }
        if self.chat.max_sessions_per_user == 0 {
            return Err(ConfigError::InvalidValue("chat.max-sessions-per-user must be at least 1".to_string()));
        }
        if !(0.0..=100.0).contains(&self.chat.fuzzy_threshold) {
            return Err(ConfigError::InvalidValue(format!(
                "chat.fuzzy-threshold must be within 0..=100, got {}",
                self.chat.fuzzy_threshold
            )));
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Result<TimeDelta, ConfigError> {
        TimeDelta::try_hours(self.chat.session_ttl_hours)
            .filter(|_| (1..=MAX_SESSION_TTL_HOURS).contains(&self.chat.session_ttl_hours))
            .ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "chat.session-ttl-hours out of range: {}",
                    self.chat.session_ttl_hours
                ))
            })
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("server:\n  bind: 0.0.0.0:9000\nchat:\n  cbd-radius-km: 5\n").unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:9000");
        assert_eq!(config.chat.cbd_radius_km, 5.0);
        assert_eq!(config.chat.session_ttl_hours, 24);
        assert_eq!(config.database.path, PathBuf::from("tourwise.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("max-sessions-per-user: 10"));
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.chat.fuzzy_threshold, 40.0);
    }

    #[test]
    fn test_huge_session_ttl_is_rejected() {
        let mut config = Config::default();
        assert_eq!(config.session_ttl().unwrap(), TimeDelta::hours(24));

        config.chat.session_ttl_hours = i64::MAX;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
        assert!(matches!(config.session_ttl(), Err(ConfigError::InvalidValue(_))));

        config.chat.session_ttl_hours = MAX_SESSION_TTL_HOURS + 1;
        assert!(config.validate().is_err());
        assert!(config.session_ttl().is_err());

        let parsed: Config = serde_yaml::from_str("chat:\n  session-ttl-hours: 9223372036854775807\n").unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.chat.fuzzy_threshold = 140.0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }
}
