use secrecy::ExposeSecret;
use thiserror::Error;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.discord.bot_token.expose_secret().trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "discord.bot_token cannot be empty".to_string(),
            ));
        }

        if self.discord.default_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "discord.default_prefix cannot be blank".to_string(),
            ));
        }

        if self.database.connection_string().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "database connection string cannot be empty".to_string(),
            ));
        }

        if let (Some(min), Some(max)) = (
            self.database.min_connections,
            self.database.max_connections,
        ) && min > max
        {
            return Err(ConfigError::InvalidConfig(format!(
                "database.min_connections ({min}) exceeds database.max_connections ({max})"
            )));
        }

        Ok(())
    }
}
