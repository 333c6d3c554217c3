use super::ConfigError;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: SecretString,
    #[serde(default = "default_prefix")]
    pub default_prefix: String,
    #[serde(default)]
    pub owner_ids: Vec<u64>,
    #[serde(default = "default_use_privileged_intents")]
    pub use_privileged_intents: bool,
}

impl DiscordConfig {
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_ids.contains(&user_id)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(alias = "console", default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default, alias = "conn_string")]
    pub url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub max_connections: Option<u32>,
    #[serde(default)]
    pub min_connections: Option<u32>,
}

impl DatabaseConfig {
    pub fn db_type(&self) -> DbType {
        let url = self.connection_string();
        if url.starts_with("sqlite://") {
            DbType::Sqlite
        } else {
            DbType::Postgres
        }
    }

    pub fn connection_string(&self) -> String {
        if let Some(ref url) = self.url {
            url.clone()
        } else if let Some(ref file) = self.filename {
            format!("sqlite://{}", file)
        } else {
            String::new()
        }
    }

    pub fn sqlite_path(&self) -> Option<String> {
        if let DbType::Sqlite = self.db_type() {
            let url = self.connection_string();
            Some(url.strip_prefix("sqlite://").unwrap_or(&url).to_string())
        } else {
            None
        }
    }

    pub fn max_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.max_connections,
            DbType::Sqlite => Some(1),
        }
    }

    pub fn min_connections(&self) -> Option<u32> {
        match self.db_type() {
            DbType::Postgres => self.min_connections,
            DbType::Sqlite => Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    Postgres,
    Sqlite,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parses, applies `PENGUIN_BOT_TOKEN` / `PENGUIN_DATABASE_URL`, then
    /// validates.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse(content)?;
        config.apply_overrides(
            std::env::var("PENGUIN_BOT_TOKEN").ok(),
            std::env::var("PENGUIN_DATABASE_URL").ok(),
        );
        config.validate()?;
        Ok(config)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn apply_overrides(&mut self, bot_token: Option<String>, database_url: Option<String>) {
        if let Some(value) = bot_token {
            self.discord.bot_token = SecretString::from(value);
        }
        if let Some(value) = database_url {
            self.database.url = Some(value);
        }
    }
}

fn default_prefix() -> String {
    "p,".to_string()
}

fn default_use_privileged_intents() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::{Config, DbType, LogFormat};
    use crate::config::ConfigError;

    fn parse_validated(content: &str) -> Result<Config, ConfigError> {
        let config = Config::parse(content)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = parse_validated(
            r#"
discord:
  bot_token: "token"
database:
  url: "postgres://penguin@localhost/penguin"
"#,
        )
        .expect("valid config");

        assert_eq!(config.discord.bot_token.expose_secret(), "token");
        assert_eq!(config.discord.default_prefix, "p,");
        assert!(config.discord.owner_ids.is_empty());
        assert!(config.discord.use_privileged_intents);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.database.db_type(), DbType::Postgres);
    }

    #[test]
    fn sqlite_filename_selects_sqlite() {
        let config = parse_validated(
            r#"
discord:
  bot_token: "token"
  owner_ids: [447422100798570496]
logging:
  level: debug
  format: json
database:
  filename: "/var/lib/penguin/bot.db"
"#,
        )
        .expect("valid config");

        assert!(config.discord.is_owner(447422100798570496));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.database.db_type(), DbType::Sqlite);
        assert_eq!(
            config.database.sqlite_path().as_deref(),
            Some("/var/lib/penguin/bot.db")
        );
        assert_eq!(config.database.max_connections(), Some(1));
    }

    #[test]
    fn blank_prefix_is_rejected() {
        let err = parse_validated(
            r#"
discord:
  bot_token: "token"
  default_prefix: "  "
database:
  url: "postgres://localhost/penguin"
"#,
        )
        .expect_err("blank prefix");

        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn missing_database_is_rejected() {
        let err = parse_validated(
            r#"
discord:
  bot_token: "token"
database: {}
"#,
        )
        .expect_err("no database");

        assert!(matches!(err, ConfigError::InvalidConfig(_)));
    }

    #[test]
    fn overrides_replace_token_and_database_url() {
        let mut config = parse_validated(
            r#"
discord:
  bot_token: "from-file"
database:
  filename: "bot.db"
"#,
        )
        .expect("valid config");

        config.apply_overrides(None, None);
        assert_eq!(config.discord.bot_token.expose_secret(), "from-file");
        assert_eq!(config.database.db_type(), DbType::Sqlite);

        config.apply_overrides(
            Some("from-env".to_string()),
            Some("postgres://penguin@db/penguin".to_string()),
        );
        assert_eq!(config.discord.bot_token.expose_secret(), "from-env");
        assert_eq!(config.database.db_type(), DbType::Postgres);
        assert_eq!(
            config.database.connection_string(),
            "postgres://penguin@db/penguin"
        );
    }
}
