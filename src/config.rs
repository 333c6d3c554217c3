pub use self::parser::{
    Config, DatabaseConfig, DbType, DiscordConfig, LogFormat, LoggingConfig,
};
pub use self::validator::ConfigError;

mod parser;
mod validator;
