use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    match config.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}

fn default_directives(level: &str) -> String {
    format!("penguin_bot={level},serenity=warn")
}

#[cfg(test)]
mod tests {
    use super::default_directives;

    #[test]
    fn default_directives_quiet_serenity() {
        assert_eq!(default_directives("debug"), "penguin_bot=debug,serenity=warn");
    }
}
