use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "penguin-bot", version, about = "A moderation / fun Discord bot")]
pub struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    pub config: PathBuf,

    /// Load and validate the configuration, then exit.
    #[arg(long)]
    pub check_config: bool,
}
