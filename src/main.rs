#![forbid(unsafe_code)]

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod bootstrap;
mod cache;
mod cli;
mod config;
mod db;
mod discord;
mod utils;

use bootstrap::Bootstrap;
use cli::Args;
use config::Config;
use discord::DiscordBot;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Arc::new(Config::load_from_file(&args.config)?);

    if args.check_config {
        println!(
            "{}: ok ({:?} database, default prefix {:?}, {} owners)",
            args.config.display(),
            config.database.db_type(),
            config.discord.default_prefix,
            config.discord.owner_ids.len()
        );
        return Ok(());
    }

    utils::logging::init_tracing(&config.logging);
    info!("penguin-bot starting up");

    let database = config.database.clone();
    let mut bootstrap = Bootstrap::new();
    let ready = bootstrap
        .run(async move {
            let manager = db::DatabaseManager::new(&database).await?;
            manager.migrate().await?;
            info!("using {:?} database", manager.db_type());
            Ok::<_, db::DatabaseError>(manager.stores())
        })
        .await?;

    DiscordBot::new(config, ready).start().await?;

    info!("penguin-bot shutting down");
    Ok(())
}
