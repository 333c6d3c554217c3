use std::sync::Arc;

use dashmap::DashMap;
use serenity::all::GuildId;
use tracing::{debug, info};

use super::PersistenceError;
use crate::db::{GuildConfig, GuildConfigStore};

const TABLE: &str = "guild_config";

/// Per-guild settings keyed by guild id.
///
/// Entries are whole `Arc<GuildConfig>` values swapped in under the map's
/// shard lock, so refreshes of different guilds do not wait on each other and
/// a reader always gets one complete record. Two refreshes of the same guild
/// race and the last write wins.
#[derive(Clone)]
pub struct GuildConfigCache {
    entries: Arc<DashMap<GuildId, Arc<GuildConfig>>>,
    store: Arc<dyn GuildConfigStore>,
}

impl GuildConfigCache {
    pub fn new(store: Arc<dyn GuildConfigStore>) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            store,
        }
    }

    /// Merges every `guild_config` row into the cache.
    ///
    /// Fetched guilds overwrite their entries; guilds missing from the result
    /// keep whatever they had.
    pub async fn load_all(&self) -> Result<(), PersistenceError> {
        let rows = self
            .store
            .fetch_all()
            .await
            .map_err(PersistenceError::table(TABLE))?;

        let fetched = rows.len();
        for config in rows {
            self.entries.insert(config.guild_id, Arc::new(config));
        }

        info!(
            "loaded {} guild configs ({} cached)",
            fetched,
            self.entries.len()
        );
        Ok(())
    }

    /// Re-reads one guild's row and replaces its entry.
    ///
    /// A missing row leaves the entry untouched. On error the entry is also
    /// untouched and the caller decides what to tell the user.
    pub async fn refresh_one(&self, guild_id: GuildId) -> Result<(), PersistenceError> {
        let row = self
            .store
            .fetch_one(guild_id)
            .await
            .map_err(PersistenceError::row(TABLE, guild_id.get()))?;

        match row {
            Some(config) => {
                debug!("refreshed guild config for {}", guild_id);
                self.entries.insert(guild_id, Arc::new(config));
            }
            None => debug!("no guild config row for {}, keeping cached entry", guild_id),
        }
        Ok(())
    }

    /// Current settings, or the unconfigured defaults for an unknown guild.
    pub fn get(&self, guild_id: GuildId) -> Arc<GuildConfig> {
        self.entries
            .get(&guild_id)
            .map(|entry| Arc::clone(entry.value()))
            .unwrap_or_else(|| Arc::new(GuildConfig::unconfigured(guild_id)))
    }

    /// Drops the entry of a guild the bot has left. The row stays in the
    /// database so a rejoin restores it.
    pub fn prune(&self, guild_id: GuildId) -> bool {
        self.entries.remove(&guild_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for GuildConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuildConfigCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
