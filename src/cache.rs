//! In-memory projections of the `guild_config`, `blacklist` and
//! `reaction_roles` tables.
//!
//! Reads never touch the database. Writes fetch first and only then swap the
//! new value in, so a failed fetch leaves the cached value as it was and a
//! reader never sees a half-built record. The three caches are independent
//! and share no lock.

pub use self::blacklist::BlacklistCache;
pub use self::error::{LoadTarget, PersistenceError};
pub use self::guild_config::GuildConfigCache;
pub use self::reaction_roles::ReactionRoleIndex;

mod blacklist;
mod error;
mod guild_config;
mod reaction_roles;

#[cfg(test)]
pub(crate) mod testing;

use crate::db::Stores;

/// The caches a feature handler may read from.
///
/// Only a successful bootstrap hands one out, so a handler never sees a
/// partially loaded set.
#[derive(Clone)]
pub struct Caches {
    pub guild_configs: GuildConfigCache,
    pub blacklist: BlacklistCache,
    pub reaction_roles: ReactionRoleIndex,
}

impl Caches {
    pub(crate) fn empty(stores: &Stores) -> Self {
        Self {
            guild_configs: GuildConfigCache::new(stores.guild_config.clone()),
            blacklist: BlacklistCache::new(stores.blacklist.clone()),
            reaction_roles: ReactionRoleIndex::new(stores.reaction_roles.clone()),
        }
    }
}
