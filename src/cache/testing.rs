//! In-memory store fakes for cache and bootstrap tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::all::{ChannelId, GuildId, MessageId, RoleId, UserId};
use tokio::sync::Notify;

use crate::db::{
    BlacklistStore, DatabaseError, GuildConfig, GuildConfigStore, ReactionRole, ReactionRoleStore,
    Stores,
};

fn unavailable() -> DatabaseError {
    DatabaseError::Connection("connection reset by peer".to_string())
}

pub(crate) fn config(guild: u64, prefix: Option<&str>) -> GuildConfig {
    GuildConfig {
        guild_id: GuildId::new(guild),
        prefix: prefix.map(str::to_string),
        autorole: None,
        welcome_message: None,
        welcome_enabled: false,
        welcome_channel_id: None,
        log_channel_id: Some(ChannelId::new(guild + 1000)),
    }
}

#[derive(Default)]
pub(crate) struct FakeGuildConfigStore {
    rows: Mutex<BTreeMap<GuildId, GuildConfig>>,
    gates: Mutex<HashMap<GuildId, Arc<Notify>>>,
    failing: AtomicBool,
    pub(crate) fetch_all_calls: AtomicUsize,
}

impl FakeGuildConfigStore {
    pub(crate) fn with_rows(rows: impl IntoIterator<Item = GuildConfig>) -> Arc<Self> {
        let store = Self::default();
        store.set_rows(rows);
        Arc::new(store)
    }

    /// Replaces the whole table.
    pub(crate) fn set_rows(&self, rows: impl IntoIterator<Item = GuildConfig>) {
        *self.rows.lock() = rows.into_iter().map(|row| (row.guild_id, row)).collect();
    }

    pub(crate) fn put(&self, row: GuildConfig) {
        self.rows.lock().insert(row.guild_id, row);
    }

    pub(crate) fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes `fetch_one(guild_id)` wait until the returned handle is notified.
    pub(crate) fn gate(&self, guild_id: GuildId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(guild_id, gate.clone());
        gate
    }

    fn check(&self) -> Result<(), DatabaseError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GuildConfigStore for FakeGuildConfigStore {
    async fn fetch_all(&self) -> Result<Vec<GuildConfig>, DatabaseError> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.rows.lock().values().cloned().collect())
    }

    async fn fetch_one(&self, guild_id: GuildId) -> Result<Option<GuildConfig>, DatabaseError> {
        let gate = self.gates.lock().get(&guild_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.check()?;
        Ok(self.rows.lock().get(&guild_id).cloned())
    }

    async fn upsert(&self, config: &GuildConfig) -> Result<(), DatabaseError> {
        self.check()?;
        self.put(config.clone());
        Ok(())
    }

    async fn ensure(&self, guild_id: GuildId) -> Result<(), DatabaseError> {
        self.check()?;
        self.rows
            .lock()
            .entry(guild_id)
            .or_insert_with(|| GuildConfig::unconfigured(guild_id));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeBlacklistStore {
    rows: Mutex<Vec<UserId>>,
    failing: AtomicBool,
    pub(crate) fetch_all_calls: AtomicUsize,
}

impl FakeBlacklistStore {
    pub(crate) fn with_users(users: impl IntoIterator<Item = u64>) -> Arc<Self> {
        let store = Self::default();
        store.set_users(users);
        Arc::new(store)
    }

    pub(crate) fn set_users(&self, users: impl IntoIterator<Item = u64>) {
        *self.rows.lock() = users.into_iter().map(UserId::new).collect();
    }

    pub(crate) fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlacklistStore for FakeBlacklistStore {
    async fn fetch_all(&self) -> Result<Vec<UserId>, DatabaseError> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self.rows.lock().clone())
    }

    async fn insert(&self, user_id: UserId) -> Result<(), DatabaseError> {
        let mut rows = self.rows.lock();
        if !rows.contains(&user_id) {
            rows.push(user_id);
        }
        Ok(())
    }

    async fn delete(&self, user_id: UserId) -> Result<(), DatabaseError> {
        self.rows.lock().retain(|id| *id != user_id);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeReactionRoleStore {
    rows: Mutex<BTreeMap<MessageId, RoleId>>,
    failing: AtomicBool,
    pub(crate) fetch_all_calls: AtomicUsize,
}

impl FakeReactionRoleStore {
    pub(crate) fn with_pairs(pairs: impl IntoIterator<Item = (u64, u64)>) -> Arc<Self> {
        let store = Self::default();
        *store.rows.lock() = pairs
            .into_iter()
            .map(|(message, role)| (MessageId::new(message), RoleId::new(role)))
            .collect();
        Arc::new(store)
    }

    pub(crate) fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReactionRoleStore for FakeReactionRoleStore {
    async fn fetch_all(&self) -> Result<Vec<ReactionRole>, DatabaseError> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        Ok(self
            .rows
            .lock()
            .iter()
            .map(|(message_id, role_id)| ReactionRole {
                message_id: *message_id,
                role_id: *role_id,
            })
            .collect())
    }

    async fn upsert(&self, message_id: MessageId, role_id: RoleId) -> Result<(), DatabaseError> {
        self.rows.lock().insert(message_id, role_id);
        Ok(())
    }

    async fn delete(&self, message_id: MessageId) -> Result<(), DatabaseError> {
        self.rows.lock().remove(&message_id);
        Ok(())
    }
}

pub(crate) struct FakeStores {
    pub(crate) guild_config: Arc<FakeGuildConfigStore>,
    pub(crate) blacklist: Arc<FakeBlacklistStore>,
    pub(crate) reaction_roles: Arc<FakeReactionRoleStore>,
}

impl FakeStores {
    pub(crate) fn new() -> Self {
        Self {
            guild_config: Arc::new(FakeGuildConfigStore::default()),
            blacklist: Arc::new(FakeBlacklistStore::default()),
            reaction_roles: Arc::new(FakeReactionRoleStore::default()),
        }
    }

    pub(crate) fn stores(&self) -> Stores {
        Stores {
            guild_config: self.guild_config.clone(),
            blacklist: self.blacklist.clone(),
            reaction_roles: self.reaction_roles.clone(),
        }
    }
}
