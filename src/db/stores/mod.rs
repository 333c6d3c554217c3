use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{GuildId, MessageId, RoleId, UserId};

use super::DatabaseError;
use super::models::{GuildConfig, ReactionRole};

#[async_trait]
pub trait GuildConfigStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<GuildConfig>, DatabaseError>;
    async fn fetch_one(&self, guild_id: GuildId) -> Result<Option<GuildConfig>, DatabaseError>;
    /// Writes every column of the record, inserting the row if needed.
    async fn upsert(&self, config: &GuildConfig) -> Result<(), DatabaseError>;
    /// Inserts an unconfigured row unless one already exists.
    async fn ensure(&self, guild_id: GuildId) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait BlacklistStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<UserId>, DatabaseError>;
    async fn insert(&self, user_id: UserId) -> Result<(), DatabaseError>;
    async fn delete(&self, user_id: UserId) -> Result<(), DatabaseError>;
}

#[async_trait]
pub trait ReactionRoleStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<ReactionRole>, DatabaseError>;
    async fn upsert(&self, message_id: MessageId, role_id: RoleId) -> Result<(), DatabaseError>;
    async fn delete(&self, message_id: MessageId) -> Result<(), DatabaseError>;
}

/// The three table gateways, handed out by a connected `DatabaseManager`.
#[derive(Clone)]
pub struct Stores {
    pub guild_config: Arc<dyn GuildConfigStore>,
    pub blacklist: Arc<dyn BlacklistStore>,
    pub reaction_roles: Arc<dyn ReactionRoleStore>,
}
