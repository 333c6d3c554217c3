use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use serenity::all::{GuildId, MessageId, RoleId, UserId};
use std::sync::Arc;

use crate::db::schema::{blacklist, guild_config, reaction_roles};

use super::{
    DatabaseError,
    models::{GuildConfig, ReactionRole},
    rows::{BlacklistRow, GuildConfigRow, ReactionRoleRow, decode_all, to_column},
};

pub(crate) fn establish_connection(path: &str) -> Result<SqliteConnection, DatabaseError> {
    SqliteConnection::establish(path).map_err(|e| DatabaseError::Connection(e.to_string()))
}

async fn with_connection<T, F>(db_path: Arc<String>, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = establish_connection(&db_path)?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct SqliteGuildConfigStore {
    db_path: Arc<String>,
}

impl SqliteGuildConfigStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::GuildConfigStore for SqliteGuildConfigStore {
    async fn fetch_all(&self) -> Result<Vec<GuildConfig>, DatabaseError> {
        let db_path = self.db_path.clone();
        with_connection(db_path, move |conn| {
            guild_config::table
                .select(GuildConfigRow::as_select())
                .load::<GuildConfigRow>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
                .and_then(decode_all)
        })
        .await
    }

    async fn fetch_one(&self, guild_id: GuildId) -> Result<Option<GuildConfig>, DatabaseError> {
        let db_path = self.db_path.clone();
        let key = to_column("guild_config", "id", guild_id.get())?;
        with_connection(db_path, move |conn| {
            guild_config::table
                .filter(guild_config::id.eq(key))
                .select(GuildConfigRow::as_select())
                .first::<GuildConfigRow>(conn)
                .optional()
                .map_err(|e| DatabaseError::Query(e.to_string()))?
                .map(GuildConfig::try_from)
                .transpose()
        })
        .await
    }

    async fn upsert(&self, config: &GuildConfig) -> Result<(), DatabaseError> {
        let db_path = self.db_path.clone();
        let row = GuildConfigRow::try_from(config)?;
        with_connection(db_path, move |conn| {
            diesel::insert_into(guild_config::table)
                .values(&row)
                .on_conflict(guild_config::id)
                .do_update()
                .set(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn ensure(&self, guild_id: GuildId) -> Result<(), DatabaseError> {
        let db_path = self.db_path.clone();
        let row = GuildConfigRow::try_from(&GuildConfig::unconfigured(guild_id))?;
        with_connection(db_path, move |conn| {
            diesel::insert_into(guild_config::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct SqliteBlacklistStore {
    db_path: Arc<String>,
}

impl SqliteBlacklistStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::BlacklistStore for SqliteBlacklistStore {
    async fn fetch_all(&self) -> Result<Vec<UserId>, DatabaseError> {
        let db_path = self.db_path.clone();
        with_connection(db_path, move |conn| {
            blacklist::table
                .select(BlacklistRow::as_select())
                .load::<BlacklistRow>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
                .and_then(decode_all)
        })
        .await
    }

    async fn insert(&self, user_id: UserId) -> Result<(), DatabaseError> {
        let db_path = self.db_path.clone();
        let row = BlacklistRow {
            id: to_column("blacklist", "id", user_id.get())?,
        };
        with_connection(db_path, move |conn| {
            diesel::insert_into(blacklist::table)
                .values(&row)
                .on_conflict_do_nothing()
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn delete(&self, user_id: UserId) -> Result<(), DatabaseError> {
        let db_path = self.db_path.clone();
        let key = to_column("blacklist", "id", user_id.get())?;
        with_connection(db_path, move |conn| {
            diesel::delete(blacklist::table.filter(blacklist::id.eq(key)))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct SqliteReactionRoleStore {
    db_path: Arc<String>,
}

impl SqliteReactionRoleStore {
    pub fn new(db_path: Arc<String>) -> Self {
        Self { db_path }
    }
}

#[async_trait]
impl super::ReactionRoleStore for SqliteReactionRoleStore {
    async fn fetch_all(&self) -> Result<Vec<ReactionRole>, DatabaseError> {
        let db_path = self.db_path.clone();
        with_connection(db_path, move |conn| {
            reaction_roles::table
                .select(ReactionRoleRow::as_select())
                .load::<ReactionRoleRow>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
                .and_then(decode_all)
        })
        .await
    }

    async fn upsert(&self, message_id: MessageId, role_id: RoleId) -> Result<(), DatabaseError> {
        let db_path = self.db_path.clone();
        let row = ReactionRoleRow {
            msg_id: to_column("reaction_roles", "msg_id", message_id.get())?,
            role_id: to_column("reaction_roles", "role_id", role_id.get())?,
        };
        with_connection(db_path, move |conn| {
            diesel::insert_into(reaction_roles::table)
                .values(&row)
                .on_conflict(reaction_roles::msg_id)
                .do_update()
                .set(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }

    async fn delete(&self, message_id: MessageId) -> Result<(), DatabaseError> {
        let db_path = self.db_path.clone();
        let key = to_column("reaction_roles", "msg_id", message_id.get())?;
        with_connection(db_path, move |conn| {
            diesel::delete(reaction_roles::table.filter(reaction_roles::msg_id.eq(key)))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
