use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serenity::all::{GuildId, MessageId, RoleId, UserId};

use crate::db::manager::Pool;
use crate::db::schema::{blacklist, guild_config, reaction_roles};

use super::{
    DatabaseError,
    models::{GuildConfig, ReactionRole},
    rows::{BlacklistRow, GuildConfigRow, ReactionRoleRow, decode_all, to_column},
};

async fn with_connection<T, F>(pool: Pool, operation: F) -> Result<T, DatabaseError>
where
    T: Send + 'static,
    F: FnOnce(&mut PgConnection) -> Result<T, DatabaseError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut conn = pool
            .get()
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        operation(&mut conn)
    })
    .await
    .map_err(|e| DatabaseError::Query(format!("database task failed: {e}")))?
}

pub struct PostgresGuildConfigStore {
    pool: Pool,
}

impl PostgresGuildConfigStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::GuildConfigStore for PostgresGuildConfigStore {
    async fn fetch_all(&self) -> Result<Vec<GuildConfig>, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
            guild_config::table
                .select(GuildConfigRow::as_select())
                .load::<GuildConfigRow>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
                .and_then(decode_all)
        })
        .await
    }

    async fn fetch_one(&self, guild_id: GuildId) -> Result<Option<GuildConfig>, DatabaseError> {
        let pool = self.pool.clone();
        let key = to_column("guild_config", "id", guild_id.get())?;
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        let row = GuildConfigRow::try_from(config)?;
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        let row = GuildConfigRow::try_from(&GuildConfig::unconfigured(guild_id))?;
        with_connection(pool, move |conn| {
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

pub struct PostgresBlacklistStore {
    pool: Pool,
}

impl PostgresBlacklistStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::BlacklistStore for PostgresBlacklistStore {
    async fn fetch_all(&self) -> Result<Vec<UserId>, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
            blacklist::table
                .select(BlacklistRow::as_select())
                .load::<BlacklistRow>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
                .and_then(decode_all)
        })
        .await
    }

    async fn insert(&self, user_id: UserId) -> Result<(), DatabaseError> {
        let pool = self.pool.clone();
        let row = BlacklistRow {
            id: to_column("blacklist", "id", user_id.get())?,
        };
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        let key = to_column("blacklist", "id", user_id.get())?;
        with_connection(pool, move |conn| {
            diesel::delete(blacklist::table.filter(blacklist::id.eq(key)))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}

pub struct PostgresReactionRoleStore {
    pool: Pool,
}

impl PostgresReactionRoleStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl super::ReactionRoleStore for PostgresReactionRoleStore {
    async fn fetch_all(&self) -> Result<Vec<ReactionRole>, DatabaseError> {
        let pool = self.pool.clone();
        with_connection(pool, move |conn| {
            reaction_roles::table
                .select(ReactionRoleRow::as_select())
                .load::<ReactionRoleRow>(conn)
                .map_err(|e| DatabaseError::Query(e.to_string()))
                .and_then(decode_all)
        })
        .await
    }

    async fn upsert(&self, message_id: MessageId, role_id: RoleId) -> Result<(), DatabaseError> {
        let pool = self.pool.clone();
        let row = ReactionRoleRow {
            msg_id: to_column("reaction_roles", "msg_id", message_id.get())?,
            role_id: to_column("reaction_roles", "role_id", role_id.get())?,
        };
        with_connection(pool, move |conn| {
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
        let pool = self.pool.clone();
        let key = to_column("reaction_roles", "msg_id", message_id.get())?;
        with_connection(pool, move |conn| {
            diesel::delete(reaction_roles::table.filter(reaction_roles::msg_id.eq(key)))
                .execute(conn)
                .map(|_| ())
                .map_err(|e| DatabaseError::Query(e.to_string()))
        })
        .await
    }
}
