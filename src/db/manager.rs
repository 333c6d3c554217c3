use crate::config::{DatabaseConfig, DbType};
use crate::db::{BlacklistStore, DatabaseError, GuildConfigStore, ReactionRoleStore, Stores};
use std::sync::Arc;
use tracing::info;

#[cfg(feature = "postgres")]
use crate::db::postgres::{
    PostgresBlacklistStore, PostgresGuildConfigStore, PostgresReactionRoleStore,
};
#[cfg(feature = "postgres")]
use diesel::pg::PgConnection;
#[cfg(feature = "postgres")]
use diesel::r2d2::{self, ConnectionManager};

#[cfg(feature = "postgres")]
pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::{
    SqliteBlacklistStore, SqliteGuildConfigStore, SqliteReactionRoleStore, establish_connection,
};

#[cfg(any(feature = "postgres", feature = "sqlite"))]
use diesel::RunQueryDsl;

#[derive(Clone)]
pub struct DatabaseManager {
    #[cfg(feature = "postgres")]
    postgres_pool: Option<Pool>,
    #[cfg(feature = "sqlite")]
    sqlite_path: Option<String>,
    guild_config_store: Arc<dyn GuildConfigStore>,
    blacklist_store: Arc<dyn BlacklistStore>,
    reaction_role_store: Arc<dyn ReactionRoleStore>,
    db_type: DbType,
}

const POSTGRES_MIGRATIONS: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS guild_config (
        id BIGINT PRIMARY KEY,
        prefix TEXT,
        autorole BIGINT,
        welcomemessage TEXT,
        welcomeenabled BOOLEAN NOT NULL DEFAULT FALSE,
        welcomeid BIGINT,
        log_id BIGINT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blacklist (
        id BIGINT PRIMARY KEY
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reaction_roles (
        msg_id BIGINT PRIMARY KEY,
        role_id BIGINT NOT NULL
    )
    "#,
];

const SQLITE_MIGRATIONS: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS guild_config (
        id INTEGER PRIMARY KEY NOT NULL,
        prefix TEXT,
        autorole INTEGER,
        welcomemessage TEXT,
        welcomeenabled BOOLEAN NOT NULL DEFAULT 0,
        welcomeid INTEGER,
        log_id INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS blacklist (
        id INTEGER PRIMARY KEY NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reaction_roles (
        msg_id INTEGER PRIMARY KEY NOT NULL,
        role_id INTEGER NOT NULL
    )
    "#,
];

impl DatabaseManager {
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let db_type = config.db_type();

        match db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let connection_string = config.connection_string();
                let max_connections = config.max_connections();
                let min_connections = config.min_connections();

                let manager = ConnectionManager::<PgConnection>::new(connection_string);

                let builder = r2d2::Pool::builder()
                    .max_size(max_connections.unwrap_or(10))
                    .min_idle(Some(min_connections.unwrap_or(1)));

                let pool = tokio::task::spawn_blocking(move || builder.build(manager))
                    .await
                    .map_err(|e| DatabaseError::Connection(format!("pool task failed: {e}")))?
                    .map_err(|e| DatabaseError::Connection(e.to_string()))?;

                info!("connected to postgres");

                Ok(Self {
                    guild_config_store: Arc::new(PostgresGuildConfigStore::new(pool.clone())),
                    blacklist_store: Arc::new(PostgresBlacklistStore::new(pool.clone())),
                    reaction_role_store: Arc::new(PostgresReactionRoleStore::new(pool.clone())),
                    postgres_pool: Some(pool),
                    #[cfg(feature = "sqlite")]
                    sqlite_path: None,
                    db_type,
                })
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = config.sqlite_path().ok_or_else(|| {
                    DatabaseError::Connection("sqlite path is not configured".to_string())
                })?;

                let probe = path.clone();
                tokio::task::spawn_blocking(move || establish_connection(&probe).map(|_| ()))
                    .await
                    .map_err(|e| DatabaseError::Connection(format!("sqlite task failed: {e}")))??;

                info!("opened sqlite database at {}", path);

                let path_arc = Arc::new(path.clone());
                Ok(Self {
                    #[cfg(feature = "postgres")]
                    postgres_pool: None,
                    guild_config_store: Arc::new(SqliteGuildConfigStore::new(path_arc.clone())),
                    blacklist_store: Arc::new(SqliteBlacklistStore::new(path_arc.clone())),
                    reaction_role_store: Arc::new(SqliteReactionRoleStore::new(path_arc)),
                    sqlite_path: Some(path),
                    db_type,
                })
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Connection(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Connection(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        match self.db_type {
            #[cfg(feature = "postgres")]
            DbType::Postgres => {
                let pool = self.postgres_pool.clone().ok_or_else(|| {
                    DatabaseError::Migration("postgres pool is not open".to_string())
                })?;
                tokio::task::spawn_blocking(move || {
                    let mut conn = pool
                        .get()
                        .map_err(|e| DatabaseError::Connection(e.to_string()))?;
                    for statement in POSTGRES_MIGRATIONS {
                        diesel::sql_query(statement)
                            .execute(&mut conn)
                            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
                    }
                    Ok(())
                })
                .await
                .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
            }
            #[cfg(feature = "sqlite")]
            DbType::Sqlite => {
                let path = self.sqlite_path.clone().ok_or_else(|| {
                    DatabaseError::Migration("sqlite path is not configured".to_string())
                })?;
                tokio::task::spawn_blocking(move || {
                    let mut conn = establish_connection(&path)?;
                    for statement in SQLITE_MIGRATIONS {
                        diesel::sql_query(statement)
                            .execute(&mut conn)
                            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
                    }
                    Ok(())
                })
                .await
                .map_err(|e| DatabaseError::Migration(format!("migration task failed: {e}")))?
            }
            #[cfg(not(feature = "postgres"))]
            DbType::Postgres => Err(DatabaseError::Migration(
                "PostgreSQL feature not enabled".to_string(),
            )),
            #[cfg(not(feature = "sqlite"))]
            DbType::Sqlite => Err(DatabaseError::Migration(
                "SQLite feature not enabled".to_string(),
            )),
        }
    }

    pub fn stores(&self) -> Stores {
        Stores {
            guild_config: self.guild_config_store.clone(),
            blacklist: self.blacklist_store.clone(),
            reaction_roles: self.reaction_role_store.clone(),
        }
    }

    pub fn db_type(&self) -> DbType {
        self.db_type
    }
}
