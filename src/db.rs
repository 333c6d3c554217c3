pub use self::error::DatabaseError;
pub use self::manager::DatabaseManager;
pub use self::models::{GuildConfig, ReactionRole};
pub use self::stores::{BlacklistStore, GuildConfigStore, ReactionRoleStore, Stores};

pub mod error;
pub mod manager;
pub mod models;
pub mod rows;
pub mod schema;
pub mod stores;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;
