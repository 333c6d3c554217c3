//! Typed row shapes shared by the PostgreSQL and SQLite stores.
//!
//! Snowflakes are stored as signed 64-bit integers. Encoding refuses ids above
//! `i64::MAX`; decoding a row back into a model rejects zero and negative ids
//! instead of defaulting them.

use std::num::NonZeroU64;

use diesel::prelude::*;
use serenity::all::{ChannelId, GuildId, MessageId, RoleId, UserId};

use super::DatabaseError;
use super::models::{GuildConfig, ReactionRole};
use super::schema::{blacklist, guild_config, reaction_roles};

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = guild_config)]
#[diesel(treat_none_as_null = true)]
pub struct GuildConfigRow {
    pub id: i64,
    pub prefix: Option<String>,
    pub autorole: Option<i64>,
    pub welcomemessage: Option<String>,
    pub welcomeenabled: bool,
    pub welcomeid: Option<i64>,
    pub log_id: Option<i64>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = blacklist)]
pub struct BlacklistRow {
    pub id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = reaction_roles)]
#[diesel(primary_key(msg_id))]
pub struct ReactionRoleRow {
    pub msg_id: i64,
    pub role_id: i64,
}

fn snowflake(table: &'static str, column: &'static str, value: i64) -> Result<u64, DatabaseError> {
    u64::try_from(value)
        .ok()
        .and_then(NonZeroU64::new)
        .map(NonZeroU64::get)
        .ok_or(DatabaseError::Decode {
            table,
            column,
            value,
        })
}

fn optional_snowflake(
    table: &'static str,
    column: &'static str,
    value: Option<i64>,
) -> Result<Option<u64>, DatabaseError> {
    value.map(|raw| snowflake(table, column, raw)).transpose()
}

pub fn to_column(
    table: &'static str,
    column: &'static str,
    id: u64,
) -> Result<i64, DatabaseError> {
    i64::try_from(id).map_err(|_| DatabaseError::Encode {
        table,
        column,
        value: id,
    })
}

fn optional_column(
    table: &'static str,
    column: &'static str,
    id: Option<u64>,
) -> Result<Option<i64>, DatabaseError> {
    id.map(|raw| to_column(table, column, raw)).transpose()
}

impl TryFrom<GuildConfigRow> for GuildConfig {
    type Error = DatabaseError;

    fn try_from(row: GuildConfigRow) -> Result<Self, Self::Error> {
        const TABLE: &str = "guild_config";
        Ok(Self {
            guild_id: GuildId::new(snowflake(TABLE, "id", row.id)?),
            prefix: row.prefix,
            autorole: optional_snowflake(TABLE, "autorole", row.autorole)?.map(RoleId::new),
            welcome_message: row.welcomemessage,
            welcome_enabled: row.welcomeenabled,
            welcome_channel_id: optional_snowflake(TABLE, "welcomeid", row.welcomeid)?
                .map(ChannelId::new),
            log_channel_id: optional_snowflake(TABLE, "log_id", row.log_id)?.map(ChannelId::new),
        })
    }
}

impl TryFrom<&GuildConfig> for GuildConfigRow {
    type Error = DatabaseError;

    fn try_from(config: &GuildConfig) -> Result<Self, Self::Error> {
        const TABLE: &str = "guild_config";
        Ok(Self {
            id: to_column(TABLE, "id", config.guild_id.get())?,
            prefix: config.prefix.clone(),
            autorole: optional_column(TABLE, "autorole", config.autorole.map(RoleId::get))?,
            welcomemessage: config.welcome_message.clone(),
            welcomeenabled: config.welcome_enabled,
            welcomeid: optional_column(
                TABLE,
                "welcomeid",
                config.welcome_channel_id.map(ChannelId::get),
            )?,
            log_id: optional_column(TABLE, "log_id", config.log_channel_id.map(ChannelId::get))?,
        })
    }
}

impl TryFrom<BlacklistRow> for UserId {
    type Error = DatabaseError;

    fn try_from(row: BlacklistRow) -> Result<Self, Self::Error> {
        snowflake("blacklist", "id", row.id).map(UserId::new)
    }
}

impl TryFrom<ReactionRoleRow> for ReactionRole {
    type Error = DatabaseError;

    fn try_from(row: ReactionRoleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: MessageId::new(snowflake("reaction_roles", "msg_id", row.msg_id)?),
            role_id: RoleId::new(snowflake("reaction_roles", "role_id", row.role_id)?),
        })
    }
}

pub fn decode_all<R, T>(rows: Vec<R>) -> Result<Vec<T>, DatabaseError>
where
    T: TryFrom<R, Error = DatabaseError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use serenity::all::{ChannelId, GuildId, RoleId, UserId};

    use super::{BlacklistRow, GuildConfigRow, ReactionRoleRow, to_column};
    use crate::db::{DatabaseError, GuildConfig, ReactionRole};

    fn row() -> GuildConfigRow {
        GuildConfigRow {
            id: 1,
            prefix: Some("p,".to_string()),
            autorole: None,
            welcomemessage: Some("hi".to_string()),
            welcomeenabled: true,
            welcomeid: Some(55),
            log_id: Some(77),
        }
    }

    #[test]
    fn guild_config_row_maps_every_column() {
        let config = GuildConfig::try_from(row()).expect("valid row");

        assert_eq!(config.guild_id, GuildId::new(1));
        assert_eq!(config.prefix.as_deref(), Some("p,"));
        assert_eq!(config.autorole, None);
        assert_eq!(config.welcome_message.as_deref(), Some("hi"));
        assert!(config.welcome_enabled);
        assert_eq!(config.welcome_channel_id, Some(ChannelId::new(55)));
        assert_eq!(config.log_channel_id, Some(ChannelId::new(77)));
    }

    #[test]
    fn guild_config_row_survives_write_path() {
        let config = GuildConfig::try_from(row()).expect("valid row");
        let encoded = GuildConfigRow::try_from(&config).expect("encodable config");
        let back = GuildConfig::try_from(encoded).expect("valid row");
        assert_eq!(back, config);
    }

    #[test]
    fn ids_above_bigint_range_are_refused_on_write() {
        let mut config = GuildConfig::try_from(row()).expect("valid row");
        config.autorole = Some(RoleId::new(u64::MAX));

        let err = GuildConfigRow::try_from(&config).expect_err("id does not fit");
        assert!(matches!(
            err,
            DatabaseError::Encode {
                table: "guild_config",
                column: "autorole",
                value: u64::MAX,
            }
        ));

        assert_eq!(
            to_column("reaction_roles", "msg_id", i64::MAX as u64).expect("largest id"),
            i64::MAX
        );
        assert!(to_column("reaction_roles", "msg_id", 1 << 63).is_err());
    }

    #[test]
    fn negative_snowflake_is_a_decode_error() {
        let mut bad = row();
        bad.welcomeid = Some(-4);

        let err = GuildConfig::try_from(bad).expect_err("negative channel id");
        match err {
            DatabaseError::Decode {
                table,
                column,
                value,
            } => {
                assert_eq!(table, "guild_config");
                assert_eq!(column, "welcomeid");
                assert_eq!(value, -4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_ids_are_rejected_for_blacklist_and_reaction_roles() {
        assert!(UserId::try_from(BlacklistRow { id: 0 }).is_err());
        assert!(
            ReactionRole::try_from(ReactionRoleRow {
                msg_id: 10,
                role_id: 0,
            })
            .is_err()
        );
        assert_eq!(
            UserId::try_from(BlacklistRow { id: 9 }).expect("valid id"),
            UserId::new(9)
        );
    }
}
