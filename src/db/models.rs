use serenity::all::{ChannelId, GuildId, MessageId, RoleId};

/// Persisted settings of one guild.
///
/// A record is always built from a complete `guild_config` row; there is no
/// partial update path, so replacing a record replaces every field at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuildConfig {
    pub guild_id: GuildId,
    /// `None` means the global default prefix applies.
    pub prefix: Option<String>,
    pub autorole: Option<RoleId>,
    pub welcome_message: Option<String>,
    pub welcome_enabled: bool,
    pub welcome_channel_id: Option<ChannelId>,
    pub log_channel_id: Option<ChannelId>,
}

impl GuildConfig {
    /// Settings of a guild that was never configured.
    pub fn unconfigured(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            prefix: None,
            autorole: None,
            welcome_message: None,
            welcome_enabled: false,
            welcome_channel_id: None,
            log_channel_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactionRole {
    pub message_id: MessageId,
    pub role_id: RoleId,
}
