use serenity::all::{ChannelId, RoleId};

use crate::db::GuildConfig;

/// One edit to a guild's settings, applied to a full record before it is
/// written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    Prefix(Option<String>),
    Autorole(Option<RoleId>),
    WelcomeChannel(Option<ChannelId>),
    WelcomeMessage(String),
    WelcomeEnabled(bool),
    LogChannel(Option<ChannelId>),
}

impl SettingsChange {
    pub fn apply(&self, config: &mut GuildConfig) {
        match self {
            SettingsChange::Prefix(prefix) => config.prefix = prefix.clone(),
            SettingsChange::Autorole(role) => config.autorole = *role,
            SettingsChange::WelcomeChannel(channel) => config.welcome_channel_id = *channel,
            SettingsChange::WelcomeMessage(message) => {
                config.welcome_message = Some(message.clone())
            }
            SettingsChange::WelcomeEnabled(enabled) => config.welcome_enabled = *enabled,
            SettingsChange::LogChannel(channel) => config.log_channel_id = *channel,
        }
    }

    pub fn confirmation(&self) -> String {
        match self {
            SettingsChange::Prefix(Some(prefix)) => format!("Prefix set to `{prefix}`."),
            SettingsChange::Prefix(None) => "Prefix reset to the default.".to_string(),
            SettingsChange::Autorole(Some(role)) => format!("New members will get <@&{role}>."),
            SettingsChange::Autorole(None) => "Autorole disabled.".to_string(),
            SettingsChange::WelcomeChannel(Some(channel)) => {
                format!("Welcome messages will be sent to <#{channel}>.")
            }
            SettingsChange::WelcomeChannel(None) => "Welcome channel cleared.".to_string(),
            SettingsChange::WelcomeMessage(_) => "Welcome message updated.".to_string(),
            SettingsChange::WelcomeEnabled(true) => "Welcome messages enabled.".to_string(),
            SettingsChange::WelcomeEnabled(false) => "Welcome messages disabled.".to_string(),
            SettingsChange::LogChannel(Some(channel)) => format!("Logging to <#{channel}>."),
            SettingsChange::LogChannel(None) => "Log channel cleared.".to_string(),
        }
    }
}

pub fn describe(config: &GuildConfig, default_prefix: &str) -> String {
    let prefix = config.prefix.as_deref().unwrap_or(default_prefix);
    let autorole = config
        .autorole
        .map(|role| format!("<@&{role}>"))
        .unwrap_or_else(|| "none".to_string());
    let welcome_channel = config
        .welcome_channel_id
        .map(|channel| format!("<#{channel}>"))
        .unwrap_or_else(|| "none".to_string());
    let log_channel = config
        .log_channel_id
        .map(|channel| format!("<#{channel}>"))
        .unwrap_or_else(|| "none".to_string());
    let welcome = if config.welcome_enabled { "on" } else { "off" };

    format!(
        "**Prefix:** `{prefix}`\n\
         **Autorole:** {autorole}\n\
         **Welcome:** {welcome} in {welcome_channel}\n\
         **Log channel:** {log_channel}"
    )
}

/// Fills the welcome template. `{user}` mentions the member, `{name}` is
/// their username and `{server}` the guild name.
pub fn render_welcome(template: &str, user_id: u64, user_name: &str, server: &str) -> String {
    template
        .replace("{user}", &format!("<@{user_id}>"))
        .replace("{name}", user_name)
        .replace("{server}", server)
}

pub const DEFAULT_WELCOME_MESSAGE: &str = "Welcome to {server}, {user}!";
