//! Text command parsing. Nothing here talks to Discord.

use once_cell::sync::Lazy;
use regex::Regex;
use serenity::all::{ChannelId, MessageId, Permissions, RoleId, UserId};
use thiserror::Error;

use super::settings::SettingsChange;

static BOT_MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<@!?(\d+)>").expect("bot mention pattern"));

static MENTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(@!?|@&|#)(\d+)>$").expect("mention pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Settings,
    Update(SettingsChange),
    BlacklistAdd(UserId),
    BlacklistRemove(UserId),
    ReactionRoleAdd {
        message_id: MessageId,
        role_id: RoleId,
    },
    ReactionRoleRemove(MessageId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Everyone,
    Permission(Permissions),
    Owner,
}

impl Command {
    pub fn access(&self) -> Access {
        match self {
            Command::Settings => Access::Everyone,
            Command::Update(_) => Access::Permission(Permissions::MANAGE_GUILD),
            Command::BlacklistAdd(_) | Command::BlacklistRemove(_) => Access::Owner,
            Command::ReactionRoleAdd { .. } | Command::ReactionRoleRemove(_) => {
                Access::Permission(Permissions::MANAGE_ROLES)
            }
        }
    }

    pub fn guild_only(&self) -> bool {
        !matches!(self, Command::BlacklistAdd(_) | Command::BlacklistRemove(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Usage: `{0}`")]
    Usage(&'static str),
}

const PREFIX_USAGE: &str = "prefix <new prefix> | prefix reset";
const AUTOROLE_USAGE: &str = "autorole <role> | autorole off";
const WELCOME_USAGE: &str =
    "welcome channel <channel|off> | welcome message <text> | welcome on|off";
const LOGCHANNEL_USAGE: &str = "logchannel <channel> | logchannel off";
const BLACKLIST_USAGE: &str = "blacklist add|remove <user>";
const REACTIONROLE_USAGE: &str =
    "reactionrole add <message id> <role> | reactionrole remove <message id>";

/// Strips the guild prefix or a leading mention of the bot.
pub fn strip_prefix<'a>(content: &'a str, prefix: &str, bot_id: UserId) -> Option<&'a str> {
    if let Some(caps) = BOT_MENTION.captures(content)
        && caps[1].parse::<u64>().ok() == Some(bot_id.get())
    {
        return Some(content[caps[0].len()..].trim_start());
    }

    content.strip_prefix(prefix).map(str::trim_start)
}

/// Parses the text after the prefix. Names this bot does not handle yield
/// `Ok(None)`.
pub fn parse(body: &str) -> Result<Option<Command>, ParseError> {
    let (name, rest) = split_word(body);
    let command = match name.to_ascii_lowercase().as_str() {
        "settings" | "config" => Command::Settings,
        "prefix" => parse_prefix(rest)?,
        "autorole" => match rest {
            "" => return Err(ParseError::Usage(AUTOROLE_USAGE)),
            "off" | "none" => Command::Update(SettingsChange::Autorole(None)),
            arg => Command::Update(SettingsChange::Autorole(Some(
                role_arg(arg).ok_or(ParseError::Usage(AUTOROLE_USAGE))?,
            ))),
        },
        "welcome" => parse_welcome(rest)?,
        "logchannel" => match rest {
            "" => return Err(ParseError::Usage(LOGCHANNEL_USAGE)),
            "off" | "none" => Command::Update(SettingsChange::LogChannel(None)),
            arg => Command::Update(SettingsChange::LogChannel(Some(
                channel_arg(arg).ok_or(ParseError::Usage(LOGCHANNEL_USAGE))?,
            ))),
        },
        "blacklist" => {
            let (action, target) = split_word(rest);
            let user = user_arg(target).ok_or(ParseError::Usage(BLACKLIST_USAGE))?;
            match action {
                "add" => Command::BlacklistAdd(user),
                "remove" => Command::BlacklistRemove(user),
                _ => return Err(ParseError::Usage(BLACKLIST_USAGE)),
            }
        }
        "reactionrole" | "rr" => parse_reaction_role(rest)?,
        _ => return Ok(None),
    };
    Ok(Some(command))
}

fn parse_prefix(rest: &str) -> Result<Command, ParseError> {
    match rest {
        "" => Err(ParseError::Usage(PREFIX_USAGE)),
        "reset" => Ok(Command::Update(SettingsChange::Prefix(None))),
        prefix => Ok(Command::Update(SettingsChange::Prefix(Some(
            prefix.to_string(),
        )))),
    }
}

fn parse_welcome(rest: &str) -> Result<Command, ParseError> {
    let (sub, arg) = split_word(rest);
    let change = match (sub, arg) {
        ("on", "") => SettingsChange::WelcomeEnabled(true),
        ("off", "") => SettingsChange::WelcomeEnabled(false),
        ("channel", "off" | "none") => SettingsChange::WelcomeChannel(None),
        ("channel", arg) => SettingsChange::WelcomeChannel(Some(
            channel_arg(arg).ok_or(ParseError::Usage(WELCOME_USAGE))?,
        )),
        ("message", "") => return Err(ParseError::Usage(WELCOME_USAGE)),
        ("message", text) => SettingsChange::WelcomeMessage(text.to_string()),
        _ => return Err(ParseError::Usage(WELCOME_USAGE)),
    };
    Ok(Command::Update(change))
}

fn parse_reaction_role(rest: &str) -> Result<Command, ParseError> {
    let (action, rest) = split_word(rest);
    let (message, role) = split_word(rest);
    let message_id = raw_id(message)
        .map(MessageId::new)
        .ok_or(ParseError::Usage(REACTIONROLE_USAGE))?;
    match (action, role) {
        ("add", role) => Ok(Command::ReactionRoleAdd {
            message_id,
            role_id: role_arg(role).ok_or(ParseError::Usage(REACTIONROLE_USAGE))?,
        }),
        ("remove", "") => Ok(Command::ReactionRoleRemove(message_id)),
        _ => Err(ParseError::Usage(REACTIONROLE_USAGE)),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim();
    match input.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (input, ""),
    }
}

/// Snowflakes are stored as BIGINT, so ids past `i64::MAX` are refused here.
fn raw_id(arg: &str) -> Option<u64> {
    arg.parse::<u64>()
        .ok()
        .filter(|id| (1..=i64::MAX as u64).contains(id))
}

/// Accepts a raw id or a mention whose sigil is one of `sigils`.
fn mention_or_id(arg: &str, sigils: &[&str]) -> Option<u64> {
    if let Some(caps) = MENTION.captures(arg) {
        return if sigils.contains(&&caps[1]) {
            raw_id(&caps[2])
        } else {
            None
        };
    }
    raw_id(arg)
}

fn user_arg(arg: &str) -> Option<UserId> {
    mention_or_id(arg, &["@", "@!"]).map(UserId::new)
}

fn role_arg(arg: &str) -> Option<RoleId> {
    mention_or_id(arg, &["@&"]).map(RoleId::new)
}

fn channel_arg(arg: &str) -> Option<ChannelId> {
    mention_or_id(arg, &["#"]).map(ChannelId::new)
}
