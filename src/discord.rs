use std::sync::Arc;

use anyhow::{Result, anyhow};
use secrecy::ExposeSecret;
use tracing::{debug, error, info, warn};

use serenity::all::{
    ActivityData, Client as SerenityClient, Context as SerenityContext,
    EventHandler as SerenityEventHandler, GatewayIntents, Guild, GuildId, Member,
    Message as SerenityMessage, Permissions, Reaction, Ready as GatewayReady, UnavailableGuild,
};

use crate::bootstrap::Ready;
use crate::cache::{Caches, GuildConfigCache};
use crate::config::Config;
use crate::db::{GuildConfig, Stores};

pub mod commands;
pub mod settings;

use self::commands::{Access, Command, parse, strip_prefix};
use self::settings::{DEFAULT_WELCOME_MESSAGE, SettingsChange, describe, render_welcome};

const REACTION_ROLE_REASON: &str = "reaction role";
const AUTOROLE_REASON: &str = "autorole";
const STALE_SETTINGS_REPLY: &str =
    "Saved, but the settings may not have updated yet. Try again in a moment.";

/// Gateway client. It can only be built from a finished bootstrap, so no
/// event reaches a handler before every cache is loaded.
pub struct DiscordBot {
    state: Arc<BotState>,
}

struct BotState {
    config: Arc<Config>,
    stores: Stores,
    caches: Arc<Caches>,
}

struct BotHandler {
    state: Arc<BotState>,
}

pub(crate) fn gateway_intents(use_privileged_intents: bool) -> GatewayIntents {
    let mut intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::DIRECT_MESSAGES;
    if use_privileged_intents {
        intents |= GatewayIntents::GUILD_MEMBERS | GatewayIntents::MESSAGE_CONTENT;
    }
    intents
}

impl DiscordBot {
    pub fn new(config: Arc<Config>, ready: Ready) -> Self {
        Self {
            state: Arc::new(BotState {
                config,
                stores: ready.stores,
                caches: ready.caches,
            }),
        }
    }

    pub async fn start(self) -> Result<()> {
        let discord = &self.state.config.discord;
        let intents = gateway_intents(discord.use_privileged_intents);

        let mut client = SerenityClient::builder(discord.bot_token.expose_secret(), intents)
            .event_handler(BotHandler {
                state: self.state.clone(),
            })
            .await
            .map_err(|e| anyhow!("failed to build discord client: {e}"))?;

        info!("connecting to the discord gateway");
        client
            .start_autosharded()
            .await
            .map_err(|e| anyhow!("discord gateway error: {e}"))
    }
}

#[serenity::async_trait]
impl SerenityEventHandler for BotHandler {
    async fn ready(&self, ctx: SerenityContext, ready: GatewayReady) {
        info!(
            "discord gateway ready as {} ({}), {} guilds",
            ready.user.name,
            ready.user.id,
            ready.guilds.len()
        );
        ctx.set_activity(Some(ActivityData::listening(format!("@{}", ready.user.name))));
    }

    async fn message(&self, ctx: SerenityContext, msg: SerenityMessage) {
        if msg.author.bot {
            return;
        }

        if self.state.caches.blacklist.contains(msg.author.id) {
            debug!("ignoring message from blacklisted user {}", msg.author.id);
            return;
        }

        let prefix = resolve_prefix(
            &self.state.caches.guild_configs,
            msg.guild_id,
            &self.state.config.discord.default_prefix,
        );
        let bot_id = ctx.cache.current_user().id;
        let Some(body) = strip_prefix(&msg.content, &prefix, bot_id) else {
            return;
        };

        let command = match parse(body) {
            Ok(Some(command)) => command,
            Ok(None) => return,
            Err(err) => {
                reply(&ctx, &msg, err.to_string()).await;
                return;
            }
        };

        if let Err(err) = self.state.execute(&ctx, &msg, command).await {
            error!("failed to run command from {}: {err:#}", msg.author.id);
            reply(&ctx, &msg, "Something went wrong running that command.").await;
        }
    }

    async fn reaction_add(&self, ctx: SerenityContext, add_reaction: Reaction) {
        self.state.sync_reaction_role(&ctx, &add_reaction, true).await;
    }

    async fn reaction_remove(&self, ctx: SerenityContext, removed_reaction: Reaction) {
        self.state
            .sync_reaction_role(&ctx, &removed_reaction, false)
            .await;
    }

    async fn guild_member_addition(&self, ctx: SerenityContext, new_member: Member) {
        if new_member.user.bot {
            return;
        }
        self.state.welcome(&ctx, &new_member).await;
    }

    async fn guild_create(&self, _ctx: SerenityContext, guild: Guild, is_new: Option<bool>) {
        if is_new != Some(true) {
            return;
        }

        info!("joined guild {} ({})", guild.name, guild.id);
        if let Err(err) = join_guild(&self.state.stores, &self.state.caches, guild.id).await {
            error!("failed to set up settings for guild {}: {err:#}", guild.id);
        }
    }

    async fn guild_delete(
        &self,
        _ctx: SerenityContext,
        incomplete: UnavailableGuild,
        _full: Option<Guild>,
    ) {
        if incomplete.unavailable {
            return;
        }

        if self.state.caches.guild_configs.prune(incomplete.id) {
            info!("left guild {}, dropped its cached settings", incomplete.id);
        }
    }
}

impl BotState {
    async fn execute(
        &self,
        ctx: &SerenityContext,
        msg: &SerenityMessage,
        command: Command,
    ) -> Result<()> {
        if command.guild_only() && msg.guild_id.is_none() {
            reply(ctx, msg, "That command only works in a server.").await;
            return Ok(());
        }

        if !self.is_allowed(ctx, msg, command.access()).await? {
            reply(ctx, msg, "You don't have permission to use that command.").await;
            return Ok(());
        }

        match command {
            Command::Settings => {
                let guild_id = guild_of(msg)?;
                let config = self.caches.guild_configs.get(guild_id);
                reply(
                    ctx,
                    msg,
                    describe(&config, &self.config.discord.default_prefix),
                )
                .await;
            }
            Command::Update(change) => {
                let guild_id = guild_of(msg)?;
                self.update_settings(ctx, msg, guild_id, change).await?;
            }
            Command::BlacklistAdd(user_id) => {
                self.stores.blacklist.insert(user_id).await?;
                self.reload_blacklist(ctx, msg, format!("<@{user_id}> is now blacklisted."))
                    .await;
            }
            Command::BlacklistRemove(user_id) => {
                self.stores.blacklist.delete(user_id).await?;
                self.reload_blacklist(ctx, msg, format!("<@{user_id}> is no longer blacklisted."))
                    .await;
            }
            Command::ReactionRoleAdd {
                message_id,
                role_id,
            } => {
                self.stores
                    .reaction_roles
                    .upsert(message_id, role_id)
                    .await?;
                self.caches.reaction_roles.upsert(message_id, role_id);
                reply(
                    ctx,
                    msg,
                    format!("Reacting to message {message_id} now grants <@&{role_id}>."),
                )
                .await;
            }
            Command::ReactionRoleRemove(message_id) => {
                self.stores.reaction_roles.delete(message_id).await?;
                let text = match self.caches.reaction_roles.remove(message_id) {
                    Some(_) => format!("Removed the reaction role on message {message_id}."),
                    None => format!("Message {message_id} had no reaction role."),
                };
                reply(ctx, msg, text).await;
            }
        }
        Ok(())
    }

    async fn is_allowed(
        &self,
        ctx: &SerenityContext,
        msg: &SerenityMessage,
        access: Access,
    ) -> Result<bool> {
        match access {
            Access::Everyone => Ok(true),
            Access::Owner => Ok(self.config.discord.is_owner(msg.author.id.get())),
            Access::Permission(required) => {
                if self.config.discord.is_owner(msg.author.id.get()) {
                    return Ok(true);
                }
                let Some(guild_id) = msg.guild_id else {
                    return Ok(false);
                };
                let member = msg.member(ctx).await?;
                let permissions = match ctx.cache.guild(guild_id) {
                    Some(guild) => guild.member_permissions(&member),
                    None => Permissions::empty(),
                };
                Ok(permissions.contains(required))
            }
        }
    }

    /// Writes the whole record, then re-reads it into the cache.
    async fn update_settings(
        &self,
        ctx: &SerenityContext,
        msg: &SerenityMessage,
        guild_id: GuildId,
        change: SettingsChange,
    ) -> Result<()> {
        let mut config = self
            .stores
            .guild_config
            .fetch_one(guild_id)
            .await?
            .unwrap_or_else(|| GuildConfig::unconfigured(guild_id));
        change.apply(&mut config);
        self.stores.guild_config.upsert(&config).await?;

        match self.caches.guild_configs.refresh_one(guild_id).await {
            Ok(()) => reply(ctx, msg, change.confirmation()).await,
            Err(err) => {
                warn!("settings for guild {guild_id} saved but not refreshed: {err}");
                reply(ctx, msg, STALE_SETTINGS_REPLY).await;
            }
        }
        Ok(())
    }

    async fn reload_blacklist(&self, ctx: &SerenityContext, msg: &SerenityMessage, done: String) {
        match self.caches.blacklist.reload_all().await {
            Ok(()) => reply(ctx, msg, done).await,
            Err(err) => {
                warn!("blacklist saved but not reloaded: {err}");
                reply(ctx, msg, STALE_SETTINGS_REPLY).await;
            }
        }
    }

    async fn sync_reaction_role(&self, ctx: &SerenityContext, reaction: &Reaction, grant: bool) {
        let Some(role_id) = self.caches.reaction_roles.lookup(reaction.message_id) else {
            return;
        };
        let (Some(guild_id), Some(user_id)) = (reaction.guild_id, reaction.user_id) else {
            return;
        };
        if user_id == ctx.cache.current_user().id
            || reaction.member.as_ref().is_some_and(|member| member.user.bot)
        {
            return;
        }

        let result = if grant {
            ctx.http
                .add_member_role(guild_id, user_id, role_id, Some(REACTION_ROLE_REASON))
                .await
        } else {
            ctx.http
                .remove_member_role(guild_id, user_id, role_id, Some(REACTION_ROLE_REASON))
                .await
        };

        match result {
            Ok(()) => debug!(
                "{} role {} for user {} in guild {}",
                if grant { "granted" } else { "revoked" },
                role_id,
                user_id,
                guild_id
            ),
            Err(err) => error!(
                "failed to update reaction role {} for user {} in guild {}: {err}",
                role_id, user_id, guild_id
            ),
        }
    }

    async fn welcome(&self, ctx: &SerenityContext, member: &Member) {
        let config = self.caches.guild_configs.get(member.guild_id);

        if let Some(role_id) = config.autorole
            && let Err(err) = ctx
                .http
                .add_member_role(member.guild_id, member.user.id, role_id, Some(AUTOROLE_REASON))
                .await
        {
            error!(
                "failed to give autorole {} to {} in guild {}: {err}",
                role_id, member.user.id, member.guild_id
            );
        }

        if !config.welcome_enabled {
            return;
        }
        let Some(channel_id) = config.welcome_channel_id else {
            debug!("welcome enabled in guild {} without a channel", member.guild_id);
            return;
        };

        let server = ctx
            .cache
            .guild(member.guild_id)
            .map(|guild| guild.name.clone())
            .unwrap_or_else(|| "the server".to_string());
        let template = config
            .welcome_message
            .as_deref()
            .unwrap_or(DEFAULT_WELCOME_MESSAGE);
        let text = render_welcome(template, member.user.id.get(), &member.user.name, &server);

        if let Err(err) = channel_id.say(&ctx.http, text).await {
            error!(
                "failed to send welcome message in channel {}: {err}",
                channel_id
            );
        }
    }
}

/// DMs use the default prefix, and so do guilds without one of their own.
fn resolve_prefix(
    guild_configs: &GuildConfigCache,
    guild_id: Option<GuildId>,
    default_prefix: &str,
) -> String {
    guild_id
        .and_then(|guild_id| guild_configs.get(guild_id).prefix.clone())
        .unwrap_or_else(|| default_prefix.to_string())
}

/// Creates the settings row of a newly joined guild, then caches it.
async fn join_guild(stores: &Stores, caches: &Caches, guild_id: GuildId) -> Result<()> {
    stores.guild_config.ensure(guild_id).await?;
    caches.guild_configs.refresh_one(guild_id).await?;
    Ok(())
}

fn guild_of(msg: &SerenityMessage) -> Result<GuildId> {
    msg.guild_id
        .ok_or_else(|| anyhow!("command requires a guild"))
}

async fn reply(ctx: &SerenityContext, msg: &SerenityMessage, content: impl Into<String>) {
    if let Err(err) = msg.reply(ctx, content).await {
        warn!("failed to reply in channel {}: {err}", msg.channel_id);
    }
}

#[cfg(test)]
mod tests {
    use serenity::all::{GatewayIntents, GuildId};

    use super::{gateway_intents, join_guild, resolve_prefix};
    use crate::cache::Caches;
    use crate::cache::testing::{FakeStores, config};
    use crate::db::GuildConfig;
    use crate::discord::settings::SettingsChange;

    #[test]
    fn privileged_intents_are_opt_in() {
        let base = gateway_intents(false);
        assert!(base.contains(GatewayIntents::GUILD_MESSAGE_REACTIONS));
        assert!(!base.contains(GatewayIntents::GUILD_MEMBERS));
        assert!(!base.contains(GatewayIntents::MESSAGE_CONTENT));

        let full = gateway_intents(true);
        assert!(full.contains(GatewayIntents::GUILD_MEMBERS | GatewayIntents::MESSAGE_CONTENT));
    }

    #[tokio::test]
    async fn prefix_resolution() {
        let fakes = FakeStores::new();
        fakes.guild_config.put(config(1, Some("!")));
        fakes.guild_config.put(config(2, None));
        let caches = Caches::empty(&fakes.stores());
        caches.guild_configs.load_all().await.expect("load");
        let guilds = &caches.guild_configs;

        assert_eq!(resolve_prefix(guilds, None, "p,"), "p,");
        assert_eq!(resolve_prefix(guilds, Some(GuildId::new(1)), "p,"), "!");
        assert_eq!(resolve_prefix(guilds, Some(GuildId::new(2)), "p,"), "p,");
        assert_eq!(resolve_prefix(guilds, Some(GuildId::new(3)), "p,"), "p,");
    }

    #[tokio::test]
    async fn prefix_reset_falls_back_to_default() {
        let fakes = FakeStores::new();
        fakes.guild_config.put(config(1, Some("!")));
        let caches = Caches::empty(&fakes.stores());
        caches.guild_configs.load_all().await.expect("load");

        let mut reset = config(1, Some("!"));
        SettingsChange::Prefix(None).apply(&mut reset);
        fakes.guild_config.put(reset);
        caches
            .guild_configs
            .refresh_one(GuildId::new(1))
            .await
            .expect("refresh");

        assert_eq!(
            resolve_prefix(&caches.guild_configs, Some(GuildId::new(1)), "p,"),
            "p,"
        );
    }

    #[tokio::test]
    async fn joining_a_guild_caches_unconfigured_settings() {
        let fakes = FakeStores::new();
        let stores = fakes.stores();
        let caches = Caches::empty(&stores);
        let guild = GuildId::new(40);

        join_guild(&stores, &caches, guild).await.expect("join");

        assert_eq!(caches.guild_configs.len(), 1);
        assert_eq!(*caches.guild_configs.get(guild), GuildConfig::unconfigured(guild));
    }

    #[tokio::test]
    async fn rejoining_keeps_existing_settings() {
        let fakes = FakeStores::new();
        fakes.guild_config.put(config(41, Some("?")));
        let stores = fakes.stores();
        let caches = Caches::empty(&stores);

        join_guild(&stores, &caches, GuildId::new(41))
            .await
            .expect("join");

        assert_eq!(
            caches.guild_configs.get(GuildId::new(41)).prefix.as_deref(),
            Some("?")
        );
    }
}
