//! Discord event handler for serenity.
//!
//! Turns DM traffic and mirror-channel deletions into [`MirrorEvent`]s for the
//! dispatcher. Guild messages other than mirror deletions are ignored.

use {
    serenity::{
        all::{
            Attachment, Channel, ChannelId, Context, EventHandler, GatewayIntents, GuildId,
            Message, MessageId, MessageUpdateEvent, Ready, User,
        },
        async_trait,
    },
    tracing::{debug, info, warn},
};

use dmbridge_mirror::{
    EventSender, InboundDelete, InboundEdit, InboundMessage, MirrorAttachment, MirrorEvent, Sender,
};

/// Handler for Discord gateway events.
pub struct MirrorHandler {
    events: EventSender,
    mirror_channel: Option<ChannelId>,
}

impl MirrorHandler {
    pub fn new(events: EventSender, mirror_channel: &str) -> Self {
        let parsed = parse_channel(mirror_channel);
        if parsed.is_none() {
            warn!(channel = mirror_channel, "mirror channel id is not a snowflake");
        }
        Self {
            events,
            mirror_channel: parsed,
        }
    }

    /// Required gateway intents for the bot.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::DIRECT_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    fn is_mirror_channel(&self, channel_id: ChannelId) -> bool {
        self.mirror_channel == Some(channel_id)
    }

    async fn emit(&self, event: MirrorEvent) {
        let kind = event.kind();
        if !self.events.send(event).await {
            debug!(kind, "event dropped during shutdown");
        }
    }
}

fn parse_channel(raw: &str) -> Option<ChannelId> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .map(ChannelId::new)
}

fn sender_of(user: &User) -> Sender {
    let name = user.global_name.as_deref().unwrap_or(&user.name);
    Sender::new(user.id.to_string()).with_name(name)
}

fn attachments_of(attachments: &[Attachment]) -> Vec<MirrorAttachment> {
    attachments
        .iter()
        .map(|a| MirrorAttachment {
            filename: a.filename.clone(),
            url: a.url.clone(),
        })
        .collect()
}

/// The other party of a DM channel. Deletions and some edits arrive without
/// an author, so the requester is taken from here.
async fn dm_recipient(ctx: &Context, channel_id: ChannelId) -> Option<User> {
    match channel_id.to_channel(ctx).await {
        Ok(Channel::Private(dm)) => Some(dm.recipient),
        Ok(_) => None,
        Err(e) => {
            warn!(channel_id = %channel_id, error = %e, "failed to resolve dm channel");
            None
        },
    }
}

#[async_trait]
impl EventHandler for MirrorHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_name = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord bot ready"
        );
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        // Skip bot messages, including our own notices.
        if msg.author.bot || msg.guild_id.is_some() {
            return;
        }

        debug!(
            original_id = %msg.id,
            author_id = %msg.author.id,
            attachments = msg.attachments.len(),
            "dm received"
        );
        self.emit(MirrorEvent::Created(InboundMessage {
            original_id: msg.id.to_string(),
            channel_id: msg.channel_id.to_string(),
            author: sender_of(&msg.author),
            content: msg.content.clone(),
            attachments: attachments_of(&msg.attachments),
        }))
        .await;
    }

    async fn message_update(
        &self,
        ctx: Context,
        _old_if_available: Option<Message>,
        _new: Option<Message>,
        event: MessageUpdateEvent,
    ) {
        if event.guild_id.is_some() {
            return;
        }
        if event.author.as_ref().is_some_and(|a| a.bot) {
            return;
        }
        // Embed unfurls also arrive as updates, without content.
        let Some(content) = event.content else {
            return;
        };

        let requester = match event.author {
            Some(author) => author,
            None => match dm_recipient(&ctx, event.channel_id).await {
                Some(user) => user,
                None => {
                    warn!(original_id = %event.id, "edit without a resolvable author, dropping");
                    return;
                },
            },
        };

        self.emit(MirrorEvent::Edited(InboundEdit {
            original_id: event.id.to_string(),
            channel_id: event.channel_id.to_string(),
            requester: sender_of(&requester),
            content,
            attachments: event
                .attachments
                .as_deref()
                .map(attachments_of)
                .unwrap_or_default(),
        }))
        .await;
    }

    async fn message_delete(
        &self,
        ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        if self.is_mirror_channel(channel_id) {
            self.emit(MirrorEvent::MirrorRemoved {
                mirror_id: deleted_message_id.to_string(),
            })
            .await;
            return;
        }
        if guild_id.is_some() {
            return;
        }

        let Some(requester) = dm_recipient(&ctx, channel_id).await else {
            warn!(
                original_id = %deleted_message_id,
                "delete without a resolvable requester, dropping"
            );
            return;
        };
        if requester.bot {
            return;
        }

        self.emit(MirrorEvent::Deleted(InboundDelete {
            original_id: deleted_message_id.to_string(),
            channel_id: channel_id.to_string(),
            requester: sender_of(&requester),
        }))
        .await;
    }
}
