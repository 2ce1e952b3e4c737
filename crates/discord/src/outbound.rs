use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::{
        builder::{CreateAttachment, CreateMessage, EditMessage},
        http::Http,
        model::{
            channel::{Channel, ChannelType},
            id::{ChannelId, MessageId, UserId},
        },
    },
    tracing::{debug, warn},
};

use dmbridge_mirror::{
    Error, MirrorAttachment, MirrorChannel, MirrorTransport, MirroredMessage, Result,
};

use crate::error::{channel_error, message_error, parse_id};

/// Discord's limit for a bot message body.
pub const MAX_CONTENT_CHARS: usize = 2000;

/// [`MirrorTransport`] over the Discord REST API.
pub struct DiscordTransport {
    http: Arc<Http>,
}

impl DiscordTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }

    /// Download each attachment for re-upload. URLs that cannot be fetched
    /// are returned so they can be linked in the body instead.
    async fn uploads(
        &self,
        attachments: &[MirrorAttachment],
    ) -> (Vec<CreateAttachment>, Vec<String>) {
        let mut files = Vec::with_capacity(attachments.len());
        let mut links = Vec::new();
        for attachment in attachments {
            match CreateAttachment::url(self.http(), &attachment.url).await {
                Ok(file) => files.push(file),
                Err(e) => {
                    warn!(
                        filename = %attachment.filename,
                        error = %e,
                        "attachment download failed, linking instead"
                    );
                    links.push(attachment.url.clone());
                },
            }
        }
        (files, links)
    }
}

/// Channel kinds a mirror can be posted into.
#[must_use]
pub fn is_postable(kind: ChannelType) -> bool {
    matches!(
        kind,
        ChannelType::Text
            | ChannelType::News
            | ChannelType::PublicThread
            | ChannelType::PrivateThread
            | ChannelType::NewsThread
    )
}

/// Append fallback links and clamp to [`MAX_CONTENT_CHARS`].
#[must_use]
pub fn compose_content(content: &str, links: &[String]) -> String {
    let mut body = content.to_string();
    for link in links {
        if !body.is_empty() {
            body.push('\n');
        }
        body.push_str(link);
    }
    if body.chars().count() <= MAX_CONTENT_CHARS {
        return body;
    }
    let mut clamped: String = body.chars().take(MAX_CONTENT_CHARS - 1).collect();
    clamped.push('…');
    clamped
}

fn channel_id_of(channel: &MirrorChannel) -> Result<ChannelId> {
    parse_id("channel", &channel.id)
        .map(ChannelId::new)
        .map_err(Error::channel_unavailable)
}

fn message_id_of(mirror_id: &str) -> Result<MessageId> {
    parse_id("message", mirror_id).map(MessageId::new)
}

#[async_trait]
impl MirrorTransport for DiscordTransport {
    async fn resolve_channel(&self, channel_id: &str) -> Result<MirrorChannel> {
        let id = parse_id("channel", channel_id)
            .map(ChannelId::new)
            .map_err(Error::channel_unavailable)?;
        match id.to_channel(self.http()).await {
            Ok(Channel::Guild(gc)) if is_postable(gc.kind) => Ok(MirrorChannel {
                id: gc.id.to_string(),
                guild_id: gc.guild_id.to_string(),
            }),
            Ok(_) => Err(Error::channel_unavailable(format!(
                "{channel_id} is not a guild text channel"
            ))),
            Err(e) => Err(channel_error(channel_id, e)),
        }
    }

    async fn send(
        &self,
        channel: &MirrorChannel,
        content: &str,
        attachments: &[MirrorAttachment],
    ) -> Result<String> {
        let channel_id = channel_id_of(channel)?;
        let (files, links) = self.uploads(attachments).await;
        let builder = CreateMessage::new()
            .content(compose_content(content, &links))
            .add_files(files);
        let msg = channel_id
            .send_message(self.http(), builder)
            .await
            .map_err(|e| channel_error(&channel.id, e))?;
        debug!(mirror_id = %msg.id, channel_id = %channel.id, "mirror posted");
        Ok(msg.id.to_string())
    }

    /// Only the body is replaced. Files uploaded with the mirror stay, since
    /// a DM edit cannot add attachments.
    async fn edit(
        &self,
        channel: &MirrorChannel,
        mirror_id: &str,
        content: &str,
        _attachments: &[MirrorAttachment],
    ) -> Result<()> {
        let channel_id = channel_id_of(channel)?;
        let message_id = message_id_of(mirror_id)?;
        channel_id
            .edit_message(
                self.http(),
                message_id,
                EditMessage::new().content(compose_content(content, &[])),
            )
            .await
            .map_err(|e| message_error(mirror_id, e))?;
        Ok(())
    }

    async fn delete(&self, channel: &MirrorChannel, mirror_id: &str) -> Result<()> {
        let channel_id = channel_id_of(channel)?;
        let message_id = message_id_of(mirror_id)?;
        channel_id
            .delete_message(self.http(), message_id)
            .await
            .map_err(|e| message_error(mirror_id, e))
    }

    async fn fetch(&self, channel: &MirrorChannel, mirror_id: &str) -> Result<MirroredMessage> {
        let channel_id = channel_id_of(channel)?;
        let message_id = message_id_of(mirror_id)?;
        let msg = channel_id
            .message(self.http(), message_id)
            .await
            .map_err(|e| message_error(mirror_id, e))?;
        Ok(MirroredMessage {
            id: msg.id.to_string(),
            content: msg.content,
        })
    }

    async fn notify_sender(&self, user_id: &str, text: &str) -> Result<()> {
        let user = UserId::new(parse_id("user", user_id)?);
        user.direct_message(self.http(), CreateMessage::new().content(text))
            .await
            .map_err(|e| Error::external(format!("direct message to {user_id}"), e))?;
        Ok(())
    }
}
