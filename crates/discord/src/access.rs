use std::sync::Arc;

use {
    async_trait::async_trait,
    serenity::{
        http::Http,
        model::{
            Permissions,
            channel::Channel,
            id::{ChannelId, GuildId, UserId},
        },
    },
    tracing::{debug, info, warn},
};

use dmbridge_mirror::{AuthorizationGate, MirrorChannel};

use crate::error::{is_unknown_member, parse_id};

/// Permissions a sender needs in the mirror channel.
pub const REQUIRED_PERMISSIONS: Permissions =
    Permissions::VIEW_CHANNEL.union(Permissions::SEND_MESSAGES);

/// `true` if the resolved permission set lets a member post mirrors.
#[must_use]
pub fn has_mirror_permissions(permissions: Permissions) -> bool {
    permissions.contains(REQUIRED_PERMISSIONS)
}

/// Reason a sender may not post into the mirror channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    NotAMember,
    MissingPermissions,
    /// A lookup failed; the gate fails closed.
    Lookup(String),
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAMember => write!(f, "sender is not a member of the guild"),
            Self::MissingPermissions => write!(f, "sender cannot view or send in the channel"),
            Self::Lookup(reason) => write!(f, "permission lookup failed: {reason}"),
        }
    }
}

/// Checks guild membership and channel permissions over the REST API.
pub struct DiscordPermissionGate {
    http: Arc<Http>,
}

impl DiscordPermissionGate {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn http(&self) -> &Http {
        &self.http
    }

    /// Resolve the sender's effective permissions in `channel`.
    pub async fn check(
        &self,
        sender_id: &str,
        channel: &MirrorChannel,
    ) -> Result<(), AccessDenied> {
        let lookup = |e: dmbridge_mirror::Error| AccessDenied::Lookup(e.to_string());
        let guild_id = GuildId::new(parse_id("guild", &channel.guild_id).map_err(lookup)?);
        let channel_id = ChannelId::new(parse_id("channel", &channel.id).map_err(lookup)?);
        let user_id = UserId::new(parse_id("user", sender_id).map_err(lookup)?);

        let member = match guild_id.member(self.http(), user_id).await {
            Ok(member) => member,
            Err(e) if is_unknown_member(&e) => return Err(AccessDenied::NotAMember),
            Err(e) => return Err(AccessDenied::Lookup(e.to_string())),
        };
        let guild = guild_id
            .to_partial_guild(self.http())
            .await
            .map_err(|e| AccessDenied::Lookup(e.to_string()))?;
        let guild_channel = match channel_id.to_channel(self.http()).await {
            Ok(Channel::Guild(gc)) => gc,
            Ok(_) => return Err(AccessDenied::Lookup("not a guild channel".into())),
            Err(e) => return Err(AccessDenied::Lookup(e.to_string())),
        };

        let permissions = guild.user_permissions_in(&guild_channel, &member);
        debug!(
            author_id = sender_id,
            channel_id = %channel.id,
            permissions = ?permissions,
            "resolved sender permissions"
        );
        if has_mirror_permissions(permissions) {
            Ok(())
        } else {
            Err(AccessDenied::MissingPermissions)
        }
    }
}

#[async_trait]
impl AuthorizationGate for DiscordPermissionGate {
    async fn can_send(&self, sender_id: &str, channel: &MirrorChannel) -> bool {
        match self.check(sender_id, channel).await {
            Ok(()) => true,
            Err(AccessDenied::Lookup(reason)) => {
                warn!(author_id = sender_id, reason = %reason, "permission lookup failed, denying");
                false
            },
            Err(denied) => {
                info!(author_id = sender_id, reason = %denied, "sender denied");
                false
            },
        }
    }
}
