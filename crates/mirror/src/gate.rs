use async_trait::async_trait;

use crate::types::MirrorChannel;

/// Decides whether a DM sender may post into the mirror channel.
#[async_trait]
pub trait AuthorizationGate: Send + Sync {
    /// `true` only if the sender is a member of the channel's guild and can
    /// both view and send in the channel. Lookup failures resolve to `false`.
    async fn can_send(&self, sender_id: &str, channel: &MirrorChannel) -> bool;
}

/// Gate that admits everyone. Useful for single-user deployments and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl AuthorizationGate for AllowAll {
    async fn can_send(&self, _sender_id: &str, _channel: &MirrorChannel) -> bool {
        true
    }
}
