use async_trait::async_trait;

use crate::{
    Result,
    types::{MirrorAttachment, MirrorChannel, MirroredMessage},
};

/// Platform operations the sync engine needs. Each may fail independently.
#[async_trait]
pub trait MirrorTransport: Send + Sync {
    /// Resolve the configured destination. Fails with
    /// [`crate::Error::ChannelUnavailable`] if it cannot be found or is not a
    /// postable guild text channel.
    async fn resolve_channel(&self, channel_id: &str) -> Result<MirrorChannel>;

    /// Post a mirror and return its platform id.
    async fn send(
        &self,
        channel: &MirrorChannel,
        content: &str,
        attachments: &[MirrorAttachment],
    ) -> Result<String>;

    /// Fails with [`crate::Error::MirrorNotFound`] if the mirror is gone.
    async fn edit(
        &self,
        channel: &MirrorChannel,
        mirror_id: &str,
        content: &str,
        attachments: &[MirrorAttachment],
    ) -> Result<()>;

    /// Fails with [`crate::Error::MirrorNotFound`] if the mirror is gone.
    async fn delete(&self, channel: &MirrorChannel, mirror_id: &str) -> Result<()>;

    async fn fetch(&self, channel: &MirrorChannel, mirror_id: &str) -> Result<MirroredMessage>;

    /// Direct-message a user. Callers treat failures as best-effort.
    async fn notify_sender(&self, user_id: &str, text: &str) -> Result<()>;
}
