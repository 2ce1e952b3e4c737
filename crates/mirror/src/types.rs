use serde::{Deserialize, Serialize};

/// The person who wrote (or is acting on) a private message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    /// Display name, used only for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Sender {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A file attached to an inbound message, re-uploaded with the mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorAttachment {
    pub filename: String,
    pub url: String,
}

/// A resolved, postable mirror destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorChannel {
    pub id: String,
    /// Guild that owns the channel; permission checks resolve membership here.
    pub guild_id: String,
}

/// A mirrored message as currently seen on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirroredMessage {
    pub id: String,
    pub content: String,
}

/// A new private message to mirror.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub original_id: String,
    /// DM channel the message arrived in.
    pub channel_id: String,
    pub author: Sender,
    pub content: String,
    pub attachments: Vec<MirrorAttachment>,
}

/// An edit of a previously received private message.
#[derive(Debug, Clone)]
pub struct InboundEdit {
    pub original_id: String,
    pub channel_id: String,
    pub requester: Sender,
    pub content: String,
    pub attachments: Vec<MirrorAttachment>,
}

/// Deletion of a previously received private message.
#[derive(Debug, Clone)]
pub struct InboundDelete {
    pub original_id: String,
    pub channel_id: String,
    pub requester: Sender,
}

/// Inbound platform events consumed by the dispatcher.
#[derive(Debug, Clone)]
pub enum MirrorEvent {
    Created(InboundMessage),
    Edited(InboundEdit),
    Deleted(InboundDelete),
    /// The mirrored copy was removed from the mirror channel by someone else.
    MirrorRemoved { mirror_id: String },
}

impl MirrorEvent {
    /// Sequencing key: events sharing a key are processed in arrival order.
    pub fn key(&self) -> &str {
        match self {
            Self::Created(m) => &m.original_id,
            Self::Edited(e) => &e.original_id,
            Self::Deleted(d) => &d.original_id,
            Self::MirrorRemoved { mirror_id } => mirror_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "create",
            Self::Edited(_) => "edit",
            Self::Deleted(_) => "delete",
            Self::MirrorRemoved { .. } => "mirror_removed",
        }
    }
}
