use std::error::Error as StdError;

/// Crate-wide result type for store and transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed errors shared by the correlation store and the mirror transport.
///
/// The engine never surfaces these to users directly; it folds them into the
/// per-operation outcome enums in [`crate::outcome`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A correlation for this inbound message already exists.
    #[error("correlation already exists for message {original_id}")]
    DuplicateKey { original_id: String },

    /// No correlation exists for this inbound message.
    #[error("no correlation for message {original_id}")]
    NotFound { original_id: String },

    /// The mirror channel cannot be resolved or is not a postable text channel.
    #[error("mirror channel unavailable: {message}")]
    ChannelUnavailable { message: String },

    /// The mirrored message no longer exists on the platform.
    #[error("mirrored message not found: {mirror_id}")]
    MirrorNotFound { mirror_id: String },

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Wrapped source error from the platform client or another dependency.
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn duplicate_key(original_id: impl Into<String>) -> Self {
        Self::DuplicateKey {
            original_id: original_id.into(),
        }
    }

    #[must_use]
    pub fn not_found(original_id: impl Into<String>) -> Self {
        Self::NotFound {
            original_id: original_id.into(),
        }
    }

    #[must_use]
    pub fn channel_unavailable(message: impl std::fmt::Display) -> Self {
        Self::ChannelUnavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn mirror_not_found(mirror_id: impl Into<String>) -> Self {
        Self::MirrorNotFound {
            mirror_id: mirror_id.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
