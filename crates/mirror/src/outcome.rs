//! Per-operation results of the sync engine.
//!
//! Each user-triggered action settles into exactly one of these variants.

use crate::notice::Notice;

/// Result of mirroring a new DM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    Mirrored { mirror_id: String },
    ChannelUnavailable,
    PermissionDenied,
    TransportFailure,
    /// The mirror was posted but the correlation could not be recorded.
    StoreFailure { mirror_id: String },
    /// The correlation already existed; the new mirror is an orphan.
    DuplicateKey { mirror_id: String },
}

impl CreateOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Mirrored { .. })
    }

    /// Successful creates are silent.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::Mirrored { .. } => None,
            Self::ChannelUnavailable => Some(Notice::ChannelNotFound),
            Self::PermissionDenied => Some(Notice::NoSendPermission),
            Self::TransportFailure => Some(Notice::ForwardFailed),
            Self::StoreFailure { .. } | Self::DuplicateKey { .. } => {
                Some(Notice::ForwardedUntracked)
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Mirrored { .. } => "mirrored",
            Self::ChannelUnavailable => "channel_unavailable",
            Self::PermissionDenied => "permission_denied",
            Self::TransportFailure => "transport_failure",
            Self::StoreFailure { .. } => "store_failure",
            Self::DuplicateKey { .. } => "duplicate_key",
        }
    }
}

/// Result of propagating an edit to the mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    NotFoundInStore,
    NotOwner,
    ChannelUnavailable,
    /// The mirror is gone; the record is left as is.
    MirrorMissing,
    TransportFailure,
    StoreFailure,
}

impl EditOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Edited)
    }

    pub fn notice(&self) -> Option<Notice> {
        Some(match self {
            Self::Edited => Notice::Edited,
            Self::NotFoundInStore => Notice::MessageNotFound,
            Self::NotOwner => Notice::NotOwner,
            Self::MirrorMissing => Notice::MirrorMissing,
            Self::ChannelUnavailable | Self::TransportFailure | Self::StoreFailure => {
                Notice::EditFailed
            },
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Edited => "edited",
            Self::NotFoundInStore => "not_found_in_store",
            Self::NotOwner => "not_owner",
            Self::ChannelUnavailable => "channel_unavailable",
            Self::MirrorMissing => "mirror_missing",
            Self::TransportFailure => "transport_failure",
            Self::StoreFailure => "store_failure",
        }
    }
}

/// Result of removing a mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFoundInStore,
    NotOwner,
    ChannelUnavailable,
    /// The mirror was already gone; the record has been dropped anyway.
    MirrorMissing,
    TransportFailure,
    StoreFailure,
}

impl DeleteOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    pub fn notice(&self) -> Option<Notice> {
        Some(match self {
            Self::Deleted => Notice::Deleted,
            Self::NotFoundInStore => Notice::MessageNotFound,
            Self::NotOwner => Notice::NotOwner,
            Self::MirrorMissing => Notice::MirrorMissing,
            Self::ChannelUnavailable | Self::TransportFailure | Self::StoreFailure => {
                Notice::DeleteFailed
            },
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::NotFoundInStore => "not_found_in_store",
            Self::NotOwner => "not_owner",
            Self::ChannelUnavailable => "channel_unavailable",
            Self::MirrorMissing => "mirror_missing",
            Self::TransportFailure => "transport_failure",
            Self::StoreFailure => "store_failure",
        }
    }
}

/// Summary of a reconcile sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct ReconcileReport {
    pub checked: usize,
    /// Records whose mirror no longer exists (removed unless dry-run).
    pub pruned: Vec<String>,
    pub errors: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_create_is_silent() {
        let outcome = CreateOutcome::Mirrored {
            mirror_id: "x1".into(),
        };
        assert!(outcome.is_success());
        assert_eq!(outcome.notice(), None);
    }

    #[test]
    fn orphaned_create_tells_sender() {
        let outcome = CreateOutcome::StoreFailure {
            mirror_id: "x1".into(),
        };
        assert_eq!(outcome.notice(), Some(Notice::ForwardedUntracked));
        assert_eq!(outcome.label(), "store_failure");
    }

    #[test]
    fn generic_failures_share_a_notice() {
        assert_eq!(
            EditOutcome::ChannelUnavailable.notice(),
            EditOutcome::TransportFailure.notice()
        );
        assert_eq!(
            DeleteOutcome::StoreFailure.notice(),
            Some(Notice::DeleteFailed)
        );
    }
}
