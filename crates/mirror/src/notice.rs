//! User-facing texts sent back to the DM sender.

use serde::{Deserialize, Serialize};

/// Language for notices sent to senders.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ja,
}

/// A notice delivered to the sender after an action settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    ChannelNotFound,
    NoSendPermission,
    ForwardFailed,
    ForwardedUntracked,
    Edited,
    EditFailed,
    Deleted,
    DeleteFailed,
    MessageNotFound,
    NotOwner,
    MirrorMissing,
}

impl Notice {
    pub fn text(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.text_en(),
            Locale::Ja => self.text_ja(),
        }
    }

    fn text_en(self) -> &'static str {
        match self {
            Self::ChannelNotFound => "The destination channel could not be found.",
            Self::NoSendPermission => "You don't have permission to send messages there.",
            Self::ForwardFailed => "Failed to forward your message.",
            Self::ForwardedUntracked => {
                "Your message was forwarded but could not be tracked; edits and deletions will not be synced."
            },
            Self::Edited => "Message updated.",
            Self::EditFailed => "Failed to update the message.",
            Self::Deleted => "Message deleted.",
            Self::DeleteFailed => "Failed to delete the message.",
            Self::MessageNotFound => "Message not found.",
            Self::NotOwner => "You are not the sender of this message.",
            Self::MirrorMissing => "The forwarded copy no longer exists.",
        }
    }

    fn text_ja(self) -> &'static str {
        match self {
            Self::ChannelNotFound => "送信先チャンネルが見つかりませんでした",
            Self::NoSendPermission => "メッセージ送信権限がありません",
            Self::ForwardFailed => "メッセージの転送に失敗しました",
            Self::ForwardedUntracked => {
                "メッセージを転送しましたが記録に失敗しました。編集・削除は反映されません"
            },
            Self::Edited => "メッセージを更新しました",
            Self::EditFailed => "更新に失敗しました",
            Self::Deleted => "メッセージを削除しました",
            Self::DeleteFailed => "削除に失敗しました",
            Self::MessageNotFound => "メッセージが見つかりません",
            Self::NotOwner => "あなたは送信者ではありません",
            Self::MirrorMissing => "転送先のメッセージは既に存在しません",
        }
    }
}
