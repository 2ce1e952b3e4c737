//! Mapping of Discord API failures onto mirror errors.

use {dmbridge_mirror::Error, serenity::http::HttpError};

const UNKNOWN_CHANNEL: isize = 10003;
const UNKNOWN_MESSAGE: isize = 10008;
const UNKNOWN_MEMBER: isize = 10007;
const MISSING_ACCESS: isize = 50001;
const MISSING_PERMISSIONS: isize = 50013;

/// What a failed request says is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    /// The channel is gone or the bot cannot post there.
    Channel,
    Message,
    /// A bare 404 without a recognised JSON error code.
    Unspecified,
}

/// Classify a Discord JSON error code and HTTP status.
#[must_use]
pub fn classify(code: isize, status: u16) -> Option<Missing> {
    match code {
        UNKNOWN_CHANNEL | MISSING_ACCESS | MISSING_PERMISSIONS => Some(Missing::Channel),
        UNKNOWN_MESSAGE => Some(Missing::Message),
        _ if status == 404 => Some(Missing::Unspecified),
        _ => None,
    }
}

pub fn missing(err: &serenity::Error) -> Option<Missing> {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => {
            classify(resp.error.code, resp.status_code.as_u16())
        },
        _ => None,
    }
}

/// `true` if a member lookup failed because the user is not in the guild.
pub fn is_unknown_member(err: &serenity::Error) -> bool {
    match err {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => {
            resp.error.code == UNKNOWN_MEMBER || resp.status_code.as_u16() == 404
        },
        _ => false,
    }
}

/// Error for a request against the mirror channel itself.
pub(crate) fn channel_error(channel_id: &str, err: serenity::Error) -> Error {
    match missing(&err) {
        Some(_) => Error::channel_unavailable(format!("channel {channel_id}: {err}")),
        None => Error::external(format!("discord request on channel {channel_id}"), err),
    }
}

/// Error for a request against one mirrored message.
pub(crate) fn message_error(mirror_id: &str, err: serenity::Error) -> Error {
    match missing(&err) {
        Some(Missing::Message | Missing::Unspecified) => Error::mirror_not_found(mirror_id),
        Some(Missing::Channel) => Error::channel_unavailable(err),
        None => Error::external(format!("discord request on message {mirror_id}"), err),
    }
}

/// Parse a snowflake. Zero is rejected since serenity ids must be non-zero.
pub(crate) fn parse_id(kind: &str, raw: &str) -> dmbridge_mirror::Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id != 0)
        .ok_or_else(|| Error::message(format!("invalid {kind} id {raw:?}")))
}
