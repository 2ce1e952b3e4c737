//! Discord adapter for the DM mirror.
//!
//! Receives private messages over the serenity gateway, hands them to the
//! sync engine as [`dmbridge_mirror::MirrorEvent`]s, and implements the
//! engine's transport and permission gate over the Discord REST API.

pub mod access;
pub mod bot;
pub mod error;
pub mod handler;
pub mod outbound;

pub use {
    access::DiscordPermissionGate,
    bot::{build_engine, start_bridge},
    handler::MirrorHandler,
    outbound::DiscordTransport,
};
