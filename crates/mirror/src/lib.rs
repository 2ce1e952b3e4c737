//! DM mirroring core.
//!
//! Correlates inbound private messages with their mirrored copies in a shared
//! channel and keeps the copies in sync through create, edit and delete.
//! Platform adapters implement [`MirrorTransport`] and [`AuthorizationGate`];
//! persistence goes through [`store::CorrelationStore`].

pub mod dispatch;
pub mod engine;
pub mod error;
pub mod gate;
pub mod notice;
pub mod outcome;
pub mod store;
pub mod store_memory;
pub mod store_sqlite;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod fakes;

pub use {
    dispatch::{EventDispatcher, EventSender},
    engine::{EngineSettings, SyncEngine},
    error::{Error, Result},
    gate::AuthorizationGate,
    notice::{Locale, Notice},
    outcome::{CreateOutcome, DeleteOutcome, EditOutcome, ReconcileReport},
    store::{CorrelationRecord, CorrelationStore},
    transport::MirrorTransport,
    types::{
        InboundDelete, InboundEdit, InboundMessage, MirrorAttachment, MirrorChannel, MirrorEvent,
        MirroredMessage, Sender,
    },
};

/// Run database migrations for the `messages` table.
///
/// Must be called before [`store_sqlite::SqliteStore::with_pool`].
pub async fn run_migrations(pool: &sqlx::SqlitePool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .set_ignore_missing(true)
        .run(pool)
        .await?;
    Ok(())
}
