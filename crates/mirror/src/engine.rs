//! The synchronization engine: create → mirrored → edited* → deleted.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

#[cfg(feature = "metrics")]
use dmbridge_metrics::{counter, histogram, labels, mirror as mirror_metrics};

use crate::{
    Error, Result,
    gate::AuthorizationGate,
    notice::{Locale, Notice},
    outcome::{CreateOutcome, DeleteOutcome, EditOutcome, ReconcileReport},
    store::{CorrelationRecord, CorrelationStore},
    transport::MirrorTransport,
    types::{InboundDelete, InboundEdit, InboundMessage, MirrorChannel, MirrorEvent, Sender},
};

/// Runtime settings for the engine, taken from the profile config.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Destination channel for mirrors.
    pub channel_id: String,
    pub locale: Locale,
    /// Re-fetch the mirror after send/edit and warn if it cannot be seen.
    pub verify_writes: bool,
}

impl EngineSettings {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            locale: Locale::default(),
            verify_writes: false,
        }
    }
}

/// Why an edit or delete was refused before touching the platform.
enum Rejection {
    NotFound,
    NotOwner,
    Store,
}

impl From<Rejection> for EditOutcome {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::NotFound => Self::NotFoundInStore,
            Rejection::NotOwner => Self::NotOwner,
            Rejection::Store => Self::StoreFailure,
        }
    }
}

impl From<Rejection> for DeleteOutcome {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::NotFound => Self::NotFoundInStore,
            Rejection::NotOwner => Self::NotOwner,
            Rejection::Store => Self::StoreFailure,
        }
    }
}

/// Drives mirror state transitions for inbound DM events.
///
/// Collaborators are injected at construction; the engine holds no global
/// client state.
pub struct SyncEngine {
    store: Arc<dyn CorrelationStore>,
    transport: Arc<dyn MirrorTransport>,
    gate: Arc<dyn AuthorizationGate>,
    settings: EngineSettings,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn CorrelationStore>,
        transport: Arc<dyn MirrorTransport>,
        gate: Arc<dyn AuthorizationGate>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            store,
            transport,
            gate,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Process one inbound event to completion.
    pub async fn handle(&self, event: MirrorEvent) {
        #[cfg(feature = "metrics")]
        let (kind, started) = (event.kind(), std::time::Instant::now());
        #[cfg(feature = "metrics")]
        counter!(mirror_metrics::EVENTS_RECEIVED_TOTAL, labels::KIND => kind).increment(1);

        match event {
            MirrorEvent::Created(msg) => {
                self.handle_create(msg).await;
            },
            MirrorEvent::Edited(edit) => {
                self.handle_edit(edit).await;
            },
            MirrorEvent::Deleted(delete) => {
                self.handle_delete(delete).await;
            },
            MirrorEvent::MirrorRemoved { mirror_id } => {
                self.handle_mirror_removed(&mirror_id).await;
            },
        }

        #[cfg(feature = "metrics")]
        histogram!(mirror_metrics::EVENT_DURATION_SECONDS, labels::KIND => kind)
            .record(started.elapsed().as_secs_f64());
    }

    /// Mirror a new DM into the shared channel.
    pub async fn handle_create(&self, msg: InboundMessage) -> CreateOutcome {
        let outcome = self.mirror_create(&msg).await;
        debug!(
            original_id = %msg.original_id,
            author_id = %msg.author.id,
            outcome = outcome.label(),
            "create settled"
        );
        #[cfg(feature = "metrics")]
        counter!(mirror_metrics::CREATES_TOTAL, labels::OUTCOME => outcome.label()).increment(1);
        self.notify(&msg.author, outcome.notice()).await;
        outcome
    }

    /// Propagate an edit of a DM to its mirror.
    pub async fn handle_edit(&self, edit: InboundEdit) -> EditOutcome {
        let outcome = self.mirror_edit(&edit).await;
        debug!(
            original_id = %edit.original_id,
            requester_id = %edit.requester.id,
            outcome = outcome.label(),
            "edit settled"
        );
        #[cfg(feature = "metrics")]
        counter!(mirror_metrics::EDITS_TOTAL, labels::OUTCOME => outcome.label()).increment(1);
        self.notify(&edit.requester, outcome.notice()).await;
        outcome
    }

    /// Remove the mirror of a deleted DM, along with its correlation.
    pub async fn handle_delete(&self, delete: InboundDelete) -> DeleteOutcome {
        let outcome = self.mirror_delete(&delete).await;
        debug!(
            original_id = %delete.original_id,
            requester_id = %delete.requester.id,
            outcome = outcome.label(),
            "delete settled"
        );
        #[cfg(feature = "metrics")]
        counter!(mirror_metrics::DELETES_TOTAL, labels::OUTCOME => outcome.label()).increment(1);
        self.notify(&delete.requester, outcome.notice()).await;
        outcome
    }

    /// Drop the correlation of a mirror that was removed from the channel by
    /// someone other than the engine. Idempotent.
    pub async fn handle_mirror_removed(&self, mirror_id: &str) -> bool {
        match self.store.delete_by_mirror_id(mirror_id).await {
            Ok(true) => {
                info!(mirror_id, "mirror removed out of band, correlation dropped");
                true
            },
            Ok(false) => {
                debug!(mirror_id, "removed message was not a tracked mirror");
                false
            },
            Err(e) => {
                warn!(mirror_id, error = %e, "failed to drop correlation for removed mirror");
                false
            },
        }
    }

    /// Check up to `limit` records against the platform and drop those whose
    /// mirror no longer exists. With `dry_run`, only report them.
    pub async fn reconcile(&self, limit: usize, dry_run: bool) -> Result<ReconcileReport> {
        let channel = self
            .transport
            .resolve_channel(&self.settings.channel_id)
            .await?;
        let records = self.store.list(limit).await?;

        let mut report = ReconcileReport::default();
        for record in records {
            report.checked += 1;
            match self.transport.fetch(&channel, &record.mirror_id).await {
                Ok(_) => {},
                Err(Error::MirrorNotFound { .. }) => {
                    if !dry_run
                        && let Err(e) = self.store.delete_by_original_id(&record.original_id).await
                    {
                        warn!(
                            original_id = %record.original_id,
                            error = %e,
                            "failed to prune stale correlation"
                        );
                        report.errors += 1;
                        continue;
                    }
                    info!(
                        original_id = %record.original_id,
                        mirror_id = %record.mirror_id,
                        dry_run,
                        "stale correlation"
                    );
                    report.pruned.push(record.original_id);
                },
                Err(e) => {
                    warn!(
                        original_id = %record.original_id,
                        mirror_id = %record.mirror_id,
                        error = %e,
                        "could not check mirror"
                    );
                    report.errors += 1;
                },
            }
        }
        Ok(report)
    }

    async fn mirror_create(&self, msg: &InboundMessage) -> CreateOutcome {
        let channel = match self.resolve_channel().await {
            Ok(channel) => channel,
            Err(Error::ChannelUnavailable { .. }) => return CreateOutcome::ChannelUnavailable,
            Err(_) => return CreateOutcome::TransportFailure,
        };

        if !self.gate.can_send(&msg.author.id, &channel).await {
            info!(
                original_id = %msg.original_id,
                author_id = %msg.author.id,
                channel_id = %channel.id,
                "sender may not post in mirror channel"
            );
            return CreateOutcome::PermissionDenied;
        }

        let mirror_id = match self
            .transport
            .send(&channel, &msg.content, &msg.attachments)
            .await
        {
            Ok(id) => id,
            Err(Error::ChannelUnavailable { message }) => {
                warn!(
                    original_id = %msg.original_id,
                    reason = %message,
                    "mirror channel rejected send"
                );
                return CreateOutcome::ChannelUnavailable;
            },
            Err(e) => {
                error!(original_id = %msg.original_id, error = %e, "failed to post mirror");
                return CreateOutcome::TransportFailure;
            },
        };

        self.verify_write(&channel, &mirror_id).await;

        match self
            .store
            .put(&msg.original_id, &mirror_id, &msg.author.id, &msg.content)
            .await
        {
            Ok(()) => {
                info!(
                    original_id = %msg.original_id,
                    mirror_id = %mirror_id,
                    author_id = %msg.author.id,
                    author = msg.author.name.as_deref().unwrap_or(""),
                    "message mirrored"
                );
                CreateOutcome::Mirrored { mirror_id }
            },
            Err(Error::DuplicateKey { .. }) => {
                self.inconsistency(
                    &msg.original_id,
                    &mirror_id,
                    "correlation already exists, new mirror is orphaned",
                );
                CreateOutcome::DuplicateKey { mirror_id }
            },
            Err(e) => {
                error!(error = %e, "failed to record correlation");
                self.inconsistency(
                    &msg.original_id,
                    &mirror_id,
                    "mirror posted without correlation",
                );
                CreateOutcome::StoreFailure { mirror_id }
            },
        }
    }

    async fn mirror_edit(&self, edit: &InboundEdit) -> EditOutcome {
        let record = match self.owned_record(&edit.original_id, &edit.requester).await {
            Ok(record) => record,
            Err(rejection) => return rejection.into(),
        };

        let channel = match self.resolve_channel().await {
            Ok(channel) => channel,
            Err(Error::ChannelUnavailable { .. }) => return EditOutcome::ChannelUnavailable,
            Err(_) => return EditOutcome::TransportFailure,
        };

        match self
            .transport
            .edit(&channel, &record.mirror_id, &edit.content, &edit.attachments)
            .await
        {
            Ok(()) => {},
            Err(Error::MirrorNotFound { .. }) => {
                warn!(
                    original_id = %record.original_id,
                    mirror_id = %record.mirror_id,
                    "mirror missing on edit, correlation left stale"
                );
                return EditOutcome::MirrorMissing;
            },
            Err(e) => {
                error!(
                    original_id = %record.original_id,
                    mirror_id = %record.mirror_id,
                    error = %e,
                    "failed to edit mirror"
                );
                return EditOutcome::TransportFailure;
            },
        }

        self.verify_write(&channel, &record.mirror_id).await;

        if let Err(e) = self
            .store
            .update_content(&record.original_id, &edit.content)
            .await
        {
            error!(error = %e, "failed to update stored content");
            self.inconsistency(
                &record.original_id,
                &record.mirror_id,
                "mirror edited but stored content is stale",
            );
            return EditOutcome::StoreFailure;
        }

        info!(
            original_id = %record.original_id,
            mirror_id = %record.mirror_id,
            "mirror edited"
        );
        EditOutcome::Edited
    }

    async fn mirror_delete(&self, delete: &InboundDelete) -> DeleteOutcome {
        let record = match self
            .owned_record(&delete.original_id, &delete.requester)
            .await
        {
            Ok(record) => record,
            Err(rejection) => return rejection.into(),
        };

        let channel = match self.resolve_channel().await {
            Ok(channel) => channel,
            Err(Error::ChannelUnavailable { .. }) => return DeleteOutcome::ChannelUnavailable,
            Err(_) => return DeleteOutcome::TransportFailure,
        };

        let mirror_missing = match self.transport.delete(&channel, &record.mirror_id).await {
            Ok(()) => false,
            Err(Error::MirrorNotFound { .. }) => {
                warn!(
                    original_id = %record.original_id,
                    mirror_id = %record.mirror_id,
                    "mirror already gone, dropping correlation"
                );
                true
            },
            Err(e) => {
                error!(
                    original_id = %record.original_id,
                    mirror_id = %record.mirror_id,
                    error = %e,
                    "failed to delete mirror"
                );
                return DeleteOutcome::TransportFailure;
            },
        };

        if let Err(e) = self.store.delete_by_original_id(&record.original_id).await {
            error!(error = %e, "failed to delete correlation");
            self.inconsistency(
                &record.original_id,
                &record.mirror_id,
                "mirror deleted but correlation remains",
            );
            return DeleteOutcome::StoreFailure;
        }

        if mirror_missing {
            DeleteOutcome::MirrorMissing
        } else {
            info!(
                original_id = %record.original_id,
                mirror_id = %record.mirror_id,
                "mirror deleted"
            );
            DeleteOutcome::Deleted
        }
    }

    /// Look up a record and check it belongs to `requester`.
    async fn owned_record(
        &self,
        original_id: &str,
        requester: &Sender,
    ) -> std::result::Result<CorrelationRecord, Rejection> {
        let record = match self.store.get_by_original_id(original_id).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(original_id, "no correlation for message");
                return Err(Rejection::NotFound);
            },
            Err(e) => {
                error!(original_id, error = %e, "correlation lookup failed");
                return Err(Rejection::Store);
            },
        };

        if record.author_id != requester.id {
            warn!(
                original_id,
                author_id = %record.author_id,
                requester_id = %requester.id,
                "requester does not own the mirrored message"
            );
            return Err(Rejection::NotOwner);
        }

        Ok(record)
    }

    async fn resolve_channel(&self) -> Result<MirrorChannel> {
        self.transport
            .resolve_channel(&self.settings.channel_id)
            .await
            .inspect_err(|e| {
                warn!(
                    channel_id = %self.settings.channel_id,
                    error = %e,
                    "failed to resolve mirror channel"
                );
            })
    }

    async fn verify_write(&self, channel: &MirrorChannel, mirror_id: &str) {
        if !self.settings.verify_writes {
            return;
        }
        match self.transport.fetch(channel, mirror_id).await {
            Ok(message) if message.id == mirror_id => {
                debug!(mirror_id, "mirror write verified");
            },
            Ok(message) => {
                warn!(mirror_id, fetched_id = %message.id, "refetched mirror has a different id");
            },
            Err(e) => {
                warn!(mirror_id, error = %e, "mirror not visible after write");
            },
        }
    }

    fn inconsistency(&self, original_id: &str, mirror_id: &str, what: &str) {
        #[cfg(feature = "metrics")]
        counter!(mirror_metrics::INCONSISTENCIES_TOTAL).increment(1);
        error!(original_id, mirror_id, "inconsistency: {what}");
    }

    async fn notify(&self, sender: &Sender, notice: Option<Notice>) {
        let Some(notice) = notice else {
            return;
        };
        if let Err(e) = self
            .transport
            .notify_sender(&sender.id, notice.text(self.settings.locale))
            .await
        {
            #[cfg(feature = "metrics")]
            counter!(mirror_metrics::NOTIFY_FAILURES_TOTAL).increment(1);
            warn!(user_id = %sender.id, error = %e, "failed to notify sender");
        }
    }
}
