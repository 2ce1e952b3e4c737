//! Test doubles for the engine's collaborators.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    Error, Result,
    gate::AuthorizationGate,
    store::{CorrelationRecord, CorrelationStore},
    store_memory::InMemoryStore,
    transport::MirrorTransport,
    types::{
        InboundDelete, InboundEdit, InboundMessage, MirrorAttachment, MirrorChannel,
        MirroredMessage, Sender,
    },
};

pub const MIRROR_CHANNEL: &str = "900";

pub fn create(id: &str, author: &str, content: &str) -> InboundMessage {
    InboundMessage {
        original_id: id.into(),
        channel_id: format!("dm-{author}"),
        author: Sender::new(author),
        content: content.into(),
        attachments: Vec::new(),
    }
}

pub fn edit(id: &str, requester: &str, content: &str) -> InboundEdit {
    InboundEdit {
        original_id: id.into(),
        channel_id: format!("dm-{requester}"),
        requester: Sender::new(requester),
        content: content.into(),
        attachments: Vec::new(),
    }
}

pub fn delete(id: &str, requester: &str) -> InboundDelete {
    InboundDelete {
        original_id: id.into(),
        channel_id: format!("dm-{requester}"),
        requester: Sender::new(requester),
    }
}

/// Gate with a fixed answer.
pub struct StaticGate(pub bool);

#[async_trait]
impl AuthorizationGate for StaticGate {
    async fn can_send(&self, _sender_id: &str, _channel: &MirrorChannel) -> bool {
        self.0
    }
}

/// Platform double holding mirrors in a map and recording every call.
#[derive(Default)]
pub struct FakeTransport {
    mirrors: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
    notices: Mutex<Vec<(String, String)>>,
    next_id: AtomicUsize,
    channel_missing: AtomicBool,
    fail_send: AtomicBool,
    fail_notify: AtomicBool,
    send_delay_ms: AtomicU64,
}

impl FakeTransport {
    pub fn set_channel_missing(&self, value: bool) {
        self.channel_missing.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_send(&self, value: bool) {
        self.fail_send.store(value, Ordering::SeqCst);
    }

    pub fn set_fail_notify(&self, value: bool) {
        self.fail_notify.store(value, Ordering::SeqCst);
    }

    /// Make every `send` take `delay` before it completes.
    pub fn set_send_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.send_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Simulate a moderator deleting the mirror directly.
    pub fn remove_out_of_band(&self, mirror_id: &str) {
        self.mirrors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(mirror_id);
    }

    pub fn mirror_content(&self, mirror_id: &str) -> Option<String> {
        self.mirrors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(mirror_id)
            .cloned()
    }

    /// Platform calls other than channel resolution and notifications.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    pub fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl MirrorTransport for FakeTransport {
    async fn resolve_channel(&self, channel_id: &str) -> Result<MirrorChannel> {
        if self.channel_missing.load(Ordering::SeqCst) {
            return Err(Error::channel_unavailable(format!("unknown channel {channel_id}")));
        }
        Ok(MirrorChannel {
            id: channel_id.to_string(),
            guild_id: "1".into(),
        })
    }

    async fn send(
        &self,
        _channel: &MirrorChannel,
        content: &str,
        _attachments: &[MirrorAttachment],
    ) -> Result<String> {
        let delay = self.send_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.record("send".into());
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(Error::message("platform exploded"));
        }
        let id = format!("x{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.mirrors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), content.to_string());
        Ok(id)
    }

    async fn edit(
        &self,
        _channel: &MirrorChannel,
        mirror_id: &str,
        content: &str,
        _attachments: &[MirrorAttachment],
    ) -> Result<()> {
        self.record(format!("edit:{mirror_id}"));
        let mut mirrors = self.mirrors.lock().unwrap_or_else(|e| e.into_inner());
        match mirrors.get_mut(mirror_id) {
            Some(body) => {
                *body = content.to_string();
                Ok(())
            },
            None => Err(Error::mirror_not_found(mirror_id)),
        }
    }

    async fn delete(&self, _channel: &MirrorChannel, mirror_id: &str) -> Result<()> {
        self.record(format!("delete:{mirror_id}"));
        let mut mirrors = self.mirrors.lock().unwrap_or_else(|e| e.into_inner());
        mirrors
            .remove(mirror_id)
            .map(|_| ())
            .ok_or_else(|| Error::mirror_not_found(mirror_id))
    }

    async fn fetch(&self, _channel: &MirrorChannel, mirror_id: &str) -> Result<MirroredMessage> {
        self.record(format!("fetch:{mirror_id}"));
        let mirrors = self.mirrors.lock().unwrap_or_else(|e| e.into_inner());
        mirrors
            .get(mirror_id)
            .map(|content| MirroredMessage {
                id: mirror_id.to_string(),
                content: content.clone(),
            })
            .ok_or_else(|| Error::mirror_not_found(mirror_id))
    }

    async fn notify_sender(&self, user_id: &str, text: &str) -> Result<()> {
        if self.fail_notify.load(Ordering::SeqCst) {
            return Err(Error::message("user has DMs disabled"));
        }
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((user_id.to_string(), text.to_string()));
        Ok(())
    }
}

/// Store whose writes always fail; reads see nothing.
pub struct BrokenStore;

#[async_trait]
impl CorrelationStore for BrokenStore {
    async fn put(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
        Err(Error::message("database is locked"))
    }

    async fn get_by_original_id(&self, _: &str) -> Result<Option<CorrelationRecord>> {
        Ok(None)
    }

    async fn get_by_mirror_id(&self, _: &str) -> Result<Option<CorrelationRecord>> {
        Ok(None)
    }

    async fn update_content(&self, original_id: &str, _: &str) -> Result<()> {
        Err(Error::not_found(original_id))
    }

    async fn delete_by_original_id(&self, _: &str) -> Result<()> {
        Err(Error::message("database is locked"))
    }

    async fn delete_by_mirror_id(&self, _: &str) -> Result<bool> {
        Err(Error::message("database is locked"))
    }

    async fn list(&self, _: usize) -> Result<Vec<CorrelationRecord>> {
        Ok(Vec::new())
    }
}

/// Working store whose content updates and deletes can be switched to fail.
#[derive(Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn set_fail_writes(&self, value: bool) {
        self.fail_writes.store(value, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::message("disk I/O error"));
        }
        Ok(())
    }
}

#[async_trait]
impl CorrelationStore for FlakyStore {
    async fn put(
        &self,
        original_id: &str,
        mirror_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        self.check()?;
        self.inner
            .put(original_id, mirror_id, author_id, content)
            .await
    }

    async fn get_by_original_id(&self, original_id: &str) -> Result<Option<CorrelationRecord>> {
        self.inner.get_by_original_id(original_id).await
    }

    async fn get_by_mirror_id(&self, mirror_id: &str) -> Result<Option<CorrelationRecord>> {
        self.inner.get_by_mirror_id(mirror_id).await
    }

    async fn update_content(&self, original_id: &str, content: &str) -> Result<()> {
        self.check()?;
        self.inner.update_content(original_id, content).await
    }

    async fn delete_by_original_id(&self, original_id: &str) -> Result<()> {
        self.check()?;
        self.inner.delete_by_original_id(original_id).await
    }

    async fn delete_by_mirror_id(&self, mirror_id: &str) -> Result<bool> {
        self.check()?;
        self.inner.delete_by_mirror_id(mirror_id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<CorrelationRecord>> {
        self.inner.list(limit).await
    }
}
