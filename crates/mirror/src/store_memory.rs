//! In-memory store for testing.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use crate::{
    Error, Result,
    store::{CorrelationRecord, CorrelationStore, now_secs},
};

/// In-memory store backed by `HashMap`. Nothing is persisted.
pub struct InMemoryStore {
    records: Mutex<HashMap<String, CorrelationRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CorrelationStore for InMemoryStore {
    async fn put(
        &self,
        original_id: &str,
        mirror_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if records.contains_key(original_id) {
            return Err(Error::duplicate_key(original_id));
        }
        let now = now_secs();
        records.insert(original_id.to_string(), CorrelationRecord {
            original_id: original_id.to_string(),
            mirror_id: mirror_id.to_string(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn get_by_original_id(&self, original_id: &str) -> Result<Option<CorrelationRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.get(original_id).cloned())
    }

    async fn get_by_mirror_id(&self, mirror_id: &str) -> Result<Option<CorrelationRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.values().find(|r| r.mirror_id == mirror_id).cloned())
    }

    async fn update_content(&self, original_id: &str, content: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let Some(record) = records.get_mut(original_id) else {
            return Err(Error::not_found(original_id));
        };
        record.content = content.to_string();
        record.updated_at = now_secs();
        Ok(())
    }

    async fn delete_by_original_id(&self, original_id: &str) -> Result<()> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.remove(original_id);
        Ok(())
    }

    async fn delete_by_mirror_id(&self, mirror_id: &str) -> Result<bool> {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let before = records.len();
        records.retain(|_, r| r.mirror_id != mirror_id);
        Ok(records.len() != before)
    }

    async fn list(&self, limit: usize) -> Result<Vec<CorrelationRecord>> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.original_id.cmp(&b.original_id))
        });
        all.truncate(limit);
        Ok(all)
    }
}
