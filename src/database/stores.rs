use crate::database::models::{InvoiceRecord, ReminderSettings, UserProfile, WorkLogEntry};
use crate::utils::time::DateKey;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

pub type WorkLogMap = BTreeMap<DateKey, WorkLogEntry>;

#[async_trait]
pub trait WorkLogStore: Send + Sync {
    async fn load(&self) -> Result<WorkLogMap>;
    async fn save(&self, logs: &WorkLogMap) -> Result<()>;
    /// Inserts the entry, or overwrites the one already stored for its date.
    async fn upsert(&self, entry: &WorkLogEntry) -> Result<()>;
    async fn delete(&self, date: &DateKey) -> Result<()>;
}

/// Invoice history, most recent first.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn load(&self) -> Result<Vec<InvoiceRecord>>;
    async fn save(&self, invoices: &[InvoiceRecord]) -> Result<()>;
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Next invoice number to assign; 1 when nothing was stored yet.
    async fn get(&self) -> Result<u32>;
    async fn set(&self, next_number: u32) -> Result<()>;
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<ReminderSettings>;
    async fn set(&self, settings: &ReminderSettings) -> Result<()>;
}

/// Opaque blob storage that keeps its contents confidential at rest.
#[async_trait]
pub trait ConfidentialStore: Send + Sync {
    async fn get(&self) -> Result<Option<Vec<u8>>>;
    async fn set(&self, blob: &[u8]) -> Result<()>;
}

#[derive(Clone)]
pub struct ProfileStore {
    inner: Arc<dyn ConfidentialStore>,
}

impl ProfileStore {
    pub fn new(inner: Arc<dyn ConfidentialStore>) -> Self {
        Self { inner }
    }

    pub async fn get(&self) -> Result<Option<UserProfile>> {
        match self.inner.get().await? {
            Some(blob) => Ok(Some(serde_json::from_slice(&blob)?)),
            None => Ok(None),
        }
    }

    pub async fn set(&self, profile: &UserProfile) -> Result<()> {
        let blob = serde_json::to_vec(profile)?;
        self.inner.set(&blob).await
    }
}
