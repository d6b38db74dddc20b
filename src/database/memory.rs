//! In-memory stores for exercising the services without SQLite.

use crate::database::models::{InvoiceRecord, ReminderSettings, WorkLogEntry};
use crate::database::stores::{
    ConfidentialStore, CounterStore, InvoiceStore, SettingsStore, WorkLogMap, WorkLogStore,
};
use crate::utils::time::DateKey;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

fn check(fail: &AtomicBool, what: &str) -> Result<()> {
    if fail.load(Ordering::SeqCst) {
        return Err(anyhow::anyhow!("{what} is unavailable"));
    }
    Ok(())
}

#[derive(Default)]
pub struct MemoryWorkLogStore {
    logs: Mutex<WorkLogMap>,
}

impl MemoryWorkLogStore {
    pub fn with_entries(entries: impl IntoIterator<Item = WorkLogEntry>) -> Self {
        let logs = entries
            .into_iter()
            .map(|entry| (entry.date.clone(), entry))
            .collect();
        Self {
            logs: Mutex::new(logs),
        }
    }
}

#[async_trait]
impl WorkLogStore for MemoryWorkLogStore {
    async fn load(&self) -> Result<WorkLogMap> {
        Ok(self.logs.lock().unwrap().clone())
    }

    async fn save(&self, logs: &WorkLogMap) -> Result<()> {
        *self.logs.lock().unwrap() = logs.clone();
        Ok(())
    }

    async fn upsert(&self, entry: &WorkLogEntry) -> Result<()> {
        self.logs
            .lock()
            .unwrap()
            .insert(entry.date.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, date: &DateKey) -> Result<()> {
        self.logs.lock().unwrap().remove(date);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryInvoiceStore {
    invoices: Mutex<Vec<InvoiceRecord>>,
    pub fail_writes: AtomicBool,
}

impl MemoryInvoiceStore {
    pub fn snapshot(&self) -> Vec<InvoiceRecord> {
        self.invoices.lock().unwrap().clone()
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn load(&self) -> Result<Vec<InvoiceRecord>> {
        Ok(self.invoices.lock().unwrap().clone())
    }

    async fn save(&self, invoices: &[InvoiceRecord]) -> Result<()> {
        check(&self.fail_writes, "invoice history")?;
        *self.invoices.lock().unwrap() = invoices.to_vec();
        Ok(())
    }
}

pub struct MemoryCounterStore {
    next: Mutex<u32>,
    pub fail_writes: AtomicBool,
}

impl MemoryCounterStore {
    pub fn starting_at(next: u32) -> Self {
        Self {
            next: Mutex::new(next),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn value(&self) -> u32 {
        *self.next.lock().unwrap()
    }
}

impl Default for MemoryCounterStore {
    fn default() -> Self {
        Self::starting_at(1)
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn get(&self) -> Result<u32> {
        Ok(*self.next.lock().unwrap())
    }

    async fn set(&self, next_number: u32) -> Result<()> {
        check(&self.fail_writes, "invoice counter")?;
        *self.next.lock().unwrap() = next_number;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Option<ReminderSettings>>,
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self) -> Result<ReminderSettings> {
        Ok(self.settings.lock().unwrap().clone().unwrap_or_default())
    }

    async fn set(&self, settings: &ReminderSettings) -> Result<()> {
        *self.settings.lock().unwrap() = Some(settings.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryConfidentialStore {
    blob: Mutex<Option<Vec<u8>>>,
}

#[async_trait]
impl ConfidentialStore for MemoryConfidentialStore {
    async fn get(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob.lock().unwrap().clone())
    }

    async fn set(&self, blob: &[u8]) -> Result<()> {
        *self.blob.lock().unwrap() = Some(blob.to_vec());
        Ok(())
    }
}
