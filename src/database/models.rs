use crate::utils::time::DateKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const GST_RATE: f64 = 0.10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLogEntry {
    pub id: String,
    pub date: DateKey,
    pub hours: f64,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkLogEntry {
    pub fn entry_id(date: &DateKey) -> String {
        format!("entry-{}", date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub date: DateKey,
    pub description: String,
    pub hours: f64,
    pub rate: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub number: u32,
    pub issue_date: DateKey,
    pub period_start: DateKey,
    pub period_end: DateKey,
    pub items: Vec<InvoiceLineItem>,
    pub subtotal: f64,
    pub gst_included: bool,
    pub gst_amount: f64,
    pub total: f64,
    pub document_uri: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceState {
    Issued,
    Materialized,
}

impl InvoiceRecord {
    /// Formatted alias of `number`; never stored on its own.
    pub fn id(&self) -> String {
        invoice_id(self.number)
    }

    pub fn state(&self) -> InvoiceState {
        match self.document_uri {
            Some(_) => InvoiceState::Materialized,
            None => InvoiceState::Issued,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.items.iter().map(|item| item.hours).sum()
    }
}

pub fn invoice_id(number: u32) -> String {
    format!("invoice-{}", number)
}

/// A computed invoice that has not been issued yet.
///
/// `number` is the prospective number shown in the preview; it is only
/// consumed when the draft goes through issuance.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceDraft {
    record: InvoiceRecord,
}

impl InvoiceDraft {
    pub(crate) fn new(record: InvoiceRecord) -> Self {
        Self { record }
    }

    pub fn record(&self) -> &InvoiceRecord {
        &self.record
    }

    pub fn is_empty(&self) -> bool {
        self.record.items.is_empty()
    }

    /// Digest of what the draft bills: period, GST flag, and every line's
    /// date, description, hours and rate. Two drafts with the same
    /// fingerprint produce the same totals.
    pub fn fingerprint(&self) -> String {
        let mut hasher = DefaultHasher::new();
        let record = &self.record;
        record.period_start.to_string().hash(&mut hasher);
        record.gst_included.hash(&mut hasher);
        for item in &record.items {
            item.date.to_string().hash(&mut hasher);
            item.description.hash(&mut hasher);
            item.hours.to_bits().hash(&mut hasher);
            item.rate.to_bits().hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }

    pub(crate) fn into_issued(self, number: u32) -> InvoiceRecord {
        InvoiceRecord {
            number,
            document_uri: None,
            ..self.record
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    pub address: String,
    pub phone: String,
    pub abn: String,
    pub hourly_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub time: String,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            time: "17:00".to_string(),
        }
    }
}
