use crate::database::models::{InvoiceLineItem, InvoiceRecord, ReminderSettings, WorkLogEntry};
use crate::database::stores::{CounterStore, InvoiceStore, SettingsStore, WorkLogMap, WorkLogStore};
use crate::utils::time::DateKey;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const COUNTER_KEY: &str = "invoice_counter";
const REMINDER_SETTINGS_KEY: &str = "reminder_settings";

// Key/value rows shared by the singleton stores
pub async fn get_state(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let row = sqlx::query("SELECT value FROM app_state WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.get("value")))
}

pub async fn put_state(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO app_state (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

#[derive(Clone)]
pub struct SqliteWorkLogStore {
    pool: SqlitePool,
}

impl SqliteWorkLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn work_log_from_row(row: &SqliteRow) -> Result<WorkLogEntry> {
    let date: String = row.get("date_iso");

    Ok(WorkLogEntry {
        id: row.get("id"),
        date: date.parse()?,
        hours: row.get("hours"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[async_trait]
impl WorkLogStore for SqliteWorkLogStore {
    async fn load(&self) -> Result<WorkLogMap> {
        let rows = sqlx::query(
            "SELECT date_iso, id, hours, description, created_at, updated_at
             FROM work_logs ORDER BY date_iso ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut logs = WorkLogMap::new();
        for row in rows {
            let entry = work_log_from_row(&row)?;
            logs.insert(entry.date.clone(), entry);
        }

        Ok(logs)
    }

    async fn save(&self, logs: &WorkLogMap) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM work_logs").execute(&mut *tx).await?;

        for (date, entry) in logs {
            sqlx::query(
                "INSERT INTO work_logs (date_iso, id, hours, description, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(date.as_str())
            .bind(&entry.id)
            .bind(entry.hours)
            .bind(&entry.description)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert(&self, entry: &WorkLogEntry) -> Result<()> {
        sqlx::query(
            "INSERT INTO work_logs (date_iso, id, hours, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(date_iso) DO UPDATE SET
                 id = excluded.id,
                 hours = excluded.hours,
                 description = excluded.description,
                 created_at = excluded.created_at,
                 updated_at = excluded.updated_at",
        )
        .bind(entry.date.as_str())
        .bind(&entry.id)
        .bind(entry.hours)
        .bind(&entry.description)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, date: &DateKey) -> Result<()> {
        sqlx::query("DELETE FROM work_logs WHERE date_iso = ?")
            .bind(date.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteInvoiceStore {
    pool: SqlitePool,
}

impl SqliteInvoiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn invoice_from_row(row: &SqliteRow) -> Result<InvoiceRecord> {
    let number: i64 = row.get("number");
    let issue_date: String = row.get("issue_date");
    let period_start: String = row.get("period_start");
    let period_end: String = row.get("period_end");
    let items: String = row.get("items");

    Ok(InvoiceRecord {
        number: u32::try_from(number)?,
        issue_date: issue_date.parse()?,
        period_start: period_start.parse()?,
        period_end: period_end.parse()?,
        items: serde_json::from_str::<Vec<InvoiceLineItem>>(&items)?,
        subtotal: row.get("subtotal"),
        gst_included: row.get("gst_included"),
        gst_amount: row.get("gst_amount"),
        total: row.get("total"),
        document_uri: row.get("document_uri"),
    })
}

#[async_trait]
impl InvoiceStore for SqliteInvoiceStore {
    async fn load(&self) -> Result<Vec<InvoiceRecord>> {
        let rows = sqlx::query(
            "SELECT number, issue_date, period_start, period_end, items, subtotal,
                    gst_included, gst_amount, total, document_uri
             FROM invoices ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(invoice_from_row).collect()
    }

    async fn save(&self, invoices: &[InvoiceRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM invoices").execute(&mut *tx).await?;

        for (position, record) in invoices.iter().enumerate() {
            let items = serde_json::to_string(&record.items)?;

            sqlx::query(
                "INSERT INTO invoices (number, id, position, issue_date, period_start, period_end,
                                       items, subtotal, gst_included, gst_amount, total, document_uri)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(i64::from(record.number))
            .bind(record.id())
            .bind(position as i64)
            .bind(record.issue_date.as_str())
            .bind(record.period_start.as_str())
            .bind(record.period_end.as_str())
            .bind(items)
            .bind(record.subtotal)
            .bind(record.gst_included)
            .bind(record.gst_amount)
            .bind(record.total)
            .bind(record.document_uri.as_deref())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct SqliteCounterStore {
    pool: SqlitePool,
}

impl SqliteCounterStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for SqliteCounterStore {
    async fn get(&self) -> Result<u32> {
        let stored = get_state(&self.pool, COUNTER_KEY).await?;

        // Unreadable values fall back to the first number, like a fresh install.
        Ok(stored
            .and_then(|value| value.trim().parse::<u32>().ok())
            .filter(|number| *number > 0)
            .unwrap_or(1))
    }

    async fn set(&self, next_number: u32) -> Result<()> {
        put_state(&self.pool, COUNTER_KEY, &next_number.to_string()).await
    }
}

#[derive(Clone)]
pub struct SqliteSettingsStore {
    pool: SqlitePool,
}

impl SqliteSettingsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get(&self) -> Result<ReminderSettings> {
        match get_state(&self.pool, REMINDER_SETTINGS_KEY).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(ReminderSettings::default()),
        }
    }

    async fn set(&self, settings: &ReminderSettings) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        put_state(&self.pool, REMINDER_SETTINGS_KEY, &raw).await
    }
}
