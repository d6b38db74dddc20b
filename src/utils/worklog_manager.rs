use crate::database::models::WorkLogEntry;
use crate::database::stores::WorkLogStore;
use crate::error::{AppError, AppResult};
use crate::invoice::engine::BillingPeriod;
use crate::utils::time::{DateKey, list_week_days};
use crate::utils::validation::{validate_description, validate_hours};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

pub struct WorkLogManager {
    store: Arc<dyn WorkLogStore>,
}

#[derive(Debug, Clone)]
pub struct WeekDay {
    pub date: NaiveDate,
    pub entry: Option<WorkLogEntry>,
}

#[derive(Debug, Clone)]
pub struct WeekOverview {
    pub period: BillingPeriod,
    pub days: Vec<WeekDay>,
}

impl WeekOverview {
    pub fn total_hours(&self) -> f64 {
        self.days
            .iter()
            .filter_map(|day| day.entry.as_ref())
            .map(|entry| entry.hours)
            .sum()
    }

    pub fn missing_days(&self) -> Vec<NaiveDate> {
        self.days
            .iter()
            .filter(|day| day.entry.is_none())
            .map(|day| day.date)
            .collect()
    }
}

impl WorkLogManager {
    pub fn new(store: Arc<dyn WorkLogStore>) -> Self {
        Self { store }
    }

    /// Creates or overwrites the entry for `date`, keeping the first `created_at`.
    pub async fn save_entry(
        &self,
        date: NaiveDate,
        hours: f64,
        description: &str,
        now: DateTime<Utc>,
    ) -> AppResult<WorkLogEntry> {
        let hours = validate_hours(hours)?;
        let description = validate_description(description)?;
        let date = DateKey::from(date);

        let existing = self.find_entry(&date).await?;

        let entry = WorkLogEntry {
            id: existing
                .as_ref()
                .map(|entry| entry.id.clone())
                .unwrap_or_else(|| WorkLogEntry::entry_id(&date)),
            date,
            hours,
            description,
            created_at: existing.map(|entry| entry.created_at).unwrap_or(now),
            updated_at: now,
        };

        self.store
            .upsert(&entry)
            .await
            .map_err(AppError::Persistence)?;

        tracing::info!(date = %entry.date, hours = entry.hours, "Saved work log entry");
        Ok(entry)
    }

    /// Returns the removed entry, or `None` when nothing was logged that day.
    pub async fn delete_entry(&self, date: NaiveDate) -> AppResult<Option<WorkLogEntry>> {
        let date = DateKey::from(date);
        let Some(existing) = self.find_entry(&date).await? else {
            return Ok(None);
        };

        self.store
            .delete(&date)
            .await
            .map_err(AppError::Persistence)?;

        tracing::info!(date = %date, "Deleted work log entry");
        Ok(Some(existing))
    }

    pub async fn find_entry(&self, date: &DateKey) -> AppResult<Option<WorkLogEntry>> {
        let logs = self.store.load().await.map_err(AppError::Persistence)?;
        Ok(logs.get(date).cloned())
    }

    pub async fn week(&self, date: NaiveDate) -> AppResult<WeekOverview> {
        let logs = self.store.load().await.map_err(AppError::Persistence)?;

        let days = list_week_days(date)
            .into_iter()
            .map(|day| WeekDay {
                date: day,
                entry: logs.get(&DateKey::from(day)).cloned(),
            })
            .collect();

        Ok(WeekOverview {
            period: BillingPeriod::week_of(date),
            days,
        })
    }
}
