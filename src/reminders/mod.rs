pub mod discord;

use crate::database::models::ReminderSettings;
use crate::database::stores::{SettingsStore, WorkLogStore};
use crate::error::{AppError, AppResult};
use crate::utils::time::{DateKey, format_time};
use crate::utils::validation::validate_reminder_settings;
use async_trait::async_trait;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use std::sync::Arc;

const MIN_LEAD_SECONDS: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderHandle {
    pub next_fire: DateTime<Tz>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Replaces any scheduled reminder with a daily one at `hour:minute`.
    /// Returns `None` when the platform does not allow notifications.
    async fn schedule(&self, hour: u32, minute: u32, skip_today: bool) -> Option<ReminderHandle>;
    async fn cancel(&self);
}

/// `time` on `date` in `timezone`. A wall-clock time skipped by a daylight
/// saving jump resolves to the same time one hour later.
fn at_local<Z: TimeZone>(timezone: &Z, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Z>> {
    let local = date.and_time(time);
    timezone
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| timezone.from_local_datetime(&(local + Duration::hours(1))).earliest())
}

/// First firing time of a daily reminder at local `time`, strictly after `now`.
///
/// Falls on tomorrow when today's slot has passed or `skip_today` is set,
/// and is never less than a minute away. Each day is resolved in `now`'s
/// zone, so the wall-clock time holds across daylight saving changes.
pub fn next_fire<Z: TimeZone>(now: &DateTime<Z>, time: NaiveTime, skip_today: bool) -> DateTime<Z> {
    let timezone = now.timezone();
    let today = now.date_naive();
    let first_day = if skip_today { 1 } else { 0 };

    let target = (first_day..=2)
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|day| at_local(&timezone, day, time))
        .find(|candidate| candidate > now)
        .unwrap_or_else(|| now.clone() + Duration::days(1));

    let earliest = now.clone() + Duration::seconds(MIN_LEAD_SECONDS);
    if target < earliest { earliest } else { target }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReminderStatus {
    Disabled,
    Scheduled(ReminderHandle),
    PermissionDenied,
}

pub struct ReminderService {
    settings: Arc<dyn SettingsStore>,
    work_logs: Arc<dyn WorkLogStore>,
    scheduler: Arc<dyn ReminderScheduler>,
}

impl ReminderService {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        work_logs: Arc<dyn WorkLogStore>,
        scheduler: Arc<dyn ReminderScheduler>,
    ) -> Self {
        Self {
            settings,
            work_logs,
            scheduler,
        }
    }

    pub async fn settings(&self) -> AppResult<ReminderSettings> {
        self.settings.get().await.map_err(AppError::Persistence)
    }

    /// Saves the new settings, then schedules or cancels accordingly.
    /// `time: None` keeps the stored time.
    pub async fn update(
        &self,
        enabled: bool,
        time: Option<String>,
        today: NaiveDate,
    ) -> AppResult<(ReminderSettings, ReminderStatus)> {
        let current = self.settings().await?;
        let mut settings = ReminderSettings {
            enabled,
            time: time.unwrap_or(current.time),
        };
        settings.time = format_time(validate_reminder_settings(&settings)?);

        self.settings
            .set(&settings)
            .await
            .map_err(AppError::Persistence)?;

        let status = self.apply(&settings, today).await?;
        Ok((settings, status))
    }

    /// Re-applies the stored settings, e.g. at startup or after today was logged.
    pub async fn refresh(&self, today: NaiveDate) -> AppResult<ReminderStatus> {
        let settings = self.settings().await?;
        self.apply(&settings, today).await
    }

    pub async fn apply(
        &self,
        settings: &ReminderSettings,
        today: NaiveDate,
    ) -> AppResult<ReminderStatus> {
        if !settings.enabled {
            self.scheduler.cancel().await;
            tracing::info!("Daily reminder disabled");
            return Ok(ReminderStatus::Disabled);
        }

        let time = validate_reminder_settings(settings)?;
        let logs = self.work_logs.load().await.map_err(AppError::Persistence)?;
        let logged_today = logs.contains_key(&DateKey::from(today));

        match self
            .scheduler
            .schedule(time.hour(), time.minute(), logged_today)
            .await
        {
            Some(handle) => {
                tracing::info!(next_fire = %handle.next_fire, skip_today = logged_today, "Daily reminder scheduled");
                Ok(ReminderStatus::Scheduled(handle))
            }
            None => {
                tracing::warn!("Reminder not scheduled: notifications are not permitted");
                Ok(ReminderStatus::PermissionDenied)
            }
        }
    }
}
