use crate::reminders::{ReminderHandle, ReminderScheduler, next_fire};
use crate::utils::format::create_info_embed;
use crate::utils::time::local_now;
use async_trait::async_trait;
use chrono::NaiveTime;
use chrono_tz::Tz;
use poise::serenity_prelude as serenity;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

/// Sends the daily reminder as a direct message to the owner.
///
/// Only one reminder task runs at a time; scheduling replaces it.
pub struct DmReminderScheduler {
    http: Arc<serenity::Http>,
    owner: serenity::UserId,
    timezone: Tz,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DmReminderScheduler {
    pub fn new(http: Arc<serenity::Http>, owner: serenity::UserId, timezone: Tz) -> Self {
        Self {
            http,
            owner,
            timezone,
            task: Mutex::new(None),
        }
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let mut current = match self.task.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = current.take() {
            previous.abort();
        }
        *current = task;
    }
}

#[async_trait]
impl ReminderScheduler for DmReminderScheduler {
    async fn schedule(&self, hour: u32, minute: u32, skip_today: bool) -> Option<ReminderHandle> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

        // A closed DM channel is the bot's equivalent of a denied notification permission.
        let channel = match self.owner.create_dm_channel(self.http.as_ref()).await {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!("Cannot open a DM channel with the owner: {:?}", e);
                return None;
            }
        };

        let first = next_fire(&local_now(self.timezone), time, skip_today);
        let http = Arc::clone(&self.http);
        let timezone = self.timezone;

        let task = tokio::spawn(async move {
            let mut fire_at = first;
            loop {
                let wait = (fire_at - local_now(timezone))
                    .to_std()
                    .unwrap_or_default();
                tokio::time::sleep(wait).await;

                let embed = create_info_embed(
                    "⏰ Daily reminder",
                    "Remember to log today's hours with `/log`.",
                );
                if let Err(e) = channel
                    .id
                    .send_message(http.as_ref(), serenity::CreateMessage::new().embed(embed))
                    .await
                {
                    tracing::warn!("Failed to send reminder: {:?}", e);
                }

                // Recomputed in the zone so a daylight saving change keeps the wall-clock time.
                fire_at = next_fire(&fire_at, time, false);
            }
        });

        self.replace_task(Some(task));
        Some(ReminderHandle { next_fire: first })
    }

    async fn cancel(&self) {
        self.replace_task(None);
    }
}
