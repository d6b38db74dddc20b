pub mod invoice;
pub mod profile;
pub mod reminders;
pub mod worklog;

use crate::bot::{Context, Error};
use crate::error::AppError;
use crate::utils::format::format_error_message;
use crate::utils::validation::validate_date;
use chrono::NaiveDate;

/// Logs a failed request at the level it deserves.
pub fn log_failure(action: &str, error: &AppError) {
    if error.is_operational() {
        tracing::error!(action, "{}", error);
    } else {
        tracing::info!(action, "Request refused: {}", error);
    }
}

pub async fn reply_error(ctx: Context<'_>, action: &str, error: AppError) -> Result<(), Error> {
    log_failure(action, &error);
    ctx.send(
        poise::CreateReply::default()
            .content(format_error_message(&error.to_string()))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Parses an optional `YYYY-MM-DD` option, defaulting to today.
pub fn date_or_today(ctx: Context<'_>, raw: Option<&str>) -> Result<NaiveDate, AppError> {
    match raw {
        Some(raw) => validate_date(raw),
        None => Ok(ctx.data().today()),
    }
}
