use crate::bot::commands::{date_or_today, reply_error};
use crate::bot::{Context, Error};
use crate::error::AppError;
use crate::utils::format::{
    create_dashboard_embed, create_week_embed, format_date, format_hours, format_info_message,
    format_success_message,
};
use crate::utils::validation::validate_date;
use chrono::{NaiveDate, Utc};

/// Re-applies the reminder when today's log changed so it skips or resumes today.
async fn refresh_reminder(ctx: Context<'_>, date: NaiveDate) {
    let today = ctx.data().today();
    if date != today {
        return;
    }
    if let Err(e) = ctx.data().reminders.refresh(today).await {
        tracing::warn!("Failed to refresh reminder: {}", e);
    }
}

/// Log the hours you worked on a day
#[poise::command(slash_command, owners_only)]
pub async fn log(
    ctx: Context<'_>,
    #[description = "Hours worked, e.g. 7.5"] hours: f64,
    #[description = "What you worked on"] description: Option<String>,
    #[description = "Date as YYYY-MM-DD (defaults to today)"] date: Option<String>,
) -> Result<(), Error> {
    let date = match date_or_today(ctx, date.as_deref()) {
        Ok(date) => date,
        Err(e) => return reply_error(ctx, "log", e).await,
    };

    let entry = match ctx
        .data()
        .work_logs
        .save_entry(date, hours, description.as_deref().unwrap_or(""), Utc::now())
        .await
    {
        Ok(entry) => entry,
        Err(e) => return reply_error(ctx, "log", e).await,
    };

    refresh_reminder(ctx, date).await;

    let msg = format_success_message(&format!(
        "Logged {} hrs for {}",
        format_hours(entry.hours),
        format_date(date)
    ));
    ctx.say(msg).await?;

    Ok(())
}

/// Remove the entry logged for a day
#[poise::command(slash_command, owners_only)]
pub async fn unlog(
    ctx: Context<'_>,
    #[description = "Date as YYYY-MM-DD"] date: String,
) -> Result<(), Error> {
    let date = match validate_date(&date) {
        Ok(date) => date,
        Err(e) => return reply_error(ctx, "unlog", e).await,
    };

    match ctx.data().work_logs.delete_entry(date).await {
        Ok(Some(_)) => {
            refresh_reminder(ctx, date).await;
            ctx.say(format_success_message(&format!(
                "Removed the entry for {}",
                format_date(date)
            )))
            .await?;
        }
        Ok(None) => {
            ctx.say(format_info_message(&format!(
                "Nothing was logged for {}",
                format_date(date)
            )))
            .await?;
        }
        Err(e) => return reply_error(ctx, "unlog", e).await,
    }

    Ok(())
}

/// Show the entries of a week
#[poise::command(slash_command, owners_only)]
pub async fn week(
    ctx: Context<'_>,
    #[description = "Any date in the week, YYYY-MM-DD (defaults to this week)"] date: Option<String>,
) -> Result<(), Error> {
    let date = match date_or_today(ctx, date.as_deref()) {
        Ok(date) => date,
        Err(e) => return reply_error(ctx, "week", e).await,
    };

    match ctx.data().work_logs.week(date).await {
        Ok(week) => {
            ctx.send(poise::CreateReply::default().embed(create_week_embed(&week)))
                .await?;
        }
        Err(e) => return reply_error(ctx, "week", e).await,
    }

    Ok(())
}

/// Show this week's hours and running total
#[poise::command(slash_command, owners_only)]
pub async fn dashboard(ctx: Context<'_>) -> Result<(), Error> {
    let data = ctx.data();

    let week = match data.work_logs.week(data.today()).await {
        Ok(week) => week,
        Err(e) => return reply_error(ctx, "dashboard", e).await,
    };
    let profile = match data.profiles.get().await {
        Ok(profile) => profile,
        Err(e) => return reply_error(ctx, "dashboard", AppError::Persistence(e)).await,
    };

    ctx.send(poise::CreateReply::default().embed(create_dashboard_embed(&week, profile.as_ref())))
        .await?;

    Ok(())
}
