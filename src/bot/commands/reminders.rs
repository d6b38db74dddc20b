use crate::bot::commands::reply_error;
use crate::bot::{Context, Error};
use crate::reminders::ReminderStatus;
use crate::utils::format::{
    create_info_embed, create_success_embed, format_reminder_settings,
};
use crate::utils::time::format_datetime;

/// Configure the daily logging reminder
#[poise::command(slash_command, owners_only, subcommands("show", "set"), subcommand_required)]
pub async fn reminders(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Show the reminder settings
#[poise::command(slash_command, owners_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().reminders.settings().await {
        Ok(settings) => {
            let embed = create_info_embed("⏰ Reminder", &format_reminder_settings(&settings));
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
                .await?;
        }
        Err(e) => return reply_error(ctx, "reminders show", e).await,
    }

    Ok(())
}

/// Turn the daily reminder on or off
#[poise::command(slash_command, owners_only)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Send a daily reminder"] enabled: bool,
    #[description = "Reminder time as HH:MM (24-hour)"] time: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();

    let (settings, status) = match data.reminders.update(enabled, time, data.today()).await {
        Ok(result) => result,
        Err(e) => return reply_error(ctx, "reminders set", e).await,
    };

    let mut description = format_reminder_settings(&settings);
    match status {
        ReminderStatus::Scheduled(handle) => description.push_str(&format!(
            "\nNext reminder: {}",
            format_datetime(&handle.next_fire)
        )),
        ReminderStatus::PermissionDenied => description.push_str(
            "\n⚠️ I can't send you direct messages. Allow DMs from server members to receive reminders.",
        ),
        ReminderStatus::Disabled => {}
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(create_success_embed("⏰ Reminder updated", &description))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}
