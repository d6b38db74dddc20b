use crate::bot::commands::reply_error;
use crate::bot::{Context, Error};
use crate::database::models::UserProfile;
use crate::error::AppError;
use crate::utils::format::{create_info_embed, create_profile_embed, format_success_message};
use crate::utils::validation::validate_profile;

/// Manage your billing profile
#[poise::command(slash_command, owners_only, subcommands("setup", "show"), subcommand_required)]
pub async fn profile(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Set the details printed on every invoice
#[poise::command(slash_command, owners_only)]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "Full name"] full_name: String,
    #[description = "Email address"] email: String,
    #[description = "Postal address"] address: String,
    #[description = "Phone number"] phone: String,
    #[description = "Australian Business Number"] abn: String,
    #[description = "Hourly rate in AUD"] hourly_rate: f64,
) -> Result<(), Error> {
    let profile = match validate_profile(UserProfile {
        full_name,
        email,
        address,
        phone,
        abn,
        hourly_rate,
    }) {
        Ok(profile) => profile,
        Err(e) => return reply_error(ctx, "profile setup", e).await,
    };

    if let Err(e) = ctx.data().profiles.set(&profile).await {
        return reply_error(ctx, "profile setup", AppError::Persistence(e)).await;
    }

    tracing::info!("Billing profile saved");
    ctx.send(
        poise::CreateReply::default()
            .content(format_success_message("Profile saved"))
            .embed(create_profile_embed(&profile))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Show your billing profile
#[poise::command(slash_command, owners_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let embed = match ctx.data().profiles.get().await {
        Ok(Some(profile)) => create_profile_embed(&profile),
        Ok(None) => create_info_embed(
            "👤 Billing profile",
            "No profile yet. Run `/profile setup` to create one.",
        ),
        Err(e) => return reply_error(ctx, "profile show", AppError::Persistence(e)).await,
    };

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;

    Ok(())
}
