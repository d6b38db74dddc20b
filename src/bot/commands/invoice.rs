use crate::bot::commands::{date_or_today, reply_error};
use crate::bot::interactions::invoice_buttons::{invoice_components, preview_components};
use crate::bot::{Context, Error};
use crate::invoice::engine::BillingPeriod;
use crate::utils::format::{create_history_embed, create_invoice_embed, create_preview_embed};

/// Preview, issue and browse invoices
#[poise::command(
    slash_command,
    owners_only,
    subcommands("preview", "view", "history"),
    subcommand_required
)]
pub async fn invoice(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Preview the invoice for a week before issuing it
#[poise::command(slash_command, owners_only)]
pub async fn preview(
    ctx: Context<'_>,
    #[description = "Include GST (10%)"] gst: Option<bool>,
    #[description = "Any date in the week, YYYY-MM-DD (defaults to this week)"] date: Option<String>,
) -> Result<(), Error> {
    let data = ctx.data();
    let gst_included = gst.unwrap_or(false);

    let date = match date_or_today(ctx, date.as_deref()) {
        Ok(date) => date,
        Err(e) => return reply_error(ctx, "invoice preview", e).await,
    };

    // Fixed here and carried by the buttons, so issuing later bills this same week.
    let period = BillingPeriod::week_of(date);

    let preview = match data
        .invoices
        .prepare_draft(&period, gst_included, data.today())
        .await
    {
        Ok(preview) => preview,
        Err(e) => return reply_error(ctx, "invoice preview", e).await,
    };

    ctx.send(
        poise::CreateReply::default()
            .embed(create_preview_embed(
                preview.draft.record(),
                preview.profile.as_ref(),
            ))
            .components(preview_components(&preview)),
    )
    .await?;

    Ok(())
}

/// Show an issued invoice
#[poise::command(slash_command, owners_only)]
pub async fn view(
    ctx: Context<'_>,
    #[description = "Invoice number"] number: u32,
) -> Result<(), Error> {
    match ctx.data().invoices.find_invoice(number).await {
        Ok(record) => {
            ctx.send(
                poise::CreateReply::default()
                    .embed(create_invoice_embed(&record))
                    .components(invoice_components(record.number)),
            )
            .await?;
        }
        Err(e) => return reply_error(ctx, "invoice view", e).await,
    }

    Ok(())
}

/// List issued invoices, most recent first
#[poise::command(slash_command, owners_only)]
pub async fn history(ctx: Context<'_>) -> Result<(), Error> {
    match ctx.data().invoices.history().await {
        Ok(records) => {
            ctx.send(poise::CreateReply::default().embed(create_history_embed(&records)))
                .await?;
        }
        Err(e) => return reply_error(ctx, "invoice history", e).await,
    }

    Ok(())
}
