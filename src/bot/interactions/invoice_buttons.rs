use crate::bot::commands::log_failure;
use crate::bot::share::ChannelShare;
use crate::bot::{Data, Error};
use crate::error::AppError;
use crate::invoice::engine::BillingPeriod;
use crate::invoice::workflow::InvoicePreview;
use crate::utils::format::{
    create_invoice_embed, create_preview_embed, format_error_message, format_success_message,
};
use crate::utils::time::DateKey;
use poise::serenity_prelude as serenity;

const PREFIX: &str = "invoice";

/// Button actions on invoice previews and issued invoices.
///
/// Draft actions carry the preview's number, period and fingerprint so the
/// invoice is issued for exactly what was shown.
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceAction {
    Generate {
        number: u32,
        period_start: DateKey,
        gst_included: bool,
        fingerprint: String,
    },
    ShareDraft {
        number: u32,
        period_start: DateKey,
        gst_included: bool,
        fingerprint: String,
    },
    ToggleGst {
        period_start: DateKey,
        gst_included: bool,
    },
    Regenerate {
        number: u32,
    },
    Share {
        number: u32,
    },
}

fn flag(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

fn parse_fingerprint(raw: &str) -> Option<String> {
    let valid = raw.len() == 16 && raw.chars().all(|c| c.is_ascii_hexdigit());
    valid.then(|| raw.to_string())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "1" => Some(true),
        "0" => Some(false),
        _ => None,
    }
}

impl InvoiceAction {
    pub fn custom_id(&self) -> String {
        match self {
            InvoiceAction::Generate {
                number,
                period_start,
                gst_included,
                fingerprint,
            } => format!(
                "{PREFIX}:generate:{number}:{period_start}:{}:{fingerprint}",
                flag(*gst_included)
            ),
            InvoiceAction::ShareDraft {
                number,
                period_start,
                gst_included,
                fingerprint,
            } => format!(
                "{PREFIX}:share_draft:{number}:{period_start}:{}:{fingerprint}",
                flag(*gst_included)
            ),
            InvoiceAction::ToggleGst {
                period_start,
                gst_included,
            } => format!("{PREFIX}:gst:{period_start}:{}", flag(*gst_included)),
            InvoiceAction::Regenerate { number } => format!("{PREFIX}:regenerate:{number}"),
            InvoiceAction::Share { number } => format!("{PREFIX}:share:{number}"),
        }
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        let parts: Vec<&str> = custom_id.split(':').collect();

        match parts.as_slice() {
            [PREFIX, "generate", number, start, gst, fingerprint] => Some(InvoiceAction::Generate {
                number: number.parse().ok()?,
                period_start: start.parse().ok()?,
                gst_included: parse_flag(gst)?,
                fingerprint: parse_fingerprint(fingerprint)?,
            }),
            [PREFIX, "share_draft", number, start, gst, fingerprint] => {
                Some(InvoiceAction::ShareDraft {
                    number: number.parse().ok()?,
                    period_start: start.parse().ok()?,
                    gst_included: parse_flag(gst)?,
                    fingerprint: parse_fingerprint(fingerprint)?,
                })
            }
            [PREFIX, "gst", start, gst] => Some(InvoiceAction::ToggleGst {
                period_start: start.parse().ok()?,
                gst_included: parse_flag(gst)?,
            }),
            [PREFIX, "regenerate", number] => Some(InvoiceAction::Regenerate {
                number: number.parse().ok()?,
            }),
            [PREFIX, "share", number] => Some(InvoiceAction::Share {
                number: number.parse().ok()?,
            }),
            _ => None,
        }
    }
}

pub fn is_invoice_action(custom_id: &str) -> bool {
    custom_id.starts_with("invoice:")
}

/// Buttons under a preview. Issuing is disabled while it would be refused anyway.
pub fn preview_components(preview: &InvoicePreview) -> Vec<serenity::CreateActionRow> {
    let record = preview.draft.record();
    let can_issue = preview.can_issue();
    let number = record.number;
    let period_start = &record.period_start;
    let gst_included = record.gst_included;
    let fingerprint = preview.draft.fingerprint();

    let draft = |share: bool| {
        if share {
            InvoiceAction::ShareDraft {
                number,
                period_start: period_start.clone(),
                gst_included,
                fingerprint: fingerprint.clone(),
            }
        } else {
            InvoiceAction::Generate {
                number,
                period_start: period_start.clone(),
                gst_included,
                fingerprint: fingerprint.clone(),
            }
        }
    };
    let toggle = InvoiceAction::ToggleGst {
        period_start: period_start.clone(),
        gst_included: !gst_included,
    };

    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(draft(false).custom_id())
            .label("🧾 Generate")
            .style(serenity::ButtonStyle::Success)
            .disabled(!can_issue),
        serenity::CreateButton::new(draft(true).custom_id())
            .label("📎 Generate & share")
            .style(serenity::ButtonStyle::Primary)
            .disabled(!can_issue),
        serenity::CreateButton::new(toggle.custom_id())
            .label(if gst_included { "Remove GST" } else { "Include GST (10%)" })
            .style(serenity::ButtonStyle::Secondary),
    ])]
}

pub fn invoice_components(number: u32) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(InvoiceAction::Regenerate { number }.custom_id())
            .label("🔄 Regenerate document")
            .style(serenity::ButtonStyle::Secondary),
        serenity::CreateButton::new(InvoiceAction::Share { number }.custom_id())
            .label("📎 Share document")
            .style(serenity::ButtonStyle::Primary),
    ])]
}

async fn respond_ephemeral(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: String,
) -> Result<(), Error> {
    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn followup_error(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    action: &str,
    error: AppError,
) -> Result<(), Error> {
    log_failure(action, &error);
    interaction
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(format_error_message(&error.to_string()))
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

pub async fn handle_invoice_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(action) = InvoiceAction::parse(&interaction.data.custom_id) else {
        return respond_ephemeral(ctx, interaction, format_error_message("Unknown invoice action"))
            .await;
    };

    if interaction.user.id != data.config.owner_id {
        return respond_ephemeral(
            ctx,
            interaction,
            format_error_message("Only the bot owner can manage invoices"),
        )
        .await;
    }

    match action {
        InvoiceAction::ToggleGst {
            period_start,
            gst_included,
        } => handle_toggle_gst(ctx, interaction, data, &period_start, gst_included).await,
        InvoiceAction::Generate {
            number,
            period_start,
            gst_included,
            fingerprint,
        } => {
            let shown = ShownDraft { number, period_start, gst_included, fingerprint };
            handle_generate(ctx, interaction, data, &shown, false).await
        }
        InvoiceAction::ShareDraft {
            number,
            period_start,
            gst_included,
            fingerprint,
        } => {
            let shown = ShownDraft { number, period_start, gst_included, fingerprint };
            handle_generate(ctx, interaction, data, &shown, true).await
        }
        InvoiceAction::Regenerate { number } => handle_regenerate(ctx, interaction, data, number).await,
        InvoiceAction::Share { number } => handle_share(ctx, interaction, data, number).await,
    }
}

async fn handle_toggle_gst(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    period_start: &DateKey,
    gst_included: bool,
) -> Result<(), Error> {
    let period = BillingPeriod::week_of(period_start.date());

    let preview = match data
        .invoices
        .prepare_draft(&period, gst_included, data.today())
        .await
    {
        Ok(preview) => preview,
        Err(e) => {
            log_failure("toggle gst", &e);
            return respond_ephemeral(ctx, interaction, format_error_message(&e.to_string())).await;
        }
    };

    interaction
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(create_preview_embed(
                        preview.draft.record(),
                        preview.profile.as_ref(),
                    ))
                    .components(preview_components(&preview)),
            ),
        )
        .await?;

    Ok(())
}

/// What a preview's Generate button was showing when it was rendered.
struct ShownDraft {
    number: u32,
    period_start: DateKey,
    gst_included: bool,
    fingerprint: String,
}

async fn handle_generate(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    shown: &ShownDraft,
    share: bool,
) -> Result<(), Error> {
    interaction.defer(&ctx.http).await?;

    let period = BillingPeriod::week_of(shown.period_start.date());
    let generated = match data
        .invoices
        .generate_invoice(
            &period,
            shown.gst_included,
            shown.number,
            &shown.fingerprint,
            data.today(),
        )
        .await
    {
        Ok(generated) => generated,
        Err(e) => return followup_error(ctx, interaction, "generate invoice", e).await,
    };

    let record = generated.record;
    let mut content = format_success_message(&format!("Invoice #{} issued", record.number));
    if let Some(e) = &generated.document_error {
        log_failure("generate invoice", e);
        content.push_str(&format!(
            "\n⚠️ {}. Use **Regenerate document** to try again.",
            e
        ));
    }

    interaction
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .embed(create_invoice_embed(&record))
                .components(invoice_components(record.number)),
        )
        .await?;

    if share && generated.document_error.is_none() {
        let surface = ChannelShare::new(ctx.http.clone(), interaction.channel_id);
        if let Err(e) = data.invoices.share_invoice(record.number, &surface).await {
            return followup_error(ctx, interaction, "share invoice", e).await;
        }
    }

    Ok(())
}

async fn handle_regenerate(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    number: u32,
) -> Result<(), Error> {
    interaction.defer(&ctx.http).await?;

    match data.invoices.regenerate_document(number).await {
        Ok(record) => {
            interaction
                .create_followup(
                    &ctx.http,
                    serenity::CreateInteractionResponseFollowup::new()
                        .content(format_success_message(&format!(
                            "Document for invoice #{} regenerated",
                            record.number
                        )))
                        .ephemeral(true),
                )
                .await?;
            Ok(())
        }
        Err(e) => followup_error(ctx, interaction, "regenerate document", e).await,
    }
}

async fn handle_share(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    data: &Data,
    number: u32,
) -> Result<(), Error> {
    interaction.defer(&ctx.http).await?;

    let surface = ChannelShare::new(ctx.http.clone(), interaction.channel_id);
    match data.invoices.share_invoice(number, &surface).await {
        Ok(_) => Ok(()),
        Err(e) => followup_error(ctx, interaction, "share invoice", e).await,
    }
}
