use crate::database::models::{InvoiceRecord, ReminderSettings, UserProfile};
use crate::utils::time::DateKey;
use crate::utils::validation::is_profile_complete;
use crate::utils::worklog_manager::WeekOverview;
use chrono::NaiveDate;
use poise::serenity_prelude as serenity;

const CURRENCY_SYMBOL: &str = "$";
const EMBED_FIELD_LIMIT: usize = 25;
const HISTORY_LIMIT: usize = 20;
// Discord rejects embeds over these, in characters.
const EMBED_DESCRIPTION_MAX: usize = 4096;
const EMBED_FIELD_VALUE_MAX: usize = 1024;
// Entries saved before descriptions were capped can be longer.
const LINE_DESCRIPTION_MAX: usize = 200;

/// `en-AU` currency: `$1,912.50`, `-$5.00`. Rounds half away from zero.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = group_thousands(cents / 100);
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };

    format!("{}{}{}.{:02}", sign, CURRENCY_SYMBOL, dollars, cents % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    grouped
}

pub fn format_hours(hours: f64) -> String {
    format!("{:.2}", hours)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y").to_string()
}

pub fn format_date_short(date: NaiveDate) -> String {
    date.format("%d %b").to_string()
}

pub fn format_date_key(key: &DateKey) -> String {
    format_date(key.date())
}

pub fn format_period(start: &DateKey, end: &DateKey) -> String {
    format!("{} - {}", format_date_key(start), format_date_key(end))
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

pub fn description_or_placeholder(description: &str) -> &str {
    if description.trim().is_empty() {
        "No description"
    } else {
        description
    }
}

pub fn format_error_message(error: &str) -> String {
    format!("❌ **Error**: {}", error)
}

pub fn format_success_message(message: &str) -> String {
    format!("✅ {}", message)
}

pub fn format_info_message(message: &str) -> String {
    format!("ℹ️ {}", message)
}

pub fn format_reminder_settings(settings: &ReminderSettings) -> String {
    if settings.enabled {
        format!("Daily reminder is **on** at {}", settings.time)
    } else {
        format!("Daily reminder is **off** (time set to {})", settings.time)
    }
}

// Embed utility functions
pub fn create_success_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0x00ff00) // Green
        .timestamp(serenity::Timestamp::now())
}

pub fn create_info_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(0x3498db) // Blue
        .timestamp(serenity::Timestamp::now())
}

fn add_line_item_fields(
    mut embed: serenity::CreateEmbed,
    record: &InvoiceRecord,
) -> serenity::CreateEmbed {
    // Leave room for the totals field.
    for item in record.items.iter().take(EMBED_FIELD_LIMIT - 1) {
        let value = format!(
            "{}\n{} hrs · {}",
            truncate(description_or_placeholder(&item.description), LINE_DESCRIPTION_MAX),
            format_hours(item.hours),
            format_currency(item.line_total)
        );
        embed = embed.field(
            format_date_key(&item.date),
            truncate(&value, EMBED_FIELD_VALUE_MAX),
            false,
        );
    }
    embed
}

fn totals_block(record: &InvoiceRecord) -> String {
    format!(
        "Subtotal: {}\nGST: {}\n**Total: {}**",
        format_currency(record.subtotal),
        format_currency(record.gst_amount),
        format_currency(record.total)
    )
}

pub fn create_preview_embed(
    draft: &InvoiceRecord,
    profile: Option<&UserProfile>,
) -> serenity::CreateEmbed {
    let mut header = format!(
        "Issue date: {}\nPeriod: {}",
        format_date_key(&draft.issue_date),
        format_period(&draft.period_start, &draft.period_end)
    );
    if !profile.is_some_and(is_profile_complete) {
        header.push_str("\n⚠️ Profile missing or incomplete: run `/profile setup` before generating.");
    }
    if draft.items.is_empty() {
        header.push_str("\n⚠️ No work logged for this week yet.");
    }

    let embed = serenity::CreateEmbed::new()
        .title(format!("🧾 Invoice preview #{}", draft.number))
        .description(header)
        .color(0x9b59b6); // Purple

    add_line_item_fields(embed, draft)
        .field(
            if draft.gst_included { "Totals (GST 10% included)" } else { "Totals (no GST)" },
            totals_block(draft),
            false,
        )
        .timestamp(serenity::Timestamp::now())
}

pub fn create_invoice_embed(record: &InvoiceRecord) -> serenity::CreateEmbed {
    let document = match &record.document_uri {
        Some(_) => "Document generated",
        None => "No document yet",
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("🧾 Invoice #{}", record.number))
        .description(format!(
            "Issue date: {}\nPeriod: {}\nHours: {}\n{}",
            format_date_key(&record.issue_date),
            format_period(&record.period_start, &record.period_end),
            format_hours(record.total_hours()),
            document
        ))
        .color(0x3498db); // Blue

    add_line_item_fields(embed, record)
        .field("Totals", totals_block(record), false)
        .footer(serenity::CreateEmbedFooter::new(record.id()))
}

pub fn create_history_embed(records: &[InvoiceRecord]) -> serenity::CreateEmbed {
    let description = if records.is_empty() {
        "No invoices yet.".to_string()
    } else {
        records
            .iter()
            .take(HISTORY_LIMIT)
            .map(|record| {
                format!(
                    "**Invoice #{}** · {} · {}\n{}",
                    record.number,
                    format_date_key(&record.issue_date),
                    format_currency(record.total),
                    format_period(&record.period_start, &record.period_end)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    serenity::CreateEmbed::new()
        .title("📚 Invoice history")
        .description(truncate(&description, EMBED_DESCRIPTION_MAX))
        .color(0x3498db) // Blue
        .footer(serenity::CreateEmbedFooter::new(format!(
            "{} invoice(s) · Use /invoice view <number> to open one",
            records.len()
        )))
}

pub fn create_week_embed(week: &WeekOverview) -> serenity::CreateEmbed {
    let mut description = String::new();

    for day in &week.days {
        match &day.entry {
            Some(entry) => description.push_str(&format!(
                "**{}**\n{} hrs · {}\n",
                format_date(day.date),
                format_hours(entry.hours),
                truncate(description_or_placeholder(&entry.description), LINE_DESCRIPTION_MAX)
            )),
            None => description.push_str(&format!("**{}**\nNo entry\n", format_date(day.date))),
        }
    }

    let missing = week.missing_days();
    if !missing.is_empty() {
        let days: Vec<String> = missing.into_iter().map(format_date_short).collect();
        description.push_str(&format!("\n⚠️ **Missing days**: {}", days.join(", ")));
    }

    serenity::CreateEmbed::new()
        .title("📅 Week entries")
        .description(truncate(&description, EMBED_DESCRIPTION_MAX))
        .color(0x9b59b6) // Purple
        .footer(serenity::CreateEmbedFooter::new(format_period(
            &week.period.start,
            &week.period.end,
        )))
}

pub fn create_dashboard_embed(
    week: &WeekOverview,
    profile: Option<&UserProfile>,
) -> serenity::CreateEmbed {
    let total_hours = week.total_hours();
    let hourly_rate = profile.map(|profile| profile.hourly_rate).unwrap_or(0.0);

    let mut description = format!(
        "Total hours: {}\nHourly rate: {}\n**Invoice total: {}**",
        format_hours(total_hours),
        format_currency(hourly_rate),
        format_currency(total_hours * hourly_rate)
    );
    if profile.is_none() {
        description.push_str("\n\n⚠️ Set up your profile with `/profile setup`.");
    }

    serenity::CreateEmbed::new()
        .title("📊 This week")
        .description(description)
        .color(0x3498db) // Blue
        .footer(serenity::CreateEmbedFooter::new(format_period(
            &week.period.start,
            &week.period.end,
        )))
        .timestamp(serenity::Timestamp::now())
}

pub fn create_profile_embed(profile: &UserProfile) -> serenity::CreateEmbed {
    let value = |text: &str| truncate(text, EMBED_FIELD_VALUE_MAX);

    serenity::CreateEmbed::new()
        .title("👤 Billing profile")
        .field("Name", value(&profile.full_name), true)
        .field("Email", value(&profile.email), true)
        .field("Phone", value(&profile.phone), true)
        .field("Address", value(&profile.address), false)
        .field("ABN", value(&profile.abn), true)
        .field("Hourly rate", format_currency(profile.hourly_rate), true)
        .color(0x3498db) // Blue
}
