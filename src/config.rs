use anyhow::Result;
use chrono_tz::Tz;
use poise::serenity_prelude::UserId;
use std::env;
use std::path::PathBuf;

const DEFAULT_TIMEZONE: &str = "Australia/Sydney";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub owner_id: UserId,
    pub database_url: String,
    pub profile_passphrase: String,
    pub documents_dir: PathBuf,
    pub pdf_converter: Option<String>,
    pub timezone: Tz,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let owner_id = env::var("OWNER_ID")
            .map_err(|_| anyhow::anyhow!("OWNER_ID environment variable is required"))?
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("OWNER_ID must be a numeric Discord user id"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:invoices.db".to_string());

        let profile_passphrase = env::var("PROFILE_PASSPHRASE")
            .map_err(|_| anyhow::anyhow!("PROFILE_PASSPHRASE environment variable is required"))?;

        let documents_dir = env::var("DOCUMENTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("invoices"));

        let pdf_converter = env::var("PDF_CONVERTER")
            .ok()
            .filter(|command| !command.trim().is_empty());

        let timezone = match env::var("TIMEZONE") {
            Ok(raw) => parse_timezone(&raw)?,
            Err(_) => parse_timezone(DEFAULT_TIMEZONE)?,
        };

        Ok(Config {
            discord_token,
            owner_id: UserId::new(owner_id),
            database_url,
            profile_passphrase,
            documents_dir,
            pdf_converter,
            timezone,
        })
    }
}

/// IANA zone name such as `Australia/Sydney`; daylight saving follows the zone.
fn parse_timezone(raw: &str) -> Result<Tz> {
    raw.trim()
        .parse::<Tz>()
        .map_err(|_| anyhow::anyhow!("TIMEZONE must be an IANA time zone name, got {raw:?}"))
}
