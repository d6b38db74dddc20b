pub mod commands;
pub mod handlers;
pub mod interactions;
pub mod share;

use crate::config::Config;
use crate::database;
use crate::database::encrypted::EncryptedStateStore;
use crate::database::sqlite::{
    SqliteCounterStore, SqliteInvoiceStore, SqliteSettingsStore, SqliteWorkLogStore,
};
use crate::database::stores::ProfileStore;
use crate::invoice::materializer::FileDocumentRenderer;
use crate::invoice::workflow::InvoiceService;
use crate::reminders::ReminderService;
use crate::reminders::discord::DmReminderScheduler;
use crate::utils::time::local_today;
use crate::utils::worklog_manager::WorkLogManager;
use anyhow::Result;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Clone)]
pub struct Data {
    pub config: Config,
    pub work_logs: Arc<WorkLogManager>,
    pub invoices: Arc<InvoiceService>,
    pub reminders: Arc<ReminderService>,
    pub profiles: ProfileStore,
}

impl Data {
    pub fn today(&self) -> chrono::NaiveDate {
        local_today(self.config.timezone)
    }
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;

    let work_log_store = Arc::new(SqliteWorkLogStore::new(pool.clone()));
    let settings_store = Arc::new(SqliteSettingsStore::new(pool.clone()));
    let profiles = ProfileStore::new(Arc::new(
        EncryptedStateStore::open(pool.clone(), &config.profile_passphrase).await?,
    ));

    let invoices = Arc::new(InvoiceService::new(
        work_log_store.clone(),
        Arc::new(SqliteInvoiceStore::new(pool.clone())),
        Arc::new(SqliteCounterStore::new(pool.clone())),
        profiles.clone(),
        Arc::new(FileDocumentRenderer::new(
            config.documents_dir.clone(),
            config.pdf_converter.clone(),
        )),
    ));
    let work_logs = Arc::new(WorkLogManager::new(work_log_store.clone()));

    let intents = serenity::GatewayIntents::non_privileged();
    let setup_config = config.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::profile::profile(),
                commands::worklog::log(),
                commands::worklog::unlog(),
                commands::worklog::week(),
                commands::worklog::dashboard(),
                commands::invoice::invoice(),
                commands::reminders::reminders(),
            ],
            owners: HashSet::from([config.owner_id]),
            initialize_owners: false,
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                // The scheduler needs the gateway's HTTP client, which only exists from here on.
                let scheduler = Arc::new(DmReminderScheduler::new(
                    ctx.http.clone(),
                    setup_config.owner_id,
                    setup_config.timezone,
                ));
                let reminders = Arc::new(ReminderService::new(
                    settings_store,
                    work_log_store,
                    scheduler,
                ));

                if let Err(e) = reminders.refresh(local_today(setup_config.timezone)).await {
                    tracing::warn!("Failed to restore reminder: {}", e);
                }

                Ok(Data {
                    config: setup_config,
                    work_logs,
                    invoices,
                    reminders,
                    profiles,
                })
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}
