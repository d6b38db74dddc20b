use crate::invoice::materializer::ShareSurface;
use anyhow::{Context, Result};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::path::Path;
use std::sync::Arc;

/// Shares invoice documents by uploading them to a channel.
pub struct ChannelShare {
    http: Arc<serenity::Http>,
    channel: serenity::ChannelId,
}

impl ChannelShare {
    pub fn new(http: Arc<serenity::Http>, channel: serenity::ChannelId) -> Self {
        Self { http, channel }
    }
}

#[async_trait]
impl ShareSurface for ChannelShare {
    async fn is_available(&self, handle: &str) -> bool {
        tokio::fs::try_exists(handle).await.unwrap_or(false)
    }

    async fn share(&self, handle: &str) -> Result<()> {
        let attachment = serenity::CreateAttachment::path(Path::new(handle))
            .await
            .with_context(|| format!("Failed to read {}", handle))?;

        self.channel
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new()
                    .content("📎 Invoice document")
                    .add_file(attachment),
            )
            .await
            .context("Failed to upload invoice document")?;

        Ok(())
    }
}
