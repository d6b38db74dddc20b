use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Turns rendered markup into a stored document and returns its handle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, markup: &str, name: &str) -> Result<String>;
}

/// Where a generated document can be handed off to.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShareSurface: Send + Sync {
    async fn is_available(&self, handle: &str) -> bool;
    async fn share(&self, handle: &str) -> Result<()>;
}

/// Writes HTML documents to disk, optionally converting them to PDF with an
/// external command invoked as `<converter> <input.html> <output.pdf>`.
///
/// Every call writes a new file; earlier documents are never overwritten.
#[derive(Debug, Clone)]
pub struct FileDocumentRenderer {
    output_dir: PathBuf,
    converter: Option<String>,
}

impl FileDocumentRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, converter: Option<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            converter,
        }
    }

    fn file_stem(name: &str) -> String {
        let safe: String = name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        format!("{}-{}", safe, Utc::now().format("%Y%m%dT%H%M%S%9f"))
    }

    async fn convert(&self, converter: &str, html: &Path, pdf: &Path) -> Result<()> {
        let mut parts = converter.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| anyhow::anyhow!("PDF converter command is empty"))?;

        let status = Command::new(program)
            .args(parts)
            .arg(html)
            .arg(pdf)
            .status()
            .await
            .with_context(|| format!("Failed to run PDF converter '{}'", program))?;

        if !status.success() {
            anyhow::bail!("PDF converter '{}' exited with {}", program, status);
        }
        if !tokio::fs::try_exists(pdf).await.unwrap_or(false) {
            anyhow::bail!("PDF converter '{}' produced no output", program);
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentRenderer for FileDocumentRenderer {
    async fn render(&self, markup: &str, name: &str) -> Result<String> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create {}", self.output_dir.display()))?;

        let stem = Self::file_stem(name);
        let html_path = self.output_dir.join(format!("{}.html", stem));

        tokio::fs::write(&html_path, markup)
            .await
            .with_context(|| format!("Failed to write {}", html_path.display()))?;

        let document = match &self.converter {
            Some(converter) => {
                let pdf_path = self.output_dir.join(format!("{}.pdf", stem));
                self.convert(converter, &html_path, &pdf_path).await?;
                pdf_path
            }
            None => html_path,
        };

        tracing::debug!(path = %document.display(), "Wrote invoice document");
        Ok(document.to_string_lossy().into_owned())
    }
}
