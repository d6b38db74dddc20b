use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Precondition(#[from] Precondition),

    #[error("Invoice #{0} was not found")]
    NotFound(u32),

    #[error("Storage failure: {0:#}")]
    Persistence(anyhow::Error),

    #[error("Document generation failed: {0:#}")]
    Materialization(anyhow::Error),

    #[error("Sharing is not available right now")]
    SharingUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("Your profile is incomplete. Run /profile setup first")]
    ProfileIncomplete,

    #[error("No work logged between {start} and {end}. Add entries before invoicing")]
    EmptyPeriod { start: String, end: String },

    #[error("Invoice #{draft} is out of date (next number is #{current}). Open a fresh preview")]
    StaleDraft { draft: u32, current: u32 },

    #[error("Another invoice is being issued. Try again once it finishes")]
    IssuanceInProgress,

    #[error("The work log changed since this preview. Open a fresh preview")]
    PreviewChanged,
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// Whether the failure is worth an `error!` log rather than a plain notice.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            AppError::Persistence(_) | AppError::Materialization(_)
        )
    }
}
