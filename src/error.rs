use std::time::Duration;
use thiserror::Error;

/// Errors raised while driving the portal
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Script evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Click on '{target}' timed out ({state})")]
    ClickTimeout { target: String, state: String },

    #[error("Click on '{target}' intercepted by another element")]
    ClickIntercepted { target: String },

    #[error("Timed out after {waited:?} waiting for {what}")]
    WaitTimeout { what: String, waited: Duration },

    /// The document field was not present in any frame
    #[error("campo_input_nao_encontrado")]
    InputNotFound,

    #[error("Query cancelled")]
    Cancelled,
}

impl ScrapeError {
    pub(crate) fn wait_timeout(what: impl Into<String>, waited: Duration) -> Self {
        Self::WaitTimeout { what: what.into(), waited }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors surfaced at the service boundary, before or around the scraper
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("documento_vazio")]
    EmptyDocument,

    #[error("tipo_invalido: {0}")]
    InvalidKind(String),

    #[error("timeout_trf6")]
    Timeout,

    #[error("{0}")]
    Scrape(#[from] ScrapeError),

    /// The admission gate was shut down
    #[error("servico_indisponivel")]
    Unavailable,

    #[error("Scraper task failed: {0}")]
    Join(String),
}
