use thiserror::Error;

use crate::browser::BrowserError;

/// Failure kinds of a scrape run.
///
/// Only the fatal kinds (see [`ScrapeError::is_fatal`]) abort a run; the rest
/// are absorbed where they happen and the affected row is dropped.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("login was not confirmed: {0}")]
    Authentication(String),

    #[error("report page did not load: {0}")]
    Navigation(String),

    #[error("no element found for {target}")]
    ElementNotFound { target: &'static str },

    #[error("incomplete row: {0}")]
    ExtractionPartial(String),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("report could not be written: {0}")]
    Report(String),

    #[error("nothing was scraped")]
    EmptyResult,
}

impl ScrapeError {
    pub fn is_fatal(&self) -> bool {
        match self {
            ScrapeError::ElementNotFound { .. } | ScrapeError::ExtractionPartial(_) => false,
            ScrapeError::Browser(e) => e.is_session_lost(),
            _ => true,
        }
    }
}
