//! Browser capability consumed by the scraping core.
//!
//! The core never builds a session itself; it is handed something that
//! implements [`Browser`]. Production runs use [`webdriver::WebDriverBrowser`],
//! tests use a scripted in-memory page.

pub mod wait;
pub mod webdriver;

#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("could not start browser session: {0}")]
    Connect(String),

    /// The session is gone (crashed browser, closed window, dead driver).
    #[error("browser session lost: {0}")]
    SessionLost(String),

    /// A single command failed; the session itself is still usable.
    #[error("browser command failed: {0}")]
    Command(String),
}

impl BrowserError {
    pub fn is_session_lost(&self) -> bool {
        matches!(self, BrowserError::SessionLost(_))
    }
}

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Everything the scraper needs from a live page.
///
/// `scope: None` searches the whole document, `Some(el)` searches below `el`.
#[async_trait]
pub trait Browser: Send + Sync {
    type Element: Clone + Send + Sync;

    async fn goto(&self, url: &str) -> BrowserResult<()>;
    async fn current_url(&self) -> BrowserResult<String>;
    async fn find_all(
        &self,
        scope: Option<&Self::Element>,
        selector: &str,
    ) -> BrowserResult<Vec<Self::Element>>;
    async fn is_displayed(&self, element: &Self::Element) -> BrowserResult<bool>;
    async fn text(&self, element: &Self::Element) -> BrowserResult<String>;
    async fn attr(&self, element: &Self::Element, name: &str) -> BrowserResult<Option<String>>;
    async fn css_value(&self, element: &Self::Element, property: &str) -> BrowserResult<String>;
    async fn click(&self, element: &Self::Element) -> BrowserResult<()>;
    async fn send_keys(&self, element: &Self::Element, text: &str) -> BrowserResult<()>;
    async fn screenshot(&self, path: &Path) -> BrowserResult<()>;
    async fn delete_cookies(&self) -> BrowserResult<()>;
    /// Ends the session. Called exactly once, at the end of a run.
    async fn quit(&self) -> BrowserResult<()>;
}
