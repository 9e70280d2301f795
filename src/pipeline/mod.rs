//! Session orchestrator: login → report page → one pass per date.
//!
//! ## States
//!
//! `Unauthenticated → Authenticated → ReportLoaded → Scraping(date)… → Done`
//! with `Failed` reachable from anywhere. The browser is quit exactly once on
//! the way out, whichever terminal state is reached.
//!
//! Row-level problems are logged and the row dropped. A date whose navigation
//! fails is skipped. Only login, report load and a lost session end the run.

use chrono::NaiveDate;
use rand::Rng;
use std::fmt;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::browser::{wait, Browser, BrowserError};
use crate::config::{AppConfig, Credentials};
use crate::error::ScrapeError;
use crate::models::{DateWindow, ScrapeResult};
use crate::scraper::locator::{locate_all, locate_first};
use crate::scraper::{DateNavigator, RowExtractor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
    ReportLoaded,
    Scraping(NaiveDate),
    Done,
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Scraping(date) => write!(f, "Scraping({})", date),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PipelineStats {
    pub dates_processed: usize,
    pub dates_skipped: usize,
    pub games: usize,
    pub rows_skipped: usize,
}

/// How a single date ended up after navigation.
enum DateOutcome {
    Ready,
    NoSlate(NaiveDate),
    Failed,
}

pub const LOGIN_FAILED_SHOT: &str = "login_failed.png";
pub const PAGE_LOAD_SHOT: &str = "page_load_error.png";
pub const DATE_SELECTION_SHOT: &str = "date_selection_error.png";

pub struct Pipeline<'a, B: Browser> {
    browser: &'a B,
    config: &'a AppConfig,
    credentials: &'a Credentials,
    state: SessionState,
}

impl<'a, B: Browser> Pipeline<'a, B> {
    pub fn new(browser: &'a B, config: &'a AppConfig, credentials: &'a Credentials) -> Self {
        Self {
            browser,
            config,
            credentials,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
    }

    /// Scrape every date in `window`, then quit the browser.
    pub async fn run(
        &mut self,
        window: &DateWindow,
    ) -> Result<(ScrapeResult, PipelineStats), ScrapeError> {
        info!(
            "Scraping {} day(s): {} to {}",
            window.len(),
            window.start(),
            window.end()
        );
        let outcome = self.drive(window).await;

        match &outcome {
            Ok((result, stats)) => {
                self.transition(SessionState::Done);
                info!(
                    "Done: {} dates, {} skipped, {} games ({} rows dropped), {} records",
                    stats.dates_processed,
                    stats.dates_skipped,
                    stats.games,
                    stats.rows_skipped,
                    result.len()
                );
            }
            Err(e) => {
                error!("Run failed in state {}: {}", self.state, e);
                self.transition(SessionState::Failed);
            }
        }

        if let Err(e) = self.browser.quit().await {
            warn!("Browser did not close cleanly: {}", e);
        } else {
            info!("Browser closed, session {}", self.state());
        }
        outcome
    }

    async fn drive(
        &mut self,
        window: &DateWindow,
    ) -> Result<(ScrapeResult, PipelineStats), ScrapeError> {
        self.login().await?;
        self.load_report().await?;

        let mut result = ScrapeResult::new();
        let mut stats = PipelineStats::default();

        for (i, date) in window.days().enumerate() {
            if i > 0 {
                wait::settle(self.config.timing.between_dates_ms).await;
            }
            self.transition(SessionState::Scraping(date));
            let span = info_span!("date", date = %date.format("%Y-%m-%d"));
            self.scrape_date(date, &mut result, &mut stats)
                .instrument(span)
                .await?;
        }

        Ok((result, stats))
    }

    fn site_url(&self, path: &str) -> Result<String, ScrapeError> {
        self.config
            .site
            .url_for(path)
            .map(String::from)
            .map_err(|e| ScrapeError::Configuration(format!("{:#}", e)))
    }

    async fn capture(&self, name: &str) {
        let path = self.config.browser.screenshot_dir.join(name);
        match self.browser.screenshot(&path).await {
            Ok(()) => info!("Screenshot saved to {:?}", path),
            Err(e) => warn!("Screenshot {:?} failed: {}", path, e),
        }
    }

    fn keystroke_delay(&self) -> u64 {
        let (a, b) = self.config.timing.keystroke_delay_ms;
        rand::rng().random_range(a.min(b)..=a.max(b))
    }

    async fn type_slowly(&self, field: &B::Element, text: &str) -> Result<(), ScrapeError> {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            self.browser.send_keys(field, ch.encode_utf8(&mut buf)).await?;
            wait::settle(self.keystroke_delay()).await;
        }
        Ok(())
    }

    // ── Login ────────────────────────────────────────────────────────────────

    async fn login(&mut self) -> Result<(), ScrapeError> {
        let (browser, config) = (self.browser, self.config);
        let (timing, selectors, site) = (&config.timing, &config.selectors, &config.site);

        info!("Logging in as {}", self.credentials.email);
        browser.delete_cookies().await?;
        browser.goto(&self.site_url("/")?).await?;
        wait::settle(timing.home_settle_ms).await;
        browser.goto(&self.site_url(&site.login_path)?).await?;

        let email_candidates = &selectors.email_field;
        let email = wait::until(timing.field_timeout(), timing.poll_interval(), move || {
            locate_first(browser, None, email_candidates)
        })
        .await?;
        let Some(email) = email else {
            self.capture(LOGIN_FAILED_SHOT).await;
            return Err(ScrapeError::Authentication("email field never appeared".into()));
        };
        self.type_slowly(&email, &self.credentials.email).await?;

        let Some(password) = locate_first(browser, None, &selectors.password_field).await? else {
            self.capture(LOGIN_FAILED_SHOT).await;
            return Err(ScrapeError::Authentication("password field not found".into()));
        };
        self.type_slowly(&password, &self.credentials.password).await?;

        let Some(submit) = locate_first(browser, None, &selectors.submit_button).await? else {
            self.capture(LOGIN_FAILED_SHOT).await;
            return Err(ScrapeError::Authentication("submit button not found".into()));
        };
        browser.click(&submit).await?;

        let login_path = site.login_path.as_str();
        let landed = wait::until(timing.login_timeout(), timing.poll_interval(), move || async move {
            let url = browser.current_url().await?;
            Ok::<_, BrowserError>((!url.contains(login_path)).then_some(url))
        })
        .await?;
        let Some(landed) = landed else {
            self.capture(LOGIN_FAILED_SHOT).await;
            return Err(ScrapeError::Authentication(format!(
                "still on {} after {}s",
                login_path, timing.login_timeout_secs
            )));
        };

        info!("Login successful, now at {}", landed);
        wait::settle(timing.post_login_settle_ms).await;
        self.transition(SessionState::Authenticated);
        Ok(())
    }

    // ── Report page ──────────────────────────────────────────────────────────

    async fn load_report(&mut self) -> Result<(), ScrapeError> {
        let (browser, config) = (self.browser, self.config);
        let (timing, selectors) = (&config.timing, &config.selectors);

        let url = self.site_url(&config.site.report_path)?;
        info!("Opening {}", url);
        browser.goto(&url).await?;

        for (what, candidates) in [
            ("date navigation", &selectors.date_container),
            ("date display", &selectors.date_display),
        ] {
            let found = wait::until(timing.report_timeout(), timing.poll_interval(), move || {
                locate_first(browser, None, candidates)
            })
            .await?;
            if found.is_none() {
                self.capture(PAGE_LOAD_SHOT).await;
                return Err(ScrapeError::Navigation(format!(
                    "{} not visible after {}s",
                    what, timing.report_timeout_secs
                )));
            }
        }

        debug!("Report page ready");
        self.transition(SessionState::ReportLoaded);
        Ok(())
    }

    // ── Dates ────────────────────────────────────────────────────────────────

    async fn select_date(&mut self, date: NaiveDate) -> Result<DateOutcome, ScrapeError> {
        let (browser, config) = (self.browser, self.config);
        let nav = DateNavigator::new(browser, &config.selectors, &config.timing);

        // The navigator only steps back; a display already behind the target
        // needs a fresh page, which opens on the latest slate.
        if let Some(shown) = nav.displayed_date(date).await? {
            if shown < date {
                debug!("Display at {}, reloading for {}", shown, date);
                self.load_report().await?;
                self.transition(SessionState::Scraping(date));
            }
        }

        if !nav.advance_to(date).await? {
            return Ok(DateOutcome::Failed);
        }
        wait::settle(config.timing.after_navigation_settle_ms).await;

        Ok(match nav.displayed_date(date).await? {
            Some(shown) if shown == date => DateOutcome::Ready,
            Some(shown) => DateOutcome::NoSlate(shown),
            None => DateOutcome::Failed,
        })
    }

    async fn scrape_date(
        &mut self,
        date: NaiveDate,
        result: &mut ScrapeResult,
        stats: &mut PipelineStats,
    ) -> Result<(), ScrapeError> {
        match self.select_date(date).await? {
            DateOutcome::Ready => {}
            DateOutcome::NoSlate(shown) => {
                info!("No slate for {}; site shows {} instead", date, shown);
                stats.dates_skipped += 1;
                return Ok(());
            }
            DateOutcome::Failed => {
                error!("Could not select {}, skipping", date);
                self.capture(DATE_SELECTION_SHOT).await;
                stats.dates_skipped += 1;
                return Ok(());
            }
        }

        let (browser, selectors) = (self.browser, &self.config.selectors);
        let rows = locate_all(browser, None, &selectors.game_rows).await?;
        if rows.is_empty() {
            info!("No games found for {}", date);
        } else {
            info!("Found {} games for {}", rows.len(), date);
        }

        let extractor = RowExtractor::new(browser, selectors);
        for (i, row) in rows.iter().enumerate() {
            match extractor.extract(row, date).await {
                Ok(pair) => {
                    result.extend(pair);
                    stats.games += 1;
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Skipping game row {}: {}", i + 1, e);
                    stats.rows_skipped += 1;
                }
            }
        }

        stats.dates_processed += 1;
        Ok(())
    }
}
