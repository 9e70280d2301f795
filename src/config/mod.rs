use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScrapeError;
use crate::report::ReportFormat;
use crate::scraper::selectors::SelectorConfig;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub browser: BrowserConfig,
    pub timing: TimingConfig,
    pub run: RunConfig,
    pub selectors: SelectorConfig,
    pub http: HttpConfig,
}

/// Target site locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
    pub login_path: String,
    pub report_path: String,
}

/// WebDriver session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub window_size: (u32, u32),
    pub user_agent: String,
    pub screenshot_dir: PathBuf,
}

/// Waits and bounds. Every wait in a run is derived from these.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_interval_ms: u64,
    pub home_settle_ms: u64,
    pub field_timeout_secs: u64,
    pub login_timeout_secs: u64,
    pub post_login_settle_ms: u64,
    pub report_timeout_secs: u64,
    pub date_change_timeout_ms: u64,
    pub max_date_steps: u32,
    pub after_navigation_settle_ms: u64,
    pub between_dates_ms: u64,
    pub keystroke_delay_ms: (u64, u64),
}

/// What to scrape and where the report goes
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub start_date: NaiveDate,
    /// `None` means today.
    pub end_date: Option<NaiveDate>,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub format: ReportFormat,
}

/// Plain HTTP client used by the `fetch` command
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub retry_base_ms: u64,
    pub user_agent: String,
    pub output_dir: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.actionnetwork.com".to_string(),
            login_path: "/login".to_string(),
            report_path: "/mlb/sharp-report".to_string(),
        }
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: false,
            window_size: (1920, 1080),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            screenshot_dir: PathBuf::from("."),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            home_settle_ms: 2_000,
            field_timeout_secs: 20,
            login_timeout_secs: 25,
            post_login_settle_ms: 3_000,
            report_timeout_secs: 30,
            date_change_timeout_ms: 3_000,
            max_date_steps: 30,
            after_navigation_settle_ms: 2_000,
            between_dates_ms: 2_000,
            keystroke_delay_ms: (100, 300),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2024, 3, 27).unwrap_or_default(),
            end_date: None,
            output_dir: PathBuf::from("data"),
            file_prefix: "mlb_signals".to_string(),
            format: ReportFormat::Xlsx,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            retry_base_ms: 500,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            output_dir: PathBuf::from("data"),
        }
    }
}

impl TimingConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn field_timeout(&self) -> Duration {
        Duration::from_secs(self.field_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn report_timeout(&self) -> Duration {
        Duration::from_secs(self.report_timeout_secs)
    }

    pub fn date_change_timeout(&self) -> Duration {
        Duration::from_millis(self.date_change_timeout_ms)
    }

    /// No sleeps and short bounds, for driving a scripted page in tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            poll_interval_ms: 1,
            home_settle_ms: 0,
            field_timeout_secs: 1,
            login_timeout_secs: 1,
            post_login_settle_ms: 0,
            report_timeout_secs: 1,
            date_change_timeout_ms: 50,
            max_date_steps: 30,
            after_navigation_settle_ms: 0,
            between_dates_ms: 0,
            keystroke_delay_ms: (0, 0),
        }
    }
}

impl SiteConfig {
    pub fn url_for(&self, path: &str) -> Result<url::Url> {
        let base = url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url {:?}", self.base_url))?;
        base.join(path).with_context(|| format!("Cannot join {:?} onto {}", path, base))
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_sources(env_overrides())
    }

    fn from_sources(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(env)
            .build()
            .context("Failed to read configuration sources")?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}

/// `SHARP_<SECTION>__<KEY>`, e.g. `SHARP_TIMING__MAX_DATE_STEPS=40`.
fn env_overrides() -> config::Environment {
    config::Environment::with_prefix("SHARP")
        .prefix_separator("_")
        .separator("__")
}

// ── Credentials ──────────────────────────────────────────────────────────────

pub const EMAIL_VAR: &str = "ACTION_NETWORK_EMAIL";
pub const PASSWORD_VAR: &str = "ACTION_NETWORK_PASSWORD";

/// Account login. Read from the environment only; never serialized.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self, ScrapeError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ScrapeError> {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ScrapeError::Configuration(format!("{key} is not set")))
        };
        Ok(Self {
            email: read(EMAIL_VAR)?,
            password: read(PASSWORD_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
