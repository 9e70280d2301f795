use crate::config::HttpConfig;
use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::StatusCode;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, warn};

pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpConfig,
}

/// Why a single attempt failed, and whether trying again can help.
#[derive(Debug)]
enum Attempt {
    Transient(anyhow::Error),
    Permanent(anyhow::Error),
}

impl Attempt {
    fn error(&self) -> &anyhow::Error {
        match self {
            Attempt::Transient(e) | Attempt::Permanent(e) => e,
        }
    }

    fn into_error(self) -> anyhow::Error {
        match self {
            Attempt::Transient(e) | Attempt::Permanent(e) => e,
        }
    }
}

pub fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl HttpClient {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // Accept cookies so session-based pages work
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            inner,
            config: config.clone(),
        })
    }

    /// Fetch a URL as text, retrying transport errors, 429 and 5xx.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        // 2^n * factor: first delay is retry_base_ms, then doubling.
        let strategy = ExponentialBackoff::from_millis(2)
            .factor((self.config.retry_base_ms / 2).max(1))
            .max_delay(Duration::from_secs(30))
            .map(jitter)
            .take(self.config.max_retries);

        RetryIf::start(
            strategy,
            || self.attempt(url),
            |e: &Attempt| {
                let retry = matches!(e, Attempt::Transient(_));
                if retry {
                    warn!("GET {} failed, retrying: {:#}", url, e.error());
                }
                retry
            },
        )
        .await
        .map_err(Attempt::into_error)
        .with_context(|| format!("All retries exhausted for {}", url))
    }

    async fn attempt(&self, url: &str) -> Result<String, Attempt> {
        debug!("GET {}", url);
        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|e| Attempt::Transient(anyhow!("Request error: {}", e)))?;

        let status = resp.status();
        if is_retryable(status) {
            return Err(Attempt::Transient(anyhow!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(Attempt::Permanent(anyhow!("HTTP error {}", status)));
        }
        resp.text()
            .await
            .map_err(|e| Attempt::Transient(anyhow!("Failed to read response body: {}", e)))
    }
}
