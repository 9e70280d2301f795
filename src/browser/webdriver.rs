use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::path::Path;
use tracing::{debug, info};

use super::{Browser, BrowserError, BrowserResult};
use crate::config::BrowserConfig;

/// A live WebDriver session (chromedriver on :4444 by default).
pub struct WebDriverBrowser {
    client: Client,
}

impl WebDriverBrowser {
    pub async fn connect(config: &BrowserConfig) -> BrowserResult<Self> {
        let (width, height) = config.window_size;
        let mut args = vec![
            "--disable-blink-features=AutomationControlled".to_string(),
            "--disable-dev-shm-usage".to_string(),
            "--disable-infobars".to_string(),
            "--disable-gpu".to_string(),
            "--no-sandbox".to_string(),
            format!("--window-size={},{}", width, height),
            format!("--user-agent={}", config.user_agent),
        ];
        if config.headless {
            args.push("--headless=new".to_string());
        }

        let mut caps = serde_json::Map::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": args,
                "excludeSwitches": ["enable-automation"],
                "useAutomationExtension": false,
            }),
        );

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| BrowserError::Connect(format!("{} ({})", e, config.webdriver_url)))?;

        info!(
            "WebDriver session started at {} (headless: {})",
            config.webdriver_url, config.headless
        );
        Ok(Self { client })
    }
}

fn map_err(e: CmdError) -> BrowserError {
    let message = e.to_string();
    let lost = matches!(e, CmdError::Lost(_))
        || message.contains("invalid session id")
        || message.contains("no such window");
    if lost {
        BrowserError::SessionLost(message)
    } else {
        BrowserError::Command(message)
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    type Element = Element;

    async fn goto(&self, url: &str) -> BrowserResult<()> {
        debug!("GET {}", url);
        self.client.goto(url).await.map_err(map_err)
    }

    async fn current_url(&self) -> BrowserResult<String> {
        Ok(self.client.current_url().await.map_err(map_err)?.to_string())
    }

    async fn find_all(&self, scope: Option<&Element>, selector: &str) -> BrowserResult<Vec<Element>> {
        let locator = Locator::Css(selector);
        match scope {
            Some(el) => el.find_all(locator).await,
            None => self.client.find_all(locator).await,
        }
        .map_err(map_err)
    }

    async fn is_displayed(&self, element: &Element) -> BrowserResult<bool> {
        element.is_displayed().await.map_err(map_err)
    }

    async fn text(&self, element: &Element) -> BrowserResult<String> {
        element.text().await.map_err(map_err)
    }

    async fn attr(&self, element: &Element, name: &str) -> BrowserResult<Option<String>> {
        element.attr(name).await.map_err(map_err)
    }

    async fn css_value(&self, element: &Element, property: &str) -> BrowserResult<String> {
        element.css_value(property).await.map_err(map_err)
    }

    async fn click(&self, element: &Element) -> BrowserResult<()> {
        element.click().await.map_err(map_err)
    }

    async fn send_keys(&self, element: &Element, text: &str) -> BrowserResult<()> {
        element.send_keys(text).await.map_err(map_err)
    }

    async fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        let png = self.client.screenshot().await.map_err(map_err)?;
        tokio::fs::write(path, png)
            .await
            .map_err(|e| BrowserError::Command(format!("writing {:?}: {}", path, e)))
    }

    async fn delete_cookies(&self) -> BrowserResult<()> {
        self.client.delete_all_cookies().await.map_err(map_err)
    }

    async fn quit(&self) -> BrowserResult<()> {
        self.client.clone().close().await.map_err(map_err)
    }
}
