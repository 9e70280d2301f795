use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::locator::{locate_exact, locate_first, locate_text};
use super::selectors::SelectorConfig;
use super::signals::evaluate_all;
use crate::browser::Browser;
use crate::error::ScrapeError;
use crate::models::{GameRecord, Side};

/// Parse a signed decimal like `-1.5`, `+1.5` or `+1.5 (-110)`.
/// Only the first token counts; `N/A`, dashes and blanks are absent.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let token = s.split_whitespace().next()?;
    if matches!(token, "N/A" | "-" | "—" | "--") {
        return None;
    }
    let cleaned: String = token
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    cleaned.parse().ok()
}

/// Away keeps the shown sign, home is always the negative magnitude.
pub fn split_spread(away: Option<f64>) -> (Option<f64>, Option<f64>) {
    (away, away.map(|s| -s.abs()))
}

pub struct RowExtractor<'a, B: Browser> {
    browser: &'a B,
    selectors: &'a SelectorConfig,
}

impl<'a, B: Browser> RowExtractor<'a, B> {
    pub fn new(browser: &'a B, selectors: &'a SelectorConfig) -> Self {
        Self { browser, selectors }
    }

    /// Both sides of the game in `row`, away first.
    ///
    /// Fails with a recoverable error when either team name or the signals
    /// container is missing; nothing is emitted for a partial row.
    pub async fn extract(
        &self,
        row: &B::Element,
        date: NaiveDate,
    ) -> Result<[GameRecord; 2], ScrapeError> {
        let browser = self.browser;
        let sel = self.selectors;

        let teams = locate_exact(browser, Some(row), &sel.team_names, 2)
            .await?
            .ok_or(ScrapeError::ElementNotFound { target: "both team names" })?;
        let mut names = Vec::with_capacity(2);
        for el in &teams {
            let name = browser.text(el).await?.trim().to_string();
            if name.is_empty() {
                return Err(ScrapeError::ExtractionPartial("blank team name".into()));
            }
            names.push(name);
        }
        let home_team = names.pop().unwrap_or_default();
        let away_team = names.pop().unwrap_or_default();
        info!("Processing game: {} @ {}", away_team, home_team);

        let container = locate_first(browser, Some(row), &sel.signals_container)
            .await?
            .ok_or(ScrapeError::ElementNotFound { target: "signals container" })?;
        let signals = evaluate_all(browser, &container).await?;

        let active: Vec<_> = signals
            .iter()
            .filter(|(_, on)| **on)
            .map(|(s, _)| s.label())
            .collect();
        if !active.is_empty() {
            info!("Active signals: {}", active.join(", "));
        }

        let spread_text = locate_text(browser, Some(row), &sel.spread).await?;
        let price = locate_text(browser, Some(row), &sel.price).await?;
        let spread = spread_text.as_deref().and_then(parse_decimal);
        if spread.is_none() {
            if let Some(text) = &spread_text {
                warn!("Unreadable spread {:?} for {} @ {}", text, away_team, home_team);
            }
        }
        debug!("Spread: {:?}, Price: {:?}", spread, price);

        let (away_spread, home_spread) = split_spread(spread);
        let away = GameRecord {
            date,
            side: Side::Away,
            team: away_team,
            signals: signals.clone(),
            spread: away_spread,
            price: price.clone(),
            result: None,
        };
        let home = GameRecord {
            side: Side::Home,
            team: home_team,
            spread: home_spread,
            ..away.clone()
        };
        Ok([away, home])
    }
}
