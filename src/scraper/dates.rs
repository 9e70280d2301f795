//! Day-nav handling on the report page.
//!
//! The display reads like `Fri Mar 28`: no year. The year is taken from the
//! target date, with the neighbouring years also tried so a window spanning
//! New Year resolves to the right side of it.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, error, info, warn};

use super::locator::{locate_first, locate_text};
use crate::browser::{wait, Browser, BrowserError, BrowserResult};
use crate::config::TimingConfig;
use crate::scraper::selectors::SelectorConfig;

/// Resolve a yearless display string to the date nearest `target`.
///
/// Years whose weekday agrees with the display win over those that don't.
pub fn parse_display_date(text: &str, target: NaiveDate) -> Option<NaiveDate> {
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        return None;
    }
    let years = (target.year() - 1)..=(target.year() + 1);
    let parse = |s: &str, fmt: &str| {
        years
            .clone()
            .filter_map(|y| NaiveDate::parse_from_str(&format!("{} {}", s, y), fmt).ok())
            .collect::<Vec<_>>()
    };

    let mut pool = parse(&text, "%a %b %d %Y");
    if pool.is_empty() {
        let without_weekday = text.split_once(' ').map(|(_, rest)| rest).unwrap_or(&text);
        pool = parse(without_weekday, "%b %d %Y");
    }
    if pool.is_empty() {
        pool = parse(&text, "%b %d %Y");
    }
    pool.into_iter().min_by_key(|d| (*d - target).num_days().abs())
}

pub struct DateNavigator<'a, B: Browser> {
    browser: &'a B,
    selectors: &'a SelectorConfig,
    timing: &'a TimingConfig,
}

impl<'a, B: Browser> DateNavigator<'a, B> {
    pub fn new(browser: &'a B, selectors: &'a SelectorConfig, timing: &'a TimingConfig) -> Self {
        Self { browser, selectors, timing }
    }

    async fn read_display(&self) -> BrowserResult<Option<String>> {
        locate_text(self.browser, None, &self.selectors.date_display).await
    }

    /// The date currently shown, resolved against `target`'s year.
    pub async fn displayed_date(&self, target: NaiveDate) -> BrowserResult<Option<NaiveDate>> {
        Ok(self
            .read_display()
            .await?
            .and_then(|t| parse_display_date(&t, target)))
    }

    /// Step back one day at a time until the display is at or before `target`.
    ///
    /// `Ok(false)` when the bound is hit, the display can't be read, or a click
    /// doesn't move it. `Err` only when the session is gone.
    pub async fn advance_to(&self, target: NaiveDate) -> BrowserResult<bool> {
        info!("Navigating to {}", target.format("%m/%d/%Y"));
        let max_steps = self.timing.max_date_steps;
        let mut steps = 0u32;

        loop {
            let Some(text) = self.read_display().await? else {
                warn!("Date display not found");
                return Ok(false);
            };
            let Some(current) = parse_display_date(&text, target) else {
                warn!("Unreadable date display {:?}", text);
                return Ok(false);
            };
            debug!("Display shows {} ({})", text, current);

            if current <= target {
                info!("Reached {} after {} step(s)", current.format("%m/%d/%Y"), steps);
                return Ok(true);
            }
            if steps >= max_steps {
                error!(
                    "Gave up after {} steps; display still at {}, target {}",
                    steps, current, target
                );
                return Ok(false);
            }

            let Some(button) =
                locate_first(self.browser, None, &self.selectors.previous_date).await?
            else {
                warn!("Previous Date button not found");
                return Ok(false);
            };
            if let Err(e) = self.browser.click(&button).await {
                if e.is_session_lost() {
                    return Err(e);
                }
                warn!("Previous Date click failed: {}", e);
                return Ok(false);
            }
            steps += 1;

            let previous = text.as_str();
            let changed = wait::until(
                self.timing.date_change_timeout(),
                self.timing.poll_interval(),
                move || async move {
                    Ok::<_, BrowserError>(self.read_display().await?.filter(|t| t != previous))
                },
            )
            .await?;
            if changed.is_none() {
                warn!("Date display stuck on {:?} after click", text);
                return Ok(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const NAV: &str = r#"<html><body>
      <div class="odds-tools-sub-nav__date">
        <button class="day-nav__button" aria-label="Previous Date">&lt;</button>
        <span class="day-nav__display">{{DATE}}</span>
        <button class="day-nav__button" aria-label="Next Date">&gt;</button>
      </div>
    </body></html>"#;

    fn nav_page(today: NaiveDate) -> FakeBrowser {
        let browser = FakeBrowser::with_html(NAV);
        browser.today(today);
        browser
    }

    #[test]
    fn test_parse_display_date_same_year() {
        assert_eq!(parse_display_date("Thu Mar 28", d(2024, 3, 27)), Some(d(2024, 3, 28)));
        assert_eq!(parse_display_date("  Wed   Mar 27 ", d(2024, 4, 10)), Some(d(2024, 3, 27)));
    }

    #[test]
    fn test_parse_display_date_across_new_year() {
        // Dec 31 2023 was a Sunday; a target in early January must not read it as 2024.
        assert_eq!(parse_display_date("Sun Dec 31", d(2024, 1, 1)), Some(d(2023, 12, 31)));
        assert_eq!(parse_display_date("Mon Jan 1", d(2023, 12, 30)), Some(d(2024, 1, 1)));
    }

    #[test]
    fn test_parse_display_date_falls_back_without_weekday() {
        assert_eq!(parse_display_date("Mar 28", d(2024, 3, 1)), Some(d(2024, 3, 28)));
        // Wrong weekday still resolves by month/day.
        assert_eq!(parse_display_date("Mon Mar 28", d(2024, 3, 1)), Some(d(2024, 3, 28)));
        assert_eq!(parse_display_date("", d(2024, 3, 1)), None);
        assert_eq!(parse_display_date("Today", d(2024, 3, 1)), None);
    }

    #[tokio::test]
    async fn test_target_on_or_after_display_needs_no_clicks() {
        let timing = TimingConfig::immediate();
        let selectors = SelectorConfig::default();
        for target in [d(2024, 4, 2), d(2024, 4, 20)] {
            let browser = nav_page(d(2024, 4, 2));
            let nav = DateNavigator::new(&browser, &selectors, &timing);
            assert!(nav.advance_to(target).await.unwrap());
            assert_eq!(browser.prev_clicks(), 0);
        }
    }

    #[tokio::test]
    async fn test_steps_back_to_target() {
        let timing = TimingConfig::immediate();
        let selectors = SelectorConfig::default();
        let browser = nav_page(d(2024, 4, 2));
        let nav = DateNavigator::new(&browser, &selectors, &timing);

        assert!(nav.advance_to(d(2024, 3, 27)).await.unwrap());
        assert_eq!(browser.prev_clicks(), 6);
        assert_eq!(browser.displayed(), Some(d(2024, 3, 27)));
        assert_eq!(nav.displayed_date(d(2024, 3, 27)).await.unwrap(), Some(d(2024, 3, 27)));
    }

    #[tokio::test]
    async fn test_step_bound_reports_failure() {
        let mut timing = TimingConfig::immediate();
        timing.max_date_steps = 5;
        let selectors = SelectorConfig::default();
        let browser = nav_page(d(2024, 4, 20));
        let nav = DateNavigator::new(&browser, &selectors, &timing);

        assert!(!nav.advance_to(d(2024, 4, 1)).await.unwrap());
        assert_eq!(browser.prev_clicks(), 5);
    }

    #[tokio::test]
    async fn test_default_bound_is_thirty_steps() {
        let timing = TimingConfig::immediate();
        let selectors = SelectorConfig::default();
        let browser = nav_page(d(2024, 5, 31));
        let nav = DateNavigator::new(&browser, &selectors, &timing);

        assert!(!nav.advance_to(d(2024, 3, 27)).await.unwrap());
        assert_eq!(browser.prev_clicks(), 30);
    }

    #[tokio::test]
    async fn test_stuck_display_fails_after_one_click() {
        let timing = TimingConfig::immediate();
        let selectors = SelectorConfig::default();
        let browser = nav_page(d(2024, 4, 2));
        browser.freeze_date();
        let nav = DateNavigator::new(&browser, &selectors, &timing);

        assert!(!nav.advance_to(d(2024, 3, 30)).await.unwrap());
        assert_eq!(browser.prev_clicks(), 1);
    }

    #[tokio::test]
    async fn test_missing_display_is_failure_not_error() {
        let timing = TimingConfig::immediate();
        let selectors = SelectorConfig::default();
        let browser = FakeBrowser::with_html("<html><body><p>maintenance</p></body></html>");
        let nav = DateNavigator::new(&browser, &selectors, &timing);
        assert!(!nav.advance_to(d(2024, 3, 27)).await.unwrap());
    }
}
