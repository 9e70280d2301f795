//! Candidate CSS selectors, most specific first.
//!
//! The site's class names differ between deployments, so every target has a
//! list instead of one selector. All lists can be overridden under
//! `[selectors]` in the config files.

use serde::{Deserialize, Serialize};

use crate::models::SignalName;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub email_field: Vec<String>,
    pub password_field: Vec<String>,
    pub submit_button: Vec<String>,
    pub date_container: Vec<String>,
    pub date_display: Vec<String>,
    pub previous_date: Vec<String>,
    pub game_rows: Vec<String>,
    pub team_names: Vec<String>,
    pub signals_container: Vec<String>,
    pub spread: Vec<String>,
    pub price: Vec<String>,
}

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            email_field: owned(&["input[type='email']", "input[name='email']"]),
            password_field: owned(&["input[type='password']"]),
            submit_button: owned(&["button[type='submit']"]),
            date_container: owned(&["div.odds-tools-sub-nav__date"]),
            date_display: owned(&[".day-nav__display"]),
            previous_date: owned(&[
                "button.day-nav__button[aria-label='Previous Date']",
                "button[aria-label='Previous Date']",
            ]),
            game_rows: owned(&[
                "div[class*='GameRow']",
                "div[class*='game-row']",
                "div[class*='Game']",
                "div[class*='game']",
            ]),
            team_names: owned(&[
                "div[class*='TeamName']",
                "div[class*='team-name']",
                "div[class*='Team']",
                "div[class*='team']",
            ]),
            signals_container: owned(&[
                "div[class*='sharp-report__signal-buttons-container']",
                "div[class*='ProReportSignals']",
                "div[class*='SignalButtons']",
                "div[class*='Signals']",
            ]),
            spread: owned(&["div[class*='Spread']", "div[class*='spread']"]),
            price: owned(&["div[class*='Price']", "div[class*='price']"]),
        }
    }
}

/// Exact class token first, then two partial-class fallbacks.
pub fn signal_candidates(signal: SignalName) -> [String; 3] {
    let key = signal.markup_key();
    [
        format!(".{}", key),
        format!("button[class*='{}']", key),
        format!("[class*='{}']", key),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_candidates_narrow_to_wide() {
        assert_eq!(
            signal_candidates(SignalName::BigMoney),
            [
                ".BigMoney".to_string(),
                "button[class*='BigMoney']".to_string(),
                "[class*='BigMoney']".to_string(),
            ]
        );
    }

    #[test]
    fn test_default_selectors_parse() {
        let cfg = SelectorConfig::default();
        let all = [
            &cfg.email_field,
            &cfg.password_field,
            &cfg.submit_button,
            &cfg.date_container,
            &cfg.date_display,
            &cfg.previous_date,
            &cfg.game_rows,
            &cfg.team_names,
            &cfg.signals_container,
            &cfg.spread,
            &cfg.price,
        ];
        for list in all {
            assert!(!list.is_empty());
            for s in list {
                assert!(::scraper::Selector::parse(s).is_ok(), "bad selector {}", s);
            }
        }
    }
}
