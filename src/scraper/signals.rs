use tracing::debug;

use super::locator::{locate_first, or_default};
use super::selectors::signal_candidates;
use crate::browser::{Browser, BrowserResult};
use crate::models::{SignalMap, SignalName};

/// Class token the site puts on a lit signal button.
pub const ACTIVE_CLASS_TOKEN: &str = "css-1m5q1hm";
/// Fill colour of a lit signal button.
pub const ACTIVE_RGB: (u8, u8, u8) = (0, 121, 240);
const ACTIVE_HEX: &str = "#0079f0";

/// What we could read off one signal element.
#[derive(Debug, Default, Clone)]
pub struct IndicatorStyle {
    pub class: String,
    pub inline_style: String,
    pub background: String,
}

impl IndicatorStyle {
    /// Any single heuristic is enough.
    pub fn is_active(&self) -> bool {
        self.class.contains(ACTIVE_CLASS_TOKEN)
            || self.class.to_lowercase().contains("active")
            || parse_rgb(&self.background) == Some(ACTIVE_RGB)
            || style_has_active_colour(&self.inline_style)
    }
}

/// `rgb(r, g, b)`, or `rgba(r, g, b, 1)`; translucent colours don't count.
fn parse_rgb(value: &str) -> Option<(u8, u8, u8)> {
    let value = value.trim().to_lowercase();
    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() < 3 || parts.len() > 4 {
        return None;
    }
    if let Some(alpha) = parts.get(3) {
        if alpha.parse::<f32>().ok()? != 1.0 {
            return None;
        }
    }
    Some((parts[0].parse().ok()?, parts[1].parse().ok()?, parts[2].parse().ok()?))
}

/// The active colour anywhere in the raw style text.
fn style_has_active_colour(style: &str) -> bool {
    let (r, g, b) = ACTIVE_RGB;
    let compact: String = style
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    compact.contains(ACTIVE_HEX)
        || compact.contains(&format!("rgb({},{},{})", r, g, b))
        || compact.contains(&format!("rgba({},{},{},1)", r, g, b))
}

/// Whether `signal` is lit inside `container`. Missing element means inactive.
pub async fn is_active<B: Browser>(
    browser: &B,
    container: &B::Element,
    signal: SignalName,
) -> BrowserResult<bool> {
    let candidates = signal_candidates(signal);
    let Some(el) = locate_first(browser, Some(container), &candidates).await? else {
        debug!("{}: no element, treating as inactive", signal);
        return Ok(false);
    };

    let style = IndicatorStyle {
        class: or_default(browser.attr(&el, "class").await, "class")?.unwrap_or_default(),
        inline_style: or_default(browser.attr(&el, "style").await, "style")?.unwrap_or_default(),
        background: or_default(browser.css_value(&el, "background-color").await, "background")?,
    };
    let active = style.is_active();
    debug!(
        "{}: active={} class={:?} style={:?} background={:?}",
        signal, active, style.class, style.inline_style, style.background
    );
    Ok(active)
}

/// All five signals for one row.
pub async fn evaluate_all<B: Browser>(
    browser: &B,
    container: &B::Element,
) -> BrowserResult<SignalMap> {
    let mut map = SignalMap::new();
    for signal in SignalName::ALL {
        map.insert(signal, is_active(browser, container, signal).await?);
    }
    Ok(map)
}
