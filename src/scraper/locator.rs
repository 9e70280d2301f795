use tracing::{debug, trace};

use crate::browser::{Browser, BrowserError, BrowserResult};

/// Visible elements matching `selector` under `scope`.
///
/// A failed lookup or visibility check counts as "no match" so the caller can
/// move on to the next candidate; only a lost session propagates.
async fn visible_matches<B: Browser>(
    browser: &B,
    scope: Option<&B::Element>,
    selector: &str,
) -> BrowserResult<Vec<B::Element>> {
    let found = match browser.find_all(scope, selector).await {
        Ok(found) => found,
        Err(e) => return absorb(e, selector).map(|_| Vec::new()),
    };

    let mut visible = Vec::with_capacity(found.len());
    for el in found {
        match browser.is_displayed(&el).await {
            Ok(true) => visible.push(el),
            Ok(false) => {}
            Err(e) => absorb(e, selector)?,
        }
    }
    Ok(visible)
}

fn absorb(e: BrowserError, selector: &str) -> BrowserResult<()> {
    if e.is_session_lost() {
        return Err(e);
    }
    trace!("{}: {}", selector, e);
    Ok(())
}

/// A failed read counts as `T::default()`; only a lost session propagates.
pub fn or_default<T: Default>(read: BrowserResult<T>, what: &str) -> BrowserResult<T> {
    match read {
        Ok(value) => Ok(value),
        Err(e) => absorb(e, what).map(|_| T::default()),
    }
}

/// First visible element of the first candidate that has one.
pub async fn locate_first<B, S>(
    browser: &B,
    scope: Option<&B::Element>,
    candidates: &[S],
) -> BrowserResult<Option<B::Element>>
where
    B: Browser,
    S: AsRef<str> + Sync,
{
    for candidate in candidates {
        let selector = candidate.as_ref();
        if let Some(el) = visible_matches(browser, scope, selector).await?.into_iter().next() {
            debug!("matched {}", selector);
            return Ok(Some(el));
        }
    }
    Ok(None)
}

/// The first candidate yielding exactly `count` visible elements.
pub async fn locate_exact<B, S>(
    browser: &B,
    scope: Option<&B::Element>,
    candidates: &[S],
    count: usize,
) -> BrowserResult<Option<Vec<B::Element>>>
where
    B: Browser,
    S: AsRef<str> + Sync,
{
    for candidate in candidates {
        let selector = candidate.as_ref();
        let visible = visible_matches(browser, scope, selector).await?;
        if visible.len() == count {
            debug!("matched {} x{}", selector, count);
            return Ok(Some(visible));
        }
        trace!("{}: {} visible, want {}", selector, visible.len(), count);
    }
    Ok(None)
}

/// Every visible element of the first candidate that has any.
pub async fn locate_all<B, S>(
    browser: &B,
    scope: Option<&B::Element>,
    candidates: &[S],
) -> BrowserResult<Vec<B::Element>>
where
    B: Browser,
    S: AsRef<str> + Sync,
{
    for candidate in candidates {
        let selector = candidate.as_ref();
        let visible = visible_matches(browser, scope, selector).await?;
        if !visible.is_empty() {
            debug!("{} visible for {}", visible.len(), selector);
            return Ok(visible);
        }
    }
    Ok(Vec::new())
}

/// Trimmed text of the first match, if any and non-empty.
pub async fn locate_text<B, S>(
    browser: &B,
    scope: Option<&B::Element>,
    candidates: &[S],
) -> BrowserResult<Option<String>>
where
    B: Browser,
    S: AsRef<str> + Sync,
{
    let Some(el) = locate_first(browser, scope, candidates).await? else {
        return Ok(None);
    };
    match browser.text(&el).await {
        Ok(text) => {
            let text = text.trim();
            Ok((!text.is_empty()).then(|| text.to_string()))
        }
        Err(e) => absorb(e, "text").map(|_| None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;

    const PAGE: &str = r#"<html><body>
        <div class="row">
          <div class="TeamName" hidden>Ghost</div>
          <div class="team-name">Cubs</div>
          <div class="team-name">Reds</div>
          <div class="team-name" style="display: none">Hidden</div>
          <div class="teamLogo">logo</div>
        </div>
        <div class="Spread"> -1.5 </div>
    </body></html>"#;

    #[tokio::test]
    async fn test_first_skips_invisible_and_missing_candidates() {
        let browser = FakeBrowser::with_html(PAGE);
        let el = locate_first(&browser, None, &["div.nothing", "div.TeamName", "div.team-name"])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(browser.text(&el).await.unwrap(), "Cubs");
    }

    #[tokio::test]
    async fn test_first_returns_none_without_error() {
        let browser = FakeBrowser::with_html(PAGE);
        let got = locate_first(&browser, None, &["div.a", "div.b"]).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_exact_requires_expected_count() {
        let browser = FakeBrowser::with_html(PAGE);
        // "team" matches 3 visible elements (two names + logo), so it is rejected.
        let got = locate_exact(&browser, None, &["div[class*='team']"], 2).await.unwrap();
        assert!(got.is_none());

        let got = locate_exact(&browser, None, &["div[class*='team']", "div.team-name"], 2)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(browser.text(&got[1]).await.unwrap(), "Reds");
    }

    #[tokio::test]
    async fn test_failing_candidate_falls_through() {
        let browser = FakeBrowser::with_html(PAGE);
        browser.fail_selector("div.team-name");
        let got = locate_all(&browser, None, &["div.team-name", "div.teamLogo"]).await.unwrap();
        assert_eq!(got.len(), 1);
    }

    #[tokio::test]
    async fn test_lost_session_propagates() {
        let browser = FakeBrowser::with_html(PAGE);
        browser.lose_session();
        let err = locate_first(&browser, None, &["div.team-name"]).await.unwrap_err();
        assert!(err.is_session_lost());
    }

    #[tokio::test]
    async fn test_scoped_text_is_trimmed() {
        let browser = FakeBrowser::with_html(PAGE);
        let row = locate_first(&browser, None, &["div.row"]).await.unwrap().unwrap();
        assert_eq!(locate_text(&browser, Some(&row), &["div.Spread"]).await.unwrap(), None);
        assert_eq!(
            locate_text(&browser, None, &["div.Spread"]).await.unwrap().as_deref(),
            Some("-1.5")
        );
    }

    #[test]
    fn test_or_default_absorbs_command_errors_only() {
        let read: BrowserResult<String> = Err(BrowserError::Command("stale".into()));
        assert_eq!(or_default(read, "class").unwrap(), "");

        let read: BrowserResult<String> = Err(BrowserError::SessionLost("gone".into()));
        assert!(or_default(read, "class").unwrap_err().is_session_lost());

        assert_eq!(or_default(Ok(Some(7)), "n").unwrap(), Some(7));
    }
}
