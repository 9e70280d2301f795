//! Scripted in-memory page for tests.
//!
//! Pages are HTML strings parsed with `scraper` on every command, so element
//! handles are positions in document order. `{{DATE}}` is replaced with the
//! day-nav display text and `{{GAMES}}` with the fragment registered for the
//! displayed date.

use async_trait::async_trait;
use chrono::NaiveDate;
use ::scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Browser, BrowserError, BrowserResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeElement(usize);

#[derive(Default)]
struct FakeState {
    url: String,
    pages: Vec<(String, String)>,
    games: HashMap<NaiveDate, String>,
    displayed: Option<NaiveDate>,
    today: Option<NaiveDate>,
    frozen_date: bool,
    login_redirects: bool,
    lost: bool,
    lost_on_style_reads: bool,
    failing_selectors: Vec<String>,
    prev_clicks: u32,
    typed: Vec<String>,
    visited: Vec<String>,
    screenshots: Vec<PathBuf>,
    cookies_deleted: bool,
    quit_calls: u32,
}

pub struct FakeBrowser {
    state: Mutex<FakeState>,
}

impl FakeBrowser {
    /// A browser already sitting on a single page.
    pub fn with_html(html: &str) -> Self {
        let browser = Self::new();
        browser.page("", html);
        browser.state().url = "https://fake.test/".to_string();
        browser
    }

    pub fn new() -> Self {
        Self { state: Mutex::new(FakeState::default()) }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Serve `html` for every URL whose path ends with `path_suffix`.
    pub fn page(&self, path_suffix: &str, html: &str) -> &Self {
        self.state().pages.push((path_suffix.to_string(), html.to_string()));
        self
    }

    /// The day-nav shows `today` after every page load.
    pub fn today(&self, today: NaiveDate) -> &Self {
        let mut st = self.state();
        st.today = Some(today);
        st.displayed = Some(today);
        self
    }

    pub fn games_on(&self, date: NaiveDate, rows_html: &str) -> &Self {
        self.state().games.insert(date, rows_html.to_string());
        self
    }

    /// "Previous Date" clicks stop changing the display.
    pub fn freeze_date(&self) -> &Self {
        self.state().frozen_date = true;
        self
    }

    /// Submitting the login form leaves `/login`.
    pub fn accept_login(&self) -> &Self {
        self.state().login_redirects = true;
        self
    }

    pub fn fail_selector(&self, selector: &str) -> &Self {
        self.state().failing_selectors.push(selector.to_string());
        self
    }

    pub fn lose_session(&self) {
        self.state().lost = true;
    }

    /// Attribute and computed-style reads report a lost session.
    pub fn lose_session_on_style_reads(&self) {
        self.state().lost_on_style_reads = true;
    }

    fn check_style_read(&self) -> BrowserResult<()> {
        if self.state().lost_on_style_reads {
            return Err(BrowserError::SessionLost("fake session closed mid-read".into()));
        }
        Ok(())
    }

    pub fn prev_clicks(&self) -> u32 {
        self.state().prev_clicks
    }

    pub fn displayed(&self) -> Option<NaiveDate> {
        self.state().displayed
    }

    pub fn typed(&self) -> String {
        self.state().typed.concat()
    }

    pub fn visited(&self) -> Vec<String> {
        self.state().visited.clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.state().screenshots.clone()
    }

    pub fn cookies_deleted(&self) -> bool {
        self.state().cookies_deleted
    }

    pub fn quit_calls(&self) -> u32 {
        self.state().quit_calls
    }

    fn render(st: &FakeState) -> String {
        let path = st.url.split('?').next().unwrap_or_default();
        let template = st
            .pages
            .iter()
            .rev()
            .find(|(suffix, _)| path.ends_with(suffix.as_str()))
            .map(|(_, html)| html.clone())
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        let display = st
            .displayed
            .map(|d| d.format("%a %b %-d").to_string())
            .unwrap_or_default();
        let games = st
            .displayed
            .and_then(|d| st.games.get(&d).cloned())
            .unwrap_or_default();
        template.replace("{{DATE}}", &display).replace("{{GAMES}}", &games)
    }

    fn check_alive(&self) -> BrowserResult<()> {
        if self.state().lost {
            return Err(BrowserError::SessionLost("fake session closed".into()));
        }
        Ok(())
    }

    /// Run `f` over the freshly rendered document and its elements in order.
    fn with_doc<T>(&self, f: impl FnOnce(&[ElementRef<'_>]) -> T) -> BrowserResult<T> {
        self.check_alive()?;
        let html = Self::render(&self.state());
        let doc = Html::parse_document(&html);
        let elements: Vec<ElementRef<'_>> = doc
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .collect();
        Ok(f(&elements))
    }

    fn with_element<T>(
        &self,
        element: &FakeElement,
        f: impl FnOnce(&[ElementRef<'_>], ElementRef<'_>) -> T,
    ) -> BrowserResult<T> {
        self.with_doc(|els| els.get(element.0).map(|el| f(els, *el)))?
            .ok_or_else(|| BrowserError::Command("stale element reference".into()))
    }
}

fn hidden(el: ElementRef<'_>) -> bool {
    std::iter::once(el)
        .chain(el.ancestors().filter_map(ElementRef::wrap))
        .any(|e| {
            let v = e.value();
            v.attr("hidden").is_some()
                || v.attr("style")
                    .map(|s| s.replace(' ', "").contains("display:none"))
                    .unwrap_or(false)
        })
}

#[async_trait]
impl Browser for FakeBrowser {
    type Element = FakeElement;

    async fn goto(&self, url: &str) -> BrowserResult<()> {
        self.check_alive()?;
        let mut st = self.state();
        st.url = url.to_string();
        st.visited.push(url.to_string());
        st.displayed = st.today;
        Ok(())
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.check_alive()?;
        Ok(self.state().url.clone())
    }

    async fn find_all(
        &self,
        scope: Option<&FakeElement>,
        selector: &str,
    ) -> BrowserResult<Vec<FakeElement>> {
        if self.state().failing_selectors.iter().any(|s| s == selector) {
            return Err(BrowserError::Command(format!("lookup failed: {}", selector)));
        }
        let sel = Selector::parse(selector)
            .map_err(|e| BrowserError::Command(format!("invalid selector {}: {:?}", selector, e)))?;
        self.with_doc(|els| {
            let position = |e: &ElementRef<'_>| els.iter().position(|x| x.id() == e.id());
            match scope {
                None => els
                    .iter()
                    .enumerate()
                    .filter(|(_, e)| sel.matches(e))
                    .map(|(i, _)| FakeElement(i))
                    .collect(),
                Some(root) => match els.get(root.0) {
                    Some(root_el) => root_el
                        .select(&sel)
                        .filter(|e| e.id() != root_el.id())
                        .filter_map(|e| position(&e))
                        .map(FakeElement)
                        .collect(),
                    None => Vec::new(),
                },
            }
        })
    }

    async fn is_displayed(&self, element: &FakeElement) -> BrowserResult<bool> {
        self.with_element(element, |_, el| !hidden(el))
    }

    async fn text(&self, element: &FakeElement) -> BrowserResult<String> {
        self.with_element(element, |_, el| {
            el.text().collect::<String>().trim().to_string()
        })
    }

    async fn attr(&self, element: &FakeElement, name: &str) -> BrowserResult<Option<String>> {
        self.check_style_read()?;
        self.with_element(element, |_, el| el.value().attr(name).map(str::to_string))
    }

    async fn css_value(&self, element: &FakeElement, property: &str) -> BrowserResult<String> {
        self.check_style_read()?;
        let key = format!("data-computed-{}", property);
        self.with_element(element, |_, el| {
            el.value()
                .attr(&key)
                .unwrap_or("rgba(0, 0, 0, 0)")
                .to_string()
        })
    }

    async fn click(&self, element: &FakeElement) -> BrowserResult<()> {
        let (label, kind) = self.with_element(element, |_, el| {
            (
                el.value().attr("aria-label").map(str::to_string),
                el.value().attr("type").map(str::to_string),
            )
        })?;
        let mut st = self.state();
        if label.as_deref() == Some("Previous Date") {
            st.prev_clicks += 1;
            if !st.frozen_date {
                st.displayed = st.displayed.and_then(|d| d.pred_opt());
            }
        } else if kind.as_deref() == Some("submit") && st.login_redirects {
            st.url = st.url.replace("/login", "/dashboard");
        }
        Ok(())
    }

    async fn send_keys(&self, element: &FakeElement, text: &str) -> BrowserResult<()> {
        self.with_element(element, |_, _| ())?;
        self.state().typed.push(text.to_string());
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> BrowserResult<()> {
        self.check_alive()?;
        self.state().screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn delete_cookies(&self) -> BrowserResult<()> {
        self.check_alive()?;
        self.state().cookies_deleted = true;
        Ok(())
    }

    async fn quit(&self) -> BrowserResult<()> {
        self.state().quit_calls += 1;
        Ok(())
    }
}
