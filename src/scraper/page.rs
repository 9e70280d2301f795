//! Generic fetch-and-parse scraping over plain HTTP.

use anyhow::{anyhow, bail, Result};
use ::scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};
use url::Url;

use super::http_client::HttpClient;
use crate::error::ScrapeError;
use crate::report::json::save_json;

pub type Record = Map<String, Value>;

/// An extraction strategy over one parsed page.
pub trait PageScraper: Send + Sync {
    fn url(&self) -> &str;
    fn scrape(&self, doc: &Html) -> Vec<Record>;
}

/// Fetch the page, extract, and write the records as JSON under `output_dir`.
///
/// An empty extraction is an error and writes nothing.
pub async fn run<S: PageScraper>(
    scraper: &S,
    client: &HttpClient,
    output_dir: &Path,
    output_file: &str,
) -> Result<PathBuf> {
    info!("Starting scrape of {}", scraper.url());
    let body = client.get_text(scraper.url()).await?;

    let records = {
        let doc = Html::parse_document(&body);
        scraper.scrape(&doc)
    };
    if records.is_empty() {
        warn!("No records extracted from {}", scraper.url());
        return Err(ScrapeError::EmptyResult.into());
    }

    info!("{} records extracted", records.len());
    save_json(&records, output_dir, output_file)
}

// ── Selector-driven strategy ─────────────────────────────────────────────────

/// `name=css` takes the element text, `name=css@attr` an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub selector: String,
    pub attr: Option<String>,
}

impl FromStr for FieldSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, rest) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("field {:?} is not name=selector[@attr]", s))?;
        let (selector, attr) = match rest.rsplit_once('@') {
            Some((sel, attr)) if !attr.is_empty() && !attr.contains(']') => {
                (sel, Some(attr.trim().to_string()))
            }
            _ => (rest, None),
        };
        if name.trim().is_empty() || selector.trim().is_empty() {
            bail!("field {:?} is not name=selector[@attr]", s);
        }
        Ok(Self {
            name: name.trim().to_string(),
            selector: selector.trim().to_string(),
            attr,
        })
    }
}

struct Field {
    name: String,
    selector: Selector,
    attr: Option<String>,
}

/// One record per `item` match, one key per field.
pub struct SelectorScraper {
    url: String,
    base: Option<Url>,
    item: Selector,
    fields: Vec<Field>,
}

fn squash(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| anyhow!("selector {:?}: {:?}", s, e))
}

impl SelectorScraper {
    pub fn new(url: &str, item: &str, fields: Vec<FieldSpec>) -> Result<Self> {
        let fields = fields
            .into_iter()
            .map(|f| {
                Ok(Field {
                    selector: parse_selector(&f.selector)?,
                    name: f.name,
                    attr: f.attr,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            url: url.to_string(),
            base: Url::parse(url).ok(),
            item: parse_selector(item)?,
            fields,
        })
    }

    fn field_value(&self, item: ElementRef<'_>, field: &Field) -> Value {
        let Some(el) = item.select(&field.selector).next() else {
            return Value::Null;
        };
        let raw = match &field.attr {
            Some(attr) => match el.value().attr(attr) {
                Some(v) => v.trim().to_string(),
                None => return Value::Null,
            },
            None => squash(&el.text().collect::<Vec<_>>().join(" ")),
        };
        let is_link = matches!(field.attr.as_deref(), Some("href") | Some("src"));
        match (&self.base, is_link) {
            (Some(base), true) => base
                .join(&raw)
                .map(|u| Value::String(u.to_string()))
                .unwrap_or(Value::String(raw)),
            _ => Value::String(raw),
        }
    }
}

impl PageScraper for SelectorScraper {
    fn url(&self) -> &str {
        &self.url
    }

    fn scrape(&self, doc: &Html) -> Vec<Record> {
        doc.select(&self.item)
            .map(|item| {
                let mut record = Record::new();
                if self.fields.is_empty() {
                    let text = squash(&item.text().collect::<Vec<_>>().join(" "));
                    record.insert("text".to_string(), Value::String(text));
                }
                for field in &self.fields {
                    record.insert(field.name.clone(), self.field_value(item, field));
                }
                record
            })
            .filter(|r| r.values().any(|v| !v.is_null()))
            .collect()
    }
}
