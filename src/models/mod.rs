use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;

// ── Signals ───────────────────────────────────────────────────────────────────

/// Named indicators shown as buttons on every game row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SignalName {
    SharpAction,
    BigMoney,
    Systems,
    Projections,
    ExpertPicks,
}

impl SignalName {
    pub const ALL: [SignalName; 5] = [
        SignalName::SharpAction,
        SignalName::BigMoney,
        SignalName::Systems,
        SignalName::Projections,
        SignalName::ExpertPicks,
    ];

    /// Class-name fragment the site uses for this signal's button.
    pub fn markup_key(self) -> &'static str {
        match self {
            SignalName::SharpAction => "SharpAction",
            SignalName::BigMoney => "BigMoney",
            SignalName::Systems => "Systems",
            SignalName::Projections => "Projections",
            SignalName::ExpertPicks => "ExpertPicks",
        }
    }

    /// Report column header.
    pub fn label(self) -> &'static str {
        match self {
            SignalName::SharpAction => "Sharp Action",
            SignalName::BigMoney => "Big Money",
            SignalName::Systems => "Systems",
            SignalName::Projections => "Projections",
            SignalName::ExpertPicks => "Top Experts",
        }
    }
}

impl fmt::Display for SignalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub type SignalMap = BTreeMap<SignalName, bool>;

// ── Game records ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Home => "Home",
            Side::Away => "Away",
        }
    }
}

/// One team's line for one game on one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub date: NaiveDate,
    pub side: Side,
    pub team: String,
    pub signals: SignalMap,
    pub spread: Option<f64>,
    pub price: Option<String>,
    pub result: Option<String>,
}

impl GameRecord {
    pub fn is_active(&self, signal: SignalName) -> bool {
        self.signals.get(&signal).copied().unwrap_or(false)
    }
}

/// Records in insertion order: date ascending, display order, away then home.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeResult {
    records: Vec<GameRecord>,
}

impl ScrapeResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = GameRecord>) {
        self.records.extend(records);
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<GameRecord> for ScrapeResult {
    fn from_iter<I: IntoIterator<Item = GameRecord>>(iter: I) -> Self {
        Self { records: iter.into_iter().collect() }
    }
}

// ── Date window ───────────────────────────────────────────────────────────────

/// Inclusive range of calendar dates, walked one day at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScrapeError> {
        if end < start {
            return Err(ScrapeError::Configuration(format!(
                "date window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
