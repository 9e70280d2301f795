//! Report output: one row per [`GameRecord`], fixed column order.

pub mod csv_file;
pub mod json;
pub mod xlsx;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::error::ScrapeError;
use crate::models::{DateWindow, GameRecord, ScrapeResult, SignalName};

pub const COLUMNS: [&str; 11] = [
    "Date",
    "Home/Away",
    "Team",
    "Big Money",
    "Sharp Action",
    "Systems",
    "Projections",
    "Top Experts",
    "Spread",
    "Price",
    "Result",
];

/// Signal columns in report order.
const SIGNAL_COLUMNS: [SignalName; 5] = [
    SignalName::BigMoney,
    SignalName::SharpAction,
    SignalName::Systems,
    SignalName::Projections,
    SignalName::ExpertPicks,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn text(s: impl Into<String>) -> Self {
        Cell::Text(s.into())
    }

    pub fn to_plain(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => n.to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// The record's cells, aligned with [`COLUMNS`].
pub fn row_cells(record: &GameRecord) -> [Cell; 11] {
    let flag = |s: SignalName| {
        if record.is_active(s) { Cell::text("X") } else { Cell::Empty }
    };
    [
        Cell::text(record.date.format("%m/%d/%Y").to_string()),
        Cell::text(record.side.as_str()),
        Cell::text(record.team.as_str()),
        flag(SIGNAL_COLUMNS[0]),
        flag(SIGNAL_COLUMNS[1]),
        flag(SIGNAL_COLUMNS[2]),
        flag(SIGNAL_COLUMNS[3]),
        flag(SIGNAL_COLUMNS[4]),
        // +0.0 folds a negated zero spread back to 0
        record.spread.map(|s| Cell::Number(s + 0.0)).unwrap_or(Cell::Empty),
        record.price.as_deref().map(Cell::text).unwrap_or(Cell::Empty),
        record.result.as_deref().map(Cell::text).unwrap_or(Cell::Empty),
    ]
}

/// `<prefix>_<start>_to_<end>.<ext>`, dates as `YYYYMMDD`.
pub fn report_file_name(prefix: &str, window: &DateWindow, format: ReportFormat) -> String {
    format!(
        "{}_{}_to_{}.{}",
        prefix,
        window.start().format("%Y%m%d"),
        window.end().format("%Y%m%d"),
        format.extension()
    )
}

pub struct ReportWriter {
    format: ReportFormat,
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(format: ReportFormat, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            format,
            output_dir: output_dir.into(),
        }
    }

    /// Write `result` to `<output_dir>/<file_name>`.
    ///
    /// An empty result is refused before anything touches the disk. The file
    /// is written under a temporary name and renamed, so a failed write leaves
    /// no artifact behind.
    pub fn write(&self, result: &ScrapeResult, file_name: &str) -> Result<PathBuf, ScrapeError> {
        if result.is_empty() {
            error!("No data to save");
            return Err(ScrapeError::EmptyResult);
        }

        fs::create_dir_all(&self.output_dir).map_err(|e| {
            ScrapeError::Report(format!("creating {:?}: {}", self.output_dir, e))
        })?;
        let path = self.output_dir.join(file_name);
        let partial = path.with_extension(format!("{}.partial", self.format.extension()));

        let written = match self.format {
            ReportFormat::Xlsx => xlsx::write(result, &partial),
            ReportFormat::Csv => csv_file::write(result, &partial),
            ReportFormat::Json => json::write(result, &partial),
        };
        if let Err(e) = written.and_then(|_| rename(&partial, &path)) {
            let _ = fs::remove_file(&partial);
            return Err(ScrapeError::Report(format!("{:?}: {:#}", path, e)));
        }

        info!("Data saved to {:?} ({} rows)", path, result.len());
        Ok(path)
    }
}

fn rename(from: &Path, to: &Path) -> anyhow::Result<()> {
    fs::rename(from, to)?;
    Ok(())
}
