use anyhow::Result;
use std::path::Path;

use super::{row_cells, Cell, COLUMNS};
use crate::models::ScrapeResult;

pub fn write(result: &ScrapeResult, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(COLUMNS)?;
    for record in result.records() {
        wtr.write_record(row_cells(record).iter().map(Cell::to_plain))?;
    }
    wtr.flush()?;
    Ok(())
}
