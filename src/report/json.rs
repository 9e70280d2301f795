use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use super::{row_cells, Cell, COLUMNS};
use crate::models::ScrapeResult;

/// Pretty-print `data` as UTF-8 JSON to `<dir>/<file_name>`, creating `dir`.
pub fn save_json<T: Serialize + ?Sized>(data: &T, dir: &Path, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    let path = dir.join(file_name);
    write_pretty(data, &path)?;
    info!("Data saved to {:?}", path);
    Ok(path)
}

fn write_pretty<T: Serialize + ?Sized>(data: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, data)?;
    out.flush()?;
    Ok(())
}

/// Report rows as an array of objects keyed by column name.
pub fn write(result: &ScrapeResult, path: &Path) -> Result<()> {
    let rows: Vec<Map<String, Value>> = result
        .records()
        .iter()
        .map(|record| {
            COLUMNS
                .iter()
                .zip(row_cells(record))
                .map(|(col, cell)| {
                    let value = match cell {
                        Cell::Text(s) => Value::String(s),
                        Cell::Number(n) => Value::from(n),
                        Cell::Empty => Value::Null,
                    };
                    (col.to_string(), value)
                })
                .collect()
        })
        .collect();
    write_pretty(&rows, path)
}
