use anyhow::Result;
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

use super::{row_cells, Cell, COLUMNS};
use crate::models::ScrapeResult;

pub const SHEET_NAME: &str = "MLB Signals";

pub fn write(result: &ScrapeResult, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (i, record) in result.records().iter().enumerate() {
        let row = i as u32 + 1;
        for (col, cell) in row_cells(record).into_iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(row, col, s)?;
                }
                Cell::Number(n) => {
                    sheet.write_number(row, col, n)?;
                }
                Cell::Empty => {}
            }
        }
    }

    sheet.autofit();
    workbook.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{sample_result, scratch_dir};
    use crate::report::{ReportFormat, ReportWriter};
    use calamine::{open_workbook, Data, Reader, Xlsx};

    #[test]
    fn test_sheet_header_and_rows_read_back() {
        let dir = scratch_dir("xlsx_read");
        let path = ReportWriter::new(ReportFormat::Xlsx, &dir)
            .write(&sample_result(), "signals.xlsx")
            .unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(workbook.sheet_names(), [SHEET_NAME]);
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();

        let header: Vec<String> = rows[0].iter().map(|c| c.to_string()).collect();
        assert_eq!(header, COLUMNS);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][2], Data::String("Yankees".into()));
        assert_eq!(rows[1][3], Data::String("X".into()));
        assert_eq!(rows[2][1], Data::String("Home".into()));
        assert_eq!(rows[2][8], Data::Float(-1.5));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
