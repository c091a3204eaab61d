//! Utility functions for spreadsheet processing
//!
//! Loading a sheet with its absolute cell positions and turning calamine
//! cells into the text and numbers the dataset stores.

use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::Path;

use crate::common::errors::{EtlError, EtlResult};

/// Load one sheet of a workbook (`.xlsx`, `.xls`, `.ods`).
///
/// calamine ranges start at the first used cell; rows and columns before it
/// are padded back in so row and column indexes match the sheet.
pub fn load_sheet(path: &Path, sheet: &str) -> EtlResult<Vec<Vec<Data>>> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();
    if !sheet_names.iter().any(|name| name == sheet) {
        return Err(EtlError::LayoutMismatch(format!(
            "sheet '{sheet}' not found in {} (sheets: {})",
            path.display(),
            sheet_names.join(", ")
        )));
    }
    let range = workbook.worksheet_range(sheet)?;
    Ok(absolute_rows(&range))
}

fn absolute_rows(range: &Range<Data>) -> Vec<Vec<Data>> {
    let Some((start_row, start_col)) = range.start() else {
        return Vec::new();
    };

    let mut rows = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![Data::Empty; start_col as usize];
        cells.extend_from_slice(row);
        rows.push(cells);
    }
    rows
}

/// Text of a cell as it is stored in the dataset's `Value` column.
///
/// Whole numbers lose their `.0` (`2.0` -> `"2"`). Empty cells, blank strings
/// and spreadsheet errors (`#N/A`, ...) have no value.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Data::Float(f) => f.is_finite().then(|| f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::Error(_) | Data::Empty => None,
    }
}

/// Numeric reading of a stored value, if it has one
pub fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
