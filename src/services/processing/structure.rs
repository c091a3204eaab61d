//! Sheet structure parsing for laboratory EDDs
//!
//! The lab stacks several tables on one sheet. Each is found by its anchor
//! (the lab id of its first record) and then cut to a fixed row count, or up
//! to the next anchor when no count is configured.

use calamine::Data;

use super::utils::cell_text;
use crate::common::errors::{EtlError, EtlResult};
use crate::layout::{DeliverableLayout, LabIdRange, TableLayout};

/// A positional sub-table cut out of the sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SubTable {
    /// 1-based position of the table in the layout
    pub index: usize,
    /// 0-based sheet row of the anchor record
    pub anchor_row: usize,
    pub parameters: Vec<String>,
    pub rows: Vec<SampleRow>,
}

/// One record of a sub-table, cells aligned with the table's parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub lab_id: String,
    pub sample_id: String,
    pub cells: Vec<Data>,
}

/// Cut every table of the layout out of the sheet rows, in layout order.
/// The search for each table starts where the previous one ended.
pub fn slice_tables(rows: &[Vec<Data>], layout: &DeliverableLayout) -> EtlResult<Vec<SubTable>> {
    let lab_col = layout.lab_id_column();
    let mut tables = Vec::with_capacity(layout.tables.len());
    let mut cursor = 0;

    for (position, table) in layout.tables.iter().enumerate() {
        let index = position + 1;
        let anchor_row = find_lab_id(rows, lab_col, cursor, |id| id == table.anchor)
            .ok_or_else(|| {
                EtlError::LayoutMismatch(format!(
                    "table {index}: anchor '{}' not found in column {} at or below sheet row {}",
                    table.anchor,
                    layout.first_column,
                    cursor + 1
                ))
            })?;

        let end = table_end(rows, lab_col, anchor_row, table, layout.tables.get(index), index)?;

        let sample_rows: Vec<SampleRow> = rows[anchor_row..end]
            .iter()
            .enumerate()
            .filter_map(|(offset, row)| {
                sample_row(
                    row,
                    lab_col,
                    table.parameters.len(),
                    layout.lab_id_range.as_ref(),
                    anchor_row + offset,
                )
            })
            .collect();

        tracing::info!(
            "Table {index} ('{}'): sheet rows {}-{}, {} records, {} parameters",
            table.anchor,
            anchor_row + 1,
            end,
            sample_rows.len(),
            table.parameters.len()
        );

        tables.push(SubTable {
            index,
            anchor_row,
            parameters: table.parameters.clone(),
            rows: sample_rows,
        });
        cursor = end;
    }

    Ok(tables)
}

/// Exclusive end row of a table starting at `anchor_row`
fn table_end(
    rows: &[Vec<Data>],
    lab_col: usize,
    anchor_row: usize,
    table: &TableLayout,
    next: Option<&TableLayout>,
    index: usize,
) -> EtlResult<usize> {
    match table.records {
        Some(records) => {
            let end = anchor_row + records;
            if end > rows.len() {
                return Err(EtlError::LayoutMismatch(format!(
                    "table {index}: expected {records} records from sheet row {} but the sheet ends at row {}",
                    anchor_row + 1,
                    rows.len()
                )));
            }
            Ok(end)
        }
        None => Ok(find_lab_id(rows, lab_col, anchor_row + 1, |id| {
            id == table.anchor || next.is_some_and(|next| id == next.anchor)
        })
        .unwrap_or(rows.len())),
    }
}

fn find_lab_id(
    rows: &[Vec<Data>],
    lab_col: usize,
    from: usize,
    matches: impl Fn(&str) -> bool,
) -> Option<usize> {
    rows.iter()
        .enumerate()
        .skip(from)
        .find(|(_, row)| {
            row.get(lab_col)
                .and_then(cell_text)
                .is_some_and(|id| matches(&id))
        })
        .map(|(row_idx, _)| row_idx)
}

fn sample_row(
    row: &[Data],
    lab_col: usize,
    parameter_count: usize,
    lab_id_range: Option<&LabIdRange>,
    row_idx: usize,
) -> Option<SampleRow> {
    let lab_id = row.get(lab_col).and_then(cell_text)?;
    if lab_id_range.is_some_and(|range| !range.contains(&lab_id)) {
        return None;
    }

    let Some(sample_id) = row.get(lab_col + 1).and_then(cell_text) else {
        tracing::warn!(
            "Sheet row {}: lab id '{lab_id}' has no sample id, skipping",
            row_idx + 1
        );
        return None;
    };

    let cells = (0..parameter_count)
        .map(|i| row.get(lab_col + 2 + i).cloned().unwrap_or(Data::Empty))
        .collect();

    Some(SampleRow {
        lab_id,
        sample_id,
        cells,
    })
}
