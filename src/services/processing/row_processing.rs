//! Wide-to-long reshaping of sliced tables
//!
//! Every (sample, parameter) cell with a value becomes one record. Empty
//! cells and the lab's no-data marker are dropped.

use super::{structure::SubTable, utils::cell_text};

/// One non-empty result cell in long format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObservation {
    /// 1-based table the value came from
    pub table: usize,
    pub lab_id: String,
    pub sample_id: String,
    pub parameter: String,
    pub value: String,
}

/// Un-pivot one table, parameter by parameter.
pub fn melt_table(table: &SubTable, no_data_sentinel: Option<&str>) -> Vec<RawObservation> {
    let mut observations = Vec::new();
    let mut dropped_sentinels = 0usize;

    for (param_idx, parameter) in table.parameters.iter().enumerate() {
        for row in &table.rows {
            let Some(value) = row.cells.get(param_idx).and_then(cell_text) else {
                continue;
            };
            if no_data_sentinel.is_some_and(|sentinel| value == sentinel) {
                dropped_sentinels += 1;
                continue;
            }
            observations.push(RawObservation {
                table: table.index,
                lab_id: row.lab_id.clone(),
                sample_id: row.sample_id.clone(),
                parameter: parameter.clone(),
                value,
            });
        }
    }

    if dropped_sentinels > 0 {
        tracing::info!(
            "Table {}: dropped {dropped_sentinels} no-data values",
            table.index
        );
    }

    observations
}

/// Un-pivot all tables, keeping table order
pub fn melt_tables(tables: &[SubTable], no_data_sentinel: Option<&str>) -> Vec<RawObservation> {
    tables
        .iter()
        .flat_map(|table| melt_table(table, no_data_sentinel))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::processing::structure::SampleRow;
    use calamine::Data;

    fn table(index: usize, parameters: &[&str], rows: Vec<(&str, &str, Vec<Data>)>) -> SubTable {
        SubTable {
            index,
            anchor_row: 0,
            parameters: parameters.iter().map(ToString::to_string).collect(),
            rows: rows
                .into_iter()
                .map(|(lab_id, sample_id, cells)| SampleRow {
                    lab_id: lab_id.to_string(),
                    sample_id: sample_id.to_string(),
                    cells,
                })
                .collect(),
        }
    }

    #[test]
    fn test_melt_table_drops_empty_cells() {
        let t = table(
            1,
            &["pH", "K_ppm"],
            vec![
                ("R70", "SITE01_2021_0815_A", vec![Data::Float(6.5), Data::Int(120)]),
                ("R71", "SITE01_2021_0815_B", vec![Data::Float(7.0), Data::Empty]),
            ],
        );

        let melted = melt_table(&t, None);

        assert_eq!(melted.len(), 3);
        // Parameter-major order
        assert_eq!(melted[0].parameter, "pH");
        assert_eq!(melted[0].lab_id, "R70");
        assert_eq!(melted[0].value, "6.5");
        assert_eq!(melted[1].parameter, "pH");
        assert_eq!(melted[1].lab_id, "R71");
        assert_eq!(melted[1].value, "7");
        assert_eq!(melted[2].parameter, "K_ppm");
        assert_eq!(melted[2].value, "120");
        assert!(melted.iter().all(|o| o.table == 1));
    }

    #[test]
    fn test_melt_table_drops_sentinel() {
        let t = table(
            2,
            &["Texture Class", "B"],
            vec![
                (
                    "2023S257",
                    "ROMO_012",
                    vec![Data::String("Loam".into()), Data::String("*".into())],
                ),
                ("2023S258", "ROMO_013", vec![Data::String(" * ".into()), Data::Float(0.4)]),
            ],
        );

        let melted = melt_table(&t, Some("*"));
        let values: Vec<_> = melted.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["Loam", "0.4"]);

        // Without a configured sentinel the marker is an ordinary value
        assert_eq!(melt_table(&t, None).len(), 4);
    }

    #[test]
    fn test_melt_tables_preserves_non_empty_cell_count() {
        let tables = vec![
            table(
                1,
                &["pH", "Lime_estimate", "EC_mmhos/cm"],
                vec![
                    ("R62", "A", vec![Data::Float(6.5), Data::Int(2), Data::Float(0.3)]),
                    ("R63", "B", vec![Data::Float(6.9), Data::Empty, Data::Empty]),
                ],
            ),
            table(
                2,
                &["Mg_ppm"],
                vec![
                    ("R62", "A", vec![Data::Float(88.0)]),
                    ("R63", "B", vec![Data::Error(calamine::CellErrorType::NA)]),
                ],
            ),
        ];

        let non_empty: usize = tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .flat_map(|r| r.cells.iter())
            .filter(|cell| cell_text(cell).is_some())
            .count();

        let melted = melt_tables(&tables, Some("*"));
        assert_eq!(melted.len(), non_empty);
        assert_eq!(melted.len(), 5);
        assert_eq!(melted.last().unwrap().table, 2);
    }
}
