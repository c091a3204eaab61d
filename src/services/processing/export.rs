//! CSV export of the pre-processed dataset

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::errors::EtlResult;
use crate::layout::DeliverableLayout;
use crate::services::enrichment::Observation;

/// `<workspace>/<out_name>.csv`
pub fn default_export_path(layout: &DeliverableLayout) -> PathBuf {
    layout.workspace.join(format!("{}.csv", layout.out_name))
}

/// Write rows with the master table's column names as header.
pub fn write_csv(path: &Path, observations: &[Observation]) -> EtlResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for observation in observations {
        writer.serialize(observation)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::sample_layout;
    use crate::services::enrichment::MISSING_STATISTIC;
    use chrono::NaiveDate;

    #[test]
    fn test_default_export_path() {
        let mut layout = sample_layout();
        layout.workspace = PathBuf::from("/data/ws");
        layout.out_name = "Soils_CSU_FieldSeason_2022".to_string();
        assert_eq!(
            default_export_path(&layout),
            PathBuf::from("/data/ws/Soils_CSU_FieldSeason_2022.csv")
        );
    }

    #[test]
    fn test_write_csv_uses_dataset_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let rows = vec![Observation {
            table: 2,
            protocol: "WEI".to_string(),
            site_name: "WET_0042".to_string(),
            event_name: "WET_0042_20210701".to_string(),
            start_date: NaiveDate::from_ymd_opt(2021, 7, 1),
            year_sampled: Some(2021),
            parameter_raw: "Lime_estimate".to_string(),
            unit_raw: None,
            parameter_dataset: "Lime_estimate".to_string(),
            unit_dataset: None,
            value: "2".to_string(),
            qc_status: 0,
            qc_flag: String::new(),
            qc_notes: String::new(),
            data_flag: "Null".to_string(),
            count: 1,
            st_dev: MISSING_STATISTIC,
            st_err: MISSING_STATISTIC,
            min: Some(MISSING_STATISTIC),
            max: Some(MISSING_STATISTIC),
        }];

        write_csv(&path, &rows).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Protocol_ROMN,SiteName,EventName,StartDate,YearSampled,ParameterRaw,UnitRaw,\
             ParameterDataset,UnitDataset,Value,QC_Status,QC_Flag,QC_Notes,DataFlag,Count,\
             StDev,STErr,Min,Max"
        );
        assert_eq!(
            lines.next().unwrap(),
            "WEI,WET_0042,WET_0042_20210701,2021-07-01,2021,Lime_estimate,,Lime_estimate,,2,0,,,Null,1,-999.0,-999.0,-999.0,-999.0"
        );
    }
}
