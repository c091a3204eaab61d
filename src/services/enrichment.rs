//! Turns resolved long-format records into master dataset rows
//!
//! Adds the bookkeeping columns the dataset expects for single-sample lab
//! results: QC status 0, empty QC flag and notes, data flag "Null", count 1
//! and -999 for the statistics that need several samples.

use chrono::NaiveDate;
use sea_orm::{ActiveValue::NotSet, Set};
use serde::Serialize;
use std::collections::HashMap;

use crate::common::errors::{EtlError, EtlResult};
use crate::services::crosswalk::CanonicalParameter;
use crate::services::metadata::{EventMetadata, UnresolvedReason, UnresolvedSample};
use crate::services::processing::{row_processing::RawObservation, utils::parse_number};
use soils_entity::soil_chemistry_dataset;

/// Value written where a statistic does not apply
pub const MISSING_STATISTIC: f64 = -999.0;

/// One row bound for `tbl_SoilChemistry_Dataset`. Field names serialize to
/// the table's column names so a CSV export lines up with the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    #[serde(skip)]
    pub table: usize,
    #[serde(rename = "Protocol_ROMN")]
    pub protocol: String,
    #[serde(rename = "SiteName")]
    pub site_name: String,
    #[serde(rename = "EventName")]
    pub event_name: String,
    #[serde(rename = "StartDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "YearSampled")]
    pub year_sampled: Option<i32>,
    #[serde(rename = "ParameterRaw")]
    pub parameter_raw: String,
    #[serde(rename = "UnitRaw")]
    pub unit_raw: Option<String>,
    #[serde(rename = "ParameterDataset")]
    pub parameter_dataset: String,
    #[serde(rename = "UnitDataset")]
    pub unit_dataset: Option<String>,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "QC_Status")]
    pub qc_status: i32,
    #[serde(rename = "QC_Flag")]
    pub qc_flag: String,
    #[serde(rename = "QC_Notes")]
    pub qc_notes: String,
    #[serde(rename = "DataFlag")]
    pub data_flag: String,
    #[serde(rename = "Count")]
    pub count: i32,
    #[serde(rename = "StDev")]
    pub st_dev: f64,
    #[serde(rename = "STErr")]
    pub st_err: f64,
    #[serde(rename = "Min")]
    pub min: Option<f64>,
    #[serde(rename = "Max")]
    pub max: Option<f64>,
}

impl Observation {
    pub fn to_active_model(&self) -> soil_chemistry_dataset::ActiveModel {
        soil_chemistry_dataset::ActiveModel {
            id: NotSet,
            protocol_romn: Set(self.protocol.clone()),
            site_name: Set(self.site_name.clone()),
            event_name: Set(self.event_name.clone()),
            start_date: Set(self.start_date),
            year_sampled: Set(self.year_sampled),
            parameter_raw: Set(self.parameter_raw.clone()),
            unit_raw: Set(self.unit_raw.clone()),
            parameter_dataset: Set(self.parameter_dataset.clone()),
            unit_dataset: Set(self.unit_dataset.clone()),
            value: Set(self.value.clone()),
            qc_status: Set(self.qc_status),
            qc_flag: Set(self.qc_flag.clone()),
            qc_notes: Set(self.qc_notes.clone()),
            data_flag: Set(self.data_flag.clone()),
            count: Set(self.count),
            st_dev: Set(self.st_dev),
            st_err: Set(self.st_err),
            min: Set(self.min),
            max: Set(self.max),
        }
    }
}

/// Min and Max of a single-sample value. Categorical parameters get the
/// missing-value sentinel; values that are not numbers have none.
pub fn min_max(
    parameter: &str,
    value: &str,
    categorical_prefixes: &[String],
) -> (Option<f64>, Option<f64>) {
    if categorical_prefixes
        .iter()
        .any(|prefix| parameter.starts_with(prefix.as_str()))
    {
        return (Some(MISSING_STATISTIC), Some(MISSING_STATISTIC));
    }
    let number = parse_number(value);
    (number, number)
}

/// Join metadata and cross-walk onto every raw record.
///
/// Both maps come out of validation, so a miss here means the inputs were
/// not validated together; it is reported the same way validation would.
pub fn enrich(
    raw: &[RawObservation],
    events: &HashMap<String, EventMetadata>,
    crosswalk: &HashMap<String, CanonicalParameter>,
    categorical_prefixes: &[String],
) -> EtlResult<Vec<Observation>> {
    let mut observations = Vec::with_capacity(raw.len());
    let mut non_numeric = 0usize;

    for record in raw {
        let event = events.get(&record.sample_id).ok_or_else(|| {
            EtlError::UnresolvedEvents(vec![UnresolvedSample {
                lab_id: record.lab_id.clone(),
                sample_id: record.sample_id.clone(),
                reason: UnresolvedReason::NoMatch,
            }])
        })?;
        let canonical = crosswalk
            .get(&record.parameter)
            .ok_or_else(|| EtlError::UnresolvedCrosswalk(vec![record.parameter.clone()]))?;

        let (min, max) = min_max(&record.parameter, &record.value, categorical_prefixes);
        if min.is_none() {
            non_numeric += 1;
        }

        observations.push(Observation {
            table: record.table,
            protocol: event.protocol.to_string(),
            site_name: event.site_name.clone(),
            event_name: event.event_name.clone(),
            start_date: event.start_date,
            year_sampled: event.year,
            parameter_raw: record.parameter.clone(),
            unit_raw: canonical.unit_raw.clone(),
            parameter_dataset: canonical.parameter_dataset.clone(),
            unit_dataset: canonical.unit_dataset.clone(),
            value: record.value.clone(),
            qc_status: 0,
            qc_flag: String::new(),
            qc_notes: String::new(),
            data_flag: "Null".to_string(),
            count: 1,
            st_dev: MISSING_STATISTIC,
            st_err: MISSING_STATISTIC,
            min,
            max,
        });
    }

    if non_numeric > 0 {
        tracing::warn!("{non_numeric} non-categorical values are not numeric, Min/Max left empty");
    }

    Ok(observations)
}
