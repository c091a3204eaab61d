//! Deliverable processor for laboratory soil chemistry EDDs
//!
//! Runs the whole import for one layout: read the sheet, slice and melt the
//! tables, resolve events, validate the cross-walk, enrich, then append.
//! Every validation happens before the first write, so a rejected
//! deliverable never leaves partial rows in the master dataset.

use crate::common::{errors::EtlResult, models::ProcessingStatus};
use crate::layout::DeliverableLayout;
use crate::services::{
    crosswalk::{CrosswalkEntry, validate_crosswalk},
    enrichment::{Observation, enrich},
    metadata::{UplandsEvent, WetlandsSample, distinct_samples, resolve_events},
};
use chrono::Utc;
use indicatif::ProgressBar;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::path::PathBuf;

use super::{
    database::{AppendSummary, DatabaseOperations},
    export::write_csv,
    row_processing::melt_tables,
    structure::slice_tables,
    utils::load_sheet,
};

/// Per-run switches from the command line
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Validate and enrich only, write nothing to the database
    pub dry_run: bool,
    /// Write the enriched rows to this CSV file
    pub export_csv: Option<PathBuf>,
}

/// Validated, enriched rows ready to append
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub tables: usize,
    pub raw_records: usize,
    pub samples: usize,
    pub observations: Vec<Observation>,
}

/// Result of processing one deliverable
#[derive(Debug, Clone, Serialize)]
pub struct EtlProcessingResult {
    pub status: ProcessingStatus,
    pub tables_sliced: usize,
    pub records_melted: usize,
    pub samples_resolved: usize,
    pub observations_prepared: usize,
    pub rows_appended: usize,
    pub rows_failed: usize,
    pub export_path: Option<PathBuf>,
    pub processing_time_ms: u128,
    pub started_at: chrono::DateTime<Utc>,
    pub completed_at: chrono::DateTime<Utc>,
    pub errors: Vec<String>,
}

/// Service for deliverable processing
#[derive(Clone)]
pub struct EddProcessor {
    db: DatabaseConnection,
}

impl EddProcessor {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Read the deliverable and run every stage up to, not including, the
    /// append.
    pub async fn prepare(&self, layout: &DeliverableLayout) -> EtlResult<PreparedDataset> {
        let rows = load_sheet(&layout.input_file, &layout.sheet)?;
        tracing::info!(
            "Loaded sheet '{}' of {} ({} rows)",
            layout.sheet,
            layout.input_file.display(),
            rows.len()
        );

        let db_ops = DatabaseOperations::new(self.db.clone());
        let (uplands, wetlands, crosswalk) = tokio::join!(
            db_ops.load_uplands_events(),
            db_ops.load_wetlands_samples(),
            db_ops.load_crosswalk()
        );

        prepare_from_rows(&rows, layout, &uplands?, &wetlands?, &crosswalk?)
    }

    /// Append prepared rows, one insert per row
    pub async fn append(
        &self,
        prepared: &PreparedDataset,
        progress: Option<&ProgressBar>,
    ) -> AppendSummary {
        if let Some(pb) = progress {
            pb.set_length(prepared.observations.len() as u64);
        }
        DatabaseOperations::new(self.db.clone())
            .append_observations(&prepared.observations, progress)
            .await
    }

    /// Full import of one deliverable
    pub async fn process_deliverable(
        &self,
        layout: &DeliverableLayout,
        options: &ImportOptions,
        progress: Option<&ProgressBar>,
    ) -> EtlResult<EtlProcessingResult> {
        let started_at = Utc::now();
        let start_time = std::time::Instant::now();

        let prepared = self.prepare(layout).await?;

        if let Some(path) = &options.export_csv {
            write_csv(path, &prepared.observations)?;
            tracing::info!(
                "Exported {} rows to {}",
                prepared.observations.len(),
                path.display()
            );
        }

        let (status, summary) = if options.dry_run {
            tracing::info!(
                "Dry run: {} rows validated, nothing appended",
                prepared.observations.len()
            );
            (ProcessingStatus::Validated, AppendSummary::default())
        } else {
            let summary = self.append(&prepared, progress).await;
            let status = if summary.failures.is_empty() {
                ProcessingStatus::Completed
            } else {
                ProcessingStatus::CompletedWithFailures
            };
            (status, summary)
        };

        let result = EtlProcessingResult {
            status,
            tables_sliced: prepared.tables,
            records_melted: prepared.raw_records,
            samples_resolved: prepared.samples,
            observations_prepared: prepared.observations.len(),
            rows_appended: summary.appended,
            rows_failed: summary.failures.len(),
            export_path: options.export_csv.clone(),
            processing_time_ms: start_time.elapsed().as_millis(),
            started_at,
            completed_at: Utc::now(),
            errors: summary
                .failures
                .iter()
                .map(|failure| match std::error::Error::source(failure) {
                    Some(cause) => format!("{failure}: {cause}"),
                    None => failure.to_string(),
                })
                .collect(),
        };

        tracing::info!(
            "Processing finished ({:?}): {} appended, {} failed in {} ms",
            result.status,
            result.rows_appended,
            result.rows_failed,
            result.processing_time_ms
        );

        Ok(result)
    }
}

/// Slice, melt, resolve, validate and enrich sheet rows against already
/// loaded lookups.
///
/// Both validations run before either error is returned so the log lists
/// undefined events and undefined parameters from the same run.
pub fn prepare_from_rows(
    rows: &[Vec<calamine::Data>],
    layout: &DeliverableLayout,
    uplands: &[UplandsEvent],
    wetlands: &[WetlandsSample],
    crosswalk: &[CrosswalkEntry],
) -> EtlResult<PreparedDataset> {
    let tables = slice_tables(rows, layout)?;
    let raw = melt_tables(&tables, layout.no_data_sentinel.as_deref());
    tracing::info!(
        "Reshaped {} tables into {} long-format records",
        tables.len(),
        raw.len()
    );

    let samples = distinct_samples(&raw);
    let events = resolve_events(&samples, uplands, wetlands, &layout.events);
    let canonical =
        validate_crosswalk(raw.iter().map(|record| record.parameter.as_str()), crosswalk);
    let (events, canonical) = (events?, canonical?);

    let observations = enrich(&raw, &events, &canonical, &layout.categorical_prefixes)?;
    tracing::info!("Prepared {} rows for the master dataset", observations.len());

    Ok(PreparedDataset {
        tables: tables.len(),
        raw_records: raw.len(),
        samples: samples.len(),
        observations,
    })
}
