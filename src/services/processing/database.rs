//! Database operations for deliverable processing
//!
//! Loads the event and cross-walk lookups and appends the enriched rows to
//! the master dataset.

use indicatif::ProgressBar;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::collections::HashMap;

use crate::common::errors::{EtlError, EtlResult};
use crate::services::crosswalk::CrosswalkEntry;
use crate::services::enrichment::Observation;
use crate::services::metadata::{UplandsEvent, WetlandsSample};
use soils_entity::{
    name_unit_crosswalk, soil_chemistry_dataset, uplands_events, wetlands_events, wetlands_soil,
};

/// Database operations for deliverable processing
pub struct DatabaseOperations {
    pub db: DatabaseConnection,
}

/// Per-row outcome of an append
#[derive(Debug, Default)]
pub struct AppendSummary {
    pub appended: usize,
    pub failures: Vec<EtlError>,
}

impl DatabaseOperations {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Load the Uplands event table
    pub async fn load_uplands_events(&self) -> EtlResult<Vec<UplandsEvent>> {
        let events = uplands_events::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|event| UplandsEvent {
                event_name: event.event_name,
                site_name: event.site_name,
                start_date: event.start_date,
            })
            .collect::<Vec<_>>();

        tracing::debug!("Loaded {} Uplands events", events.len());
        Ok(events)
    }

    /// Load Wetlands soil samples joined to their events. Soil rows without
    /// a sample id or without a matching event cannot resolve anything and
    /// are left out.
    pub async fn load_wetlands_samples(&self) -> EtlResult<Vec<WetlandsSample>> {
        let events: HashMap<String, wetlands_events::Model> = wetlands_events::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|event| (event.event_name.clone(), event))
            .collect();

        let soil = wetlands_soil::Entity::find().all(&self.db).await?;

        let samples = soil
            .into_iter()
            .filter_map(|row| {
                let sample_id = row.chem?;
                let event = events.get(&row.event_name)?;
                Some(WetlandsSample {
                    sample_id,
                    event_name: event.event_name.clone(),
                    start_date: event.start_date,
                })
            })
            .collect::<Vec<_>>();

        tracing::debug!("Loaded {} Wetlands soil samples", samples.len());
        Ok(samples)
    }

    /// Load the name/unit cross-walk
    pub async fn load_crosswalk(&self) -> EtlResult<Vec<CrosswalkEntry>> {
        let entries = name_unit_crosswalk::Entity::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|entry| CrosswalkEntry {
                parameter_native: entry.parameter_native,
                unit_native: entry.unit_native,
                parameter_dataset: entry.parameter_dataset,
                unit_dataset: entry.unit_dataset,
            })
            .collect::<Vec<_>>();

        tracing::debug!("Loaded {} cross-walk entries", entries.len());
        Ok(entries)
    }

    /// Append rows one at a time. A failed row is logged and collected, and
    /// the remaining rows are still attempted.
    pub async fn append_observations(
        &self,
        observations: &[Observation],
        progress: Option<&ProgressBar>,
    ) -> AppendSummary {
        let mut summary = AppendSummary::default();

        for observation in observations {
            if let Some(pb) = progress {
                pb.set_message(format!(
                    "{} / {}",
                    observation.event_name, observation.parameter_raw
                ));
            }

            match soil_chemistry_dataset::Entity::insert(observation.to_active_model())
                .exec(&self.db)
                .await
            {
                Ok(_) => {
                    summary.appended += 1;
                    tracing::info!(
                        "Appended event '{}' parameter '{}' (table {})",
                        observation.event_name,
                        observation.parameter_raw,
                        observation.table
                    );
                }
                Err(source) => {
                    tracing::warn!(
                        "Failed to append event '{}' parameter '{}' (table {}): {source}",
                        observation.event_name,
                        observation.parameter_raw,
                        observation.table
                    );
                    summary.failures.push(EtlError::AppendFailure {
                        event_name: observation.event_name.clone(),
                        parameter: observation.parameter_raw.clone(),
                        table: observation.table,
                        source,
                    });
                }
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        summary
    }
}
