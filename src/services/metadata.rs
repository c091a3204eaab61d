//! Event metadata resolution
//!
//! Every sample must land on exactly one monitoring event. The Uplands
//! (VCSS) event table is tried first with the layout's join key; the
//! Wetlands (WEI) soil samples are tried second on the sample id itself and
//! win whenever they match.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::common::errors::{EtlError, EtlResult};
use crate::common::models::{Protocol, UNRESOLVED};
use crate::layout::{EventMatching, UplandsKey};
use crate::services::processing::row_processing::RawObservation;

/// Distinct (lab id, sample id) pair of the deliverable
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleKey {
    pub lab_id: String,
    pub sample_id: String,
}

/// Row of the Uplands event table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplandsEvent {
    pub event_name: String,
    pub site_name: String,
    pub start_date: Option<NaiveDate>,
}

/// Wetlands event joined to one of its soil samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WetlandsSample {
    pub sample_id: String,
    pub event_name: String,
    pub start_date: Option<NaiveDate>,
}

/// Event metadata attached to every observation of a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    pub lab_id: String,
    pub sample_id: String,
    pub protocol: Protocol,
    pub site_name: String,
    pub event_name: String,
    pub start_date: Option<NaiveDate>,
    pub year: Option<i32>,
    /// Why the sample is still unresolved; `None` once an event is assigned
    pub unresolved: Option<UnresolvedReason>,
}

impl EventMetadata {
    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_none() && self.event_name != UNRESOLVED
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The sample id is too short for the configured key rule
    NoCandidateKey,
    /// Neither source knows the sample
    NoMatch,
    /// The Uplands key hit several events and no Wetlands sample matched
    AmbiguousUplands(Vec<String>),
    /// The sample id is on soil samples of several Wetlands events
    AmbiguousWetlands(Vec<String>),
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::NoCandidateKey => {
                f.write_str("no event key derivable from sample id")
            }
            UnresolvedReason::NoMatch => f.write_str("no Uplands or Wetlands event"),
            UnresolvedReason::AmbiguousUplands(events) => {
                write!(f, "several Uplands events match: {}", events.join(", "))
            }
            UnresolvedReason::AmbiguousWetlands(events) => {
                write!(f, "several Wetlands events match: {}", events.join(", "))
            }
        }
    }
}

/// Sample left without an event after both passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedSample {
    pub lab_id: String,
    pub sample_id: String,
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} ({})", self.lab_id, self.sample_id, self.reason)
    }
}

/// Distinct samples that carry at least one observation, sorted
pub fn distinct_samples(observations: &[RawObservation]) -> Vec<SampleKey> {
    observations
        .iter()
        .map(|o| SampleKey {
            lab_id: o.lab_id.clone(),
            sample_id: o.sample_id.clone(),
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Key of a sample or event on the Uplands join
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    EventName(String),
    SiteDate(String, String),
}

fn sample_join_key(sample_id: &str, matching: &EventMatching) -> Option<JoinKey> {
    match &matching.uplands_key {
        UplandsKey::EventName { event } => event.apply(sample_id).map(JoinKey::EventName),
        UplandsKey::SiteDate { date, .. } => Some(JoinKey::SiteDate(
            matching.site_name.apply(sample_id)?,
            date.apply(sample_id)?,
        )),
    }
}

/// Events without a start date cannot be placed in a year and never match
fn event_join_key(event: &UplandsEvent, key: &UplandsKey) -> Option<JoinKey> {
    let start_date = event.start_date?;
    match key {
        UplandsKey::EventName { .. } => Some(JoinKey::EventName(event.event_name.clone())),
        UplandsKey::SiteDate { date_format, .. } => Some(JoinKey::SiteDate(
            event.site_name.clone(),
            start_date.format(date_format).to_string(),
        )),
    }
}

/// First pass: left-join samples onto the Uplands events.
///
/// A single match gives a VCSS row. No match, or several, leaves the row at
/// "TBD" for the Wetlands pass.
pub fn resolve_uplands(
    samples: &[SampleKey],
    events: &[UplandsEvent],
    matching: &EventMatching,
) -> Vec<EventMetadata> {
    let mut by_key: HashMap<JoinKey, Vec<&UplandsEvent>> = HashMap::new();
    for event in events {
        if let Some(key) = event_join_key(event, &matching.uplands_key) {
            by_key.entry(key).or_default().push(event);
        }
    }

    samples
        .iter()
        .map(|sample| {
            let site_name = matching
                .site_name
                .apply(&sample.sample_id)
                .unwrap_or_else(|| UNRESOLVED.to_string());
            let mut row = EventMetadata {
                lab_id: sample.lab_id.clone(),
                sample_id: sample.sample_id.clone(),
                protocol: Protocol::Tbd,
                site_name,
                event_name: UNRESOLVED.to_string(),
                start_date: None,
                year: None,
                unresolved: Some(UnresolvedReason::NoMatch),
            };

            let Some(key) = sample_join_key(&sample.sample_id, matching) else {
                row.unresolved = Some(UnresolvedReason::NoCandidateKey);
                return row;
            };

            match by_key.get(&key).map(Vec::as_slice) {
                Some([event]) => {
                    row.protocol = Protocol::Vcss;
                    row.event_name.clone_from(&event.event_name);
                    row.start_date = event.start_date;
                    row.year = event.start_date.map(|d| d.year());
                    row.unresolved = None;
                }
                Some(several) => {
                    row.unresolved = Some(UnresolvedReason::AmbiguousUplands(
                        several.iter().map(|e| e.event_name.clone()).collect(),
                    ));
                }
                None => {}
            }
            row
        })
        .collect()
}

/// Second pass: left-join the Uplands result onto Wetlands soil samples by
/// sample id. A Wetlands match always wins; without one the row is kept.
pub fn resolve_wetlands(
    resolved: Vec<EventMetadata>,
    wetlands: &[WetlandsSample],
) -> Vec<EventMetadata> {
    let mut by_sample: HashMap<&str, BTreeMap<&str, Option<NaiveDate>>> = HashMap::new();
    for sample in wetlands {
        by_sample
            .entry(sample.sample_id.trim())
            .or_default()
            .insert(sample.event_name.as_str(), sample.start_date);
    }

    resolved
        .into_iter()
        .map(|mut row| {
            let Some(events) = by_sample.get(row.sample_id.trim()) else {
                return row;
            };

            if events.len() == 1 {
                if let Some((event_name, start_date)) = events.iter().next() {
                    row.protocol = Protocol::Wei;
                    row.event_name = (*event_name).to_string();
                    row.start_date = *start_date;
                    row.year = start_date.map(|d| d.year());
                    row.unresolved = None;
                }
            } else {
                row.protocol = Protocol::Tbd;
                row.event_name = UNRESOLVED.to_string();
                row.start_date = None;
                row.year = None;
                row.unresolved = Some(UnresolvedReason::AmbiguousWetlands(
                    events.keys().map(ToString::to_string).collect(),
                ));
            }
            row
        })
        .collect()
}

/// Reject the run if any sample is still unresolved, otherwise index the
/// metadata by sample id.
pub fn validate_events(
    resolved: Vec<EventMetadata>,
) -> EtlResult<HashMap<String, EventMetadata>> {
    let unresolved: Vec<UnresolvedSample> = resolved
        .iter()
        .filter(|row| !row.is_resolved())
        .map(|row| UnresolvedSample {
            lab_id: row.lab_id.clone(),
            sample_id: row.sample_id.clone(),
            reason: row
                .unresolved
                .clone()
                .unwrap_or(UnresolvedReason::NoMatch),
        })
        .collect();

    if !unresolved.is_empty() {
        tracing::warn!(
            "There are {} records with undefined events:",
            unresolved.len()
        );
        for sample in &unresolved {
            tracing::warn!("  undefined event: {sample}");
        }
        return Err(EtlError::UnresolvedEvents(unresolved));
    }

    Ok(resolved
        .into_iter()
        .map(|row| (row.sample_id.clone(), row))
        .collect())
}

/// Both passes plus validation
pub fn resolve_events(
    samples: &[SampleKey],
    uplands: &[UplandsEvent],
    wetlands: &[WetlandsSample],
    matching: &EventMatching,
) -> EtlResult<HashMap<String, EventMetadata>> {
    let after_uplands = resolve_uplands(samples, uplands, matching);
    let vcss = after_uplands
        .iter()
        .filter(|row| row.protocol == Protocol::Vcss)
        .count();
    tracing::info!(
        "Uplands events: {vcss} of {} samples matched",
        after_uplands.len()
    );

    let after_wetlands = resolve_wetlands(after_uplands, wetlands);
    let wei = after_wetlands
        .iter()
        .filter(|row| row.protocol == Protocol::Wei)
        .count();
    tracing::info!("Wetlands events: {wei} samples matched");

    validate_events(after_wetlands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::IdDerivation;

    fn date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn sample(lab_id: &str, sample_id: &str) -> SampleKey {
        SampleKey {
            lab_id: lab_id.to_string(),
            sample_id: sample_id.to_string(),
        }
    }

    fn uplands(event_name: &str, site_name: &str, start_date: Option<NaiveDate>) -> UplandsEvent {
        UplandsEvent {
            event_name: event_name.to_string(),
            site_name: site_name.to_string(),
            start_date,
        }
    }

    fn wetlands(
        sample_id: &str,
        event_name: &str,
        start_date: Option<NaiveDate>,
    ) -> WetlandsSample {
        WetlandsSample {
            sample_id: sample_id.to_string(),
            event_name: event_name.to_string(),
            start_date,
        }
    }

    fn by_event_name() -> EventMatching {
        EventMatching {
            site_name: IdDerivation::Segments { count: 1 },
            uplands_key: UplandsKey::EventName {
                event: IdDerivation::Segments { count: 3 },
            },
        }
    }

    fn by_site_date() -> EventMatching {
        EventMatching {
            site_name: IdDerivation::Prefix { length: 8 },
            uplands_key: UplandsKey::SiteDate {
                date: IdDerivation::Segment { index: 2 },
                date_format: "%Y%m%d".to_string(),
            },
        }
    }

    #[test]
    fn test_uplands_match_by_event_name() {
        let samples = vec![sample("R70", "SITE01_2021_0815_A")];
        let events = vec![uplands("SITE01_2021_0815", "SITE01", date(2021, 8, 15))];

        let rows = resolve_uplands(&samples, &events, &by_event_name());

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.protocol, Protocol::Vcss);
        assert_eq!(row.site_name, "SITE01");
        assert_eq!(row.event_name, "SITE01_2021_0815");
        assert_eq!(row.start_date, date(2021, 8, 15));
        assert_eq!(row.year, Some(2021));
        assert!(row.is_resolved());
    }

    #[test]
    fn test_uplands_event_without_start_date_does_not_match() {
        let samples = vec![sample("R70", "SITE01_2021_0815_A")];
        let events = vec![uplands("SITE01_2021_0815", "SITE01", None)];

        let rows = resolve_uplands(&samples, &events, &by_event_name());
        assert_eq!(rows[0].protocol, Protocol::Tbd);
        assert_eq!(rows[0].event_name, UNRESOLVED);
    }

    #[test]
    fn test_samples_sharing_a_site_date_key_share_the_event() {
        let samples = vec![
            sample("2023S249", "ROMO_012_20220801_S1"),
            sample("2023S250", "ROMO_012_20220801_S2"),
            sample("2023S251", "ROMO_013_20220802_S1"),
        ];
        let events = vec![
            uplands("ROMO_012_2022_A", "ROMO_012", date(2022, 8, 1)),
            uplands("ROMO_012_2021_A", "ROMO_012", date(2021, 8, 1)),
            uplands("ROMO_013_2022_A", "ROMO_013", date(2022, 8, 2)),
        ];

        let rows = resolve_uplands(&samples, &events, &by_site_date());

        assert_eq!(rows[0].event_name, "ROMO_012_2022_A");
        assert_eq!(rows[1].event_name, rows[0].event_name);
        assert_eq!(rows[1].start_date, rows[0].start_date);
        assert_eq!(rows[2].event_name, "ROMO_013_2022_A");
        assert!(rows.iter().all(|r| r.protocol == Protocol::Vcss));
    }

    #[test]
    fn test_ambiguous_uplands_match_stays_unresolved() {
        let samples = vec![sample("2023S249", "ROMO_012_20220801_S1")];
        let events = vec![
            uplands("ROMO_012_2022_A", "ROMO_012", date(2022, 8, 1)),
            uplands("ROMO_012_2022_B", "ROMO_012", date(2022, 8, 1)),
        ];

        let rows = resolve_uplands(&samples, &events, &by_site_date());
        assert_eq!(rows[0].protocol, Protocol::Tbd);
        assert!(matches!(
            rows[0].unresolved,
            Some(UnresolvedReason::AmbiguousUplands(ref names)) if names.len() == 2
        ));
    }

    #[test]
    fn test_short_sample_id_has_no_candidate_key() {
        let samples = vec![sample("2023S249", "ROMO")];
        let rows = resolve_uplands(&samples, &[], &by_site_date());
        assert_eq!(rows[0].unresolved, Some(UnresolvedReason::NoCandidateKey));
    }

    #[test]
    fn test_wetlands_overrides_unresolved_uplands() {
        let samples = vec![sample("R80", "WET_0042_S")];
        let after_uplands = resolve_uplands(&samples, &[], &by_event_name());
        assert_eq!(after_uplands[0].protocol, Protocol::Tbd);

        let rows = resolve_wetlands(
            after_uplands,
            &[wetlands("WET_0042_S", "WET_0042_2021", date(2021, 7, 2))],
        );

        assert_eq!(rows[0].protocol, Protocol::Wei);
        assert_eq!(rows[0].event_name, "WET_0042_2021");
        assert_eq!(rows[0].start_date, date(2021, 7, 2));
        assert_eq!(rows[0].year, Some(2021));
        assert!(rows[0].is_resolved());
    }

    #[test]
    fn test_wetlands_wins_over_resolved_uplands_only_with_own_match() {
        let samples = vec![
            sample("R70", "SITE01_2021_0815_A"),
            sample("R71", "SITE01_2021_0815_B"),
        ];
        let events = vec![uplands("SITE01_2021_0815", "SITE01", date(2021, 8, 15))];
        let after_uplands = resolve_uplands(&samples, &events, &by_event_name());

        let rows = resolve_wetlands(
            after_uplands,
            &[wetlands("SITE01_2021_0815_B", "WET_SITE01_2021", date(2021, 8, 16))],
        );

        // No Wetlands match: Uplands result untouched
        assert_eq!(rows[0].protocol, Protocol::Vcss);
        assert_eq!(rows[0].event_name, "SITE01_2021_0815");
        // Own Wetlands match: Wetlands wins
        assert_eq!(rows[1].protocol, Protocol::Wei);
        assert_eq!(rows[1].event_name, "WET_SITE01_2021");
        assert_eq!(rows[1].start_date, date(2021, 8, 16));
        assert_eq!(rows[1].site_name, "SITE01");
    }

    #[test]
    fn test_duplicate_soil_rows_of_one_event_are_not_ambiguous() {
        let after_uplands = resolve_uplands(&[sample("R80", "WET_7")], &[], &by_event_name());
        let rows = resolve_wetlands(
            after_uplands,
            &[
                wetlands("WET_7", "WET_EVENT_7", date(2021, 7, 2)),
                wetlands("WET_7", "WET_EVENT_7", date(2021, 7, 2)),
            ],
        );
        assert_eq!(rows[0].protocol, Protocol::Wei);
    }

    #[test]
    fn test_several_wetlands_events_are_ambiguous() {
        let samples = vec![sample("R70", "SITE01_2021_0815_A")];
        let events = vec![uplands("SITE01_2021_0815", "SITE01", date(2021, 8, 15))];
        let after_uplands = resolve_uplands(&samples, &events, &by_event_name());

        let rows = resolve_wetlands(
            after_uplands,
            &[
                wetlands("SITE01_2021_0815_A", "WET_A", date(2021, 8, 15)),
                wetlands("SITE01_2021_0815_A", "WET_B", date(2021, 8, 16)),
            ],
        );

        assert_eq!(rows[0].protocol, Protocol::Tbd);
        assert_eq!(
            rows[0].unresolved,
            Some(UnresolvedReason::AmbiguousWetlands(vec![
                "WET_A".to_string(),
                "WET_B".to_string()
            ]))
        );
    }

    #[test]
    fn test_resolve_events_rejects_unknown_samples() {
        let samples = vec![
            sample("R70", "SITE01_2021_0815_A"),
            sample("R99", "NOWHERE_2021_0101_A"),
        ];
        let events = vec![uplands("SITE01_2021_0815", "SITE01", date(2021, 8, 15))];

        let err = resolve_events(&samples, &events, &[], &by_event_name()).unwrap_err();

        match err {
            EtlError::UnresolvedEvents(unresolved) => {
                assert_eq!(unresolved.len(), 1);
                assert_eq!(unresolved[0].lab_id, "R99");
                assert_eq!(unresolved[0].reason, UnresolvedReason::NoMatch);
            }
            other => panic!("Expected unresolved events, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_events_indexes_by_sample_id() {
        let samples = vec![sample("R70", "SITE01_2021_0815_A"), sample("R80", "WET_0042_S")];
        let events = vec![uplands("SITE01_2021_0815", "SITE01", date(2021, 8, 15))];
        let wet = vec![wetlands("WET_0042_S", "WET_0042_2021", date(2021, 7, 2))];

        let resolved = resolve_events(&samples, &events, &wet, &by_event_name()).unwrap();

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["SITE01_2021_0815_A"].protocol, Protocol::Vcss);
        assert_eq!(resolved["WET_0042_S"].protocol, Protocol::Wei);
    }

    #[test]
    fn test_distinct_samples() {
        let observation = |lab: &str, sample_id: &str, parameter: &str| RawObservation {
            table: 1,
            lab_id: lab.to_string(),
            sample_id: sample_id.to_string(),
            parameter: parameter.to_string(),
            value: "1".to_string(),
        };
        let observations = vec![
            observation("R71", "B", "pH"),
            observation("R70", "A", "pH"),
            observation("R70", "A", "K_ppm"),
        ];

        let samples = distinct_samples(&observations);
        assert_eq!(samples, vec![sample("R70", "A"), sample("R71", "B")]);
    }
}
