//! Name/unit cross-walk validation
//!
//! Lab parameter names are mapped to the dataset's canonical parameter and
//! unit through `tlu_NameUnitCrossWalk`. A name missing from the lookup
//! stops the import; the data manager adds it and re-runs.

use std::collections::{BTreeSet, HashMap};

use crate::common::errors::{EtlError, EtlResult};

/// Row of the cross-walk lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrosswalkEntry {
    pub parameter_native: String,
    pub unit_native: Option<String>,
    pub parameter_dataset: String,
    pub unit_dataset: Option<String>,
}

/// What a raw parameter name maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalParameter {
    pub unit_raw: Option<String>,
    pub parameter_dataset: String,
    pub unit_dataset: Option<String>,
}

/// Left-join the distinct raw names onto the lookup.
///
/// Every unknown name is reported, sorted, in a single
/// [`EtlError::UnresolvedCrosswalk`].
pub fn validate_crosswalk<'a>(
    parameters: impl IntoIterator<Item = &'a str>,
    lookup: &[CrosswalkEntry],
) -> EtlResult<HashMap<String, CanonicalParameter>> {
    let by_native: HashMap<&str, &CrosswalkEntry> = lookup
        .iter()
        .map(|entry| (entry.parameter_native.as_str(), entry))
        .collect();

    let distinct: BTreeSet<&str> = parameters.into_iter().collect();

    let mut mapping = HashMap::with_capacity(distinct.len());
    let mut missing = Vec::new();
    for parameter in distinct {
        match by_native.get(parameter) {
            Some(entry) => {
                mapping.insert(
                    parameter.to_string(),
                    CanonicalParameter {
                        unit_raw: entry.unit_native.clone(),
                        parameter_dataset: entry.parameter_dataset.clone(),
                        unit_dataset: entry.unit_dataset.clone(),
                    },
                );
            }
            None => missing.push(parameter.to_string()),
        }
    }

    if !missing.is_empty() {
        tracing::warn!(
            "Parameters are undefined in 'tlu_NameUnitCrossWalk', define them and reprocess:"
        );
        for parameter in &missing {
            tracing::warn!("  undefined parameter: '{parameter}'");
        }
        return Err(EtlError::UnresolvedCrosswalk(missing));
    }

    tracing::info!("Cross-walk defined for all {} parameters", mapping.len());
    Ok(mapping)
}
