use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Validated and appended to the master dataset
    Completed,
    /// Validated only, nothing written (dry run)
    Validated,
    /// Validated, but one or more rows failed to append
    CompletedWithFailures,
}

/// Monitoring protocol an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Uplands vegetation and soils
    #[serde(rename = "VCSS")]
    Vcss,
    /// Wetlands ecological integrity
    #[serde(rename = "WEI")]
    Wei,
    /// Not yet resolved to an event
    #[serde(rename = "TBD")]
    Tbd,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Vcss => "VCSS",
            Protocol::Wei => "WEI",
            Protocol::Tbd => UNRESOLVED,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder used for event and site names that are not resolved yet
pub const UNRESOLVED: &str = "TBD";
