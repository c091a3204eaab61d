//! Declarative description of one laboratory deliverable.
//!
//! Each EDD the lab sends has its own sheet name, table anchors, record
//! counts and column lists. Instead of hard-coding those per year, a layout
//! file (YAML) describes them and the slicer, resolver and enrichment stages
//! read it.
//!
//! ```yaml
//! input_file: Report_2022.xlsx
//! sheet: RawData
//! first_column: 3
//! workspace: workspace
//! out_name: Soils_CSU_FieldSeason_2022
//! no_data_sentinel: "*"
//! events:
//!   site_name: { rule: prefix, length: 8 }
//!   uplands_key:
//!     strategy: event_name
//!     event: { rule: segments, count: 3 }
//! tables:
//!   - anchor: 2023S249
//!     records: 24
//!     parameters: ["Bulk Density (g/cm)"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::errors::{EtlError, EtlResult};

/// Parameter name prefixes whose values are categorical. Their Min/Max are
/// written as the missing-value sentinel instead of the value itself.
pub const DEFAULT_CATEGORICAL_PREFIXES: [&str; 3] =
    ["Lime_estimate", "Texture_Categorical", "Peat_Thickness_cm"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableLayout {
    /// Spreadsheet delivered by the lab
    pub input_file: PathBuf,
    /// Sheet holding the raw results
    pub sheet: String,
    /// 1-based sheet column holding the lab id. The ROMN sample id is the
    /// next column and parameters follow in layout order.
    #[serde(default = "default_first_column")]
    pub first_column: usize,
    /// Only keep rows whose lab id falls in this range
    #[serde(default)]
    pub lab_id_range: Option<LabIdRange>,
    /// Cell value the lab uses for "no data"
    #[serde(default)]
    pub no_data_sentinel: Option<String>,
    /// Directory for the run log and exports
    pub workspace: PathBuf,
    #[serde(default = "default_out_name")]
    pub out_name: String,
    pub events: EventMatching,
    #[serde(default = "default_categorical_prefixes")]
    pub categorical_prefixes: Vec<String>,
    pub tables: Vec<TableLayout>,
}

/// One positional sub-table of the sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    /// Lab id of the first record of the table
    pub anchor: String,
    /// Number of record rows. Without it the table runs until its anchor
    /// (or the next table's anchor) shows up again, or the sheet ends, and
    /// the layout must set `lab_id_range` to keep header rows out.
    #[serde(default)]
    pub records: Option<usize>,
    /// Parameter column names, left to right after the two id columns
    pub parameters: Vec<String>,
}

/// Inclusive range of lab ids such as `R62`..`R136`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabIdRange {
    pub prefix: String,
    pub first: u32,
    pub last: u32,
}

impl LabIdRange {
    pub fn contains(&self, lab_id: &str) -> bool {
        lab_id
            .trim()
            .strip_prefix(self.prefix.as_str())
            .and_then(|number| number.parse::<u32>().ok())
            .is_some_and(|number| (self.first..=self.last).contains(&number))
    }
}

/// How sample ids are matched to monitoring events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMatching {
    /// Derives the site name from the sample id
    pub site_name: IdDerivation,
    pub uplands_key: UplandsKey,
}

/// Join key used against the Uplands event table, chosen per layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum UplandsKey {
    /// Derived event name equals `EventName`
    EventName { event: IdDerivation },
    /// Derived site name and date number equal `SiteName` and the formatted
    /// `StartDate`. For sample ids that carry a date segment but not the
    /// event name.
    SiteDate {
        date: IdDerivation,
        #[serde(default = "default_date_format")]
        date_format: String,
    },
}

/// Rule carving a piece out of a ROMN sample id like `ROMO_012_20210815_S1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum IdDerivation {
    /// First `length` characters
    Prefix { length: usize },
    /// First `count` underscore-separated segments, rejoined with `_`
    Segments { count: usize },
    /// The single underscore-separated segment at `index`
    Segment { index: usize },
}

impl IdDerivation {
    pub fn apply(self, sample_id: &str) -> Option<String> {
        let sample_id = sample_id.trim();
        let derived = match self {
            IdDerivation::Prefix { length } => sample_id.chars().take(length).collect(),
            IdDerivation::Segments { count } => sample_id
                .split('_')
                .take(count)
                .collect::<Vec<_>>()
                .join("_"),
            IdDerivation::Segment { index } => sample_id.split('_').nth(index)?.to_string(),
        };
        (!derived.is_empty()).then_some(derived)
    }
}

fn default_first_column() -> usize {
    1
}

fn default_out_name() -> String {
    "Soils_EDD_Preprocessed".to_string()
}

fn default_date_format() -> String {
    "%Y%m%d".to_string()
}

fn default_categorical_prefixes() -> Vec<String> {
    DEFAULT_CATEGORICAL_PREFIXES
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl DeliverableLayout {
    /// Load a layout file. Relative `input_file` and `workspace` paths are
    /// taken relative to the layout file itself.
    pub fn from_file(path: &Path) -> EtlResult<Self> {
        let text = fs::read_to_string(path)?;
        let mut layout = Self::from_yaml(&text)?;
        if let Some(base) = path.parent() {
            layout.resolve_paths(base);
        }
        Ok(layout)
    }

    pub fn from_yaml(text: &str) -> EtlResult<Self> {
        let layout: Self = serde_yml::from_str(text)?;
        layout.validate()?;
        Ok(layout)
    }

    fn resolve_paths(&mut self, base: &Path) {
        if self.input_file.is_relative() {
            self.input_file = base.join(&self.input_file);
        }
        if self.workspace.is_relative() {
            self.workspace = base.join(&self.workspace);
        }
    }

    pub fn validate(&self) -> EtlResult<()> {
        if self.first_column == 0 {
            return Err(EtlError::Config(
                "first_column is 1-based and must be at least 1".to_string(),
            ));
        }
        if self.tables.is_empty() {
            return Err(EtlError::Config("layout defines no tables".to_string()));
        }
        for (index, table) in self.tables.iter().enumerate() {
            if table.anchor.trim().is_empty() {
                return Err(EtlError::Config(format!("table {} has an empty anchor", index + 1)));
            }
            if table.parameters.is_empty() {
                return Err(EtlError::Config(format!(
                    "table {} ('{}') defines no parameters",
                    index + 1,
                    table.anchor
                )));
            }
            if table.records == Some(0) {
                return Err(EtlError::Config(format!(
                    "table {} ('{}') has zero records",
                    index + 1,
                    table.anchor
                )));
            }
            if table.records.is_none() && self.lab_id_range.is_none() {
                return Err(EtlError::Config(format!(
                    "table {} ('{}') needs records or a lab_id_range",
                    index + 1,
                    table.anchor
                )));
            }
        }
        if let Some(range) = &self.lab_id_range {
            if range.first > range.last {
                return Err(EtlError::Config(format!(
                    "lab_id_range {}{} > {}{}",
                    range.prefix, range.first, range.prefix, range.last
                )));
            }
        }
        Ok(())
    }

    /// 0-based column of the lab id
    pub fn lab_id_column(&self) -> usize {
        self.first_column - 1
    }
}
