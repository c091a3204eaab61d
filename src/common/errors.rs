use sea_orm::DbErr;
use thiserror::Error;

use crate::services::metadata::UnresolvedSample;

/// Errors raised while importing a deliverable.
///
/// `UnresolvedEvents` and `UnresolvedCrosswalk` are validation failures and are
/// always returned before the master dataset is touched.
#[derive(Debug, Error)]
pub enum EtlError {
    /// The sheet does not look like the configured layout
    #[error("layout mismatch: {0}")]
    LayoutMismatch(String),

    #[error(
        "{} sample(s) with undefined events: {}",
        .0.len(),
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    UnresolvedEvents(Vec<UnresolvedSample>),

    #[error(
        "{} parameter(s) undefined in 'tlu_NameUnitCrossWalk': {}",
        .0.len(),
        .0.join(", ")
    )]
    UnresolvedCrosswalk(Vec<String>),

    #[error("failed to append event '{event_name}' parameter '{parameter}' for table {table}")]
    AppendFailure {
        event_name: String,
        parameter: String,
        table: usize,
        #[source]
        source: DbErr,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("workbook error")]
    Workbook(#[from] calamine::Error),

    #[error("database error")]
    Database(#[from] DbErr),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("layout file error")]
    Yaml(#[from] serde_yml::Error),

    #[error("CSV export error")]
    Csv(#[from] csv::Error),
}

/// Result type alias for import operations
pub type EtlResult<T> = Result<T, EtlError>;

impl EtlError {
    /// Validation failures are the ones a data manager fixes in the lookup
    /// tables before re-running; everything else is an operational failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EtlError::UnresolvedEvents(_) | EtlError::UnresolvedCrosswalk(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metadata::UnresolvedReason;

    #[test]
    fn test_unresolved_crosswalk_lists_every_parameter() {
        let err = EtlError::UnresolvedCrosswalk(vec!["B".to_string(), "TC (%)".to_string()]);
        let message = err.to_string();
        assert!(message.starts_with("2 parameter(s)"));
        assert!(message.contains("B, TC (%)"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_unresolved_events_message() {
        let err = EtlError::UnresolvedEvents(vec![UnresolvedSample {
            lab_id: "R99".to_string(),
            sample_id: "ZZZZ_9999".to_string(),
            reason: UnresolvedReason::NoMatch,
        }]);
        let message = err.to_string();
        assert!(message.contains("1 sample(s)"));
        assert!(message.contains("R99"));
        assert!(message.contains("ZZZZ_9999"));
    }

    #[test]
    fn test_wrapped_errors_print_their_cause_once() {
        let err = EtlError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "edd.xlsx is missing",
        ));
        assert_eq!(err.to_string(), "I/O error");

        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain, "I/O error: edd.xlsx is missing");

        let err = EtlError::AppendFailure {
            event_name: "SITE01_2021_0815".to_string(),
            parameter: "pH".to_string(),
            table: 1,
            source: DbErr::Custom("constraint failed".to_string()),
        };
        let chain = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(chain.matches("constraint failed").count(), 1);
    }

    #[test]
    fn test_layout_mismatch_is_not_validation() {
        let err = EtlError::LayoutMismatch("anchor 'R62' not found".to_string());
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "layout mismatch: anchor 'R62' not found");
    }
}
