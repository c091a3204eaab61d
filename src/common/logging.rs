//! Run workspace and log file handling.
//!
//! Every run appends to a plain-text log file under the deliverable's
//! workspace directory, next to whatever the console shows.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*};

use crate::layout::DeliverableLayout;

/// Log file for a run started on `today`, e.g.
/// `workspace/Soils_CSU_FieldSeason_2021_20250901_logfile.txt`
pub fn run_log_path(layout: &DeliverableLayout, today: NaiveDate) -> PathBuf {
    layout.workspace.join(format!(
        "{}_{}_logfile.txt",
        layout.out_name,
        today.format("%Y%m%d")
    ))
}

/// Create the workspace directory and the (empty) log file if absent.
pub fn prepare_workspace(layout: &DeliverableLayout, today: NaiveDate) -> Result<PathBuf> {
    fs::create_dir_all(&layout.workspace).with_context(|| {
        format!(
            "Failed to create workspace {}",
            layout.workspace.display()
        )
    })?;

    let log_path = run_log_path(layout, today);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    Ok(log_path)
}

/// Prepare the workspace and install logging for a run. When the workspace
/// cannot be created, console logging is still installed before the error
/// is returned so the top-level handler has somewhere to report it.
pub fn init_run_logging(layout: &DeliverableLayout, today: NaiveDate) -> Result<PathBuf> {
    init_run_logging_with(layout, today, init_tracing)
}

fn init_run_logging_with(
    layout: &DeliverableLayout,
    today: NaiveDate,
    install: impl FnOnce(Option<&Path>) -> Result<()>,
) -> Result<PathBuf> {
    match prepare_workspace(layout, today) {
        Ok(log_path) => {
            install(Some(&log_path))?;
            Ok(log_path)
        }
        Err(e) => {
            install(None)?;
            Err(e)
        }
    }
}

/// Install the global subscriber: console output plus, when given, a
/// non-ANSI copy appended to `log_file`.
pub fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::sample_layout;

    #[test]
    fn test_run_log_path_uses_out_name_and_date() {
        let mut layout = sample_layout();
        layout.workspace = PathBuf::from("/tmp/soils");
        layout.out_name = "Soils_CSU_FieldSeason_2021".to_string();
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

        assert_eq!(
            run_log_path(&layout, today),
            PathBuf::from("/tmp/soils/Soils_CSU_FieldSeason_2021_20250901_logfile.txt")
        );
    }

    #[test]
    fn test_prepare_workspace_creates_directory_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut layout = sample_layout();
        layout.workspace = dir.path().join("nested").join("workspace");
        let today = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();

        let log_path = prepare_workspace(&layout, today).unwrap();

        assert!(layout.workspace.is_dir());
        assert!(log_path.is_file());

        // A second run on the same day reuses the file
        fs::write(&log_path, "earlier run\n").unwrap();
        let again = prepare_workspace(&layout, today).unwrap();
        assert_eq!(again, log_path);
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "earlier run\n");
    }

    #[test]
    fn test_blocked_workspace_still_installs_console_logging() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let mut layout = sample_layout();
        layout.workspace = blocker.join("ws");
        let today = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();

        let mut installed = Vec::new();
        let err = init_run_logging_with(&layout, today, |log_file| {
            installed.push(log_file.map(Path::to_path_buf));
            Ok(())
        })
        .unwrap_err();

        assert_eq!(installed, vec![None]);
        assert!(format!("{err:#}").contains("Failed to create workspace"));
    }

    #[test]
    fn test_run_logging_writes_to_the_run_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut layout = sample_layout();
        layout.workspace = dir.path().join("ws");
        let today = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();

        let mut installed = Vec::new();
        let log_path = init_run_logging_with(&layout, today, |log_file| {
            installed.push(log_file.map(Path::to_path_buf));
            Ok(())
        })
        .unwrap();

        assert_eq!(installed, vec![Some(log_path.clone())]);
        assert!(log_path.is_file());
    }
}
