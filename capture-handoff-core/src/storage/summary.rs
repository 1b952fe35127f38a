use std::fs;
use std::path::Path;

use crate::models::error::StorageError;
use crate::models::run_summary::RunSummary;

/// Write a run summary as pretty JSON. Creates parent directories.
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StorageError::Write {
            path: parent.display().to_string(),
            reason: e.to_string(),
        })?;
    }
    let json = serde_json::to_string_pretty(summary).map_err(|e| StorageError::Serialize(e.to_string()))?;
    fs::write(path, json).map_err(|e| StorageError::Write {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Read a run summary written by `write_summary`.
pub fn read_summary(path: &Path) -> Result<RunSummary, StorageError> {
    let json = fs::read_to_string(path).map_err(|e| StorageError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&json).map_err(|e| StorageError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::models::statistics::{CaptureStatistics, QueueCounters, StatisticsSnapshot};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("capture_handoff_test_{}", name))
    }

    #[test]
    fn summary_survives_disk() {
        let path = temp_path("summary/run.json");
        let snapshot = StatisticsSnapshot::new(
            CaptureStatistics {
                received: 12,
                dropped: 2,
                if_dropped: 0,
            },
            QueueCounters {
                appended: 10,
                processed: 9,
                failed: 1,
                swaps: 3,
                ..Default::default()
            },
        );
        let summary = RunSummary::new("synth0", Utc::now(), 2.5, 9, 1, 0, snapshot);

        write_summary(&summary, &path).unwrap();
        let loaded = read_summary(&path).unwrap();

        assert_eq!(loaded, summary);
        fs::remove_file(&path).ok();
    }

    #[test]
    fn garbage_is_a_read_error() {
        let path = temp_path("garbage.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(read_summary(&path), Err(StorageError::Read { .. })));
        fs::remove_file(&path).ok();
    }
}
