//! JSON export of results and comparisons.
//!
//! Single results are written exactly as the service returned them;
//! comparisons as the ordered algorithm-to-entry mapping.

use crate::runner::SessionReport;
use osched_env::Domain;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

/// `{domain}_{algorithm}_{timestamp}.json`
///
/// Characters other than ASCII alphanumerics, `-` and `_` in the algorithm
/// id become `_`, so the file always lands directly in the export directory.
pub fn export_filename(domain: Domain, algorithm: &str, timestamp_ms: u128) -> String {
    format!(
        "{}_{}_{}.json",
        domain.as_str(),
        file_safe(algorithm),
        timestamp_ms
    )
}

fn file_safe(id: &str) -> String {
    id.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `comparison_{domain}_{timestamp}.json`
pub fn comparison_filename(domain: Domain, timestamp_ms: u128) -> String {
    format!("comparison_{}_{}.json", domain.as_str(), timestamp_ms)
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Writes `value` as pretty JSON to `dir/name`, creating `dir` if needed.
pub fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    name: &str,
    value: &T,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(path)
}

/// Exports a report into `dir` and returns the written path.
pub fn export_report(
    dir: &Path,
    report: &SessionReport,
    timestamp_ms: u128,
) -> io::Result<PathBuf> {
    let path = match report {
        SessionReport::Single { result, .. } => write_json(
            dir,
            &export_filename(result.domain(), result.algorithm(), timestamp_ms),
            result.payload(),
        )?,
        SessionReport::Comparison(result) => write_json(
            dir,
            &comparison_filename(result.domain(), timestamp_ms),
            result,
        )?,
    };
    info!("Exported {} to {}", report.domain().label(), path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ResultView;
    use osched_core::comparison::{ComparisonEntry, ComparisonResult};
    use osched_core::layout::head_movement;
    use osched_env::SimulationResult;
    use serde_json::{json, Value};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "osched-export-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_filenames() {
        assert_eq!(
            export_filename(Domain::Cpu, "RoundRobin", 1_700_000_000_123),
            "cpu_RoundRobin_1700000000123.json"
        );
        assert_eq!(
            comparison_filename(Domain::Page, 42),
            "comparison_page_42.json"
        );
    }

    #[test]
    fn test_filename_strips_path_components() {
        assert_eq!(
            export_filename(Domain::Disk, "C-SCAN", 1),
            "disk_C-SCAN_1.json"
        );
        assert_eq!(
            export_filename(Domain::Disk, "../../etc/x", 1),
            "disk_______etc_x_1.json"
        );
        assert_eq!(
            export_filename(Domain::Cpu, "a\\b", 2),
            "cpu_a_b_2.json"
        );
    }

    #[test]
    fn test_export_stays_in_directory() {
        let payload = json!({"metrics": {"total_seek": 0}, "sequence": [], "trace": []});
        let result = SimulationResult::from_payload(Domain::Disk, "../escape", payload).unwrap();
        let report = SessionReport::Single {
            metrics: vec![],
            view: ResultView::Disk {
                movement: head_movement(0, &[], &[]),
                sequence: vec![],
                inconsistency: None,
            },
            result,
        };

        let dir = scratch_dir("escape");
        let path = export_report(&dir, &report, 3).unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(path.file_name().unwrap(), "disk____escape_3.json");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_single_export_keeps_raw_payload() {
        let payload = json!({
            "success": true,
            "metrics": {"total_seek": 45},
            "sequence": [98],
            "trace": [],
            "visualization": "iVBORw0KGgo="
        });
        let result = SimulationResult::from_payload(Domain::Disk, "FCFS", payload.clone()).unwrap();
        let report = SessionReport::Single {
            metrics: vec![],
            view: ResultView::Disk {
                movement: head_movement(53, &[], &[98]),
                sequence: vec![98],
                inconsistency: None,
            },
            result,
        };

        let dir = scratch_dir("single");
        let path = export_report(&dir, &report, 7).unwrap();
        assert_eq!(path.file_name().unwrap(), "disk_FCFS_7.json");

        let written: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, payload);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_comparison_export() {
        let mut comparison = ComparisonResult::new(Domain::Cpu);
        comparison.push(
            "SJF",
            ComparisonEntry::Metrics([("avg_waiting_time", 3.0)].into_iter().collect()),
        );
        comparison.push(
            "FCFS",
            ComparisonEntry::Failed {
                error: "CPU simulation failed".into(),
            },
        );

        let dir = scratch_dir("comparison");
        let path = export_report(&dir, &SessionReport::Comparison(comparison), 9).unwrap();
        assert_eq!(path.file_name().unwrap(), "comparison_cpu_9.json");

        let text = fs::read_to_string(&path).unwrap();
        // Request order survives
        assert!(text.find("SJF").unwrap() < text.find("FCFS").unwrap());
        let written: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(written["FCFS"], json!({"error": "CPU simulation failed"}));
        fs::remove_dir_all(&dir).unwrap();
    }
}
