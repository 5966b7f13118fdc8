use std::error::Error;
use std::path::{Path, PathBuf};
use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::core::rollout::{EpisodeSummary, RolloutReport, StepRecord};
use crate::utils::logging::{self, FileIOType, OperationCategory};

/// Writes rollout results into a timestamped run directory.
pub struct CsvExporter {
    output_dir: PathBuf,
    timestamp: String,
}

impl CsvExporter {
    /// Creates `<output_dir>/<YYYYmmdd_HHMMSS>` if it doesn't exist.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let full_path = output_dir.as_ref().join(&timestamp);
        std::fs::create_dir_all(&full_path)?;

        Ok(Self {
            output_dir: full_path,
            timestamp,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn export_rollouts(&self, report: &RolloutReport) -> Result<(), Box<dyn Error>> {
        let _timing = logging::start_timing(
            "CsvExporter::export_rollouts",
            OperationCategory::FileIO { subcategory: FileIOType::ResultsSave },
        );

        self.export_steps(&report.records)?;
        self.export_summaries(&report.summaries)?;

        info!(dir = %self.output_dir.display(), episodes = report.summaries.len(), "rollouts exported");
        Ok(())
    }

    pub fn export_steps(&self, records: &[StepRecord]) -> Result<PathBuf, Box<dyn Error>> {
        self.write_rows("steps.csv", records)
    }

    pub fn export_summaries(&self, summaries: &[EpisodeSummary]) -> Result<PathBuf, Box<dyn Error>> {
        self.write_rows("episodes.csv", summaries)
    }

    fn write_rows<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<PathBuf, Box<dyn Error>> {
        let path = self.output_dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(step: usize) -> StepRecord {
        StepRecord {
            episode: 0,
            step,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, step as u32, 0, 0).unwrap(),
            action: "DoNothing".to_string(),
            reward: -1.0,
            cumulative_reward: -(step as f64),
            terminated: step == 2,
            elements_in_outage: 0,
            elements_in_maintenance: 1,
        }
    }

    #[test]
    fn test_exports_steps_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        assert!(exporter.output_dir().starts_with(dir.path()));

        let path = exporter.export_steps(&[record(1), record(2)]).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("episode,step,timestamp,action,reward"));
        assert!(lines[2].contains("DoNothing"));
        assert!(lines[2].contains("true"));
    }

    #[test]
    fn test_exports_full_report() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = CsvExporter::new(dir.path()).unwrap();
        let report = RolloutReport {
            summaries: vec![EpisodeSummary {
                episode: 0,
                agent: "do-nothing".to_string(),
                steps: 2,
                cumulative_reward: -2.0,
                terminated: true,
                outage_steps: 0,
                maintenance_steps: 2,
            }],
            records: vec![record(1), record(2)],
        };
        exporter.export_rollouts(&report).unwrap();
        assert!(exporter.output_dir().join("steps.csv").exists());
        let summaries = std::fs::read_to_string(exporter.output_dir().join("episodes.csv")).unwrap();
        assert!(summaries.contains("do-nothing"));
    }
}
