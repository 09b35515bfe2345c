//! JSON dumps of simulation state: periodic per-day compositions and the
//! full trajectory export.

use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::compartment::PopulationVector;
use crate::engine::{RunSummary, SimulationEngine};
use crate::trajectory::Trajectory;

#[derive(Debug, Serialize)]
pub struct DaySnapshot<'a> {
    pub scenario: &'a str,
    pub day: u64,
    pub total: f64,
    pub composition: PopulationVector,
}

#[derive(Debug, Serialize)]
pub struct TrajectoryExport<'a> {
    pub scenario: &'a str,
    pub written_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub final_state: PopulationVector,
    pub trajectory: &'a Trajectory,
}

pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval_days: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval_days: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval_days,
        }
    }

    pub fn should_write(&self, day: u64) -> bool {
        self.interval_days > 0 && day > 0 && day % self.interval_days == 0
    }

    /// Writes `<output_dir>/<scenario>/day_NNNNNN.json` when `day` falls on
    /// the interval.
    pub fn maybe_write(
        &self,
        scenario: &str,
        day: u64,
        state: &PopulationVector,
    ) -> Result<Option<PathBuf>> {
        if !self.should_write(day) {
            return Ok(None);
        }

        let dir = self.output_dir.join(scenario);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let path = dir.join(format!("day_{day:06}.json"));
        let snapshot = DaySnapshot {
            scenario,
            day,
            total: state.total(),
            composition: *state,
        };
        write_json(&path, &snapshot)?;
        debug!(day, path = %path.display(), "wrote day snapshot");
        Ok(Some(path))
    }
}

/// Runs `engine`, writing interval snapshots as it goes. The first failed
/// write interrupts the run and is returned.
pub fn run_with_snapshots(
    engine: &mut SimulationEngine,
    scenario: &str,
    writer: &SnapshotWriter,
    max_steps: Option<u64>,
) -> Result<RunSummary> {
    let mut failure = None;
    let summary = engine.run_with_hook(max_steps, |report, state| {
        match writer.maybe_write(scenario, report.day, state) {
            Ok(_) => ControlFlow::Continue(()),
            Err(err) => {
                warn!(day = report.day, error = %err, "snapshot failed; stopping run");
                failure = Some(err);
                ControlFlow::Break(())
            }
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(summary),
    }
}

pub fn write_trajectory(
    path: impl AsRef<Path>,
    scenario: &str,
    summary: RunSummary,
    trajectory: &Trajectory,
) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create export dir {}", parent.display()))?;
    }
    let export = TrajectoryExport {
        scenario,
        written_at: Utc::now(),
        summary,
        final_state: trajectory.last(),
        trajectory,
    };
    write_json(path, &export)
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize snapshot")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Termination;
    use crate::rates::RateTable;

    #[test]
    fn writes_only_on_interval_days() {
        let writer = SnapshotWriter::new("unused", 30);
        assert!(!writer.should_write(0));
        assert!(!writer.should_write(29));
        assert!(writer.should_write(30));
        assert!(!writer.should_write(31));
        assert!(writer.should_write(60));

        let disabled = SnapshotWriter::new("unused", 0);
        assert!(!disabled.should_write(30));
    }

    #[test]
    fn day_snapshot_lands_under_scenario_dir() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 10);
        let state = PopulationVector::seed();

        assert!(writer.maybe_write("seeded", 9, &state).unwrap().is_none());
        let path = writer
            .maybe_write("seeded", 10, &state)
            .unwrap()
            .expect("day 10 is on the interval");
        assert_eq!(path, temp.path().join("seeded").join("day_000010.json"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["day"], 10);
        assert_eq!(json["composition"]["zombie"], 1.0);
        assert_eq!(json["total"], 4.0);
    }

    #[test]
    fn trajectory_export_contains_every_day() {
        let temp = tempfile::tempdir().unwrap();
        let mut engine = SimulationEngine::new(RateTable::default());
        let summary = engine.run_with_hook(Some(3), |_, _| ControlFlow::Continue(()));
        let path = temp.path().join("out").join("trajectory.json");

        write_trajectory(&path, "seeded", summary, engine.trajectory()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["summary"]["steps"], 3);
        assert_eq!(json["summary"]["termination"], "day_limit");
        assert_eq!(json["trajectory"]["raider"].as_array().unwrap().len(), 4);
        assert!(json["written_at"].is_string());
    }

    #[test]
    fn run_with_snapshots_writes_every_interval() {
        let temp = tempfile::tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 5);
        let mut engine = SimulationEngine::new(RateTable::default());

        let summary = run_with_snapshots(&mut engine, "seeded", &writer, Some(12)).unwrap();

        assert_eq!(summary.steps, 12);
        assert_eq!(summary.termination, Termination::DayLimit);
        assert!(temp.path().join("seeded").join("day_000005.json").exists());
        assert!(temp.path().join("seeded").join("day_000010.json").exists());
    }

    #[test]
    fn failed_snapshot_stops_the_run() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let writer = SnapshotWriter::new(&blocker, 5);
        let mut engine = SimulationEngine::new(RateTable::default());

        let err = run_with_snapshots(&mut engine, "seeded", &writer, Some(1000)).unwrap_err();

        assert!(err.to_string().contains("Failed to create snapshot dir"));
        assert_eq!(engine.day(), 5);
        assert_eq!(engine.trajectory().len(), 6);
    }
}
