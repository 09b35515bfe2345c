use std::ops::ControlFlow;
use std::path::PathBuf;

use outbreak::{
    snapshot::SnapshotWriter, Compartment, RateTable, Scenario, ScenarioLoader, Termination,
};

fn scenario_loader() -> ScenarioLoader {
    ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"))
}

fn scenario_path(name: &str) -> PathBuf {
    PathBuf::from("scenarios").join(format!("{name}.yaml"))
}

#[test]
fn ten_year_fixture_matches_built_in_scenario() {
    let scenario = scenario_loader()
        .load(scenario_path("ten_years"))
        .expect("scenario parses");
    let built_in = Scenario::ten_years();

    assert_eq!(scenario.name, "ten_years");
    assert_eq!(scenario.max_days, Some(3650));
    assert_eq!(scenario.rate_table(), built_in.rate_table());
    assert_eq!(scenario.initial_levels(), built_in.initial_levels());
    assert_eq!(scenario.snapshot.interval_days, 365);
}

#[test]
fn ten_year_run_stops_at_day_limit() {
    let scenario = scenario_loader()
        .load(scenario_path("ten_years"))
        .unwrap();
    let mut engine = scenario.build_engine();
    let summary = engine.run_with_hook(Some(scenario.day_limit(None)), |_, _| {
        ControlFlow::Continue(())
    });

    assert_eq!(summary.steps, 3650);
    assert_eq!(summary.termination, Termination::DayLimit);
    assert_eq!(engine.trajectory().len(), 3651);
    let zombies = engine.trajectory().series(Compartment::Zombie);
    assert!(zombies.last().unwrap() > &zombies[0], "zombies should spread");
}

#[test]
fn open_ended_fixture_has_no_day_limit() {
    let scenario = scenario_loader()
        .load(scenario_path("open_ended"))
        .unwrap();
    assert_eq!(scenario.max_days, None);
    assert_eq!(scenario.rate_table(), RateTable::default());
    assert_eq!(scenario.day_limit(Some(30)), 30);
}

#[test]
fn frozen_fixture_converges_immediately() {
    let scenario = scenario_loader().load(scenario_path("frozen")).unwrap();
    let mut engine = scenario.build_engine();
    assert_eq!(engine.run(None), 1);
}

#[test]
fn civilian_birth_variant_runs_side_by_side() {
    let loader = scenario_loader();
    let survivalist = loader.load(scenario_path("ten_years")).unwrap();
    let civilian = loader.load(scenario_path("civilian_births")).unwrap();

    let mut a = survivalist.build_engine();
    let mut b = civilian.build_engine();
    a.step();
    b.step();

    let (a, b) = (a.current_state(), b.current_state());
    assert_eq!(a[Compartment::Raider], b[Compartment::Raider]);
    assert_eq!(a[Compartment::Survivalist], b[Compartment::Survivalist]);
    let gap = b[Compartment::Civilian] - a[Compartment::Civilian];
    assert!((gap - (0.000016 - 0.000001)).abs() < 1e-12);
}

#[test]
fn missing_scenario_reports_path() {
    let err = scenario_loader()
        .load("scenarios/does_not_exist.yaml")
        .unwrap_err();
    assert!(format!("{err:#}").contains("does_not_exist.yaml"));
}

#[test]
fn engine_emits_day_snapshots() {
    let scenario = scenario_loader()
        .load(scenario_path("ten_years"))
        .unwrap();
    let temp_dir = tempfile::tempdir().unwrap();
    let snapshot_dir = temp_dir.path().join("snaps");
    let writer = SnapshotWriter::new(&snapshot_dir, 10);

    let mut engine = scenario.build_engine();
    let mut written = Vec::new();
    engine.run_with_hook(Some(30), |report, state| {
        if let Some(path) = writer
            .maybe_write(&scenario.name, report.day, state)
            .expect("snapshot written")
        {
            written.push(path);
        }
        ControlFlow::Continue(())
    });

    assert_eq!(written.len(), 3);
    let expected = snapshot_dir.join("ten_years").join("day_000010.json");
    assert!(
        expected.exists(),
        "expected snapshot {} to exist",
        expected.display()
    );
    let data = std::fs::read_to_string(expected).unwrap();
    assert!(
        data.contains("\"scenario\": \"ten_years\""),
        "snapshot should contain scenario metadata"
    );
}
