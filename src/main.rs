use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use outbreak::{
    snapshot::{run_with_snapshots, write_trajectory, SnapshotWriter},
    Compartment, PopulationVector, Scenario, ScenarioLoader,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Raider/Survivalist/Civilian/Zombie population runner")]
struct Cli {
    /// Scenario YAML file (built-in ten-year scenario when omitted)
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Override the day limit
    #[arg(long, conflicts_with = "open_ended")]
    days: Option<u64>,

    /// Run until convergence with no day limit
    #[arg(long)]
    open_ended: bool,

    /// Override snapshot interval in days
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for day snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Write the full trajectory as JSON to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the composition of one day (last day when out of range)
    #[arg(long)]
    day: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let scenario = match &cli.scenario {
        Some(path) => ScenarioLoader::new(".").load(path)?,
        None => Scenario::ten_years(),
    };
    init_tracing(&scenario.logging.level);

    let max_steps = if cli.open_ended {
        warn!("running without a day limit; this only stops once the populations converge");
        None
    } else {
        Some(scenario.day_limit(cli.days))
    };

    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot.interval_days);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from(&scenario.snapshot.output_dir));
    let writer = SnapshotWriter::new(snapshot_dir, snapshot_interval);

    info!(scenario = %scenario.name, ?max_steps, "starting simulation");
    let mut engine = scenario.build_engine();
    let summary = run_with_snapshots(&mut engine, &scenario.name, &writer, max_steps)?;

    println!(
        "Scenario '{}' stopped after {} days ({:?})",
        scenario.name, summary.steps, summary.termination
    );
    print_levels("Final populations", engine.current_state());

    if let Some(day) = cli.day {
        let trajectory = engine.trajectory();
        let shown = day.min(trajectory.last_day());
        print_levels(&format!("Day {shown}"), &trajectory.day(day));
    }

    if let Some(path) = &cli.export {
        write_trajectory(path, &scenario.name, summary, engine.trajectory())?;
        info!(path = %path.display(), "exported trajectory");
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_levels(title: &str, levels: &PopulationVector) {
    println!("{title}:");
    for compartment in Compartment::ALL {
        println!("  {:<12} {:.6}", compartment.label(), levels[compartment]);
    }
    println!(
        "  total {:.6} (living {:.6})",
        levels.total(),
        levels.living_total()
    );
}
