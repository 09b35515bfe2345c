pub mod compartment;
pub mod config;
pub mod engine;
pub mod model;
pub mod rates;
pub mod scenario;
pub mod snapshot;
pub mod trajectory;

pub use compartment::{Compartment, PopulationVector};
pub use engine::{EngineBuilder, RunSummary, SimulationEngine, StepReport, Termination, EPSILON};
pub use rates::{CivilianBirthSource, RateTable};
pub use scenario::{Scenario, ScenarioError, ScenarioLoader};
pub use trajectory::Trajectory;
