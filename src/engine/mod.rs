use std::ops::ControlFlow;

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::{
    compartment::{Compartment, PopulationVector},
    model,
    rates::RateTable,
    trajectory::Trajectory,
};

/// Total absolute day-over-day change below which a run counts as converged.
pub const EPSILON: f64 = 1e-6;

pub const ONE_YEAR_DAYS: u64 = 365;
pub const TEN_YEARS_DAYS: u64 = 10 * ONE_YEAR_DAYS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Converged,
    DayLimit,
    /// A level overflowed to infinity or NaN.
    Diverged,
    /// The step hook asked the run to stop.
    Interrupted,
}

/// Outcome of a single integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    pub day: u64,
    pub total_change: f64,
    /// Negative overshoot dropped when levels were clamped to zero. The
    /// all-compartment total grows by this much on top of births.
    pub clamped: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub termination: Termination,
}

pub struct EngineBuilder {
    rates: RateTable,
    initial: PopulationVector,
    epsilon: f64,
}

impl EngineBuilder {
    pub fn new(rates: RateTable) -> Self {
        Self {
            rates,
            initial: PopulationVector::seed(),
            epsilon: EPSILON,
        }
    }

    pub fn with_initial(mut self, initial: PopulationVector) -> Self {
        self.initial = initial;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn build(self) -> SimulationEngine {
        debug!(
            initial_total = self.initial.total(),
            epsilon = self.epsilon,
            civilian_birth = ?self.rates.civilian_birth_source(),
            "built simulation engine"
        );
        SimulationEngine {
            trajectory: Trajectory::new(&self.initial),
            population: self.initial,
            rates: self.rates,
            epsilon: self.epsilon,
            day: 0,
        }
    }
}

/// Forward-Euler integrator over the five compartments, one step per day.
pub struct SimulationEngine {
    rates: RateTable,
    population: PopulationVector,
    trajectory: Trajectory,
    epsilon: f64,
    day: u64,
}

impl SimulationEngine {
    /// Engine at the seed levels with the default convergence threshold.
    pub fn new(rates: RateTable) -> Self {
        EngineBuilder::new(rates).build()
    }

    /// Advances one day.
    ///
    /// Every delta is computed from the pre-step snapshot before any level
    /// changes. Levels that would go negative are clamped to zero and the
    /// excess is dropped. Non-finite levels are kept as they are.
    pub fn step(&mut self) -> StepReport {
        let previous = self.population;
        let deltas = model::deltas(&self.rates, &previous);

        let mut clamped = 0.0;
        for compartment in Compartment::ALL {
            let next = previous[compartment] + deltas[compartment];
            self.population[compartment] = if next < 0.0 {
                clamped += -next;
                0.0
            } else {
                next
            };
        }

        self.day += 1;
        self.trajectory.push(&self.population);
        let total_change = self.population.total_absolute_change(&previous);

        if clamped > 0.0 {
            warn!(day = self.day, clamped, "clamped negative population levels");
        }
        trace!(day = self.day, total_change, "step complete");

        StepReport {
            day: self.day,
            total_change,
            clamped,
        }
    }

    /// Steps until converged, diverged or `max_steps` steps have been taken
    /// and returns the number of steps. At least one step is always taken.
    /// With `None` this only returns once the dynamics settle below the
    /// convergence threshold or overflow.
    pub fn run(&mut self, max_steps: Option<u64>) -> u64 {
        self.run_with_hook(max_steps, |_, _| ControlFlow::Continue(()))
            .steps
    }

    /// Like [`SimulationEngine::run`], calling `hook` after every step.
    /// Returning `ControlFlow::Break` from the hook ends the run.
    pub fn run_with_hook<F>(&mut self, max_steps: Option<u64>, mut hook: F) -> RunSummary
    where
        F: FnMut(&StepReport, &PopulationVector) -> ControlFlow<()>,
    {
        let mut steps = 0_u64;
        loop {
            let report = self.step();
            steps += 1;

            if hook(&report, &self.population).is_break() {
                return self.finish(steps, Termination::Interrupted);
            }
            if !report.total_change.is_finite() || !self.population.is_finite() {
                return self.finish(steps, Termination::Diverged);
            }
            if report.total_change < self.epsilon {
                return self.finish(steps, Termination::Converged);
            }
            if max_steps.is_some_and(|limit| steps >= limit) {
                return self.finish(steps, Termination::DayLimit);
            }
        }
    }

    fn finish(&self, steps: u64, termination: Termination) -> RunSummary {
        info!(
            steps,
            reason = ?termination,
            day = self.day,
            living = self.population.living_total(),
            "simulation stopped"
        );
        RunSummary { steps, termination }
    }

    pub fn current_state(&self) -> &PopulationVector {
        &self.population
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    /// Days simulated so far.
    pub fn day(&self) -> u64 {
        self.day
    }
}
