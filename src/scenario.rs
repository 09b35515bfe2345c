use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    compartment::{Compartment, PopulationVector},
    config::{LoggingConfig, SnapshotConfig},
    engine::{EngineBuilder, SimulationEngine, EPSILON, TEN_YEARS_DAYS},
    rates::{self, CivilianBirthSource, RateTable},
};

fn default_epsilon() -> f64 {
    EPSILON
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    Birth,
    Death,
    Zombie,
    Exchange,
}

impl std::fmt::Display for RateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RateKind::Birth => "birth",
            RateKind::Death => "death",
            RateKind::Zombie => "zombie",
            RateKind::Exchange => "exchange",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ScenarioError {
    #[error("{kind} rate for {target} must be non-negative, got {value}")]
    NegativeRate {
        kind: RateKind,
        target: String,
        value: f64,
    },
    #[error("{kind} rate is not defined for {target}")]
    UndefinedRate { kind: RateKind, target: String },
    #[error("initial level for {compartment} must be non-negative, got {value}")]
    NegativeLevel { compartment: Compartment, value: f64 },
    #[error("{field} must be finite")]
    NonFiniteValue { field: String },
    #[error("epsilon must be positive, got {0}")]
    InvalidEpsilon(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub from: Compartment,
    pub to: Compartment,
    pub rate: f64,
}

/// Rate sections of a scenario. A missing section keeps the default table's
/// entries for that kind of transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    #[serde(default)]
    pub birth: Option<BTreeMap<Compartment, f64>>,
    #[serde(default)]
    pub death: Option<BTreeMap<Compartment, f64>>,
    #[serde(default)]
    pub zombie: Option<BTreeMap<Compartment, f64>>,
    #[serde(default)]
    pub exchange: Option<Vec<ExchangeRate>>,
    #[serde(default)]
    pub civilian_birth: CivilianBirthSource,
}

impl RateConfig {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        type Section<'a> = (
            RateKind,
            &'a Option<BTreeMap<Compartment, f64>>,
            fn(Compartment) -> bool,
        );

        let sections: [Section<'_>; 3] = [
            (RateKind::Birth, &self.birth, rates::birth_defined),
            (RateKind::Death, &self.death, rates::death_defined),
            (RateKind::Zombie, &self.zombie, rates::zombie_defined),
        ];
        for (kind, section, defined) in sections {
            for (&compartment, &value) in section.iter().flatten() {
                if !defined(compartment) {
                    return Err(ScenarioError::UndefinedRate {
                        kind,
                        target: compartment.to_string(),
                    });
                }
                check_rate(kind, compartment.to_string(), value)?;
            }
        }

        for entry in self.exchange.iter().flatten() {
            let target = format!("{} -> {}", entry.from, entry.to);
            if !rates::exchange_defined(entry.from, entry.to) {
                return Err(ScenarioError::UndefinedRate {
                    kind: RateKind::Exchange,
                    target,
                });
            }
            check_rate(RateKind::Exchange, target, entry.rate)?;
        }
        Ok(())
    }

    /// Overlays configured sections on the default table.
    pub fn build(&self) -> RateTable {
        let defaults = RateTable::default();
        let mut builder = RateTable::builder().civilian_birth(self.civilian_birth);

        for compartment in Compartment::ALL {
            let birth = section_rate(&self.birth, compartment, defaults.birth_rate(compartment));
            if let Some(rate) = birth {
                builder = builder.birth(compartment, rate);
            }
            let death = section_rate(&self.death, compartment, defaults.death_rate(compartment));
            if let Some(rate) = death {
                builder = builder.death(compartment, rate);
            }
            let zombie =
                section_rate(&self.zombie, compartment, defaults.zombie_rate(compartment));
            if let Some(rate) = zombie {
                builder = builder.zombie(compartment, rate);
            }
        }

        match &self.exchange {
            Some(entries) => {
                for entry in entries {
                    builder = builder.exchange(entry.from, entry.to, entry.rate);
                }
            }
            None => {
                for (src, dst) in rates::EXCHANGE_PAIRS {
                    if let Some(rate) = defaults.exchange_rate(src, dst) {
                        builder = builder.exchange(src, dst, rate);
                    }
                }
            }
        }

        builder.build()
    }
}

fn section_rate(
    section: &Option<BTreeMap<Compartment, f64>>,
    compartment: Compartment,
    default: Option<f64>,
) -> Option<f64> {
    match section {
        Some(map) => map.get(&compartment).copied(),
        None => default,
    }
}

fn check_rate(kind: RateKind, target: String, value: f64) -> Result<(), ScenarioError> {
    if !value.is_finite() {
        return Err(ScenarioError::NonFiniteValue {
            field: format!("{kind} rate for {target}"),
        });
    }
    if value < 0.0 {
        return Err(ScenarioError::NegativeRate {
            kind,
            target,
            value,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `None` asks for open-ended convergence mode.
    #[serde(default)]
    pub max_days: Option<u64>,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default)]
    pub initial: Option<BTreeMap<Compartment, f64>>,
    #[serde(default)]
    pub rates: RateConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Scenario {
    /// Default table, seed levels, ten simulated years.
    pub fn ten_years() -> Self {
        Self {
            name: "ten_years".to_string(),
            description: Some("Default rates from the seed population for ten years".into()),
            max_days: Some(TEN_YEARS_DAYS),
            epsilon: EPSILON,
            initial: None,
            rates: RateConfig::default(),
            snapshot: SnapshotConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let scenario: Scenario =
            serde_yaml::from_str(text).context("Failed to parse scenario YAML")?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !self.epsilon.is_finite() {
            return Err(ScenarioError::NonFiniteValue {
                field: "epsilon".into(),
            });
        }
        if self.epsilon <= 0.0 {
            return Err(ScenarioError::InvalidEpsilon(self.epsilon));
        }
        for (&compartment, &value) in self.initial.iter().flatten() {
            if !value.is_finite() {
                return Err(ScenarioError::NonFiniteValue {
                    field: format!("initial level for {compartment}"),
                });
            }
            if value < 0.0 {
                return Err(ScenarioError::NegativeLevel { compartment, value });
            }
        }
        self.rates.validate()
    }

    /// Seed levels with any configured compartments replaced.
    pub fn initial_levels(&self) -> PopulationVector {
        let mut levels = PopulationVector::seed();
        for (&compartment, &value) in self.initial.iter().flatten() {
            levels[compartment] = value;
        }
        levels
    }

    pub fn rate_table(&self) -> RateTable {
        self.rates.build()
    }

    pub fn build_engine(&self) -> SimulationEngine {
        EngineBuilder::new(self.rate_table())
            .with_initial(self.initial_levels())
            .with_epsilon(self.epsilon)
            .build()
    }

    /// Day limit for a run: the override, then the scenario's own limit,
    /// then ten years.
    pub fn day_limit(&self, override_days: Option<u64>) -> u64 {
        override_days.or(self.max_days).unwrap_or(TEN_YEARS_DAYS)
    }
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .validate()
            .with_context(|| format!("Invalid scenario {}", path.display()))?;
        Ok(scenario)
    }
}
