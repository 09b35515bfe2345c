use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::compartment::Compartment;

/// Which birth constant drives Civilian births.
///
/// The model has always used the Survivalist constant for Civilians. The
/// `Civilian` variant runs the same model with the Civilian constant instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CivilianBirthSource {
    #[default]
    Survivalist,
    Civilian,
}

/// Exchange pairs the model reads. Any other ordered pair is undefined.
pub const EXCHANGE_PAIRS: [(Compartment, Compartment); 4] = [
    (Compartment::Raider, Compartment::Survivalist),
    (Compartment::Survivalist, Compartment::Raider),
    (Compartment::Survivalist, Compartment::Civilian),
    (Compartment::Civilian, Compartment::Survivalist),
];

pub fn birth_defined(compartment: Compartment) -> bool {
    Compartment::LIVING.contains(&compartment)
}

pub fn death_defined(compartment: Compartment) -> bool {
    compartment != Compartment::Removed
}

pub fn zombie_defined(compartment: Compartment) -> bool {
    Compartment::LIVING.contains(&compartment)
}

pub fn exchange_defined(src: Compartment, dst: Compartment) -> bool {
    EXCHANGE_PAIRS.contains(&(src, dst))
}

/// Immutable per-run rate constants.
///
/// Lookups return `None` for transitions that do not exist. Callers treat
/// `None` as zero flow; [`RateTable::flow`] does that for them.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    birth: HashMap<Compartment, f64>,
    death: HashMap<Compartment, f64>,
    zombie: HashMap<Compartment, f64>,
    exchange: HashMap<(Compartment, Compartment), f64>,
    civilian_birth: CivilianBirthSource,
}

impl RateTable {
    pub fn builder() -> RateTableBuilder {
        RateTableBuilder::default()
    }

    /// Table with every defined transition present and set to zero.
    pub fn zeroed() -> Self {
        let mut builder = Self::builder();
        for compartment in Compartment::ALL {
            if birth_defined(compartment) {
                builder = builder.birth(compartment, 0.0);
            }
            if death_defined(compartment) {
                builder = builder.death(compartment, 0.0);
            }
            if zombie_defined(compartment) {
                builder = builder.zombie(compartment, 0.0);
            }
        }
        for (src, dst) in EXCHANGE_PAIRS {
            builder = builder.exchange(src, dst, 0.0);
        }
        builder.build()
    }

    pub fn birth_rate(&self, compartment: Compartment) -> Option<f64> {
        self.birth.get(&compartment).copied()
    }

    pub fn death_rate(&self, compartment: Compartment) -> Option<f64> {
        self.death.get(&compartment).copied()
    }

    pub fn zombie_rate(&self, compartment: Compartment) -> Option<f64> {
        self.zombie.get(&compartment).copied()
    }

    pub fn exchange_rate(&self, src: Compartment, dst: Compartment) -> Option<f64> {
        self.exchange.get(&(src, dst)).copied()
    }

    pub fn civilian_birth_source(&self) -> CivilianBirthSource {
        self.civilian_birth
    }

    pub fn with_civilian_birth(mut self, source: CivilianBirthSource) -> Self {
        self.civilian_birth = source;
        self
    }

    /// Birth constant applied to the Civilian level.
    pub fn civilian_birth_rate(&self) -> Option<f64> {
        match self.civilian_birth {
            CivilianBirthSource::Survivalist => self.birth_rate(Compartment::Survivalist),
            CivilianBirthSource::Civilian => self.birth_rate(Compartment::Civilian),
        }
    }

    /// Collapses an undefined rate to zero flow.
    pub fn flow(rate: Option<f64>) -> f64 {
        rate.unwrap_or(0.0)
    }
}

impl Default for RateTable {
    fn default() -> Self {
        use Compartment::*;

        Self::builder()
            .birth(Raider, 0.000004)
            .birth(Survivalist, 0.000001)
            .birth(Civilian, 0.000016)
            .death(Raider, 0.0001)
            .death(Survivalist, 0.0003)
            .death(Civilian, 0.00006)
            .death(Zombie, 0.00003)
            .zombie(Raider, 0.0002)
            .zombie(Survivalist, 0.0004)
            .zombie(Civilian, 0.00003)
            .exchange(Raider, Survivalist, 0.0)
            .exchange(Survivalist, Raider, 0.0008)
            .exchange(Survivalist, Civilian, 0.0)
            .exchange(Civilian, Survivalist, 0.0003)
            .build()
    }
}

/// Populates a [`RateTable`] once at configuration time.
///
/// The builder does not validate; scenario loading rejects undefined or
/// negative entries before it gets here.
#[derive(Debug, Default)]
pub struct RateTableBuilder {
    birth: HashMap<Compartment, f64>,
    death: HashMap<Compartment, f64>,
    zombie: HashMap<Compartment, f64>,
    exchange: HashMap<(Compartment, Compartment), f64>,
    civilian_birth: CivilianBirthSource,
}

impl RateTableBuilder {
    pub fn birth(mut self, compartment: Compartment, rate: f64) -> Self {
        self.birth.insert(compartment, rate);
        self
    }

    pub fn death(mut self, compartment: Compartment, rate: f64) -> Self {
        self.death.insert(compartment, rate);
        self
    }

    pub fn zombie(mut self, compartment: Compartment, rate: f64) -> Self {
        self.zombie.insert(compartment, rate);
        self
    }

    pub fn exchange(mut self, src: Compartment, dst: Compartment, rate: f64) -> Self {
        self.exchange.insert((src, dst), rate);
        self
    }

    pub fn civilian_birth(mut self, source: CivilianBirthSource) -> Self {
        self.civilian_birth = source;
        self
    }

    pub fn build(self) -> RateTable {
        RateTable {
            birth: self.birth,
            death: self.death,
            zombie: self.zombie,
            exchange: self.exchange,
            civilian_birth: self.civilian_birth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Compartment::*;

    #[test]
    fn default_table_leaves_undefined_transitions_absent() {
        let rates = RateTable::default();
        assert_eq!(rates.birth_rate(Zombie), None);
        assert_eq!(rates.birth_rate(Removed), None);
        assert_eq!(rates.death_rate(Removed), None);
        assert_eq!(rates.zombie_rate(Zombie), None);
        assert_eq!(rates.zombie_rate(Removed), None);
        assert_eq!(rates.exchange_rate(Raider, Civilian), None);
        assert_eq!(rates.exchange_rate(Zombie, Raider), None);
    }

    #[test]
    fn exchange_is_directional() {
        let rates = RateTable::default();
        assert_eq!(rates.exchange_rate(Survivalist, Raider), Some(0.0008));
        assert_eq!(rates.exchange_rate(Raider, Survivalist), Some(0.0));
        assert_eq!(rates.exchange_rate(Civilian, Survivalist), Some(0.0003));
        assert_eq!(rates.exchange_rate(Survivalist, Civilian), Some(0.0));
    }

    #[test]
    fn civilian_births_follow_selected_source() {
        let rates = RateTable::default();
        assert_eq!(rates.civilian_birth_source(), CivilianBirthSource::Survivalist);
        assert_eq!(rates.civilian_birth_rate(), Some(0.000001));

        let corrected = RateTable::builder()
            .birth(Survivalist, 0.000001)
            .birth(Civilian, 0.000016)
            .civilian_birth(CivilianBirthSource::Civilian)
            .build();
        assert_eq!(corrected.civilian_birth_rate(), Some(0.000016));
    }

    #[test]
    fn zeroed_table_defines_every_transition() {
        let rates = RateTable::zeroed();
        for compartment in Compartment::LIVING {
            assert_eq!(rates.birth_rate(compartment), Some(0.0));
            assert_eq!(rates.zombie_rate(compartment), Some(0.0));
        }
        assert_eq!(rates.death_rate(Zombie), Some(0.0));
        for (src, dst) in EXCHANGE_PAIRS {
            assert_eq!(rates.exchange_rate(src, dst), Some(0.0));
        }
        assert_eq!(RateTable::flow(rates.death_rate(Removed)), 0.0);
    }
}
