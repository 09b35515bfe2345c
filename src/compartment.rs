use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compartment {
    Raider,
    Survivalist,
    Civilian,
    Zombie,
    Removed,
}

impl Compartment {
    pub const COUNT: usize = 5;

    pub const ALL: [Compartment; Compartment::COUNT] = [
        Compartment::Raider,
        Compartment::Survivalist,
        Compartment::Civilian,
        Compartment::Zombie,
        Compartment::Removed,
    ];

    /// Compartments that can give birth and be infected.
    pub const LIVING: [Compartment; 3] = [
        Compartment::Raider,
        Compartment::Survivalist,
        Compartment::Civilian,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Compartment::Raider => "Raider",
            Compartment::Survivalist => "Survivalist",
            Compartment::Civilian => "Civilian",
            Compartment::Zombie => "Zombie",
            Compartment::Removed => "Removed",
        }
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Population level per compartment, in units relative to the seed values.
///
/// Serialized as a map keyed by lowercase compartment name. Compartments
/// missing from a deserialized map read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<Compartment, f64>",
    from = "BTreeMap<Compartment, f64>"
)]
pub struct PopulationVector {
    levels: [f64; Compartment::COUNT],
}

impl PopulationVector {
    pub fn new(levels: [f64; Compartment::COUNT]) -> Self {
        Self { levels }
    }

    /// Raider, Survivalist, Civilian and Zombie at 1.0, Removed at 0.0.
    pub fn seed() -> Self {
        Self::new([1.0, 1.0, 1.0, 1.0, 0.0])
    }

    pub fn get(&self, compartment: Compartment) -> f64 {
        self.levels[compartment.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Compartment, f64)> + '_ {
        Compartment::ALL
            .iter()
            .map(move |&compartment| (compartment, self.get(compartment)))
    }

    pub fn total(&self) -> f64 {
        self.levels.iter().sum()
    }

    /// Everything still walking around: all compartments except Removed.
    pub fn living_total(&self) -> f64 {
        self.iter()
            .filter(|(compartment, _)| *compartment != Compartment::Removed)
            .map(|(_, level)| level)
            .sum()
    }

    /// Sum of absolute per-compartment differences against `other`.
    pub fn total_absolute_change(&self, other: &PopulationVector) -> f64 {
        self.levels
            .iter()
            .zip(other.levels.iter())
            .map(|(a, b)| (a - b).abs())
            .sum()
    }

    pub fn is_finite(&self) -> bool {
        self.levels.iter().all(|level| level.is_finite())
    }
}

impl Index<Compartment> for PopulationVector {
    type Output = f64;

    fn index(&self, compartment: Compartment) -> &f64 {
        &self.levels[compartment.index()]
    }
}

impl IndexMut<Compartment> for PopulationVector {
    fn index_mut(&mut self, compartment: Compartment) -> &mut f64 {
        &mut self.levels[compartment.index()]
    }
}

impl From<BTreeMap<Compartment, f64>> for PopulationVector {
    fn from(map: BTreeMap<Compartment, f64>) -> Self {
        let mut vector = PopulationVector::default();
        for (compartment, level) in map {
            vector[compartment] = level;
        }
        vector
    }
}

impl From<PopulationVector> for BTreeMap<Compartment, f64> {
    fn from(vector: PopulationVector) -> Self {
        vector.iter().collect()
    }
}
