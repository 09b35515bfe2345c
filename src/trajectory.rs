use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::compartment::{Compartment, PopulationVector};

/// Day-indexed history of every compartment. Day 0 is the initial condition.
///
/// Only the engine can extend it; everyone else gets a shared reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    series: [Vec<f64>; Compartment::COUNT],
}

impl Trajectory {
    pub(crate) fn new(initial: &PopulationVector) -> Self {
        let mut trajectory = Self {
            series: Default::default(),
        };
        trajectory.push(initial);
        trajectory
    }

    pub(crate) fn push(&mut self, snapshot: &PopulationVector) {
        for (compartment, level) in snapshot.iter() {
            self.series[compartment.index()].push(level);
        }
    }

    /// Number of recorded days, including day 0.
    pub fn len(&self) -> usize {
        self.series[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn series(&self, compartment: Compartment) -> &[f64] {
        &self.series[compartment.index()]
    }

    /// Series drawn on a level-vs-day chart. Removed is left out.
    pub fn plotted(&self) -> impl Iterator<Item = (Compartment, &[f64])> + '_ {
        Compartment::ALL
            .iter()
            .filter(|compartment| **compartment != Compartment::Removed)
            .map(move |&compartment| (compartment, self.series(compartment)))
    }

    pub fn last_day(&self) -> usize {
        self.len().saturating_sub(1)
    }

    /// Composition on `day`. Days past the end read as the last recorded day.
    pub fn day(&self, day: usize) -> PopulationVector {
        let day = day.min(self.last_day());
        let mut snapshot = PopulationVector::default();
        for compartment in Compartment::ALL {
            snapshot[compartment] = self.series(compartment)[day];
        }
        snapshot
    }

    pub fn last(&self) -> PopulationVector {
        self.day(self.last_day())
    }

    /// Fraction of the day's total held by each compartment, for pie charts.
    /// An empty population yields all zeros.
    pub fn share(&self, day: usize) -> PopulationVector {
        let snapshot = self.day(day);
        let total = snapshot.total();
        if total <= 0.0 {
            return PopulationVector::default();
        }
        let mut share = PopulationVector::default();
        for (compartment, level) in snapshot.iter() {
            share[compartment] = level / total;
        }
        share
    }
}

impl Serialize for Trajectory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Compartment::COUNT))?;
        for compartment in Compartment::ALL {
            map.serialize_entry(&compartment, self.series(compartment))?;
        }
        map.end()
    }
}
