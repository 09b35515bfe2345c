//! Per-compartment flow computation.
//!
//! Every function here reads a frozen [`PopulationVector`] and never writes
//! to it, so the order in which compartments are evaluated cannot change the
//! result.

use crate::compartment::{Compartment, PopulationVector};
use crate::rates::RateTable;

/// Net per-day delta for every compartment, indexed like [`PopulationVector`].
pub type Deltas = PopulationVector;

/// Net per-day change of one compartment given the current snapshot.
pub fn delta(compartment: Compartment, rates: &RateTable, snapshot: &PopulationVector) -> f64 {
    use Compartment::*;

    let r = snapshot[Raider];
    let s = snapshot[Survivalist];
    let c = snapshot[Civilian];
    let z = snapshot[Zombie];

    let birth = |k| RateTable::flow(rates.birth_rate(k));
    let death = |k| RateTable::flow(rates.death_rate(k));
    let zombie = |k| RateTable::flow(rates.zombie_rate(k));
    let exchange = |src, dst| RateTable::flow(rates.exchange_rate(src, dst));

    match compartment {
        Raider => {
            birth(Raider) * r + exchange(Survivalist, Raider) * r * s
                - exchange(Raider, Survivalist) * r * s
                - zombie(Raider) * r * z
                - death(Raider) * r
        }
        Survivalist => {
            birth(Survivalist) * s
                + exchange(Raider, Survivalist) * s * r
                + exchange(Civilian, Survivalist) * s * c
                - exchange(Survivalist, Raider) * s * r
                - exchange(Survivalist, Civilian) * s * c
                - zombie(Survivalist) * s * z
                - death(Survivalist) * s
        }
        Civilian => {
            RateTable::flow(rates.civilian_birth_rate()) * c
                + exchange(Survivalist, Civilian) * c * s
                - exchange(Civilian, Survivalist) * c * s
                - zombie(Civilian) * c * z
                - death(Civilian) * c
        }
        Zombie => {
            zombie(Raider) * z * r + zombie(Survivalist) * z * s + zombie(Civilian) * z * c
                - death(Zombie) * z
        }
        Removed => {
            death(Raider) * r + death(Survivalist) * s + death(Civilian) * c + death(Zombie) * z
        }
    }
}

/// Deltas of all five compartments against the same snapshot.
pub fn deltas(rates: &RateTable, snapshot: &PopulationVector) -> Deltas {
    let mut out = Deltas::default();
    for compartment in Compartment::ALL {
        out[compartment] = delta(compartment, rates, snapshot);
    }
    out
}

/// Births across all living compartments for one day.
pub fn birth_inflow(rates: &RateTable, snapshot: &PopulationVector) -> f64 {
    RateTable::flow(rates.birth_rate(Compartment::Raider)) * snapshot[Compartment::Raider]
        + RateTable::flow(rates.birth_rate(Compartment::Survivalist))
            * snapshot[Compartment::Survivalist]
        + RateTable::flow(rates.civilian_birth_rate()) * snapshot[Compartment::Civilian]
}
