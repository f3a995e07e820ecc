//! Adjustment-phase legality: builds and disbands.

use std::collections::BTreeMap;

use crate::board::adjacency::Subregion;
use crate::board::state::Ownership;
use crate::board::territory::Power;
use crate::board::unit::Unit;

use super::LegalOptions;

/// Supply centers owned minus units on the board, per faction.
///
/// Positive values are builds, negative values are disbands owed. Factions
/// with neither a center nor a unit are absent.
pub fn builds_available(units: &[Unit], ownership: &Ownership) -> BTreeMap<Power, i32> {
    let mut builds: BTreeMap<Power, i32> = BTreeMap::new();
    for (t, power) in ownership.iter() {
        if t.is_supply_center() {
            *builds.entry(power).or_default() += 1;
        }
    }
    for unit in units {
        *builds.entry(unit.power).or_default() -= 1;
    }
    builds
}

/// A build is possible on a vacant home supply center still held by its
/// original owner, while that owner has builds to spare.
pub fn build_options(actor: Subregion, units: &[Unit], ownership: &Ownership) -> LegalOptions {
    let mut options = LegalOptions::new();
    let t = actor.territory;
    if !actor.exists() || !t.is_supply_center() {
        return options;
    }
    let Some(owner) = ownership.owner(t) else {
        return options;
    };
    let spare = builds_available(units, ownership).get(&owner).copied().unwrap_or(0);
    let vacant = !units.iter().any(|u| u.territory() == t);
    if spare > 0 && vacant && t.home() == Some(owner) {
        options.insert(None, None);
    }
    options
}

/// A unit may be disbanded while its owner has more units than centers.
pub fn disband_options(actor: Subregion, units: &[Unit], ownership: &Ownership) -> LegalOptions {
    let mut options = LegalOptions::new();
    let Some(unit) = units.iter().find(|u| u.territory() == actor.territory) else {
        return options;
    };
    let owed = builds_available(units, ownership).get(&unit.power).copied().unwrap_or(0);
    if owed < 0 {
        options.insert(None, None);
    }
    options
}
