//! Adjustment-phase resolution.
//!
//! Builds and disbands are carried out as ordered. A faction that still has
//! more units than supply centers afterwards loses its units farthest from
//! home until the counts match (civil disorder).

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::debug;

use crate::board::adjacency::{borders, territory_parts, Subregion};
use crate::board::order::{Action, Order, OrderResult};
use crate::board::state::{Ownership, Phase};
use crate::board::territory::{Power, ALL_TERRITORIES};
use crate::board::unit::Unit;
use crate::movegen::builds_available;

use super::{phase, AdjudicationError, PhaseOutcome};

/// Breadth-first distance from `power`'s home supply centers to every
/// reachable subregion.
///
/// Fleets travel over water only, starting from the sea coasts of the home
/// centers. Armies may step into any part of a bordering territory, so land
/// and sea hops both count, starting from every part of the home centers.
pub fn home_distances(power: Power, armies: bool) -> BTreeMap<Subregion, usize> {
    let mut dist = BTreeMap::new();
    let mut queue = VecDeque::new();

    let homes = ALL_TERRITORIES
        .iter()
        .filter(|t| t.is_supply_center() && t.home() == Some(power));
    for &home in homes {
        for &sr in territory_parts(home) {
            if (armies || sr.is_sea()) && dist.insert(sr, 0).is_none() {
                queue.push_back(sr);
            }
        }
    }

    while let Some(sr) = queue.pop_front() {
        let d = dist[&sr] + 1;
        let next: Vec<Subregion> = if armies {
            borders(sr)
                .iter()
                .flat_map(|b| territory_parts(b.territory).iter().copied())
                .collect()
        } else {
            borders(sr).to_vec()
        };
        for n in next {
            if !dist.contains_key(&n) {
                dist.insert(n, d);
                queue.push_back(n);
            }
        }
    }
    dist
}

/// Picks which of `power`'s units to remove when it has `excess` too many.
///
/// The farthest unit goes first; unreachable units count as infinitely far.
/// Ties go to fleets before armies, then to the earlier territory.
pub fn civil_disorder(power: Power, units: &[Unit], excess: usize) -> Vec<Subregion> {
    let fleet_dist = home_distances(power, false);
    let army_dist = home_distances(power, true);

    let mut ranked: Vec<(Reverse<usize>, bool, Subregion)> = units
        .iter()
        .filter(|u| u.power == power)
        .map(|u| {
            let table = if u.is_army() { &army_dist } else { &fleet_dist };
            let d = table.get(&u.subregion).copied().unwrap_or(usize::MAX);
            (Reverse(d), u.is_army(), u.subregion)
        })
        .collect();
    ranked.sort_by_key(|&(d, army, sr)| (d, army, sr.territory));
    ranked.into_iter().take(excess).map(|(_, _, sr)| sr).collect()
}

/// Resolves an adjustment phase and applies it to the board.
pub fn resolve_adjustments(
    current: Phase,
    orders: &[Order],
    units: &[Unit],
    ownership: &Ownership,
) -> Result<PhaseOutcome, AdjudicationError> {
    let mut orders: Vec<Order> = orders.to_vec();
    for order in &mut orders {
        order.result = Some(match order.action {
            Action::Waive => OrderResult::Failed,
            Action::Disband => OrderResult::Disbanded,
            _ => OrderResult::Succeeded,
        });
    }

    let disbanded: BTreeSet<Subregion> = orders
        .iter()
        .filter(|o| o.action == Action::Disband)
        .filter_map(|o| o.actor)
        .collect();
    let mut units: Vec<Unit> = units
        .iter()
        .filter(|u| !disbanded.contains(&u.subregion))
        .cloned()
        .map(|mut u| {
            u.settle();
            u.previous = Some(u.subregion);
            u
        })
        .collect();
    units.extend(
        orders
            .iter()
            .filter(|o| o.action == Action::Build && o.succeeded())
            .filter_map(|o| o.actor.map(|sr| Unit::new(o.power, sr))),
    );

    for (power, count) in builds_available(&units, ownership) {
        if count >= 0 {
            continue;
        }
        let removed = civil_disorder(power, &units, count.unsigned_abs() as usize);
        debug!(%power, removed = ?removed, "civil disorder");
        units.retain(|u| !removed.contains(&u.subregion));
        orders.extend(removed.into_iter().map(|sr| {
            let mut order = Order::disband(power, sr).defaulted();
            order.result = Some(OrderResult::Disbanded);
            order
        }));
    }

    Ok(phase::conclude(current, orders, units, ownership.clone()))
}
