//! Retreat-phase resolution.
//!
//! A retreat succeeds unless another retreat heads for the same territory,
//! in which case all of them fail. Dislodged units that do not retreat
//! successfully are disbanded.

use std::collections::BTreeMap;

use crate::board::order::{Order, OrderResult};
use crate::board::state::{Ownership, Phase};
use crate::board::territory::Territory;
use crate::board::unit::Unit;

use super::{order_map, phase, AdjudicationError, OrderMap, PhaseOutcome};

/// Returns whether each retreat order succeeds. Orders that are not moves
/// never succeed.
pub fn retreat_decisions(orders: &OrderMap) -> BTreeMap<Territory, bool> {
    let mut arrivals: BTreeMap<Territory, usize> = BTreeMap::new();
    for t in orders.values().filter(|o| o.is_move()).filter_map(Order::target_territory) {
        *arrivals.entry(t).or_default() += 1;
    }

    orders
        .iter()
        .map(|(&t, o)| {
            let ok = o.is_move()
                && o
                    .target_territory()
                    .is_some_and(|target| arrivals.get(&target) == Some(&1));
            (t, ok)
        })
        .collect()
}

/// Resolves a retreat phase and applies it to the board.
pub fn resolve_retreats(
    current: Phase,
    orders: &[Order],
    units: &[Unit],
    ownership: &Ownership,
) -> Result<PhaseOutcome, AdjudicationError> {
    let mut orders = order_map(orders);
    for (t, ok) in retreat_decisions(&orders) {
        if let Some(order) = orders.get_mut(&t) {
            order.result = Some(if ok { OrderResult::Succeeded } else { OrderResult::Failed });
        }
    }
    let units = phase::apply_retreats(&mut orders, units);
    Ok(phase::conclude(current, orders.into_values().collect(), units, ownership.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::adjacency::Subregion;
    use crate::board::state::Season;
    use crate::board::territory::{Power, Territory::*};

    fn dislodged(power: Power, sr: Subregion) -> Unit {
        let mut u = Unit::new(power, sr);
        u.dislodged = true;
        u
    }

    #[test]
    fn colliding_retreats_both_disband() {
        let units = vec![
            dislodged(Power::Germany, Subregion::land(Mun)),
            Unit::new(Power::France, Subregion::land(Mun)),
            dislodged(Power::Austria, Subregion::land(Vie)),
            Unit::new(Power::Russia, Subregion::land(Vie)),
        ];
        let orders = vec![
            Order::movement(Power::Germany, Subregion::land(Mun), Subregion::land(Boh)),
            Order::movement(Power::Austria, Subregion::land(Vie), Subregion::land(Boh)),
        ];
        let phase = Phase::new(1, 1901, Season::SpringRetreat);
        let out = resolve_retreats(phase, &orders, &units, &Ownership::new()).unwrap();

        assert_eq!(out.units.len(), 2);
        assert!(out.units.iter().all(|u| !u.dislodged));
        assert!(out.orders.iter().all(|o| o.result == Some(OrderResult::Disbanded)));
        assert_eq!(out.phase.season, Season::FallMovement);
    }

    #[test]
    fn lone_retreat_succeeds() {
        let units = vec![
            dislodged(Power::Germany, Subregion::land(Mun)),
            Unit::new(Power::France, Subregion::land(Mun)),
        ];
        let orders = vec![Order::movement(Power::Germany, Subregion::land(Mun), Subregion::land(Boh))];
        let phase = Phase::new(1, 1901, Season::SpringRetreat);
        let out = resolve_retreats(phase, &orders, &units, &Ownership::new()).unwrap();

        assert_eq!(out.orders[0].result, Some(OrderResult::Succeeded));
        assert!(out.units.iter().any(|u| u.power == Power::Germany && u.subregion == Subregion::land(Boh)));
    }

    #[test]
    fn disband_order_is_recorded() {
        let units = vec![dislodged(Power::Italy, Subregion::sea(Nap))];
        let orders = vec![Order::disband(Power::Italy, Subregion::sea(Nap))];
        let phase = Phase::new(3, 1901, Season::FallRetreat);
        let out = resolve_retreats(phase, &orders, &units, &Ownership::new()).unwrap();
        assert!(out.units.is_empty());
        assert_eq!(out.orders[0].result, Some(OrderResult::Disbanded));
    }
}
