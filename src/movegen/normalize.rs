//! Turning submitted orders into the complete order set of a phase.
//!
//! Every actionable unit (or adjustment slot) starts with a default order.
//! Legal submissions replace the defaults; anything else is rejected. The
//! result has exactly one order per actor, so the resolver never has to deal
//! with missing or duplicate orders.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::board::adjacency::is_adjacent;
use crate::board::order::{Action, Order};
use crate::board::state::{Ownership, Season};
use crate::board::territory::{Power, Territory};
use crate::board::unit::Unit;
use crate::board::Subregion;

use super::{actionable_subregions, builds_available, is_legal};

/// The outcome of normalising a phase's submissions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// One order per actor, in faction order, then actor or slot order.
    pub orders: Vec<Order>,
    /// Submissions that were illegal or exceeded the faction's allowance.
    pub rejected: Vec<Order>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Unit(Subregion),
    Adjustment(usize),
}

/// Fills in defaults, keeps the legal submissions and works out which army
/// moves will travel by convoy.
///
/// Defaults are Hold in movement seasons, Disband in retreat seasons and a
/// Waive per adjustment slot. A faction gets one slot per disband it owes,
/// or one per build up to the number of places it could build. The last
/// legal order for an actor wins; adjustment orders take slots in the order
/// they were submitted.
pub fn normalize_orders(season: Season, submitted: &[Order], units: &[Unit], ownership: &Ownership) -> Normalized {
    let actors = actionable_subregions(units, ownership, season);
    let mut slots: BTreeMap<(Power, Slot), Order> = BTreeMap::new();

    if season.is_adjustment() {
        for (power, count) in builds_available(units, ownership) {
            let sites = actors.get(&power).map_or(0, Vec::len);
            let n = if count < 0 {
                count.unsigned_abs() as usize
            } else {
                (count as usize).min(sites)
            };
            for i in 0..n {
                slots.insert((power, Slot::Adjustment(i)), Order::waive(power).defaulted());
            }
        }
    } else {
        for (&power, subregions) in &actors {
            for &sr in subregions {
                let default = if season.is_movement() {
                    Order::hold(power, sr)
                } else {
                    Order::disband(power, sr)
                };
                slots.insert((power, Slot::Unit(sr)), default.defaulted());
            }
        }
    }

    let mut rejected = Vec::new();
    let mut next_slot: BTreeMap<Power, usize> = BTreeMap::new();
    let mut claimed: BTreeSet<Territory> = BTreeSet::new();
    for order in submitted {
        if !is_legal(order, units, ownership, season) {
            debug!(%order, power = %order.power, "rejected illegal order");
            rejected.push(order.clone());
            continue;
        }
        let slot = if season.is_adjustment() {
            // One build or disband per territory.
            if let Some(t) = order.territory() {
                if !claimed.insert(t) {
                    debug!(%order, power = %order.power, "rejected second adjustment for territory");
                    rejected.push(order.clone());
                    continue;
                }
            }
            let i = next_slot.entry(order.power).or_default();
            *i += 1;
            Slot::Adjustment(*i - 1)
        } else {
            match order.actor {
                Some(sr) => Slot::Unit(sr),
                None => {
                    rejected.push(order.clone());
                    continue;
                }
            }
        };
        match slots.get_mut(&(order.power, slot)) {
            Some(entry) => {
                let mut order = order.clone();
                order.user_issued = true;
                order.convoy = false;
                order.result = None;
                *entry = order;
            }
            None => {
                debug!(%order, power = %order.power, "dropped order beyond allowance");
                rejected.push(order.clone());
            }
        }
    }

    if season.is_movement() {
        mark_convoys(&mut slots);
    }

    Normalized {
        orders: slots.into_values().collect(),
        rejected,
    }
}

/// Decides which army moves travel by convoy.
///
/// A move to a non-adjacent target is convoyed whenever a convoy was ordered
/// for it. A move to an adjacent target only goes by convoy if its own
/// faction ordered a matching convoy, or the player asked for one and any
/// faction ordered it.
fn mark_convoys(slots: &mut BTreeMap<(Power, Slot), Order>) {
    let convoys: Vec<(Power, Option<Subregion>)> = slots
        .values()
        .filter(|o| o.action == Action::Convoy)
        .map(|o| (o.power, o.assist))
        .collect();

    for order in slots.values_mut() {
        let (Some(actor), Some(target)) = (order.actor, order.target) else {
            continue;
        };
        if !order.is_move() || !actor.is_land() {
            continue;
        }
        let matching: Vec<Power> = convoys
            .iter()
            .filter(|(_, army)| army.map(|a| a.territory) == Some(actor.territory))
            .map(|&(power, _)| power)
            .collect();

        order.convoy = if is_adjacent(actor, target) {
            matching.contains(&order.power) || (order.via_convoy && !matching.is_empty())
        } else {
            !matching.is_empty()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::state::initial_state;
    use crate::board::territory::Territory::*;

    #[test]
    fn every_unit_gets_a_hold_by_default() {
        let state = initial_state();
        let out = normalize_orders(Season::SpringMovement, &[], &state.units, &state.ownership);
        assert_eq!(out.orders.len(), 22);
        assert!(out.orders.iter().all(|o| o.action == Action::Hold && !o.user_issued));
        assert!(out.rejected.is_empty());
    }

    #[test]
    fn legal_orders_replace_defaults_and_illegal_are_rejected() {
        let state = initial_state();
        let submitted = vec![
            Order::movement(Power::France, Subregion::land(Par), Subregion::land(Bur)),
            Order::movement(Power::France, Subregion::land(Par), Subregion::land(Pic)),
            Order::movement(Power::France, Subregion::land(Mar), Subregion::land(Mun)),
            Order::hold(Power::Germany, Subregion::land(Par)),
        ];
        let out = normalize_orders(Season::SpringMovement, &submitted, &state.units, &state.ownership);
        assert_eq!(out.orders.len(), 22);
        let par = out
            .orders
            .iter()
            .find(|o| o.actor == Some(Subregion::land(Par)))
            .unwrap();
        assert_eq!(par.target, Some(Subregion::land(Pic)));
        assert!(par.user_issued);
        assert_eq!(out.rejected.len(), 2);
    }

    #[test]
    fn retreat_defaults_to_disband() {
        let mut state = initial_state();
        state.units[0].dislodged = true;
        let out = normalize_orders(Season::SpringRetreat, &[], &state.units, &state.ownership);
        assert_eq!(out.orders.len(), 1);
        assert_eq!(out.orders[0].action, Action::Disband);
    }

    #[test]
    fn adjustment_slots_fill_in_order() {
        let mut state = initial_state();
        state.units.retain(|u| u.power != Power::Austria);
        let submitted = vec![
            Order::build(Power::Austria, Subregion::land(Vie)),
            Order::build(Power::Austria, Subregion::land(Bud)),
            Order::waive(Power::Austria),
            Order::build(Power::Austria, Subregion::sea(Tri)),
        ];
        let out = normalize_orders(Season::Adjustment, &submitted, &state.units, &state.ownership);
        let austria: Vec<&Order> = out.orders.iter().filter(|o| o.power == Power::Austria).collect();
        assert_eq!(austria.len(), 3);
        assert_eq!(austria[0].action, Action::Build);
        assert_eq!(austria[1].action, Action::Build);
        assert_eq!(austria[2].action, Action::Waive);
        assert!(austria[2].user_issued);
        assert_eq!(out.rejected.len(), 1);
    }

    #[test]
    fn non_adjacent_army_move_is_convoyed_only_with_a_convoy() {
        let units = vec![
            Unit::new(Power::England, Subregion::land(Edi)),
            Unit::new(Power::England, Subregion::sea(Nth)),
        ];
        let own = Ownership::new();
        let move_only = vec![Order::movement(Power::England, Subregion::land(Edi), Subregion::land(Nwy))];
        let out = normalize_orders(Season::SpringMovement, &move_only, &units, &own);
        assert!(out.rejected.is_empty());
        assert!(!out.orders[0].convoy);

        let mut with_convoy = move_only.clone();
        with_convoy.push(Order::convoy(Power::England, Subregion::sea(Nth), Subregion::land(Edi), Subregion::land(Nwy)));
        let out = normalize_orders(Season::SpringMovement, &with_convoy, &units, &own);
        let edi = out.orders.iter().find(|o| o.territory() == Some(Edi)).unwrap();
        assert!(edi.convoy);
    }

    #[test]
    fn duplicate_builds_are_rejected() {
        let mut state = initial_state();
        state.units.retain(|u| u.power != Power::Austria);
        let submitted = vec![
            Order::build(Power::Austria, Subregion::land(Tri)),
            Order::build(Power::Austria, Subregion::sea(Tri)),
        ];
        let out = normalize_orders(Season::Adjustment, &submitted, &state.units, &state.ownership);
        assert_eq!(out.rejected, vec![submitted[1].clone()]);
    }

    #[test]
    fn adjacent_move_uses_own_convoy() {
        let units = vec![
            Unit::new(Power::England, Subregion::land(Yor)),
            Unit::new(Power::England, Subregion::sea(Nth)),
        ];
        let own = Ownership::new();
        let submitted = vec![
            Order::movement(Power::England, Subregion::land(Yor), Subregion::land(Lon)),
            Order::convoy(Power::England, Subregion::sea(Nth), Subregion::land(Yor), Subregion::land(Lon)),
        ];
        let out = normalize_orders(Season::FallMovement, &submitted, &units, &own);
        let yor = out.orders.iter().find(|o| o.territory() == Some(Yor)).unwrap();
        assert!(yor.convoy);
    }
}
