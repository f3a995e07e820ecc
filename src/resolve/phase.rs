//! Applying resolved orders to the board and advancing to the next phase.
//!
//! Phase flow never skips a step: every movement phase is followed by a
//! retreat phase, even when nothing was dislodged, and every fall retreat by
//! an adjustment phase. Ownership changes hands on entering the adjustment
//! phase, so builds reflect the captures of the year just played.

use std::collections::BTreeMap;

use crate::board::order::{Order, OrderResult};
use crate::board::state::{Ownership, Phase, Season};
use crate::board::territory::Territory;
use crate::board::unit::Unit;

use super::build::resolve_adjustments;
use super::movement::resolve_movement;
use super::retreat::resolve_retreats;
use super::{AdjudicationError, OrderMap, PhaseOutcome};

/// Resolves the orders of one phase and returns the board for the next.
///
/// `orders` should come out of [`crate::movegen::normalize_orders`]; illegal
/// or missing orders are not repaired here.
pub fn resolve_phase(
    phase: Phase,
    orders: &[Order],
    units: &[Unit],
    ownership: &Ownership,
) -> Result<PhaseOutcome, AdjudicationError> {
    match phase.season {
        Season::SpringMovement | Season::FallMovement => resolve_movement(phase, orders, units, ownership),
        Season::SpringRetreat | Season::FallRetreat => resolve_retreats(phase, orders, units, ownership),
        Season::Adjustment => resolve_adjustments(phase, orders, units, ownership),
    }
}

/// Moves units according to resolved movement orders.
///
/// Successful movers relocate. A unit whose territory was entered without it
/// leaving is dislodged, remembering where the attack came from unless the
/// attacker was convoyed. Units that bounced off a territory that two or more
/// moves failed to enter record it as a standoff.
pub fn apply_movement(orders: &mut OrderMap, units: &[Unit]) -> Vec<Unit> {
    let mut units = units.to_vec();
    let mut displaced: BTreeMap<Territory, Territory> = BTreeMap::new();
    let mut failed: BTreeMap<Territory, usize> = BTreeMap::new();

    for unit in &mut units {
        unit.settle();
        unit.previous = Some(unit.subregion);
        let Some(order) = orders.get(&unit.territory()) else {
            continue;
        };
        let (true, Some(target)) = (order.is_move(), order.target) else {
            continue;
        };
        if order.succeeded() {
            displaced.insert(target.territory, unit.territory());
            unit.subregion = target;
        } else {
            *failed.entry(target.territory).or_default() += 1;
        }
    }

    for unit in &mut units {
        let Some(from) = unit.previous.map(|p| p.territory) else {
            continue;
        };
        let Some(order) = orders.get(&from) else {
            continue;
        };
        let moved = order.is_move() && order.succeeded();
        let standoff = order
            .target_territory()
            .filter(|t| order.is_move() && failed.get(t).copied().unwrap_or(0) > 1);

        if let (Some(&source), false) = (displaced.get(&from), moved) {
            let by_convoy = orders.get(&source).is_some_and(|o| o.convoy);
            unit.dislodged = true;
            unit.displaced_from = (!by_convoy).then_some(source);
            if let Some(order) = orders.get_mut(&from) {
                order.result = Some(OrderResult::Dislodged);
            }
        }
        if standoff.is_some() {
            unit.standoff_from = standoff;
        }
    }

    units
}

/// Moves successful retreats and removes every other dislodged unit.
pub fn apply_retreats(orders: &mut OrderMap, units: &[Unit]) -> Vec<Unit> {
    let mut survivors = Vec::with_capacity(units.len());
    for unit in units {
        let mut unit = unit.clone();
        unit.previous = Some(unit.subregion);
        if !unit.dislodged {
            unit.settle();
            survivors.push(unit);
            continue;
        }

        let t = unit.territory();
        let order = orders
            .entry(t)
            .or_insert_with(|| Order::disband(unit.power, unit.subregion).defaulted());
        match (order.is_move() && order.succeeded(), order.target) {
            (true, Some(target)) => {
                unit.subregion = target;
                unit.settle();
                survivors.push(unit);
            }
            _ => order.result = Some(OrderResult::Disbanded),
        }
    }
    survivors
}

/// Every territory with a land part that holds an army passes to the army's
/// owner. Fleets never capture.
pub fn update_ownership(units: &[Unit], ownership: &Ownership) -> Ownership {
    let mut updated = ownership.clone();
    for unit in units.iter().filter(|u| u.is_army()) {
        updated.set(unit.territory(), unit.power);
    }
    updated
}

/// Wraps up a resolved phase: advances the season and, on entering the
/// adjustment phase, updates ownership.
pub fn conclude(current: Phase, orders: Vec<Order>, units: Vec<Unit>, ownership: Ownership) -> PhaseOutcome {
    let phase = current.advance_season();
    let ownership = if phase.season.is_adjustment() {
        update_ownership(&units, &ownership)
    } else {
        ownership
    };
    PhaseOutcome {
        phase,
        orders,
        units,
        ownership,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::adjacency::Subregion;
    use crate::board::territory::{Power, Territory::*};

    fn resolved(mut order: Order, result: OrderResult) -> Order {
        order.result = Some(result);
        order
    }

    #[test]
    fn dislodged_unit_remembers_attacker() {
        let units = vec![
            Unit::new(Power::Germany, Subregion::land(Mun)),
            Unit::new(Power::Italy, Subregion::land(Tyr)),
        ];
        let mut orders: OrderMap = [
            (Mun, resolved(Order::movement(Power::Germany, Subregion::land(Mun), Subregion::land(Tyr)), OrderResult::Succeeded)),
            (Tyr, resolved(Order::hold(Power::Italy, Subregion::land(Tyr)), OrderResult::Failed)),
        ]
        .into_iter()
        .collect();

        let after = apply_movement(&mut orders, &units);
        assert_eq!(after[0].subregion, Subregion::land(Tyr));
        assert_eq!(after[0].previous, Some(Subregion::land(Mun)));
        assert!(!after[0].dislodged);
        assert!(after[1].dislodged);
        assert_eq!(after[1].displaced_from, Some(Mun));
        assert_eq!(orders[&Tyr].result, Some(OrderResult::Dislodged));
    }

    #[test]
    fn double_bounce_records_standoff() {
        let units = vec![
            Unit::new(Power::Germany, Subregion::land(Ber)),
            Unit::new(Power::Russia, Subregion::land(War)),
        ];
        let mut orders: OrderMap = [
            (Ber, resolved(Order::movement(Power::Germany, Subregion::land(Ber), Subregion::land(Sil)), OrderResult::Failed)),
            (War, resolved(Order::movement(Power::Russia, Subregion::land(War), Subregion::land(Sil)), OrderResult::Failed)),
        ]
        .into_iter()
        .collect();

        let after = apply_movement(&mut orders, &units);
        assert!(after.iter().all(|u| u.standoff_from == Some(Sil)));
        assert!(after.iter().all(|u| !u.dislodged));
    }

    #[test]
    fn unordered_dislodged_unit_is_disbanded() {
        let mut unit = Unit::new(Power::Italy, Subregion::land(Tyr));
        unit.dislodged = true;
        let units = vec![unit, Unit::new(Power::Germany, Subregion::land(Tyr))];
        let mut orders = OrderMap::new();

        let after = apply_retreats(&mut orders, &units);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].power, Power::Germany);
        assert_eq!(orders[&Tyr].result, Some(OrderResult::Disbanded));
        assert!(!orders[&Tyr].user_issued);
    }

    #[test]
    fn only_armies_capture() {
        let units = vec![
            Unit::new(Power::England, Subregion::sea(Bel)),
            Unit::new(Power::France, Subregion::land(Hol)),
        ];
        let owned = update_ownership(&units, &Ownership::new());
        assert_eq!(owned.owner(Bel), None);
        assert_eq!(owned.owner(Hol), Some(Power::France));
    }

    #[test]
    fn conclude_updates_ownership_only_before_adjustments() {
        let units = vec![Unit::new(Power::France, Subregion::land(Bel))];
        let spring = Phase::opening();
        let out = conclude(spring, vec![], units.clone(), Ownership::new());
        assert_eq!(out.ownership.owner(Bel), None);
        assert_eq!(out.phase.season, Season::SpringRetreat);

        let fall_retreat = Phase::new(3, 1901, Season::FallRetreat);
        let out = conclude(fall_retreat, vec![], units, Ownership::new());
        assert_eq!(out.phase.season, Season::Adjustment);
        assert_eq!(out.ownership.owner(Bel), Some(Power::France));
    }
}
