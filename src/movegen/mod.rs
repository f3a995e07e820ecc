//! Order legality and generation.
//!
//! Decides which orders are structurally legal in the current position,
//! independently of whether they will succeed, and generates legal orders:
//! every form an actor may take, or a random pick per unit.

pub mod build;
pub mod movement;
pub mod normalize;
pub mod retreat;

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::adjacency::{is_adjacent, territory_parts, Subregion};
use crate::board::order::{Action, Order};
use crate::board::state::{GameState, Ownership, Season};
use crate::board::territory::{Power, ALL_POWERS};
use crate::board::unit::Unit;

pub use build::builds_available;
pub use normalize::{normalize_orders, Normalized};

/// The legal (assist, target) combinations for an action by one actor.
///
/// `None` stands for an absent assist or target: a move has no assist, a
/// hold support has no target, and a hold has neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegalOptions(BTreeMap<Option<Subregion>, BTreeSet<Option<Subregion>>>);

impl LegalOptions {
    pub fn new() -> Self {
        LegalOptions(BTreeMap::new())
    }

    pub fn insert(&mut self, assist: Option<Subregion>, target: Option<Subregion>) {
        self.0.entry(assist).or_default().insert(target);
    }

    /// True if no legal form of the order exists.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of (assist, target) combinations.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn permits(&self, assist: Option<Subregion>, target: Option<Subregion>) -> bool {
        self.0.get(&assist).is_some_and(|targets| targets.contains(&target))
    }

    pub fn assists(&self) -> impl Iterator<Item = Option<Subregion>> + '_ {
        self.0.keys().copied()
    }

    pub fn targets(&self, assist: Option<Subregion>) -> impl Iterator<Item = Option<Subregion>> + '_ {
        self.0.get(&assist).into_iter().flatten().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<Subregion>, Option<Subregion>)> + '_ {
        self.0
            .iter()
            .flat_map(|(&a, targets)| targets.iter().map(move |&t| (a, t)))
    }
}

/// The unit standing exactly at `sr`, ignoring dislodged units when an
/// undislodged one is also there.
pub(crate) fn unit_at(units: &[Unit], sr: Subregion) -> Option<&Unit> {
    let mut here = units.iter().filter(|u| u.subregion == sr);
    let first = here.next()?;
    Some(if first.dislodged {
        here.next().unwrap_or(first)
    } else {
        first
    })
}

/// Every legal (assist, target) combination for `action` by `actor`.
pub fn legal_options(
    action: Action,
    actor: Subregion,
    units: &[Unit],
    ownership: &Ownership,
    season: Season,
) -> LegalOptions {
    let movement = season.is_movement();
    match action {
        Action::Hold if movement => movement::hold_options(actor, units),
        Action::Move if movement => movement::move_options(actor, units),
        Action::Move if season.is_retreat() => retreat::retreat_options(actor, units),
        Action::Support if movement => movement::support_options(actor, units),
        Action::Convoy if movement => movement::convoy_options(actor, units),
        Action::Build if season.is_adjustment() => build::build_options(actor, units, ownership),
        Action::Disband if season.is_retreat() => retreat::disband_options(actor, units),
        Action::Disband if season.is_adjustment() => build::disband_options(actor, units, ownership),
        Action::Hold
        | Action::Move
        | Action::Support
        | Action::Convoy
        | Action::Build
        | Action::Disband
        | Action::Waive => LegalOptions::new(),
    }
}

/// True if `order` is structurally legal for its issuer in this position.
pub fn is_legal(order: &Order, units: &[Unit], ownership: &Ownership, season: Season) -> bool {
    let spare = || {
        builds_available(units, ownership)
            .get(&order.power)
            .copied()
            .unwrap_or(0)
    };
    if order.action == Action::Waive {
        return season.is_adjustment() && order.actor.is_none() && spare() > 0;
    }
    let Some(actor) = order.actor else {
        return false;
    };

    let issued_by_owner = if season.is_retreat() {
        units
            .iter()
            .find(|u| u.subregion == actor && u.dislodged)
            .is_some_and(|u| u.power == order.power)
    } else if order.action == Action::Build {
        ownership.owner(actor.territory) == Some(order.power)
    } else {
        unit_at(units, actor).is_some_and(|u| u.power == order.power)
    };
    if !issued_by_owner {
        return false;
    }

    legal_options(order.action, actor, units, ownership, season).permits(order.assist, order.target)
}

/// Subregions that may be given an order this season, per faction.
///
/// In the adjustment season these are the vacant owned home centers of a
/// faction with builds to spare (every part of each), or all of its units
/// when it owes disbands. The build count itself does not limit the list.
pub fn actionable_subregions(
    units: &[Unit],
    ownership: &Ownership,
    season: Season,
) -> BTreeMap<Power, Vec<Subregion>> {
    let units_of = |power: Power, dislodged_only: bool| -> Vec<Subregion> {
        units
            .iter()
            .filter(|u| u.power == power && (u.dislodged || !dislodged_only))
            .map(|u| u.subregion)
            .collect()
    };

    match season {
        Season::SpringMovement | Season::FallMovement => {
            ALL_POWERS.iter().map(|&p| (p, units_of(p, false))).collect()
        }
        Season::SpringRetreat | Season::FallRetreat => {
            ALL_POWERS.iter().map(|&p| (p, units_of(p, true))).collect()
        }
        Season::Adjustment => builds_available(units, ownership)
            .into_iter()
            .map(|(power, count)| {
                let actors = match count {
                    c if c > 0 => ownership
                        .iter()
                        .filter(|&(t, p)| {
                            p == power
                                && t.is_supply_center()
                                && t.home() == Some(power)
                                && !units.iter().any(|u| u.territory() == t)
                        })
                        .flat_map(|(t, _)| territory_parts(t).iter().copied())
                        .collect(),
                    0 => Vec::new(),
                    _ => units_of(power, false),
                };
                (power, actors)
            })
            .collect(),
    }
}

/// Every legal order `power` could give `actor` this season.
pub fn legal_orders(
    power: Power,
    actor: Subregion,
    units: &[Unit],
    ownership: &Ownership,
    season: Season,
) -> Vec<Order> {
    const ACTIONS: [Action; 6] = [
        Action::Hold,
        Action::Move,
        Action::Support,
        Action::Convoy,
        Action::Build,
        Action::Disband,
    ];

    let mut orders = Vec::new();
    for action in ACTIONS {
        for (assist, target) in legal_options(action, actor, units, ownership, season).iter() {
            let order = match (action, assist, target) {
                (Action::Hold, _, _) => Order::hold(power, actor),
                (Action::Move, _, Some(target)) => {
                    let order = Order::movement(power, actor, target);
                    if season.is_movement() && !is_adjacent(actor, target) {
                        order.via_convoy()
                    } else {
                        order
                    }
                }
                (Action::Support, Some(assist), None) => Order::support_hold(power, actor, assist),
                (Action::Support, Some(assist), Some(target)) => {
                    Order::support_move(power, actor, assist, target)
                }
                (Action::Convoy, Some(army), Some(target)) => Order::convoy(power, actor, army, target),
                (Action::Build, _, _) => Order::build(power, actor),
                (Action::Disband, _, _) => Order::disband(power, actor),
                _ => continue,
            };
            if is_legal(&order, units, ownership, season) {
                orders.push(order);
            }
        }
    }
    orders
}

/// Picks one random legal order for each of `power`'s actionable units.
///
/// In the adjustment season, picks random build sites up to the number of
/// builds available (at most one per territory), or random units to disband
/// when disbands are owed.
pub fn random_orders(power: Power, state: &GameState, rng: &mut impl Rng) -> Vec<Order> {
    let season = state.phase.season;
    let actors = actionable_subregions(&state.units, &state.ownership, season)
        .remove(&power)
        .unwrap_or_default();

    if !season.is_adjustment() {
        let mut orders = Vec::with_capacity(actors.len());
        for actor in actors {
            let legal = legal_orders(power, actor, &state.units, &state.ownership, season);
            if let Some(order) = legal.choose(rng) {
                orders.push(order.clone());
            }
        }
        return orders;
    }

    let count = builds_available(&state.units, &state.ownership)
        .get(&power)
        .copied()
        .unwrap_or(0);
    let mut actors = actors;
    actors.shuffle(rng);
    if count < 0 {
        return actors
            .into_iter()
            .take(count.unsigned_abs() as usize)
            .map(|actor| Order::disband(power, actor))
            .collect();
    }

    let mut used = BTreeSet::new();
    let mut orders = Vec::new();
    for actor in actors {
        if orders.len() as i32 >= count {
            break;
        }
        if used.insert(actor.territory) {
            orders.push(Order::build(power, actor));
        }
    }
    orders
}

/// Random legal orders for every faction, in faction order.
pub fn random_phase_orders(state: &GameState, rng: &mut impl Rng) -> Vec<Order> {
    ALL_POWERS
        .iter()
        .flat_map(|&power| random_orders(power, state, rng))
        .collect()
}
