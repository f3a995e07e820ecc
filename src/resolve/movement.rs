//! Movement-phase adjudication.
//!
//! Outcomes are found by search rather than by evaluation order. Each order
//! is hypothesised to succeed or fail, one at a time, picking the order with
//! the fewest undecided dependencies first. Once every hypothesised order has
//! all of its dependencies hypothesised too, the strengths implied by the
//! hypothesis are computed and checked against it. The first complete
//! hypothesis that survives every check is the resolution.
//!
//! Convoys on a dependency cycle may additionally be assigned
//! [`Decision::Paradox`], which breaks the cycle: the convoy is neither
//! relied on as a path nor treated as dislodged.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::{Index, IndexMut};

use tracing::{debug, error};

use crate::board::adjacency::{is_adjacent, Subregion};
use crate::board::order::{Action, Order, OrderResult};
use crate::board::state::{Ownership, Phase};
use crate::board::territory::{Power, Territory, TERRITORY_COUNT};
use crate::board::unit::Unit;

use super::convoy::convoy_path_exists;
use super::dependency::{construct_dependencies, detect_paradox, head_to_head, immediate_fails, Dependencies};
use super::{order_map, phase, AdjudicationError, OrderMap, PhaseOutcome};

/// A hypothesised outcome for one order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Success,
    Failure,
    /// A convoy whose outcome depends on itself. Reported as a failure.
    Paradox,
}

impl Decision {
    #[inline]
    pub fn succeeded(self) -> bool {
        self == Decision::Success
    }
}

/// Decisions keyed by the territory of the order they belong to.
pub type Assignment = BTreeMap<Territory, Decision>;

/// One strength value per territory.
#[derive(Debug, Clone, Copy)]
struct Tally([u8; TERRITORY_COUNT]);

impl Tally {
    fn new() -> Self {
        Tally([0; TERRITORY_COUNT])
    }
}

impl Index<Territory> for Tally {
    type Output = u8;

    fn index(&self, t: Territory) -> &u8 {
        &self.0[t.index()]
    }
}

impl IndexMut<Territory> for Tally {
    fn index_mut(&mut self, t: Territory) -> &mut u8 {
        &mut self.0[t.index()]
    }
}

#[derive(Debug, Clone, Copy)]
struct Strengths {
    hold: Tally,
    attack: Tally,
    defend: Tally,
    prevent: Tally,
}

/// Per-move path information under some hypothesis.
#[derive(Debug, Clone, Copy, Default)]
struct Route {
    path: bool,
    convoyed: bool,
}

/// Searches for a consistent outcome of one set of movement orders.
pub struct MovementResolver<'a> {
    orders: &'a OrderMap,
    units: &'a [Unit],
    powers: BTreeMap<Territory, Power>,
    deps: Dependencies,
    fails: BTreeSet<Territory>,
    paradox: BTreeSet<Territory>,
    steps: usize,
}

impl<'a> MovementResolver<'a> {
    /// Runs the dependency analysis up front; the search happens in
    /// [`MovementResolver::resolve`].
    pub fn new(orders: &'a OrderMap, units: &'a [Unit]) -> Self {
        let deps = construct_dependencies(orders);
        let paradox = detect_paradox(orders, &deps);
        let fails = immediate_fails(orders, units);
        let powers = units.iter().map(|u| (u.territory(), u.power)).collect();
        MovementResolver {
            orders,
            units,
            powers,
            deps,
            fails,
            paradox,
            steps: 0,
        }
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.deps
    }

    pub fn paradoxical(&self) -> &BTreeSet<Territory> {
        &self.paradox
    }

    pub fn immediate_failures(&self) -> &BTreeSet<Territory> {
        &self.fails
    }

    /// Number of search nodes visited by the last call to `resolve`.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Finds the first consistent assignment, or `None` if there is none.
    pub fn resolve(&mut self) -> Option<Assignment> {
        self.steps = 0;
        let mut state = Assignment::new();
        let found = self.search(&mut state);
        debug!(
            orders = self.orders.len(),
            steps = self.steps,
            paradox = self.paradox.len(),
            found,
            "movement search finished"
        );
        found.then_some(state)
    }

    fn search(&mut self, state: &mut Assignment) -> bool {
        self.steps += 1;

        let settled = state
            .keys()
            .all(|&t| self.deps.of(t).iter().all(|d| state.contains_key(d)));
        if settled && !self.consistent(state) {
            return false;
        }

        let next = self
            .orders
            .keys()
            .filter(|t| !state.contains_key(t))
            .map(|&t| {
                let open = self.deps.of(t).iter().filter(|d| !state.contains_key(d)).count();
                (open, t)
            })
            .min();
        let Some((_, t)) = next else {
            return true;
        };

        let choices = if self.paradox.contains(&t) {
            [Decision::Paradox, Decision::Failure]
        } else {
            [Decision::Success, Decision::Failure]
        };
        for decision in choices {
            state.insert(t, decision);
            if self.search(state) {
                return true;
            }
            state.remove(&t);
        }
        false
    }

    #[inline]
    fn power_at(&self, t: Territory) -> Option<Power> {
        self.powers
            .get(&t)
            .copied()
            .or_else(|| self.orders.get(&t).map(|o| o.power))
    }

    fn is_success(state: &Assignment, t: Territory) -> bool {
        state.get(&t).is_some_and(|d| d.succeeded())
    }

    fn convoys_for(&self, mover: Territory, picked: impl Iterator<Item = Territory>) -> Vec<&'a Order> {
        let orders = self.orders;
        picked
            .filter_map(|t| orders.get(&t))
            .filter(|o| o.action == Action::Convoy && o.assist_territory() == Some(mover))
            .collect()
    }

    fn routes(&self, state: &Assignment) -> BTreeMap<Territory, Route> {
        let mut routes = BTreeMap::new();
        for (&t, order) in self.orders {
            if !order.is_move() {
                continue;
            }
            let (Some(actor), Some(target)) = (order.actor, order.target) else {
                routes.insert(t, Route::default());
                continue;
            };

            let successful = state
                .iter()
                .filter(|(_, d)| d.succeeded())
                .map(|(&t2, _)| t2);
            // Only the mover's own convoys count unless it asked to be convoyed.
            let matching: Vec<Subregion> = self
                .convoys_for(t, successful)
                .into_iter()
                .filter(|c| order.convoy || c.power == order.power)
                .filter_map(|c| c.actor)
                .collect();

            let mut path = convoy_path_exists(self.units, matching.iter().copied(), actor, target);
            let convoyed = path;

            let mut blocked = false;
            if !path && order.convoy {
                let paradoxical: Vec<Subregion> = self
                    .convoys_for(t, self.paradox.iter().copied())
                    .into_iter()
                    .filter_map(|c| c.actor)
                    .collect();
                blocked = convoy_path_exists(
                    self.units,
                    matching.iter().chain(paradoxical.iter()).copied(),
                    actor,
                    target,
                );
            }

            if !order.convoy && is_adjacent(actor, target) {
                path = !blocked;
            }
            routes.insert(t, Route { path, convoyed });
        }
        routes
    }

    fn base_strengths(&self, state: &Assignment, routes: &BTreeMap<Territory, Route>) -> Strengths {
        let mut s = Strengths {
            hold: Tally::new(),
            attack: Tally::new(),
            defend: Tally::new(),
            prevent: Tally::new(),
        };
        let convoyed = |t: Territory| routes.get(&t).is_some_and(|r| r.convoyed);

        for (&t, order) in self.orders {
            match order.action {
                Action::Move => {
                    s.defend[t] = 1;
                    if routes.get(&t).is_some_and(|r| r.path) {
                        s.attack[t] = 1;
                        s.prevent[t] = 1;

                        let occupied = order
                            .target_territory()
                            .and_then(|t2| Some((t2, self.orders.get(&t2)?)));
                        if let Some((t2, o2)) = occupied {
                            let swap = head_to_head(t, order, o2, convoyed(t), convoyed(t2));
                            let d2 = state.get(&t2).copied();
                            // Only an occupant moving elsewhere has a decision we depend on.
                            let leaves = o2.is_move() && !swap && d2.is_some_and(Decision::succeeded);
                            if !leaves && self.power_at(t) == self.power_at(t2) {
                                s.attack[t] = 0;
                            }
                            if swap && d2.is_some_and(Decision::succeeded) {
                                s.prevent[t] = 0;
                            }
                        }
                    }
                    if let Some(d) = state.get(&t) {
                        s.hold[t] = if d.succeeded() { 0 } else { 1 };
                    }
                }
                Action::Hold | Action::Support | Action::Convoy => s.hold[t] = 1,
                _ => {}
            }
        }
        s
    }

    fn add_supports(&self, state: &Assignment, routes: &BTreeMap<Territory, Route>, s: &mut Strengths) {
        for (&t, d) in state {
            let Some(order) = self.orders.get(&t) else {
                continue;
            };
            if !d.succeeded() || order.action != Action::Support {
                continue;
            }
            let Some(assisted) = order.assist_territory() else {
                continue;
            };
            let Some(t2) = order.target_territory() else {
                s.hold[assisted] += 1;
                continue;
            };

            if s.attack[assisted] > 0 {
                let counts = match self.orders.get(&t2) {
                    None => true,
                    Some(o2) => {
                        let c2 = routes.get(&t2).is_some_and(|r| r.convoyed);
                        let leaving = Self::is_success(state, t2)
                            && o2.is_move()
                            && !head_to_head(t, order, o2, false, c2);
                        leaving || self.power_at(t) != self.power_at(t2)
                    }
                };
                if counts {
                    s.attack[assisted] += 1;
                }
            }
            if s.defend[assisted] > 0 {
                s.defend[assisted] += 1;
            }
            if s.prevent[assisted] > 0 {
                s.prevent[assisted] += 1;
            }
        }
    }

    fn attackers(&self, t: Territory) -> Vec<Territory> {
        self.orders
            .iter()
            .filter(|(_, o)| o.is_move() && o.target_territory() == Some(t))
            .map(|(&t2, _)| t2)
            .collect()
    }

    fn consistent(&self, state: &Assignment) -> bool {
        let routes = self.routes(state);
        let mut s = self.base_strengths(state, &routes);
        self.add_supports(state, &routes, &mut s);

        state.iter().all(|(&t, &d)| match self.orders.get(&t).map(|o| o.action) {
            Some(Action::Move) => self.consistent_move(t, d, &s, &routes),
            Some(Action::Support) => self.consistent_support(t, d, &s),
            Some(Action::Hold | Action::Convoy) => self.consistent_hold(t, d, &s),
            _ => true,
        })
    }

    fn consistent_move(&self, t: Territory, d: Decision, s: &Strengths, routes: &BTreeMap<Territory, Route>) -> bool {
        let Some(order) = self.orders.get(&t) else {
            return true;
        };
        let Some(target) = order.target_territory() else {
            return !d.succeeded();
        };
        let route = routes.get(&t).copied().unwrap_or_default();
        let convoyed = |t: Territory| routes.get(&t).is_some_and(|r| r.convoyed);
        let attack = s.attack[t];

        let mut moves = route.path && !self.fails.contains(&t);
        if let Some(o2) = self.orders.get(&target) {
            if head_to_head(t, order, o2, route.convoyed, convoyed(target)) && attack <= s.defend[target] {
                moves = false;
            }
        }
        if attack <= s.hold[target] {
            moves = false;
        }
        let outmatched = self.orders.iter().any(|(&t2, o2)| {
            t2 != t && o2.is_move() && o2.target_territory() == Some(target) && attack <= s.prevent[t2]
        });
        if outmatched {
            moves = false;
        }

        d.succeeded() == moves
    }

    fn consistent_support(&self, t: Territory, d: Decision, s: &Strengths) -> bool {
        let Some(order) = self.orders.get(&t) else {
            return true;
        };
        let target = order.target_territory();
        let attackers = self.attackers(t);

        let dislodged_by_target = target
            .is_some_and(|tt| attackers.contains(&tt) && s.attack[tt] > s.hold[t]);
        let cut_elsewhere = attackers
            .iter()
            .any(|&a| Some(a) != target && s.attack[a] > 0);
        let cut = self.fails.contains(&t) || dislodged_by_target || cut_elsewhere;

        d.succeeded() == !cut
    }

    fn consistent_hold(&self, t: Territory, d: Decision, s: &Strengths) -> bool {
        let mut holds = !self.fails.contains(&t);
        let attackers = self.attackers(t);
        let strongest = attackers
            .iter()
            .map(|&a| (s.attack[a], s.prevent[a], a))
            .max();
        if let Some((strength, _, top)) = strongest {
            let contested = attackers
                .iter()
                .any(|&a| a != top && s.prevent[a] >= strength);
            if strength > s.hold[t] && !contested {
                holds = false;
            }
        }
        (d != Decision::Failure) == holds
    }
}

/// Decides every order of a movement phase.
///
/// The orders are expected to be normalised already: one per unit, each
/// structurally legal.
pub fn adjudicate(orders: &OrderMap, units: &[Unit]) -> Option<Assignment> {
    MovementResolver::new(orders, units).resolve()
}

/// Resolves a movement phase and applies its results to the board.
pub fn resolve_movement(
    current: Phase,
    orders: &[Order],
    units: &[Unit],
    ownership: &Ownership,
) -> Result<PhaseOutcome, AdjudicationError> {
    let mut orders = order_map(orders);
    let Some(decisions) = adjudicate(&orders, units) else {
        error!(phase = %current, orders = orders.len(), "no consistent movement resolution");
        return Err(AdjudicationError::NoConsistentResolution {
            phase: current,
            orders: orders.len(),
        });
    };

    for (t, d) in decisions {
        if let Some(order) = orders.get_mut(&t) {
            order.result = Some(if d.succeeded() {
                OrderResult::Succeeded
            } else {
                OrderResult::Failed
            });
        }
    }

    let units = phase::apply_movement(&mut orders, units);
    Ok(phase::conclude(current, orders.into_values().collect(), units, ownership.clone()))
}
