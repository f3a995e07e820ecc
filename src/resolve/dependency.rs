//! Dependency analysis between movement-phase orders.
//!
//! Whether one order succeeds can hinge on the outcome of another: a move
//! depends on the unit in its target leaving, a support on not being attacked,
//! and so on. These relations are encoded as a small table of predicates over
//! pairs of orders. The resulting graph drives the search order in
//! [`super::movement`], and its strongly connected components expose convoy
//! paradoxes.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::board::adjacency::{borders, is_adjacent};
use crate::board::order::{Action, Order};
use crate::board::territory::Territory;
use crate::board::unit::Unit;

use super::convoy::convoy_path_exists;
use super::OrderMap;

/// A reason why the first order of a pair depends on the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    /// The second order assists the unit of the first.
    Assist,
    /// The second order moves into the first order's territory.
    AttackUs,
    /// The second order supports the unit we support against, into our territory.
    AttackUsFromTarget,
    /// The two units, directly or through the supported unit, swap places.
    HeadToHead,
    /// The second order supports the unit standing in our target to hold.
    HostileAssistHold,
    /// The second order helps someone else into our target.
    HostileAssistCompete,
    /// The unit in our target is moving somewhere other than our territory.
    MoveAway,
}

fn relations(first: Action, second: Action) -> &'static [Relation] {
    use Action::*;
    use Relation::*;
    match (first, second) {
        (Hold, Support) => &[Assist, AttackUs],
        (Hold, Convoy) => &[AttackUs],
        (Move, Move) => &[MoveAway],
        (Move, Support) => &[Assist, HostileAssistCompete, HeadToHead, HostileAssistHold],
        (Move, Convoy) => &[Assist, HostileAssistCompete],
        (Support, Support) => &[Assist, AttackUsFromTarget],
        (Support, Convoy) => &[AttackUs],
        (Convoy, Move) => &[AttackUs],
        (Convoy, Support) => &[Assist],
        _ => &[],
    }
}

/// Compares two optional territories, treating two missing values as unequal.
#[inline]
fn same(a: Option<Territory>, b: Option<Territory>) -> bool {
    a.is_some() && a == b
}

impl Relation {
    fn holds(self, t1: Territory, o1: &Order, t2: Territory, o2: &Order) -> bool {
        match self {
            Relation::Assist => o2.assist_territory() == Some(t1),
            Relation::AttackUs => o2.target_territory() == Some(t1),
            Relation::AttackUsFromTarget => {
                same(o2.assist_territory(), o1.target_territory())
                    && o2.target_territory() == Some(t1)
            }
            Relation::HeadToHead => head_to_head(t1, o1, o2, false, false),
            Relation::HostileAssistHold => {
                same(o2.assist_territory(), o1.target_territory()) && o2.target.is_none()
            }
            Relation::HostileAssistCompete => {
                o2.assist_territory() != Some(t1)
                    && same(o2.target_territory(), o1.target_territory())
            }
            Relation::MoveAway => {
                o1.target_territory() == Some(t2)
                    && (o2.target_territory() != Some(t1) || o1.convoy || o2.convoy)
            }
        }
    }
}

/// True if the move `o1` from `t1` and the unit behind `o2` are trying to
/// swap places over a shared border.
///
/// When `o2` is a support, the supported unit is the one compared against.
/// Either move being convoyed rules the swap out; `c1` and `c2` say whether
/// each side is using a convoy.
pub(crate) fn head_to_head(t1: Territory, o1: &Order, o2: &Order, c1: bool, c2: bool) -> bool {
    let (Some(a1), Some(a2)) = (o1.actor, o2.assist.or(o2.actor)) else {
        return false;
    };
    let t2 = a2.territory;
    if !borders(a1).iter().any(|b| b.territory == t2) {
        return false;
    }
    if !borders(a2).iter().any(|b| b.territory == t1) {
        return false;
    }
    if c1 || c2 {
        return false;
    }
    o2.target_territory() == Some(t1) && o1.target_territory() == Some(t2)
}

/// Directed dependency graph between orders, keyed by the acting territory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    edges: BTreeMap<Territory, Vec<Territory>>,
}

impl Dependencies {
    /// Territories whose orders the order at `t` depends on, in territory order.
    pub fn of(&self, t: Territory) -> &[Territory] {
        self.edges.get(&t).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Territory, &[Territory])> + '_ {
        self.edges.iter().map(|(&t, deps)| (t, deps.as_slice()))
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// Builds the dependency graph for a set of movement orders.
pub fn construct_dependencies(orders: &OrderMap) -> Dependencies {
    let mut edges = BTreeMap::new();
    for (&t1, o1) in orders {
        let deps: Vec<Territory> = orders
            .iter()
            .filter(|&(&t2, o2)| {
                t1 != t2
                    && relations(o1.action, o2.action)
                        .iter()
                        .any(|r| r.holds(t1, o1, t2, o2))
            })
            .map(|(&t2, _)| t2)
            .collect();
        edges.insert(t1, deps);
    }
    Dependencies { edges }
}

struct Tarjan<'a> {
    orders: &'a OrderMap,
    deps: &'a Dependencies,
    low: BTreeMap<Territory, usize>,
    stack: Vec<Territory>,
    paradox: BTreeSet<Territory>,
}

impl Tarjan<'_> {
    fn visit(&mut self, node: Territory) {
        if self.low.contains_key(&node) {
            return;
        }
        let index = self.low.len();
        self.low.insert(node, index);
        let base = self.stack.len();
        self.stack.push(node);

        for &next in self.deps.of(node) {
            self.visit(next);
            let reached = self.low.get(&next).copied().unwrap_or(usize::MAX);
            if let Some(low) = self.low.get_mut(&node) {
                *low = (*low).min(reached);
            }
        }

        if self.low.get(&node) == Some(&index) {
            let component = self.stack.split_off(base);
            if component.len() > 1 {
                for &t in &component {
                    if self.orders.get(&t).map(|o| o.action) == Some(Action::Convoy) {
                        self.paradox.insert(t);
                    }
                }
            }
            // Finished nodes must never lower anyone else's link value.
            for t in component {
                self.low.insert(t, self.orders.len());
            }
        }
    }
}

/// Returns the convoy orders that sit on a dependency cycle.
///
/// Such convoys may be assigned the paradox decision during the search.
pub fn detect_paradox(orders: &OrderMap, deps: &Dependencies) -> BTreeSet<Territory> {
    let mut tarjan = Tarjan {
        orders,
        deps,
        low: BTreeMap::new(),
        stack: Vec::new(),
        paradox: BTreeSet::new(),
    };
    for &t in orders.keys() {
        tarjan.visit(t);
    }
    if !tarjan.paradox.is_empty() {
        debug!(convoys = ?tarjan.paradox, "convoys marked paradoxical");
    }
    tarjan.paradox
}

/// Returns the orders that fail no matter what else happens.
///
/// That covers moves with neither a border nor a matching convoy chain, and
/// supports or convoys whose assisted unit was ordered to do something else.
pub fn immediate_fails(orders: &OrderMap, units: &[Unit]) -> BTreeSet<Territory> {
    let mut fails = BTreeSet::new();
    for (&t, order) in orders {
        let (Some(actor), target) = (order.actor, order.target) else {
            continue;
        };
        let ok = match order.action {
            Action::Move => match target {
                Some(target) if is_adjacent(actor, target) => true,
                Some(target) => {
                    let fleets = orders.values().filter_map(|o| {
                        (o.action == Action::Convoy
                            && o.assist == Some(actor)
                            && o.target == Some(target))
                            .then_some(o.actor)
                            .flatten()
                    });
                    convoy_path_exists(units, fleets, actor, target)
                }
                None => false,
            },
            Action::Support | Action::Convoy => {
                let assisted = order.assist_territory().and_then(|a| orders.get(&a));
                match (assisted, target) {
                    (None, _) => false,
                    (Some(a), Some(target)) => a.action == Action::Move && a.target == Some(target),
                    (Some(a), None) => {
                        matches!(a.action, Action::Hold | Action::Support | Action::Convoy)
                    }
                }
            }
            _ => true,
        };
        if !ok {
            fails.insert(t);
        }
    }
    fails
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::adjacency::Subregion;
    use crate::board::territory::{Power, Territory::*};

    fn map(orders: Vec<Order>) -> OrderMap {
        orders
            .into_iter()
            .filter_map(|o| o.territory().map(|t| (t, o)))
            .collect()
    }

    fn land(t: Territory) -> Subregion {
        Subregion::land(t)
    }

    fn sea(t: Territory) -> Subregion {
        Subregion::sea(t)
    }

    #[test]
    fn move_depends_on_unit_leaving_target() {
        let orders = map(vec![
            Order::movement(Power::Germany, land(Mun), land(Boh)),
            Order::movement(Power::Austria, land(Boh), land(Vie)),
        ]);
        let deps = construct_dependencies(&orders);
        assert_eq!(deps.of(Mun), &[Boh]);
        assert!(deps.of(Boh).is_empty());
    }

    #[test]
    fn swap_is_not_a_move_away() {
        let orders = map(vec![
            Order::movement(Power::Germany, land(Ber), land(Pru)),
            Order::movement(Power::Russia, land(Pru), land(Ber)),
        ]);
        let deps = construct_dependencies(&orders);
        assert_eq!(deps.edge_count(), 0);
    }

    #[test]
    fn support_depends_on_attackers() {
        let orders = map(vec![
            Order::support_hold(Power::Italy, land(Tyr), land(Ven)),
            Order::hold(Power::Italy, land(Ven)),
            Order::movement(Power::Austria, land(Tri), land(Ven)),
        ]);
        let deps = construct_dependencies(&orders);
        // The held unit depends on its support.
        assert_eq!(deps.of(Ven), &[Tyr]);
        // The attacker depends on the hold support into its target.
        assert_eq!(deps.of(Tri), &[Tyr]);
    }

    #[test]
    fn head_to_head_needs_a_shared_border() {
        let a = Order::movement(Power::Germany, land(Ber), land(Pru));
        let b = Order::movement(Power::Russia, land(Pru), land(Ber));
        assert!(head_to_head(Ber, &a, &b, false, false));
        assert!(!head_to_head(Ber, &a, &b, true, false));

        let c = Order::movement(Power::Russia, land(Pru), land(Sil));
        assert!(!head_to_head(Ber, &a, &c, false, false));
    }

    #[test]
    fn convoy_cycle_is_paradoxical() {
        // Pandin's paradox shape: the convoy attacks the fleet supporting
        // the attack on the convoying fleet.
        let orders = map(vec![
            Order::support_move(Power::England, sea(Lon), sea(Wal), sea(Eng)),
            Order::movement(Power::England, sea(Wal), sea(Eng)),
            Order::movement(Power::France, land(Bre), land(Lon)).via_convoy(),
            Order::convoy(Power::France, sea(Eng), land(Bre), land(Lon)),
        ]);
        let deps = construct_dependencies(&orders);
        let paradox = detect_paradox(&orders, &deps);
        assert_eq!(paradox.into_iter().collect::<Vec<_>>(), vec![Eng]);
    }

    #[test]
    fn acyclic_orders_have_no_paradox() {
        let orders = map(vec![
            Order::movement(Power::England, land(Lon), land(Bel)).via_convoy(),
            Order::convoy(Power::England, sea(Nth), land(Lon), land(Bel)),
        ]);
        let deps = construct_dependencies(&orders);
        assert!(detect_paradox(&orders, &deps).is_empty());
    }

    #[test]
    fn unreachable_move_and_mismatched_support_fail_immediately() {
        let units = vec![
            Unit::new(Power::France, land(Par)),
            Unit::new(Power::France, land(Bur)),
            Unit::new(Power::France, land(Gas)),
        ];
        let orders = map(vec![
            Order::movement(Power::France, land(Par), land(Mun)),
            Order::support_move(Power::France, land(Bur), land(Gas), land(Mar)),
            Order::movement(Power::France, land(Gas), land(Spa)),
        ]);
        let fails = immediate_fails(&orders, &units);
        assert!(fails.contains(&Par));
        assert!(fails.contains(&Bur));
        assert!(!fails.contains(&Gas));
    }

    #[test]
    fn hold_support_for_a_mover_fails_immediately() {
        let units = vec![
            Unit::new(Power::Italy, land(Tyr)),
            Unit::new(Power::Italy, land(Ven)),
        ];
        let orders = map(vec![
            Order::support_hold(Power::Italy, land(Tyr), land(Ven)),
            Order::movement(Power::Italy, land(Ven), land(Pie)),
        ]);
        assert!(immediate_fails(&orders, &units).contains(&Tyr));
    }

    #[test]
    fn convoyed_move_with_chain_does_not_fail() {
        let units = vec![
            Unit::new(Power::England, land(Lon)),
            Unit::new(Power::England, sea(Nth)),
        ];
        let orders = map(vec![
            Order::movement(Power::England, land(Lon), land(Bel)).via_convoy(),
            Order::convoy(Power::England, sea(Nth), land(Lon), land(Bel)),
        ]);
        assert!(immediate_fails(&orders, &units).is_empty());
    }
}
