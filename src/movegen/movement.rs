//! Movement-phase legality: hold, move, support and convoy.

use std::collections::BTreeSet;

use crate::board::adjacency::{bordering_parts, borders, Subregion};
use crate::board::unit::Unit;
use crate::resolve::convoy::{can_convoy, convoying_fleets, find_convoys};

use super::{unit_at, LegalOptions};

/// A unit may always hold.
pub fn hold_options(actor: Subregion, units: &[Unit]) -> LegalOptions {
    let mut options = LegalOptions::new();
    if unit_at(units, actor).is_some() {
        options.insert(None, None);
    }
    options
}

/// Adjacent subregions, plus every coast a convoy cluster could carry an
/// army to.
pub fn move_options(actor: Subregion, units: &[Unit]) -> LegalOptions {
    let mut options = LegalOptions::new();
    let present = units.iter().filter(|u| u.territory() == actor.territory).count();
    let Some(unit) = unit_at(units, actor) else {
        return options;
    };
    if present != 1 {
        return options;
    }

    let mut targets: BTreeSet<Subregion> = borders(actor).iter().copied().collect();
    if unit.is_army() {
        for cluster in find_convoys(units, convoying_fleets(units)) {
            if cluster.coasts.contains(&actor) {
                targets.extend(cluster.coasts.iter().copied());
            }
        }
        targets.remove(&actor);
    }
    for target in targets {
        options.insert(None, Some(target));
    }
    options
}

/// Hold support for any unit next door, move support for any unit that can
/// reach a subregion next door, directly or by convoy.
pub fn support_options(actor: Subregion, units: &[Unit]) -> LegalOptions {
    let mut options = LegalOptions::new();
    if unit_at(units, actor).is_none() {
        return options;
    }
    let adj: BTreeSet<Subregion> = bordering_parts(actor).into_iter().collect();

    for &a in &adj {
        if unit_at(units, a).is_some() {
            options.insert(Some(a), None);
        }
    }

    let attackers: BTreeSet<Subregion> = adj
        .iter()
        .flat_map(|&a| borders(a).iter().copied())
        .filter(|&b| b != actor && unit_at(units, b).is_some())
        .collect();
    for b in attackers {
        for &x in borders(b) {
            if adj.contains(&x) {
                options.insert(Some(b), Some(x));
            }
        }
    }

    // A fleet giving support cannot also be convoying.
    let fleets = convoying_fleets(units).into_iter().filter(|&f| f != actor);
    let armies: Vec<Subregion> = units
        .iter()
        .filter(|u| u.is_army() && u.subregion != actor)
        .map(|u| u.subregion)
        .collect();
    for cluster in find_convoys(units, fleets) {
        for &army in armies.iter().filter(|a| cluster.coasts.contains(a)) {
            for &x in cluster.coasts.intersection(&adj) {
                if x != army {
                    options.insert(Some(army), Some(x));
                }
            }
        }
    }
    options
}

/// Any army on the fleet's cluster coasts, to any other coast of the cluster.
pub fn convoy_options(actor: Subregion, units: &[Unit]) -> LegalOptions {
    let mut options = LegalOptions::new();
    if unit_at(units, actor).is_none() || !can_convoy(actor) {
        return options;
    }
    let Some(cluster) = find_convoys(units, convoying_fleets(units))
        .into_iter()
        .find(|c| c.fleets.contains(&actor))
    else {
        return options;
    };

    let armies = units
        .iter()
        .filter(|u| u.is_army() && cluster.coasts.contains(&u.subregion));
    for army in armies {
        for &x in &cluster.coasts {
            if x != army.subregion {
                options.insert(Some(army.subregion), Some(x));
            }
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::territory::{Coast, Power, Territory::*};

    fn army(t: crate::board::Territory) -> Unit {
        Unit::new(Power::France, Subregion::land(t))
    }

    fn fleet(t: crate::board::Territory) -> Unit {
        Unit::new(Power::England, Subregion::sea(t))
    }

    #[test]
    fn army_moves_by_land() {
        let units = vec![army(Par)];
        let options = move_options(Subregion::land(Par), &units);
        let targets: Vec<_> = options.targets(None).collect();
        assert_eq!(targets.len(), 4);
        assert!(options.permits(None, Some(Subregion::land(Bur))));
        assert!(!options.permits(None, Some(Subregion::land(Mar))));
    }

    #[test]
    fn army_gains_convoy_destinations() {
        let units = vec![army(Lon), fleet(Nth)];
        let options = move_options(Subregion::land(Lon), &units);
        assert!(options.permits(None, Some(Subregion::land(Nwy))));
        assert!(options.permits(None, Some(Subregion::land(Bel))));
        assert!(!options.permits(None, Some(Subregion::land(Lon))));
    }

    #[test]
    fn fleet_on_split_coast_moves_along_that_coast() {
        let units = vec![Unit::new(Power::Russia, Subregion::coast(Stp, Coast::South))];
        let options = move_options(Subregion::coast(Stp, Coast::South), &units);
        assert!(options.permits(None, Some(Subregion::sea(Bot))));
        assert!(!options.permits(None, Some(Subregion::sea(Bar))));
    }

    #[test]
    fn support_into_reachable_subregions() {
        let units = vec![army(Mun), army(Vie), army(Boh)];
        let options = support_options(Subregion::land(Mun), &units);
        assert!(options.permits(Some(Subregion::land(Boh)), None));
        assert!(options.permits(Some(Subregion::land(Vie)), Some(Subregion::land(Tyr))));
        assert!(options.permits(Some(Subregion::land(Vie)), Some(Subregion::land(Boh))));
        assert!(!options.permits(Some(Subregion::land(Vie)), Some(Subregion::land(Gal))));
    }

    #[test]
    fn support_for_convoyed_army() {
        let units = vec![army(Lon), fleet(Nth), Unit::new(Power::France, Subregion::land(Hol))];
        let options = support_options(Subregion::land(Hol), &units);
        assert!(options.permits(Some(Subregion::land(Lon)), Some(Subregion::land(Bel))));
    }

    #[test]
    fn convoy_only_from_open_sea() {
        let units = vec![army(Lon), fleet(Nth), fleet(Eng), Unit::new(Power::England, Subregion::sea(Wal))];
        let options = convoy_options(Subregion::sea(Nth), &units);
        assert!(options.permits(Some(Subregion::land(Lon)), Some(Subregion::land(Bre))));
        assert!(!options.permits(Some(Subregion::land(Lon)), Some(Subregion::land(Lon))));
        assert!(convoy_options(Subregion::sea(Wal), &units).is_empty());
    }
}
