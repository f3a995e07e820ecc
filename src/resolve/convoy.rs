//! Convoy clusters: connected groups of fleets at sea and the coasts they reach.
//!
//! Only fleets standing in open water can convoy. Adjacent convoying fleets are
//! merged with a disjoint-set forest, and each resulting group is reported
//! together with the land subregions of every territory it touches. A group is
//! only worth reporting when at least one army stands on one of those coasts.

use std::collections::{BTreeMap, BTreeSet};

use crate::board::adjacency::{borders, is_adjacent, territory_parts, Subregion};
use crate::board::unit::Unit;

/// Union-find over a fixed set of keys, with path compression and union by rank.
#[derive(Debug, Clone)]
pub struct DisjointSet<K: Ord + Copy> {
    index: BTreeMap<K, usize>,
    keys: Vec<K>,
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl<K: Ord + Copy> DisjointSet<K> {
    /// Creates a forest with each key in its own set. Duplicate keys are merged.
    pub fn new(keys: impl IntoIterator<Item = K>) -> Self {
        let mut set = DisjointSet {
            index: BTreeMap::new(),
            keys: Vec::new(),
            parent: Vec::new(),
            rank: Vec::new(),
        };
        for key in keys {
            if !set.index.contains_key(&key) {
                let i = set.keys.len();
                set.index.insert(key, i);
                set.keys.push(key);
                set.parent.push(i);
                set.rank.push(0);
            }
        }
        set
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn root(&mut self, mut i: usize) -> usize {
        let mut top = i;
        while self.parent[top] != top {
            top = self.parent[top];
        }
        while self.parent[i] != top {
            let next = self.parent[i];
            self.parent[i] = top;
            i = next;
        }
        top
    }

    /// Returns a representative of `key`'s set, or `None` for an unknown key.
    pub fn find(&mut self, key: K) -> Option<K> {
        let i = *self.index.get(&key)?;
        let r = self.root(i);
        Some(self.keys[r])
    }

    /// Merges the sets of `a` and `b`. Returns false if they were already
    /// joined or either key is unknown.
    pub fn union(&mut self, a: K, b: K) -> bool {
        let (Some(&ia), Some(&ib)) = (self.index.get(&a), self.index.get(&b)) else {
            return false;
        };
        let (ra, rb) = (self.root(ia), self.root(ib));
        if ra == rb {
            return false;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
        true
    }

    /// Returns every set, each sorted, ordered by its smallest key.
    pub fn groups(&mut self) -> Vec<Vec<K>> {
        let mut by_root: BTreeMap<usize, Vec<K>> = BTreeMap::new();
        for i in 0..self.keys.len() {
            let r = self.root(i);
            by_root.entry(r).or_default().push(self.keys[i]);
        }
        let mut groups: Vec<Vec<K>> = by_root
            .into_values()
            .map(|mut g| {
                g.sort();
                g
            })
            .collect();
        groups.sort();
        groups
    }
}

/// A connected group of convoying fleets and the land subregions it borders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvoyCluster {
    pub fleets: BTreeSet<Subregion>,
    pub coasts: BTreeSet<Subregion>,
}

impl ConvoyCluster {
    /// True if an army could be carried from `from` to `to` through this cluster.
    pub fn connects(&self, from: Subregion, to: Subregion) -> bool {
        self.coasts.contains(&from) && self.coasts.contains(&to)
    }
}

/// True if a fleet at `sr` is eligible to convoy, that is, it is at sea.
#[inline]
pub fn can_convoy(sr: Subregion) -> bool {
    sr.is_sea() && !sr.territory.has_land()
}

/// Returns the subregions of every fleet on the board that can convoy.
pub fn convoying_fleets(units: &[Unit]) -> Vec<Subregion> {
    units
        .iter()
        .map(|u| u.subregion)
        .filter(|&sr| can_convoy(sr))
        .collect()
}

/// Groups `fleets` into convoy clusters.
///
/// Fleets that cannot convoy are ignored. A cluster is returned only if one of
/// its coasts currently holds an army from `units`. The result is ordered by
/// each cluster's first fleet.
pub fn find_convoys(units: &[Unit], fleets: impl IntoIterator<Item = Subregion>) -> Vec<ConvoyCluster> {
    let fleets: Vec<Subregion> = fleets.into_iter().filter(|&f| can_convoy(f)).collect();
    if fleets.is_empty() {
        return Vec::new();
    }

    let armies: BTreeSet<Subregion> = units
        .iter()
        .filter(|u| u.is_army())
        .map(|u| u.subregion)
        .collect();

    let mut forest = DisjointSet::new(fleets.iter().copied());
    for (i, &a) in fleets.iter().enumerate() {
        for &b in &fleets[i + 1..] {
            if is_adjacent(a, b) {
                forest.union(a, b);
            }
        }
    }

    forest
        .groups()
        .into_iter()
        .filter_map(|group| {
            let coasts: BTreeSet<Subregion> = group
                .iter()
                .flat_map(|&f| borders(f).iter())
                .flat_map(|b| territory_parts(b.territory).iter().copied())
                .filter(|p| p.is_land())
                .collect();
            if coasts.is_disjoint(&armies) {
                return None;
            }
            Some(ConvoyCluster {
                fleets: group.into_iter().collect(),
                coasts,
            })
        })
        .collect()
}

/// True if some cluster of `fleets` carries an army from `from` to `to`.
pub fn convoy_path_exists(
    units: &[Unit],
    fleets: impl IntoIterator<Item = Subregion>,
    from: Subregion,
    to: Subregion,
) -> bool {
    find_convoys(units, fleets)
        .iter()
        .any(|cluster| cluster.connects(from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::territory::{Power, Territory, Territory::*};

    fn army(t: Territory) -> Unit {
        Unit::new(Power::England, Subregion::land(t))
    }

    fn fleet(t: Territory) -> Unit {
        Unit::new(Power::England, Subregion::sea(t))
    }

    #[test]
    fn disjoint_set_merges_and_finds() {
        let mut ds = DisjointSet::new([1, 2, 3, 4, 5]);
        assert!(ds.union(1, 2));
        assert!(ds.union(3, 4));
        assert!(ds.union(2, 4));
        assert!(!ds.union(1, 3));
        assert_eq!(ds.find(1), ds.find(4));
        assert_ne!(ds.find(1), ds.find(5));
        assert_eq!(ds.find(9), None);
        assert_eq!(ds.groups(), vec![vec![1, 2, 3, 4], vec![5]]);
        assert_eq!(ds.len(), 5);
    }

    #[test]
    fn three_fleet_chain_links_london_to_tunis() {
        let units = vec![army(Lon), fleet(Eng), fleet(Mao), fleet(Wes)];
        let clusters = find_convoys(&units, convoying_fleets(&units));
        assert_eq!(clusters.len(), 1);
        let cluster = &clusters[0];
        assert_eq!(cluster.fleets.len(), 3);
        assert!(cluster.connects(Subregion::land(Lon), Subregion::land(Tun)));
        assert!(cluster.connects(Subregion::land(Lon), Subregion::land(Por)));
        assert!(!cluster.connects(Subregion::land(Lon), Subregion::land(Rom)));
    }

    #[test]
    fn coastal_fleets_do_not_convoy() {
        let units = vec![army(Lon), fleet(Wal), fleet(Bre)];
        assert!(find_convoys(&units, convoying_fleets(&units)).is_empty());
        assert!(find_convoys(&units, [Subregion::sea(Wal)]).is_empty());
    }

    #[test]
    fn cluster_without_army_is_dropped() {
        let units = vec![fleet(Nth), army(Mun)];
        assert!(find_convoys(&units, convoying_fleets(&units)).is_empty());
    }

    #[test]
    fn separate_seas_form_separate_clusters() {
        let units = vec![army(Lon), army(Gre), fleet(Nth), fleet(Aeg)];
        let clusters = find_convoys(&units, convoying_fleets(&units));
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.fleets.len() == 1));
    }

    #[test]
    fn no_fleets_no_clusters() {
        let units = vec![army(Lon)];
        assert!(find_convoys(&units, []).is_empty());
        assert!(!convoy_path_exists(&units, [], Subregion::land(Lon), Subregion::land(Bel)));
    }
}
