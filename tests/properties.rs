//! Properties checked over randomly generated, seeded games.

use std::collections::{BTreeSet, VecDeque};

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use adjudicator::board::adjacency::all_subregions;
use adjudicator::board::{initial_state, is_adjacent, territory_parts, GameState, Power, Subregion, Unit, ALL_POWERS};
use adjudicator::movegen::{is_legal, normalize_orders, random_phase_orders};
use adjudicator::resolve::convoy::{can_convoy, convoying_fleets, find_convoys};
use adjudicator::resolve::{resolve_phase, PhaseOutcome};

const SEEDS: u64 = 8;
const PHASES: usize = 10;

fn advance(outcome: &PhaseOutcome) -> GameState {
    GameState {
        phase: outcome.phase,
        units: outcome.units.clone(),
        ownership: outcome.ownership.clone(),
    }
}

/// Plays `PHASES` phases of random legal orders, handing each resolved
/// phase to `check` together with the state it started from.
fn random_game(seed: u64, mut check: impl FnMut(&GameState, &[adjudicator::board::Order], &PhaseOutcome)) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut state = initial_state();
    for _ in 0..PHASES {
        let submitted = random_phase_orders(&state, &mut rng);
        let season = state.phase.season;
        for order in &submitted {
            assert!(is_legal(order, &state.units, &state.ownership, season), "generated illegal {}", order);
        }
        let normalized = normalize_orders(season, &submitted, &state.units, &state.ownership);
        assert!(normalized.rejected.is_empty(), "seed {}: rejected {:?}", seed, normalized.rejected);
        let outcome = resolve_phase(state.phase, &normalized.orders, &state.units, &state.ownership)
            .unwrap_or_else(|e| panic!("seed {}: {}", seed, e));
        check(&state, &normalized.orders, &outcome);
        state = advance(&outcome);
    }
}

#[test]
fn resolution_is_deterministic() {
    for seed in 0..SEEDS {
        random_game(seed, |state, orders, outcome| {
            let again = resolve_phase(state.phase, orders, &state.units, &state.ownership).unwrap();
            assert_eq!(&again, outcome, "seed {} phase {}", seed, state.phase);
        });
    }
}

#[test]
fn same_seed_same_game() {
    let record = |seed| {
        let mut phases = Vec::new();
        random_game(seed, |_, _, outcome| phases.push(outcome.clone()));
        phases
    };
    assert_eq!(record(42), record(42));
}

#[test]
fn no_unit_is_dislodged_by_its_own_faction() {
    for seed in 0..SEEDS {
        random_game(seed, |state, _, outcome| {
            if !state.phase.season.is_movement() {
                return;
            }
            for beaten in outcome.units.iter().filter(|u| u.dislodged) {
                let winner = outcome
                    .units
                    .iter()
                    .find(|u| !u.dislodged && u.territory() == beaten.territory())
                    .expect("a unit took the territory");
                assert_ne!(winner.power, beaten.power, "seed {}: {:?}", seed, beaten);
            }
        });
    }
}

#[test]
fn unit_counts_follow_centers_after_adjustment() {
    for seed in 0..SEEDS {
        random_game(seed, |state, _, outcome| {
            if !state.phase.season.is_adjustment() {
                return;
            }
            for power in ALL_POWERS {
                let units = outcome.units.iter().filter(|u| u.power == power).count();
                assert!(
                    units <= outcome.ownership.supply_centers(power),
                    "seed {}: {} keeps {} units",
                    seed,
                    power,
                    units
                );
            }
        });
    }
}

fn random_board(rng: &mut SmallRng) -> Vec<Unit> {
    let mut seas: Vec<Subregion> = all_subregions().filter(|&s| can_convoy(s)).collect();
    let mut lands: Vec<Subregion> = all_subregions().filter(|s| s.is_land()).collect();
    seas.shuffle(rng);
    lands.shuffle(rng);
    let fleets = rng.gen_range(1..=12);
    let armies = rng.gen_range(1..=8);
    seas.into_iter()
        .take(fleets)
        .chain(lands.into_iter().take(armies))
        .map(|sr| Unit::new(Power::England, sr))
        .collect()
}

#[test]
fn convoy_clusters_are_connected_and_reach_an_army() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..200 {
        let units = random_board(&mut rng);
        let armies: BTreeSet<Subregion> = units.iter().filter(|u| u.is_army()).map(|u| u.subregion).collect();
        let clusters = find_convoys(&units, convoying_fleets(&units));

        let mut seen = BTreeSet::new();
        for cluster in &clusters {
            // Connected under adjacency.
            let start = *cluster.fleets.iter().next().expect("non-empty cluster");
            let mut reached = BTreeSet::from([start]);
            let mut queue = VecDeque::from([start]);
            while let Some(f) = queue.pop_front() {
                for &g in &cluster.fleets {
                    if is_adjacent(f, g) && reached.insert(g) {
                        queue.push_back(g);
                    }
                }
            }
            assert_eq!(reached, cluster.fleets);

            // Maximal: no outside fleet borders the cluster.
            for f in convoying_fleets(&units) {
                if !cluster.fleets.contains(&f) {
                    assert!(cluster.fleets.iter().all(|&g| !is_adjacent(f, g)));
                }
            }

            let coasts: BTreeSet<Subregion> = cluster
                .fleets
                .iter()
                .flat_map(|f| f.borders().iter())
                .flat_map(|b| territory_parts(b.territory).iter().copied())
                .filter(|p| p.is_land())
                .collect();
            assert_eq!(coasts, cluster.coasts);
            assert!(!cluster.coasts.is_disjoint(&armies));

            for &f in &cluster.fleets {
                assert!(seen.insert(f), "fleet {} in two clusters", f);
            }
        }
    }
}
