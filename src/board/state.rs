//! Phase descriptors, territory ownership and whole-board snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::adjacency::Subregion;
use super::territory::{Coast, Power, Territory, ALL_TERRITORIES};
use super::unit::Unit;

/// The five phases of a game year, in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    SpringMovement,
    SpringRetreat,
    FallMovement,
    FallRetreat,
    Adjustment,
}

impl Season {
    /// The season that follows this one.
    pub const fn next(self) -> Season {
        match self {
            Season::SpringMovement => Season::SpringRetreat,
            Season::SpringRetreat => Season::FallMovement,
            Season::FallMovement => Season::FallRetreat,
            Season::FallRetreat => Season::Adjustment,
            Season::Adjustment => Season::SpringMovement,
        }
    }

    pub const fn is_movement(self) -> bool {
        matches!(self, Season::SpringMovement | Season::FallMovement)
    }

    pub const fn is_retreat(self) -> bool {
        matches!(self, Season::SpringRetreat | Season::FallRetreat)
    }

    pub const fn is_adjustment(self) -> bool {
        matches!(self, Season::Adjustment)
    }

    /// Short tag: S, SR, F, FR or FA.
    pub const fn tag(self) -> &'static str {
        match self {
            Season::SpringMovement => "S",
            Season::SpringRetreat => "SR",
            Season::FallMovement => "F",
            Season::FallRetreat => "FR",
            Season::Adjustment => "FA",
        }
    }
}

/// Identifies one phase of one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Phase {
    pub number: u32,
    pub year: u16,
    pub season: Season,
}

impl Phase {
    pub const fn new(number: u32, year: u16, season: Season) -> Self {
        Phase { number, year, season }
    }

    /// Spring 1901 movement, the first phase of a standard game.
    pub const fn opening() -> Self {
        Phase::new(0, 1901, Season::SpringMovement)
    }

    /// Returns the phase that follows this one. The year only turns over when
    /// the adjustment phase wraps back to spring.
    pub fn advance_season(&self) -> Phase {
        let year = if self.season.is_adjustment() {
            self.year + 1
        } else {
            self.year
        };
        Phase::new(self.number + 1, year, self.season.next())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.season {
            Season::SpringMovement => "Spring movement",
            Season::SpringRetreat => "Spring retreat",
            Season::FallMovement => "Fall movement",
            Season::FallRetreat => "Fall retreat",
            Season::Adjustment => "Winter adjustment",
        };
        write!(f, "{} {} (#{})", name, self.year, self.number)
    }
}

/// Which faction controls each territory. Territories nobody controls are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ownership(BTreeMap<Territory, Power>);

impl Ownership {
    pub fn new() -> Self {
        Ownership(BTreeMap::new())
    }

    /// Ownership at the start of a standard game: every home territory,
    /// supply center or not, belongs to its home faction.
    pub fn initial() -> Self {
        ALL_TERRITORIES
            .iter()
            .filter_map(|&t| t.home().map(|p| (t, p)))
            .collect()
    }

    #[inline]
    pub fn owner(&self, territory: Territory) -> Option<Power> {
        self.0.get(&territory).copied()
    }

    pub fn set(&mut self, territory: Territory, power: Power) {
        self.0.insert(territory, power);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Territory, Power)> + '_ {
        self.0.iter().map(|(&t, &p)| (t, p))
    }

    /// Number of supply centers controlled by `power`.
    pub fn supply_centers(&self, power: Power) -> usize {
        self.iter()
            .filter(|&(t, p)| p == power && t.is_supply_center())
            .count()
    }
}

impl FromIterator<(Territory, Power)> for Ownership {
    fn from_iter<I: IntoIterator<Item = (Territory, Power)>>(iter: I) -> Self {
        Ownership(iter.into_iter().collect())
    }
}

/// Units and ownership at the start of a phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub phase: Phase,
    pub units: Vec<Unit>,
    pub ownership: Ownership,
}

/// Returns the standard opening position.
pub fn initial_state() -> GameState {
    use Territory::*;

    let fleet = Subregion::sea;
    let army = Subregion::land;
    let placements = [
        (Power::Austria, army(Bud)),
        (Power::Austria, fleet(Tri)),
        (Power::Austria, army(Vie)),
        (Power::England, fleet(Edi)),
        (Power::England, fleet(Lon)),
        (Power::England, army(Lvp)),
        (Power::France, fleet(Bre)),
        (Power::France, army(Mar)),
        (Power::France, army(Par)),
        (Power::Germany, army(Ber)),
        (Power::Germany, fleet(Kie)),
        (Power::Germany, army(Mun)),
        (Power::Italy, fleet(Nap)),
        (Power::Italy, army(Rom)),
        (Power::Italy, army(Ven)),
        (Power::Russia, army(Mos)),
        (Power::Russia, fleet(Sev)),
        (Power::Russia, Subregion::coast(Stp, Coast::South)),
        (Power::Russia, army(War)),
        (Power::Turkey, fleet(Ank)),
        (Power::Turkey, army(Con)),
        (Power::Turkey, army(Smy)),
    ];

    GameState {
        phase: Phase::opening(),
        units: placements
            .into_iter()
            .map(|(power, sr)| Unit::new(power, sr))
            .collect(),
        ownership: Ownership::initial(),
    }
}
