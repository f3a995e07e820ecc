//! Armies, fleets and the per-phase markers they carry.

use serde::{Deserialize, Serialize};

use super::adjacency::Subregion;
use super::territory::{Power, Territory};

/// The type of a military unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UnitType {
    Army,
    Fleet,
}

impl UnitType {
    /// Returns the uppercase letter used in order notation.
    pub const fn letter(self) -> char {
        match self {
            UnitType::Army => 'A',
            UnitType::Fleet => 'F',
        }
    }

    pub fn from_letter(c: char) -> Option<UnitType> {
        match c.to_ascii_uppercase() {
            'A' => Some(UnitType::Army),
            'F' => Some(UnitType::Fleet),
            _ => None,
        }
    }
}

/// A unit on the board.
///
/// `previous` is the subregion the unit held when the last movement phase
/// started. `displaced_from` and `standoff_from` are only set between a
/// movement phase and the retreat phase that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub power: Power,
    pub subregion: Subregion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<Subregion>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dislodged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub displaced_from: Option<Territory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standoff_from: Option<Territory>,
}

impl Unit {
    /// Creates an undislodged unit with no history.
    pub fn new(power: Power, subregion: Subregion) -> Self {
        Unit {
            power,
            subregion,
            previous: None,
            dislodged: false,
            displaced_from: None,
            standoff_from: None,
        }
    }

    #[inline]
    pub fn territory(&self) -> Territory {
        self.subregion.territory
    }

    #[inline]
    pub fn unit_type(&self) -> UnitType {
        self.subregion.unit_type()
    }

    #[inline]
    pub fn is_army(&self) -> bool {
        self.subregion.is_land()
    }

    /// Drops the retreat markers left over from the previous phase.
    pub fn settle(&mut self) {
        self.dislodged = false;
        self.displaced_from = None;
        self.standoff_from = None;
    }
}
