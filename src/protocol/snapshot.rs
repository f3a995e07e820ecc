//! JSON snapshots of a game between phases.
//!
//! A snapshot is what the command-line tool reads and writes: the phase about
//! to be played, the units and ownership at its start, and the orders
//! submitted for it. After adjudication the snapshot for the next phase also
//! carries the resolved orders of the phase that led to it.
//!
//! ```json
//! {
//!   "phase": { "number": 0, "year": 1901, "season": "spring_movement" },
//!   "units": [{ "power": "england", "subregion": "lon.s" }],
//!   "ownership": { "lon": "england" },
//!   "orders": ["england: F lon - eng"]
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::order::Order;
use crate::board::state::{GameState, Ownership, Phase};
use crate::board::territory::Territory;
use crate::board::unit::Unit;
use crate::resolve::PhaseOutcome;

use super::notation::{format_line, parse_line, NotationError};

/// Errors that can occur when reading a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad order '{line}': {source}")]
    Notation {
        line: String,
        #[source]
        source: NotationError,
    },

    #[error("two units stand in {0}")]
    Crowded(Territory),

    #[error("dislodged unit in {territory} outside a retreat phase")]
    StrayDislodged { territory: Territory },
}

/// An order as submitted: a notation line or a full order record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderEntry {
    Written(String),
    Structured(Order),
}

impl OrderEntry {
    pub fn to_order(&self) -> Result<Order, SnapshotError> {
        match self {
            OrderEntry::Written(line) => parse_line(line).map_err(|source| SnapshotError::Notation {
                line: line.clone(),
                source,
            }),
            OrderEntry::Structured(order) => Ok(order.clone()),
        }
    }
}

impl From<Order> for OrderEntry {
    fn from(order: Order) -> Self {
        OrderEntry::Written(format_line(&order))
    }
}

/// A game position between phases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub units: Vec<Unit>,
    pub ownership: Ownership,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub orders: Vec<OrderEntry>,
    /// Orders of the previous phase with their results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolved: Vec<Order>,
}

impl Snapshot {
    /// A snapshot of `state` with no orders submitted yet.
    pub fn from_state(state: &GameState) -> Self {
        Snapshot {
            phase: state.phase,
            units: state.units.clone(),
            ownership: state.ownership.clone(),
            orders: Vec::new(),
            resolved: Vec::new(),
        }
    }

    /// The snapshot for the phase an outcome leads to.
    pub fn from_outcome(outcome: PhaseOutcome) -> Self {
        Snapshot {
            phase: outcome.phase,
            units: outcome.units,
            ownership: outcome.ownership,
            orders: Vec::new(),
            resolved: outcome.orders,
        }
    }

    /// Parses and validates a snapshot.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Reads a snapshot from a file.
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        Snapshot::from_json(&Snapshot::read_file(path)?)
    }

    /// Reads a file's text, naming the file in the error.
    pub fn read_file(path: &Path) -> Result<String, SnapshotError> {
        fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn state(&self) -> GameState {
        GameState {
            phase: self.phase,
            units: self.units.clone(),
            ownership: self.ownership.clone(),
        }
    }

    /// The submitted orders, with notation lines parsed.
    pub fn orders(&self) -> Result<Vec<Order>, SnapshotError> {
        self.orders.iter().map(OrderEntry::to_order).collect()
    }

    /// Checks that the units can stand where they are.
    ///
    /// Each territory holds at most one unit plus, during a retreat phase,
    /// one dislodged unit.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut standing = BTreeSet::new();
        let mut dislodged = BTreeSet::new();
        for unit in &self.units {
            let t = unit.territory();
            if unit.dislodged {
                if !self.phase.season.is_retreat() {
                    return Err(SnapshotError::StrayDislodged { territory: t });
                }
                if !dislodged.insert(t) {
                    return Err(SnapshotError::Crowded(t));
                }
            } else if !standing.insert(t) {
                return Err(SnapshotError::Crowded(t));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::adjacency::Subregion;
    use crate::board::order::Action;
    use crate::board::state::{initial_state, Season};
    use crate::board::territory::{Power, Territory::*};

    #[test]
    fn reads_mixed_order_forms() {
        let json = r#"{
            "phase": { "number": 0, "year": 1901, "season": "spring_movement" },
            "units": [
                { "power": "england", "subregion": "lon.s" },
                { "power": "france", "subregion": "par.l" }
            ],
            "ownership": { "lon": "england", "par": "france" },
            "orders": [
                "england: F lon - eng",
                { "power": "france", "action": "move", "actor": "par.l", "target": "bur.l" }
            ]
        }"#;
        let snapshot = Snapshot::from_json(json).unwrap();
        let orders = snapshot.orders().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].target, Some(Subregion::sea(Eng)));
        assert_eq!(orders[1].power, Power::France);
        assert_eq!(orders[1].action, Action::Move);
        assert_eq!(snapshot.ownership.owner(Par), Some(Power::France));
    }

    #[test]
    fn bad_order_line_names_the_line() {
        let mut snapshot = Snapshot::from_state(&initial_state());
        snapshot.orders.push(OrderEntry::Written("england: F lon ~ eng".to_string()));
        match snapshot.orders() {
            Err(SnapshotError::Notation { line, source }) => {
                assert_eq!(line, "england: F lon ~ eng");
                assert_eq!(source, NotationError::UnknownAction("~".to_string()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn rejects_crowded_territories() {
        let mut snapshot = Snapshot::from_state(&initial_state());
        snapshot.units.push(Unit::new(Power::France, Subregion::sea(Lon)));
        assert!(matches!(snapshot.validate(), Err(SnapshotError::Crowded(Lon))));
    }

    #[test]
    fn dislodged_units_only_in_retreat_phases() {
        let mut snapshot = Snapshot::from_state(&initial_state());
        let mut beaten = Unit::new(Power::France, Subregion::land(Lvp));
        beaten.dislodged = true;
        snapshot.units.push(beaten);
        assert!(matches!(
            snapshot.validate(),
            Err(SnapshotError::StrayDislodged { territory: Lvp })
        ));
        snapshot.phase = Phase::new(1, 1901, Season::SpringRetreat);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn json_round_trip_keeps_the_opening() {
        let mut snapshot = Snapshot::from_state(&initial_state());
        snapshot
            .orders
            .push(Order::movement(Power::France, Subregion::land(Par), Subregion::land(Bur)).into());
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"france: A par - bur\""));
        assert_eq!(Snapshot::from_json(&json).unwrap(), snapshot);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Snapshot::from_json("{"), Err(SnapshotError::Json(_))));
        let unknown_place = r#"{ "phase": { "number": 0, "year": 1901, "season": "spring_movement" },
            "units": [{ "power": "england", "subregion": "xyz.l" }], "ownership": {} }"#;
        assert!(matches!(Snapshot::from_json(unknown_place), Err(SnapshotError::Json(_))));
    }
}
