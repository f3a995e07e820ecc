//! Text and JSON formats at the edge of the crate.
//!
//! `notation` reads and writes single orders such as `F lon S F wal - eng`.
//! `snapshot` is the JSON game position consumed and produced by the CLI.

pub mod notation;
pub mod snapshot;

pub use notation::{format_order, format_orders, parse_line, parse_order, parse_orders, parse_unit, NotationError};
pub use snapshot::{OrderEntry, Snapshot, SnapshotError};
