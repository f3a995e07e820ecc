//! Diplomacy adjudication library.
//!
//! Exposes the board representation, legality checks and order generation,
//! phase resolution, the order notation and snapshot formats, and the engine
//! used by the command-line binary.

pub mod board;
pub mod engine;
pub mod movegen;
pub mod protocol;
pub mod resolve;
