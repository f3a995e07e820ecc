//! Order resolution.
//!
//! Resolves one phase of orders into outcomes and the board that follows.
//! Movement phases go through dependency analysis and a backtracking search
//! over order outcomes; retreats and adjustments are settled directly.

pub mod build;
pub mod convoy;
pub mod dependency;
pub mod movement;
pub mod phase;
pub mod retreat;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Order, Ownership, Phase, Territory, Unit};

pub use movement::{resolve_movement, Decision};
pub use phase::resolve_phase;

/// Orders of a movement or retreat phase, keyed by the acting territory.
pub type OrderMap = BTreeMap<Territory, Order>;

/// Ways adjudicating a phase can fail. No state is changed when they occur.
#[derive(Debug, Error)]
pub enum AdjudicationError {
    #[error("no consistent resolution found for {orders} orders in {phase}")]
    NoConsistentResolution { phase: Phase, orders: usize },
    #[error("illegal order: {order}")]
    IllegalOrder { order: Order },
}

/// Everything a resolved phase produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseOutcome {
    /// The phase that follows the one just resolved.
    pub phase: Phase,
    /// The resolved orders, each carrying its result.
    pub orders: Vec<Order>,
    pub units: Vec<Unit>,
    pub ownership: Ownership,
}

/// Keys orders by the territory of their actor. Later orders for the same
/// territory replace earlier ones, and orders without an actor are skipped.
pub(crate) fn order_map(orders: &[Order]) -> OrderMap {
    orders
        .iter()
        .filter_map(|o| o.territory().map(|t| (t, o.clone())))
        .collect()
}
