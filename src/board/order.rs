//! Orders for all three kinds of phase.
//!
//! An order is a flat record rather than an enum per action: actor, assist and
//! target are all subregions, and which of them are present depends on the
//! action. This keeps dependency analysis uniform, since every predicate just
//! compares territories of those three slots.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::adjacency::Subregion;
use super::territory::{Power, Territory};

/// The kind of instruction an order gives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Hold,
    Move,
    Support,
    Convoy,
    Build,
    Disband,
    /// An adjustment slot left unused.
    Waive,
}

/// The outcome recorded on an order once its phase is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderResult {
    Succeeded,
    Failed,
    /// The ordered unit was dislodged (a "bounce" in some rule books).
    Dislodged,
    Disbanded,
}

/// A single order.
///
/// * Hold: `actor`.
/// * Move: `actor`, `target`.
/// * Support: `actor`, `assist`, and `target` for a move support.
/// * Convoy: `actor`, `assist` (the army), `target`.
/// * Build / Disband: `actor`.
/// * Waive: nothing.
///
/// `via_convoy` is what the player asked for. `convoy` is set during
/// normalisation when the move will actually be treated as convoyed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Order {
    pub power: Power,
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<Subregion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assist: Option<Subregion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Subregion>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub via_convoy: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub convoy: bool,
    #[serde(default)]
    pub user_issued: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<OrderResult>,
}

impl Order {
    fn new(power: Power, action: Action, actor: Option<Subregion>) -> Self {
        Order {
            power,
            action,
            actor,
            assist: None,
            target: None,
            via_convoy: false,
            convoy: false,
            user_issued: true,
            result: None,
        }
    }

    pub fn hold(power: Power, actor: Subregion) -> Self {
        Order::new(power, Action::Hold, Some(actor))
    }

    pub fn movement(power: Power, actor: Subregion, target: Subregion) -> Self {
        Order {
            target: Some(target),
            ..Order::new(power, Action::Move, Some(actor))
        }
    }

    pub fn support_hold(power: Power, actor: Subregion, assist: Subregion) -> Self {
        Order {
            assist: Some(assist),
            ..Order::new(power, Action::Support, Some(actor))
        }
    }

    pub fn support_move(power: Power, actor: Subregion, assist: Subregion, target: Subregion) -> Self {
        Order {
            assist: Some(assist),
            target: Some(target),
            ..Order::new(power, Action::Support, Some(actor))
        }
    }

    pub fn convoy(power: Power, actor: Subregion, army: Subregion, target: Subregion) -> Self {
        Order {
            assist: Some(army),
            target: Some(target),
            ..Order::new(power, Action::Convoy, Some(actor))
        }
    }

    pub fn build(power: Power, actor: Subregion) -> Self {
        Order::new(power, Action::Build, Some(actor))
    }

    pub fn disband(power: Power, actor: Subregion) -> Self {
        Order::new(power, Action::Disband, Some(actor))
    }

    pub fn waive(power: Power) -> Self {
        Order::new(power, Action::Waive, None)
    }

    /// Marks a move as requesting a convoy.
    pub fn via_convoy(mut self) -> Self {
        self.via_convoy = true;
        self
    }

    /// Marks the order as filled in by the adjudicator rather than a player.
    pub(crate) fn defaulted(mut self) -> Self {
        self.user_issued = false;
        self
    }

    /// The territory the ordered unit stands in.
    #[inline]
    pub fn territory(&self) -> Option<Territory> {
        self.actor.map(|a| a.territory)
    }

    #[inline]
    pub fn target_territory(&self) -> Option<Territory> {
        self.target.map(|t| t.territory)
    }

    #[inline]
    pub fn assist_territory(&self) -> Option<Territory> {
        self.assist.map(|a| a.territory)
    }

    #[inline]
    pub fn is_move(&self) -> bool {
        self.action == Action::Move
    }

    pub fn succeeded(&self) -> bool {
        self.result == Some(OrderResult::Succeeded)
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::protocol::notation::format_order(self))
    }
}
