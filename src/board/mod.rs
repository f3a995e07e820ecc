//! Map, units, orders and phase state.

pub mod adjacency;
pub mod order;
pub mod state;
pub mod territory;
pub mod unit;

pub use adjacency::{borders, bordering_parts, is_adjacent, territory_parts, Subregion, SubregionKind};
pub use order::{Action, Order, OrderResult};
pub use state::{initial_state, GameState, Ownership, Phase, Season};
pub use territory::{Coast, Power, Terrain, Territory, ALL_POWERS, ALL_TERRITORIES, TERRITORY_COUNT};
pub use unit::{Unit, UnitType};
