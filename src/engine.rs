//! The adjudication front end.
//!
//! Ties normalisation and resolution together: submitted orders are checked
//! against the position, defaults are filled in, and the phase is resolved.
//! Independent snapshots can be adjudicated in parallel on a rayon pool.

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::board::adjacency::Subregion;
use crate::board::order::{Order, OrderResult};
use crate::board::state::GameState;
use crate::movegen::{legal_orders, normalize_orders};
use crate::protocol::snapshot::{Snapshot, SnapshotError};
use crate::resolve::{resolve_phase, AdjudicationError, PhaseOutcome};

/// Engine settings, loaded from JSON. Missing fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Threads for batch adjudication. 0 lets rayon decide.
    pub threads: usize,
    /// Fail on the first illegal order instead of dropping it.
    pub strict: bool,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(EngineError::Config)
    }

    /// Reads a config file.
    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let data = fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.display().to_string(),
            source,
        })?;
        EngineConfig::from_json(&data)
    }
}

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[source] serde_json::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Adjudication(#[from] AdjudicationError),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A resolved phase together with the submissions that were thrown out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjudication {
    pub outcome: PhaseOutcome,
    pub rejected: Vec<Order>,
}

/// Adjudicates phases according to its config.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Engine { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalises `submitted` against `state` and resolves the phase.
    pub fn adjudicate(&self, state: &GameState, submitted: &[Order]) -> Result<Adjudication, AdjudicationError> {
        let season = state.phase.season;
        let normalized = normalize_orders(season, submitted, &state.units, &state.ownership);
        if self.config.strict {
            if let Some(order) = normalized.rejected.first() {
                return Err(AdjudicationError::IllegalOrder { order: order.clone() });
            }
        }

        let outcome = resolve_phase(state.phase, &normalized.orders, &state.units, &state.ownership)?;
        let succeeded = outcome
            .orders
            .iter()
            .filter(|o| o.result == Some(OrderResult::Succeeded))
            .count();
        info!(
            phase = %state.phase,
            orders = outcome.orders.len(),
            succeeded,
            rejected = normalized.rejected.len(),
            units = outcome.units.len(),
            "adjudicated phase"
        );
        Ok(Adjudication {
            outcome,
            rejected: normalized.rejected,
        })
    }

    /// Adjudicates the orders carried by a snapshot and returns the snapshot
    /// of the next phase.
    pub fn step(&self, snapshot: &Snapshot) -> Result<Snapshot, EngineError> {
        snapshot.validate()?;
        let orders = snapshot.orders()?;
        let adjudication = self.adjudicate(&snapshot.state(), &orders)?;
        Ok(Snapshot::from_outcome(adjudication.outcome))
    }

    /// Steps many independent snapshots in parallel. Results come back in
    /// input order.
    pub fn adjudicate_batch(&self, snapshots: &[Snapshot]) -> Result<Vec<Result<Snapshot, EngineError>>, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()?;
        debug!(threads = pool.current_num_threads(), snapshots = snapshots.len(), "batch adjudication");
        Ok(pool.install(|| snapshots.par_iter().map(|s| self.step(s)).collect()))
    }

    /// Every legal order for whoever may act from `actor` in this snapshot.
    ///
    /// The acting faction is the owner of the unit standing there, or of the
    /// territory when it is an empty build site.
    pub fn options(&self, snapshot: &Snapshot, actor: Subregion) -> Vec<Order> {
        let season = snapshot.phase.season;
        let power = snapshot
            .units
            .iter()
            .find(|u| u.territory() == actor.territory && (u.dislodged || !season.is_retreat()))
            .map(|u| u.power)
            .or_else(|| snapshot.ownership.owner(actor.territory));
        match power {
            Some(power) => legal_orders(power, actor, &snapshot.units, &snapshot.ownership, season),
            None => Vec::new(),
        }
    }
}
