//! Error types for warden-reconcile.

use crate::report::Severity;
use thiserror::Error;
use warden_topology::TopologyError;

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Conditions that abort an invocation.
///
/// Every variant is fatal. Recoverable drift is reported through
/// [`crate::Report`] instead and never surfaces as an `Error`.
#[derive(Debug, Error)]
pub enum Error {
    /// Fetched data is inconsistent (unresolvable placement, mismatched views)
    #[error("inconsistent inventory: {0}")]
    Topology(#[from] TopologyError),

    /// The cloud inventory could not be listed
    #[error("cloud inventory unavailable: {0}")]
    Inventory(String),

    /// A replica-set read failed
    #[error("replica set query failed: {0}")]
    ReplicaSet(String),

    /// A configuration write failed or was rejected
    #[error("replica set config write failed: {0}")]
    Write(String),

    /// Corrective writes are not taking effect
    #[error(
        "excessive config updates ({updates} applied, limit {limit}) -- perhaps they aren't \
         working? Perhaps the database isn't fully set up on a new instance yet"
    )]
    NotConverging { updates: u32, limit: u32 },
}

impl Error {
    /// Severity this error maps to.
    pub fn severity(&self) -> Severity {
        Severity::Disaster
    }
}
