//! Collaborator boundaries.
//!
//! The reconciler only depends on these data contracts. How an adapter
//! talks to its backend (SDK, HTTP, subprocess) is its own business, as is
//! its timeout policy: calls are blocking and the core never times them out.

use crate::error::Result;
use warden_topology::{CloudInstance, ReplicaConfig, ReplicaStatus};

/// Source of cloud instances belonging to a replica set.
pub trait InventorySource {
    /// List instances whose inventory tag names `replica_set`.
    ///
    /// An empty list means no instances were found. An unreachable backend
    /// must be an error, never an empty list.
    fn list_instances(&self, replica_set: &str) -> Result<Vec<CloudInstance>>;
}

/// Read side of the replica-set runtime.
pub trait ReplicaSetSource {
    /// Whether the answering node is the writable leader.
    fn is_leader(&self) -> Result<bool>;

    /// Live status: membership, health, state, self flag.
    fn status(&self) -> Result<ReplicaStatus>;

    /// Stored configuration: tags and priority, in positional order.
    fn config(&self) -> Result<ReplicaConfig>;
}
