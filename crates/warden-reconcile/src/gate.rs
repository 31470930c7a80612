//! Leadership gate.
//!
//! Only the writable leader may mutate the replica-set configuration. On
//! every other node the invocation is a no-op that succeeds.

use crate::error::Result;
use crate::ports::ReplicaSetSource;

/// Whether this process may reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leadership {
    /// The answering node is the writable leader
    Leader,
    /// Some other node leads; nothing to do here
    Follower,
}

/// Ask the runtime whether this node is the writable leader.
pub fn check_leadership<R: ReplicaSetSource + ?Sized>(source: &R) -> Result<Leadership> {
    if source.is_leader()? {
        Ok(Leadership::Leader)
    } else {
        Ok(Leadership::Follower)
    }
}
