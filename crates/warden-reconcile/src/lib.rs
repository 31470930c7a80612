//! Replica-Set Reconciliation
//!
//! Keeps a replica set's membership and placement tags in line with the
//! cloud instances meant to back it.
//!
//! # Flow
//!
//! ```text
//! LeadershipGate ─▶ fetch (inventory + replica set) ─▶ passes ─┬─▶ converged
//!                         ▲                                    │
//!                         └──── refetch ◀── ConfigWriter ◀─────┘ one write
//! ```
//!
//! 1. Only the writable leader proceeds; elsewhere the run is a clean no-op.
//! 2. Both inventories are fetched into an immutable [`Snapshot`].
//! 3. [`run_passes`] classifies drift. Untagged members and unregistered
//!    instances are corrected, one write per pass. Dead members and wrong
//!    tags only produce warnings.
//! 4. After a write everything is refetched and the passes run again,
//!    bounded by [`Settings::max_config_updates`].
//!
//! The outcome is a [`Report`] whose [`Severity`] maps onto the scheduler's
//! exit codes. Every [`Error`] is a disaster.

mod error;
mod gate;
mod mutation;
mod passes;
mod ports;
mod reconciler;
mod report;
mod snapshot;
mod writer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{Error, Result};
pub use gate::{check_leadership, Leadership};
pub use mutation::{Mutation, NewMember};
pub use passes::{next_member_id, run_passes, PassOutcome};
pub use ports::{InventorySource, ReplicaSetSource};
pub use reconciler::{Outcome, Reconciler, Settings, Step, DEFAULT_MAX_CONFIG_UPDATES};
pub use report::{Event, EventLevel, Report, Severity};
pub use snapshot::Snapshot;
pub use writer::{apply_mutation, ConfigWriter};
