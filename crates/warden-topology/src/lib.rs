//! Replica-Set Topology Model
//!
//! Plain data for the two inventories replset-warden reconciles:
//!
//! - **Cloud instances**: virtual machines tagged as belonging to a replica
//!   set, with lifecycle state and (when running) IP and availability zone.
//! - **Replica members**: the database's own view of the replica set, merged
//!   from the runtime status document and the stored configuration document.
//!
//! The two inventories are joined by IP: a member's `host` equals the IP of
//! the instance backing it.
//!
//! Nothing in this crate performs I/O. Every value is rebuilt from scratch on
//! each fetch and discarded afterwards.

mod error;
mod instance;
mod ip;
mod member;
mod views;

pub use error::{Result, TopologyError};
pub use instance::{CloudInstance, InstanceState, Role};
pub use ip::is_valid_ipv4;
pub use member::{placement_tags, split_host_port, ReplicaMember, Tags, ALL_TAG, AZ_TAG};
pub use views::{merge_members, ConfigEntry, ReplicaConfig, ReplicaStatus, StatusEntry};

/// Port new members are registered with.
pub const DEFAULT_MEMBER_PORT: u16 = 27017;
