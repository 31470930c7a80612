//! Error types for the topology model.

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Inconsistencies detected while shaping fetched data.
///
/// All of these mean the fetched data cannot be trusted; none of them is a
/// reconciliation case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// A status entry has no configuration counterpart
    #[error("replica set member {name} appears in rs.status() but not in rs.conf()")]
    MissingConfig { name: String },

    /// A configuration entry has no status counterpart
    #[error("replica set member {host} appears in rs.conf() but not in rs.status()")]
    MissingStatus { host: String },

    /// The same host appears twice in one view
    #[error("replica set member {host} is listed more than once")]
    DuplicateMember { host: String },

    /// A member name is not `host:port`
    #[error("malformed member name '{0}', expected host:port")]
    MalformedName(String),

    /// A running instance without a resolvable IP
    #[error("failed to find IP address of running instance {id}")]
    MissingIp { id: String },

    /// A running instance without an availability zone
    #[error("failed to find availability zone of running instance {id}")]
    MissingZone { id: String },

    /// The provider reported an IP that is not dotted-quad IPv4
    #[error("inventory provided invalid IP '{ip}' for instance {id}")]
    InvalidIp { id: String, ip: String },
}
