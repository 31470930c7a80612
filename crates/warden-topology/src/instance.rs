//! Cloud instances backing a replica set.

use crate::error::{Result, TopologyError};
use crate::ip::is_valid_ipv4;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state reported by the cloud provider.
///
/// Only [`InstanceState::Running`] instances carry placement data. Recently
/// terminated instances keep their tags for a while, so every other state is
/// kept around verbatim for the audit output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
    /// Any state this model has no name for
    Other(String),
}

impl InstanceState {
    /// Whether the instance is running.
    pub fn is_running(&self) -> bool {
        matches!(self, InstanceState::Running)
    }

    /// The provider's spelling of this state.
    pub fn as_str(&self) -> &str {
        match self {
            InstanceState::Pending => "pending",
            InstanceState::Running => "running",
            InstanceState::Stopping => "stopping",
            InstanceState::Stopped => "stopped",
            InstanceState::ShuttingDown => "shutting-down",
            InstanceState::Terminated => "terminated",
            InstanceState::Other(s) => s,
        }
    }
}

impl From<&str> for InstanceState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => InstanceState::Pending,
            "running" => InstanceState::Running,
            "stopping" => InstanceState::Stopping,
            "stopped" => InstanceState::Stopped,
            "shutting-down" => InstanceState::ShuttingDown,
            "terminated" => InstanceState::Terminated,
            other => InstanceState::Other(other.to_string()),
        }
    }
}

impl From<String> for InstanceState {
    fn from(s: String) -> Self {
        InstanceState::from(s.as_str())
    }
}

impl From<InstanceState> for String {
    fn from(state: InstanceState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intended replica-set role, taken from the instance's inventory tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Preferred election candidate
    Primary,
    /// Never elected, invisible to clients
    Hidden,
    /// Ordinary secondary (also the fallback for unknown hints)
    #[default]
    Secondary,
}

impl Role {
    /// Interpret the role hint from an inventory tag.
    ///
    /// Anything other than `primary` or `hidden`, including no hint at all,
    /// is an ordinary secondary.
    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(str::trim) {
            Some(h) if h.eq_ignore_ascii_case("primary") => Role::Primary,
            Some(h) if h.eq_ignore_ascii_case("hidden") => Role::Hidden,
            _ => Role::Secondary,
        }
    }

    /// Election priority a new member with this role is added with.
    pub const fn member_priority(&self) -> u32 {
        match self {
            Role::Primary => 3,
            Role::Hidden => 0,
            Role::Secondary => 1,
        }
    }

    /// Whether a new member with this role is added hidden.
    pub const fn is_hidden(&self) -> bool {
        matches!(self, Role::Hidden)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("primary"),
            Role::Hidden => f.write_str("hidden"),
            Role::Secondary => f.write_str("secondary"),
        }
    }
}

/// One virtual machine tagged as belonging to this replica set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudInstance {
    /// Provider identifier (opaque)
    pub id: String,
    /// Role hint from the inventory tag
    #[serde(default)]
    pub role: Role,
    /// Lifecycle state
    pub state: InstanceState,
    /// IPv4 address, only resolved while running
    #[serde(default)]
    pub ip: Option<String>,
    /// Availability zone, only resolved while running
    #[serde(default)]
    pub availability_zone: Option<String>,
}

impl CloudInstance {
    /// A running instance with placement data.
    pub fn running(id: impl Into<String>, role: Role, ip: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            state: InstanceState::Running,
            ip: Some(ip.into()),
            availability_zone: Some(zone.into()),
        }
    }

    /// An instance in a non-running state. Carries no placement data.
    pub fn idle(id: impl Into<String>, role: Role, state: InstanceState) -> Self {
        Self {
            id: id.into(),
            role,
            state,
            ip: None,
            availability_zone: None,
        }
    }

    /// The IP used to match this instance against replica members.
    ///
    /// `None` unless the instance is running: stale addresses of stopped
    /// instances must never match a member.
    pub fn matchable_ip(&self) -> Option<&str> {
        if self.state.is_running() {
            self.ip.as_deref()
        } else {
            None
        }
    }

    /// The availability zone, only while running.
    pub fn zone(&self) -> Option<&str> {
        if self.state.is_running() {
            self.availability_zone.as_deref()
        } else {
            None
        }
    }

    /// IP and availability zone of a running instance that has both.
    pub fn placement(&self) -> Option<(&str, &str)> {
        Some((self.matchable_ip()?, self.zone()?))
    }

    /// Check that a running instance has a usable network identity.
    ///
    /// A running instance without an IP or zone, or with an IP that is not
    /// IPv4, means the inventory is corrupt.
    pub fn validate(&self) -> Result<()> {
        if !self.state.is_running() {
            return Ok(());
        }
        let ip = match self.ip.as_deref() {
            Some(ip) if !ip.is_empty() => ip,
            _ => return Err(TopologyError::MissingIp { id: self.id.clone() }),
        };
        if !is_valid_ipv4(ip) {
            return Err(TopologyError::InvalidIp {
                id: self.id.clone(),
                ip: ip.to_string(),
            });
        }
        match self.availability_zone.as_deref() {
            Some(zone) if !zone.is_empty() => Ok(()),
            _ => Err(TopologyError::MissingZone { id: self.id.clone() }),
        }
    }
}

impl fmt::Display for CloudInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} role={} state={}", self.id, self.role, self.state)?;
        if let Some(ip) = &self.ip {
            write!(f, " ip={}", ip)?;
        }
        if let Some(zone) = &self.availability_zone {
            write!(f, " az={}", zone)?;
        }
        Ok(())
    }
}
