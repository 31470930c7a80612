//! Raw replica-set views and their merge into [`ReplicaMember`] records.
//!
//! The runtime exposes two documents that are read independently:
//!
//! - **status** (`rs.status()`): who is up, who is primary, which entry is us
//! - **configuration** (`rs.conf()`): tags and priority, addressed by position
//!
//! A member must appear in both. Anything else means the views were read at
//! inconsistent moments, which is a fetch fault rather than drift.

use crate::error::{Result, TopologyError};
use crate::member::{split_host_port, ReplicaMember, Tags};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One entry of the status document's `members` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// `host:port`
    pub name: String,
    /// Human-readable state
    #[serde(rename = "stateStr")]
    pub state: String,
    /// 1 if reachable, 0 otherwise
    #[serde(default)]
    pub health: f64,
    /// Member id
    #[serde(rename = "_id")]
    pub id: u32,
    /// Set on the entry describing the node that answered
    #[serde(rename = "self", default)]
    pub is_self: bool,
}

/// The status document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplicaStatus {
    pub members: Vec<StatusEntry>,
}

/// One entry of the configuration document's `members` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// `host:port`
    pub host: String,
    #[serde(default)]
    pub tags: Option<Tags>,
    #[serde(default = "default_priority")]
    pub priority: f64,
}

fn default_priority() -> f64 {
    1.0
}

/// The configuration document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReplicaConfig {
    pub members: Vec<ConfigEntry>,
}

/// Join status and configuration by member name.
///
/// Members come back in status order; `config_index` records each member's
/// position in the configuration array.
pub fn merge_members(status: &ReplicaStatus, config: &ReplicaConfig) -> Result<Vec<ReplicaMember>> {
    let mut by_host: HashMap<&str, (usize, &ConfigEntry)> = HashMap::new();
    for (index, entry) in config.members.iter().enumerate() {
        if by_host.insert(entry.host.as_str(), (index, entry)).is_some() {
            return Err(TopologyError::DuplicateMember {
                host: entry.host.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    let mut members = Vec::with_capacity(status.members.len());
    for entry in &status.members {
        if !seen.insert(entry.name.as_str()) {
            return Err(TopologyError::DuplicateMember {
                host: entry.name.clone(),
            });
        }
        let (config_index, conf) = by_host
            .get(entry.name.as_str())
            .copied()
            .ok_or_else(|| TopologyError::MissingConfig {
                name: entry.name.clone(),
            })?;
        let (host, port) = split_host_port(&entry.name)?;
        members.push(ReplicaMember {
            name: entry.name.clone(),
            host,
            port,
            id: entry.id,
            state: entry.state.clone(),
            health: entry.health,
            config_index,
            tags: conf.tags.clone(),
            priority: conf.priority,
            is_self: entry.is_self,
        });
    }

    if let Some(orphan) = config.members.iter().find(|c| !seen.contains(c.host.as_str())) {
        return Err(TopologyError::MissingStatus {
            host: orphan.host.clone(),
        });
    }

    Ok(members)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::placement_tags;

    fn status(entries: &[(&str, u32)]) -> ReplicaStatus {
        ReplicaStatus {
            members: entries
                .iter()
                .map(|(name, id)| StatusEntry {
                    name: name.to_string(),
                    state: "SECONDARY".to_string(),
                    health: 1.0,
                    id: *id,
                    is_self: false,
                })
                .collect(),
        }
    }

    fn config(hosts: &[&str]) -> ReplicaConfig {
        ReplicaConfig {
            members: hosts
                .iter()
                .map(|host| ConfigEntry {
                    host: host.to_string(),
                    tags: None,
                    priority: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn merges_by_name_and_records_config_position() {
        let status = status(&[("10.0.0.1:27017", 0), ("10.0.0.2:27017", 4)]);
        let mut config = config(&["10.0.0.2:27017", "10.0.0.1:27017"]);
        config.members[0].tags = Some(placement_tags("us-east-1b"));
        config.members[0].priority = 3.0;

        let members = merge_members(&status, &config).unwrap();
        assert_eq!(members.len(), 2);

        assert_eq!(members[0].host, "10.0.0.1");
        assert_eq!(members[0].config_index, 1);
        assert!(members[0].tags.is_none());

        assert_eq!(members[1].id, 4);
        assert_eq!(members[1].config_index, 0);
        assert_eq!(members[1].priority, 3.0);
        assert_eq!(members[1].tags, Some(placement_tags("us-east-1b")));
    }

    #[test]
    fn status_without_config_is_a_fault() {
        let status = status(&[("10.0.0.1:27017", 0), ("10.0.0.2:27017", 1)]);
        let config = config(&["10.0.0.1:27017"]);
        assert_eq!(
            merge_members(&status, &config),
            Err(TopologyError::MissingConfig {
                name: "10.0.0.2:27017".to_string()
            })
        );
    }

    #[test]
    fn config_without_status_is_a_fault() {
        let status = status(&[("10.0.0.1:27017", 0)]);
        let config = config(&["10.0.0.1:27017", "10.0.0.9:27017"]);
        assert_eq!(
            merge_members(&status, &config),
            Err(TopologyError::MissingStatus {
                host: "10.0.0.9:27017".to_string()
            })
        );
    }

    #[test]
    fn duplicate_hosts_are_a_fault() {
        let status = status(&[("10.0.0.1:27017", 0)]);
        let config = config(&["10.0.0.1:27017", "10.0.0.1:27017"]);
        assert!(matches!(
            merge_members(&status, &config),
            Err(TopologyError::DuplicateMember { .. })
        ));
    }

    #[test]
    fn empty_views_merge_to_nothing() {
        let members = merge_members(&ReplicaStatus::default(), &ReplicaConfig::default()).unwrap();
        assert!(members.is_empty());
    }

    #[test]
    fn decodes_server_documents() {
        let status: ReplicaStatus = serde_json::from_str(
            r#"{"set":"rs0","members":[
                {"_id":0,"name":"10.0.0.1:27017","health":1,"state":1,"stateStr":"PRIMARY","self":true},
                {"_id":2,"name":"10.0.0.2:27017","health":0,"state":8,"stateStr":"(not reachable/healthy)"}
            ]}"#,
        )
        .unwrap();
        let config: ReplicaConfig = serde_json::from_str(
            r#"{"_id":"rs0","version":7,"members":[
                {"_id":0,"host":"10.0.0.1:27017","priority":3,"tags":{"all":"all","az":"us-east-1a"}},
                {"_id":2,"host":"10.0.0.2:27017"}
            ]}"#,
        )
        .unwrap();

        let members = merge_members(&status, &config).unwrap();
        assert!(members[0].is_self);
        assert_eq!(members[0].tag("az"), Some("us-east-1a"));
        assert_eq!(members[1].health, 0.0);
        assert_eq!(members[1].priority, 1.0);
        assert!(members[1].is_untagged());
    }
}
