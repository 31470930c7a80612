//! Replica-set members as seen by the database.

use crate::error::{Result, TopologyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Member tags: placement metadata keyed by tag name.
pub type Tags = BTreeMap<String, String>;

/// Blanket marker tag every managed member carries (`all: "all"`).
pub const ALL_TAG: &str = "all";

/// Availability-zone tag.
pub const AZ_TAG: &str = "az";

/// The tag set a member in `zone` should carry.
pub fn placement_tags(zone: &str) -> Tags {
    let mut tags = Tags::new();
    tags.insert(ALL_TAG.to_string(), ALL_TAG.to_string());
    tags.insert(AZ_TAG.to_string(), zone.to_string());
    tags
}

/// Split a member name into host and port.
pub fn split_host_port(name: &str) -> Result<(String, u16)> {
    let (host, port) = name
        .rsplit_once(':')
        .ok_or_else(|| TopologyError::MalformedName(name.to_string()))?;
    if host.is_empty() {
        return Err(TopologyError::MalformedName(name.to_string()));
    }
    let port = port
        .parse::<u16>()
        .map_err(|_| TopologyError::MalformedName(name.to_string()))?;
    Ok((host.to_string(), port))
}

/// One configured replica-set member, merged from status and configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaMember {
    /// Canonical `host:port` identity
    pub name: String,
    /// Host part of `name` (an IP for managed members)
    pub host: String,
    /// Port part of `name`
    pub port: u16,
    /// Member id (`_id`), unique within the set
    pub id: u32,
    /// Runtime state (PRIMARY, SECONDARY, (not reachable/healthy), ...)
    pub state: String,
    /// Runtime health flag (1 = up)
    pub health: f64,
    /// Position in the configuration's `members` array
    pub config_index: usize,
    /// Configured tags, `None` if never tagged
    pub tags: Option<Tags>,
    /// Election priority
    pub priority: f64,
    /// Whether this member is the node running the reconciliation
    pub is_self: bool,
}

impl ReplicaMember {
    /// Whether the member carries no tags at all.
    ///
    /// Newer servers report an untagged member as `tags: {}`, older ones
    /// omit the field; both count as untagged.
    pub fn is_untagged(&self) -> bool {
        self.tags.as_ref().map_or(true, Tags::is_empty)
    }

    /// Value of one tag, if set.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }
}

impl fmt::Display for ReplicaMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} id={} state={} health={} idx={} priority={}",
            self.name, self.id, self.state, self.health, self.config_index, self.priority
        )?;
        match &self.tags {
            Some(tags) => {
                f.write_str(" tags={")?;
                for (i, (k, v)) in tags.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("}")?;
            }
            None => f.write_str(" tags=none")?,
        }
        if self.is_self {
            f.write_str(" (self)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(tags: Option<Tags>) -> ReplicaMember {
        ReplicaMember {
            name: "10.0.0.5:27017".to_string(),
            host: "10.0.0.5".to_string(),
            port: 27017,
            id: 0,
            state: "SECONDARY".to_string(),
            health: 1.0,
            config_index: 0,
            tags,
            priority: 1.0,
            is_self: false,
        }
    }

    #[test]
    fn splits_host_and_port() {
        assert_eq!(
            split_host_port("10.0.0.5:27017").unwrap(),
            ("10.0.0.5".to_string(), 27017)
        );
        assert!(split_host_port("10.0.0.5").is_err());
        assert!(split_host_port(":27017").is_err());
        assert!(split_host_port("10.0.0.5:mongo").is_err());
    }

    #[test]
    fn empty_tags_count_as_untagged() {
        assert!(member(None).is_untagged());
        assert!(member(Some(Tags::new())).is_untagged());
        assert!(!member(Some(placement_tags("us-east-1a"))).is_untagged());
    }

    #[test]
    fn tag_lookup() {
        let m = member(Some(placement_tags("us-east-1a")));
        assert_eq!(m.tag(AZ_TAG), Some("us-east-1a"));
        assert_eq!(m.tag("dc"), None);
        assert_eq!(member(None).tag(AZ_TAG), None);
    }

    #[test]
    fn display_lists_tags() {
        let line = member(Some(placement_tags("us-east-1a"))).to_string();
        assert!(line.contains("tags={all:all, az:us-east-1a}"), "{}", line);
        assert!(member(None).to_string().ends_with("tags=none"));
    }
}
