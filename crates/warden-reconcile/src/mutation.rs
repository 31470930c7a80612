//! Corrective writes against the replica-set configuration.

use serde::Serialize;
use std::fmt;
use warden_topology::Tags;

/// A member to add to the replica set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMember {
    #[serde(rename = "_id")]
    pub id: u32,
    /// `ip:port`
    pub host: String,
    pub priority: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    pub tags: Tags,
}

impl NewMember {
    /// The member document as JSON (also valid shell syntax).
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// The single write a reconciliation pass may propose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Set the tags of an existing member, addressed by config position
    TagMember {
        /// Member name, for diagnostics only
        member: String,
        config_index: usize,
        tags: Tags,
    },
    /// Add an instance as a new member
    AddMember(NewMember),
}

impl Mutation {
    /// Short human label.
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::TagMember { .. } => "tag-member",
            Mutation::AddMember(_) => "add-member",
        }
    }
}

/// Shell notation of the write, as logged before it is applied.
impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::TagMember {
                config_index, tags, ..
            } => {
                let tags = serde_json::to_string(tags).map_err(|_| fmt::Error)?;
                write!(f, "c.members[{}].tags={}", config_index, tags)
            }
            Mutation::AddMember(member) => {
                let doc = member.to_json().map_err(|_| fmt::Error)?;
                write!(f, "rs.add({})", doc)
            }
        }
    }
}
