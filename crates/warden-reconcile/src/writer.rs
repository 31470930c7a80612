//! ConfigWriter: the write side of the replica-set runtime.
//!
//! Each call is one administrative unit: it either applies completely or
//! returns an error. A failure after a partial application (config read,
//! write refused) is surfaced as-is; the caller never retries a write.

use crate::error::Result;
use crate::mutation::{Mutation, NewMember};
use warden_topology::Tags;

/// Applies corrective writes to the replica-set configuration.
///
/// Writes take `&mut self` so a process can never have two in flight.
pub trait ConfigWriter {
    /// Re-read the live configuration, set `members[config_index].tags`,
    /// and write the configuration back.
    fn update_member_tags(&mut self, config_index: usize, tags: &Tags) -> Result<()>;

    /// Add a member.
    fn add_member(&mut self, member: &NewMember) -> Result<()>;
}

/// Apply one mutation through `writer`.
pub fn apply_mutation<W: ConfigWriter + ?Sized>(writer: &mut W, mutation: &Mutation) -> Result<()> {
    tracing::debug!(kind = mutation.kind(), "applying config write");
    match mutation {
        Mutation::TagMember {
            config_index, tags, ..
        } => writer.update_member_tags(*config_index, tags),
        Mutation::AddMember(member) => writer.add_member(member),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeReplicaSet, RecordedWrite};
    use warden_topology::placement_tags;

    #[test]
    fn dispatches_tag_writes() {
        let mut rs = FakeReplicaSet::leader().with_member("10.0.0.1:27017", 0, None);
        let mutation = Mutation::TagMember {
            member: "10.0.0.1:27017".into(),
            config_index: 0,
            tags: placement_tags("us-east-1a"),
        };
        apply_mutation(&mut rs, &mutation).unwrap();
        assert_eq!(
            rs.writes(),
            [RecordedWrite::Tags {
                config_index: 0,
                tags: placement_tags("us-east-1a")
            }]
        );
    }

    #[test]
    fn dispatches_adds_and_propagates_failures() {
        let mut rs = FakeReplicaSet::leader();
        rs.fail_writes("not primary");
        let member = NewMember {
            id: 0,
            host: "10.0.0.5:27017".into(),
            priority: 1,
            hidden: false,
            tags: placement_tags("us-east-1a"),
        };
        assert!(apply_mutation(&mut rs, &Mutation::AddMember(member)).is_err());
        assert!(rs.writes().is_empty());
    }
}
