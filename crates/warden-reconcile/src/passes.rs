//! The two reconciliation passes.
//!
//! Both passes are pure: they look at one [`Snapshot`] and return events
//! plus at most one proposed [`Mutation`]. Pass B only runs when pass A
//! proposed nothing.
//!
//! ```text
//! Pass A (tag correction)      for each member:
//!   no instance with ip == host      → warn (dead or mistagged)
//!   instance found, member untagged  → TagMember, stop
//!   instance found, tags wrong       → warn (never rewritten)
//!
//! Pass B (membership admission) for each running instance:
//!   ip matches a member host        → skip
//!   ip fails the IPv4 gate          → skip silently (still booting)
//!   otherwise                       → AddMember, stop
//! ```

use crate::mutation::{Mutation, NewMember};
use crate::report::Event;
use crate::snapshot::Snapshot;
use warden_topology::{is_valid_ipv4, placement_tags, CloudInstance, ReplicaMember, ALL_TAG, AZ_TAG};

/// Result of one pass over a snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassOutcome {
    /// Diagnostics in the order they were found
    pub events: Vec<Event>,
    /// The write to apply before the next fetch, if any
    pub mutation: Option<Mutation>,
}

impl PassOutcome {
    /// Whether the snapshot needs no write.
    pub fn is_converged(&self) -> bool {
        self.mutation.is_none()
    }
}

/// Run tag correction, then membership admission.
pub fn run_passes(snapshot: &Snapshot, member_port: u16) -> PassOutcome {
    let mut events = Vec::new();
    let mut mutation = correct_tags(snapshot, &mut events);
    if mutation.is_none() {
        mutation = admit_instances(snapshot, member_port, &mut events);
    }
    PassOutcome { events, mutation }
}

/// The running instance whose IP is `host`.
fn backing_instance<'a>(instances: &'a [CloudInstance], host: &str) -> Option<(&'a CloudInstance, &'a str)> {
    instances.iter().find_map(|instance| match instance.placement() {
        Some((ip, zone)) if ip == host => Some((instance, zone)),
        _ => None,
    })
}

fn correct_tags(snapshot: &Snapshot, events: &mut Vec<Event>) -> Option<Mutation> {
    for member in &snapshot.members {
        let Some((instance, zone)) = backing_instance(&snapshot.instances, &member.host) else {
            events.push(Event::warn(format!(
                "The replica set member {} seems to be dead (or not a correctly tagged AWS instance).",
                member.name
            )));
            continue;
        };

        if member.is_untagged() {
            let mutation = Mutation::TagMember {
                member: member.name.clone(),
                config_index: member.config_index,
                tags: placement_tags(zone),
            };
            events.push(Event::info(format!(
                "Tagging replica set member {} ({}) with AZ {}.",
                member.name, instance.id, zone
            )));
            events.push(Event::info(mutation.to_string()));
            return Some(mutation);
        }

        check_tags(member, zone, events);
    }
    None
}

fn check_tags(member: &ReplicaMember, zone: &str, events: &mut Vec<Event>) {
    if member.tag(ALL_TAG) != Some(ALL_TAG) {
        events.push(Event::warn(format!(
            "The replica set member {} isn't tagged with {{all:all}}.",
            member.name
        )));
    }
    if member.tag(AZ_TAG) != Some(zone) {
        events.push(Event::warn(format!(
            "The replica set member {} isn't tagged with the correct availability zone ({}, found {}).",
            member.name,
            zone,
            member.tag(AZ_TAG).unwrap_or("none")
        )));
    }
}

fn admit_instances(snapshot: &Snapshot, member_port: u16, events: &mut Vec<Event>) -> Option<Mutation> {
    for instance in &snapshot.instances {
        let Some((ip, zone)) = instance.placement() else {
            continue;
        };
        if snapshot.members.iter().any(|m| m.host == ip) || !is_valid_ipv4(ip) {
            continue;
        }

        let member = NewMember {
            id: next_member_id(&snapshot.members),
            host: format!("{}:{}", ip, member_port),
            priority: instance.role.member_priority(),
            hidden: instance.role.is_hidden(),
            tags: placement_tags(zone),
        };
        let mutation = Mutation::AddMember(member);
        events.push(Event::info(format!(
            "Adding new instance {} ({}) to replica set!",
            ip, instance.id
        )));
        events.push(Event::info(mutation.to_string()));
        return Some(mutation);
    }
    None
}

/// Id for a new member: one past the largest id in use.
///
/// Ids freed by removed members are not reused.
pub fn next_member_id(members: &[ReplicaMember]) -> u32 {
    members
        .iter()
        .map(|m| m.id)
        .max()
        .map_or(0, |max| max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::EventLevel;
    use warden_topology::{InstanceState, Role, Tags};

    fn member(host: &str, id: u32, config_index: usize, tags: Option<Tags>) -> ReplicaMember {
        ReplicaMember {
            name: format!("{}:27017", host),
            host: host.to_string(),
            port: 27017,
            id,
            state: "SECONDARY".to_string(),
            health: 1.0,
            config_index,
            tags,
            priority: 1.0,
            is_self: false,
        }
    }

    fn warnings(outcome: &PassOutcome) -> usize {
        outcome
            .events
            .iter()
            .filter(|e| e.level == EventLevel::Warn)
            .count()
    }

    #[test]
    fn adds_primary_to_empty_set() {
        let snapshot = Snapshot::new(
            vec![CloudInstance::running("i-1", Role::Primary, "10.0.0.5", "us-east-1a")],
            vec![],
        );
        let outcome = run_passes(&snapshot, 27017);
        assert_eq!(
            outcome.mutation,
            Some(Mutation::AddMember(NewMember {
                id: 0,
                host: "10.0.0.5:27017".to_string(),
                priority: 3,
                hidden: false,
                tags: placement_tags("us-east-1a"),
            }))
        );
        assert_eq!(warnings(&outcome), 0);
    }

    #[test]
    fn tags_untagged_member_at_its_config_index() {
        let snapshot = Snapshot::new(
            vec![CloudInstance::running("i-1", Role::Secondary, "10.0.0.5", "us-east-1b")],
            vec![member("10.0.0.5", 3, 2, None)],
        );
        let outcome = run_passes(&snapshot, 27017);
        assert_eq!(
            outcome.mutation,
            Some(Mutation::TagMember {
                member: "10.0.0.5:27017".to_string(),
                config_index: 2,
                tags: placement_tags("us-east-1b"),
            })
        );
        assert!(outcome.events.iter().any(|e| e.message
            == r#"c.members[2].tags={"all":"all","az":"us-east-1b"}"#));
    }

    #[test]
    fn dead_member_warns_once_without_mutation() {
        let snapshot = Snapshot::new(vec![], vec![member("10.0.0.9", 0, 0, None)]);
        let outcome = run_passes(&snapshot, 27017);
        assert!(outcome.is_converged());
        assert_eq!(warnings(&outcome), 1);
        assert_eq!(
            outcome.events[0].message,
            "The replica set member 10.0.0.9:27017 seems to be dead \
             (or not a correctly tagged AWS instance)."
        );
    }

    #[test]
    fn tagging_takes_precedence_over_admission() {
        let snapshot = Snapshot::new(
            vec![
                CloudInstance::running("i-new", Role::Primary, "10.0.0.7", "us-east-1c"),
                CloudInstance::running("i-1", Role::Secondary, "10.0.0.5", "us-east-1b"),
            ],
            vec![member("10.0.0.5", 0, 0, None)],
        );
        let outcome = run_passes(&snapshot, 27017);
        assert!(matches!(outcome.mutation, Some(Mutation::TagMember { .. })));
    }

    #[test]
    fn wrong_tags_warn_but_are_not_rewritten() {
        let mut tags = Tags::new();
        tags.insert("all".into(), "some".into());
        tags.insert("az".into(), "us-east-1a".into());
        let snapshot = Snapshot::new(
            vec![CloudInstance::running("i-1", Role::Secondary, "10.0.0.5", "us-east-1b")],
            vec![member("10.0.0.5", 0, 0, Some(tags))],
        );
        let outcome = run_passes(&snapshot, 27017);
        assert!(outcome.is_converged());
        assert_eq!(warnings(&outcome), 2);
        assert!(outcome.events[1].message.contains("(us-east-1b, found us-east-1a)"));
    }

    #[test]
    fn role_sets_priority_and_hidden_flag() {
        for (role, priority, hidden) in [
            (Role::Primary, 3, false),
            (Role::Hidden, 0, true),
            (Role::Secondary, 1, false),
        ] {
            let snapshot = Snapshot::new(
                vec![CloudInstance::running("i-1", role, "10.0.0.5", "us-east-1a")],
                vec![],
            );
            match run_passes(&snapshot, 27017).mutation {
                Some(Mutation::AddMember(m)) => {
                    assert_eq!(m.priority, priority, "{:?}", role);
                    assert_eq!(m.hidden, hidden, "{:?}", role);
                }
                other => panic!("expected add-member for {:?}, got {:?}", role, other),
            }
        }
    }

    #[test]
    fn new_ids_skip_past_the_largest() {
        let members = vec![
            member("10.0.0.1", 1, 0, Some(placement_tags("a"))),
            member("10.0.0.2", 2, 1, Some(placement_tags("a"))),
            member("10.0.0.3", 5, 2, Some(placement_tags("a"))),
        ];
        assert_eq!(next_member_id(&members), 6);
        assert_eq!(next_member_id(&[]), 0);
    }

    #[test]
    fn admission_uses_next_id_and_stops_after_one() {
        let snapshot = Snapshot::new(
            vec![
                CloudInstance::running("i-1", Role::Secondary, "10.0.0.1", "a"),
                CloudInstance::running("i-4", Role::Secondary, "10.0.0.4", "a"),
                CloudInstance::running("i-5", Role::Secondary, "10.0.0.5", "b"),
            ],
            vec![member("10.0.0.1", 5, 0, Some(placement_tags("a")))],
        );
        let outcome = run_passes(&snapshot, 27017);
        match outcome.mutation {
            Some(Mutation::AddMember(m)) => {
                assert_eq!(m.id, 6);
                assert_eq!(m.host, "10.0.0.4:27017");
            }
            other => panic!("expected add-member, got {:?}", other),
        }
    }

    #[test]
    fn malformed_ip_is_skipped_silently() {
        let snapshot = Snapshot::new(
            vec![CloudInstance::running("i-1", Role::Primary, "10.0.0", "us-east-1a")],
            vec![],
        );
        let outcome = run_passes(&snapshot, 27017);
        assert!(outcome.is_converged());
        assert!(outcome.events.is_empty());
    }

    #[test]
    fn stopped_instances_neither_match_nor_join() {
        let mut stopped = CloudInstance::idle("i-1", Role::Primary, InstanceState::Stopped);
        stopped.ip = Some("10.0.0.5".into());
        stopped.availability_zone = Some("us-east-1a".into());
        let snapshot = Snapshot::new(
            vec![stopped],
            vec![member("10.0.0.5", 0, 0, Some(placement_tags("us-east-1a")))],
        );
        let outcome = run_passes(&snapshot, 27017);
        assert!(outcome.is_converged());
        assert_eq!(warnings(&outcome), 1);
    }

    #[test]
    fn custom_member_port() {
        let snapshot = Snapshot::new(
            vec![CloudInstance::running("i-1", Role::Secondary, "10.0.0.5", "a")],
            vec![],
        );
        match run_passes(&snapshot, 27018).mutation {
            Some(Mutation::AddMember(m)) => assert_eq!(m.host, "10.0.0.5:27018"),
            other => panic!("expected add-member, got {:?}", other),
        }
    }
}
