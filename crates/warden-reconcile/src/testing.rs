//! In-memory collaborators for tests.

use crate::error::{Error, Result};
use crate::mutation::NewMember;
use crate::ports::{InventorySource, ReplicaSetSource};
use crate::writer::ConfigWriter;
use std::cell::RefCell;
use warden_topology::{
    CloudInstance, ConfigEntry, ReplicaConfig, ReplicaStatus, StatusEntry, Tags,
};

/// Inventory that always returns the same instances.
#[derive(Debug, Default)]
pub struct FakeInventory {
    instances: Vec<CloudInstance>,
    error: Option<String>,
    queried: RefCell<Vec<String>>,
}

impl FakeInventory {
    pub fn new(instances: Vec<CloudInstance>) -> Self {
        Self {
            instances,
            ..Self::default()
        }
    }

    /// An inventory whose backend cannot be reached.
    pub fn unreachable(message: &str) -> Self {
        Self {
            error: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Replica-set tags this inventory was asked about, in order.
    pub fn queried_tags(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }
}

impl InventorySource for FakeInventory {
    fn list_instances(&self, replica_set: &str) -> Result<Vec<CloudInstance>> {
        self.queried.borrow_mut().push(replica_set.to_string());
        match &self.error {
            Some(message) => Err(Error::Inventory(message.clone())),
            None => Ok(self.instances.clone()),
        }
    }
}

/// A write the fake replica set received.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedWrite {
    Tags { config_index: usize, tags: Tags },
    Add(NewMember),
}

/// Replica set held in memory.
///
/// Writes update the stored views unless the fake was made
/// [`ineffective`](FakeReplicaSet::ineffective), which simulates a backend
/// that accepts writes without applying them.
#[derive(Debug)]
pub struct FakeReplicaSet {
    leader: bool,
    status: ReplicaStatus,
    config: ReplicaConfig,
    effective: bool,
    read_error: Option<String>,
    write_error: Option<String>,
    writes: Vec<RecordedWrite>,
}

impl FakeReplicaSet {
    fn empty(leader: bool) -> Self {
        Self {
            leader,
            status: ReplicaStatus::default(),
            config: ReplicaConfig::default(),
            effective: true,
            read_error: None,
            write_error: None,
            writes: Vec::new(),
        }
    }

    /// An empty replica set answered by its leader.
    pub fn leader() -> Self {
        Self::empty(true)
    }

    /// An empty replica set answered by a non-leader.
    pub fn follower() -> Self {
        Self::empty(false)
    }

    /// Add a healthy member to both views.
    pub fn with_member(mut self, name: &str, id: u32, tags: Option<Tags>) -> Self {
        self.push_member(name, id, "SECONDARY", tags, 1.0);
        self
    }

    /// Replace both views.
    pub fn with_views(mut self, status: ReplicaStatus, config: ReplicaConfig) -> Self {
        self.status = status;
        self.config = config;
        self
    }

    /// Accept writes without applying them.
    pub fn ineffective(mut self) -> Self {
        self.effective = false;
        self
    }

    pub fn fail_reads(&mut self, message: &str) {
        self.read_error = Some(message.to_string());
    }

    pub fn fail_writes(&mut self, message: &str) {
        self.write_error = Some(message.to_string());
    }

    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    pub fn config_view(&self) -> &ReplicaConfig {
        &self.config
    }

    fn push_member(&mut self, name: &str, id: u32, state: &str, tags: Option<Tags>, priority: f64) {
        self.status.members.push(StatusEntry {
            name: name.to_string(),
            state: state.to_string(),
            health: 1.0,
            id,
            is_self: self.status.members.is_empty(),
        });
        self.config.members.push(ConfigEntry {
            host: name.to_string(),
            tags,
            priority,
        });
    }

    fn check_read(&self) -> Result<()> {
        match &self.read_error {
            Some(message) => Err(Error::ReplicaSet(message.clone())),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> Result<()> {
        match &self.write_error {
            Some(message) => Err(Error::Write(message.clone())),
            None => Ok(()),
        }
    }
}

impl ReplicaSetSource for FakeReplicaSet {
    fn is_leader(&self) -> Result<bool> {
        self.check_read()?;
        Ok(self.leader)
    }

    fn status(&self) -> Result<ReplicaStatus> {
        self.check_read()?;
        Ok(self.status.clone())
    }

    fn config(&self) -> Result<ReplicaConfig> {
        self.check_read()?;
        Ok(self.config.clone())
    }
}

impl ConfigWriter for FakeReplicaSet {
    fn update_member_tags(&mut self, config_index: usize, tags: &Tags) -> Result<()> {
        self.check_write()?;
        if config_index >= self.config.members.len() {
            return Err(Error::Write(format!("no member at index {}", config_index)));
        }
        self.writes.push(RecordedWrite::Tags {
            config_index,
            tags: tags.clone(),
        });
        if self.effective {
            self.config.members[config_index].tags = Some(tags.clone());
        }
        Ok(())
    }

    fn add_member(&mut self, member: &NewMember) -> Result<()> {
        self.check_write()?;
        self.writes.push(RecordedWrite::Add(member.clone()));
        if self.effective {
            self.push_member(
                &member.host,
                member.id,
                "STARTUP2",
                Some(member.tags.clone()),
                f64::from(member.priority),
            );
        }
        Ok(())
    }
}
