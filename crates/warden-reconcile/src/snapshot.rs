//! Immutable view of both inventories, fetched fresh for every pass.

use crate::error::Result;
use crate::ports::{InventorySource, ReplicaSetSource};
use warden_topology::{merge_members, CloudInstance, ReplicaMember};

/// Cloud instances and replica members as fetched at one moment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub instances: Vec<CloudInstance>,
    pub members: Vec<ReplicaMember>,
}

impl Snapshot {
    pub fn new(instances: Vec<CloudInstance>, members: Vec<ReplicaMember>) -> Self {
        Self { instances, members }
    }

    /// Fetch both inventories.
    ///
    /// Instances are validated before anything else: a running instance
    /// without usable placement aborts the fetch.
    pub fn fetch<I, R>(inventory: &I, replica_set: &R, replica_set_tag: &str) -> Result<Self>
    where
        I: InventorySource + ?Sized,
        R: ReplicaSetSource + ?Sized,
    {
        let instances = inventory.list_instances(replica_set_tag)?;
        for instance in &instances {
            instance.validate()?;
        }

        let status = replica_set.status()?;
        let config = replica_set.config()?;
        let members = merge_members(&status, &config)?;

        tracing::debug!(
            instances = instances.len(),
            members = members.len(),
            "fetched inventories"
        );
        Ok(Self { instances, members })
    }

    /// Line-oriented description of both inventories for the audit log.
    pub fn audit_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.instances.len() + self.members.len() + 2);
        lines.push(format!("Cloud instance info ({}):", self.instances.len()));
        lines.extend(self.instances.iter().map(|i| format!("  {}", i)));
        lines.push(format!("Replica set info ({}):", self.members.len()));
        lines.extend(self.members.iter().map(|m| format!("  {}", m)));
        lines
    }
}
