//! The convergence driver.
//!
//! Each step runs both passes against a fresh snapshot. A step that
//! proposes a write applies it, refetches, and steps again. Decisions are
//! therefore always made against the configuration this process observed
//! last, never against positions that a write may have shifted.

use crate::error::{Error, Result};
use crate::gate::{check_leadership, Leadership};
use crate::mutation::Mutation;
use crate::passes::run_passes;
use crate::ports::{InventorySource, ReplicaSetSource};
use crate::report::Report;
use crate::snapshot::Snapshot;
use crate::writer::{apply_mutation, ConfigWriter};
use warden_topology::DEFAULT_MEMBER_PORT;

/// Corrective writes allowed per invocation before giving up.
pub const DEFAULT_MAX_CONFIG_UPDATES: u32 = 9;

/// Reconciliation settings for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Inventory tag value identifying this replica set
    pub replica_set: String,
    /// Port new members are added with
    pub member_port: u16,
    /// Writes allowed per invocation
    pub max_config_updates: u32,
}

impl Settings {
    pub fn new(replica_set: impl Into<String>) -> Self {
        Self {
            replica_set: replica_set.into(),
            member_port: DEFAULT_MEMBER_PORT,
            max_config_updates: DEFAULT_MAX_CONFIG_UPDATES,
        }
    }
}

/// How an invocation ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Another node leads the replica set; nothing was done
    NotLeader,
    /// No further writes needed after `config_updates` writes
    Converged { config_updates: u32 },
}

/// Verdict of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to write
    Converged,
    /// This write must be applied, then everything refetched
    Mutated(Mutation),
}

/// Drives passes, writes and refetches until the replica set is in line.
#[derive(Debug, Clone)]
pub struct Reconciler {
    settings: Settings,
}

impl Reconciler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// One full invocation: leadership check, fetch, converge.
    pub fn run<I, R>(&self, inventory: &I, replica_set: &mut R, report: &mut Report) -> Result<Outcome>
    where
        I: InventorySource + ?Sized,
        R: ReplicaSetSource + ConfigWriter + ?Sized,
    {
        if check_leadership(&*replica_set)? == Leadership::Follower {
            report.info("Not master. Nothing to do!");
            return Ok(Outcome::NotLeader);
        }

        let snapshot = Snapshot::fetch(inventory, &*replica_set, &self.settings.replica_set)?;
        for line in snapshot.audit_lines() {
            tracing::info!("{}", line);
        }

        let config_updates = self.converge(inventory, replica_set, snapshot, report)?;
        Ok(Outcome::Converged { config_updates })
    }

    /// Run the passes over `snapshot` and record their events.
    pub fn step(&self, snapshot: &Snapshot, report: &mut Report) -> Step {
        let outcome = run_passes(snapshot, self.settings.member_port);
        report.extend(outcome.events);
        match outcome.mutation {
            Some(mutation) => Step::Mutated(mutation),
            None => Step::Converged,
        }
    }

    /// Step until converged, starting from an already fetched snapshot.
    ///
    /// Returns the number of writes applied. Proposing a write once
    /// `max_config_updates` writes have been applied is fatal.
    pub fn converge<I, R>(
        &self,
        inventory: &I,
        replica_set: &mut R,
        snapshot: Snapshot,
        report: &mut Report,
    ) -> Result<u32>
    where
        I: InventorySource + ?Sized,
        R: ReplicaSetSource + ConfigWriter + ?Sized,
    {
        let limit = self.settings.max_config_updates;
        let mut snapshot = snapshot;
        let mut updates = 0u32;

        loop {
            let mutation = match self.step(&snapshot, report) {
                Step::Converged => {
                    tracing::debug!(updates, "replica set converged");
                    return Ok(updates);
                }
                Step::Mutated(mutation) => mutation,
            };

            if updates >= limit {
                return Err(Error::NotConverging { updates, limit });
            }
            apply_mutation(replica_set, &mutation)?;
            updates += 1;
            tracing::info!(updates, kind = mutation.kind(), "config updated, refetching");

            snapshot = Snapshot::fetch(inventory, &*replica_set, &self.settings.replica_set)?;
        }
    }
}
