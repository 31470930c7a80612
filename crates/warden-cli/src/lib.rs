//! replset-warden
//!
//! Scheduled check that keeps a MongoDB replica set's membership and
//! placement tags in line with the EC2 instances tagged for it. Meant to run
//! from cron on every member; only the primary acts.
//!
//! Exit codes follow the monitoring convention: 0 ok, 1 warning,
//! 2 disaster.

pub mod config;

pub use config::{Cli, ConfigError, FileConfig, WardenConfig};

use std::panic::{self, AssertUnwindSafe};
use warden_reconcile::{
    ConfigWriter, InventorySource, Outcome, Reconciler, ReplicaSetSource, Report, Severity,
};
use warden_sources::{EucaInventory, MongoShell, ProcessRunner};

/// Exit code for runs that could not even start.
pub const DISASTER_EXIT: u8 = 2;

/// Reconcile with the euca2ools and mongo shell adapters.
pub fn run(config: &WardenConfig) -> Report {
    let inventory = EucaInventory::new(ProcessRunner)
        .with_tag_key(&config.tag_key)
        .with_binaries(&config.euca_describe_tags, &config.euca_describe_instances);
    let mut shell = MongoShell::new(ProcessRunner)
        .with_binary(&config.mongo_bin)
        .with_database(&config.database);
    reconcile(config, &inventory, &mut shell)
}

/// Reconcile through arbitrary collaborators.
///
/// Never fails: errors and panics become fatal events in the report.
pub fn reconcile<I, R>(config: &WardenConfig, inventory: &I, replica_set: &mut R) -> Report
where
    I: InventorySource + ?Sized,
    R: ReplicaSetSource + ConfigWriter + ?Sized,
{
    let reconciler = Reconciler::new(config.settings());
    let mut report = Report::new();
    tracing::debug!(replica_set = %config.replica_set, "starting reconciliation");

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        reconciler.run(inventory, replica_set, &mut report)
    }));

    match result {
        Ok(Ok(Outcome::NotLeader)) => {}
        Ok(Ok(Outcome::Converged { config_updates })) => {
            tracing::info!(config_updates, "replica set in line with inventory");
        }
        Ok(Err(e)) => report.fatal(e.to_string()),
        Err(payload) => report.fatal(format!("reconciliation panicked: {}", panic_message(&*payload))),
    }

    if report.severity() != Severity::Ok {
        tracing::debug!(severity = %report.severity(), "finished with problems");
    }
    report
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}
