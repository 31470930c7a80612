//! Cloud inventory through the euca2ools command line.
//!
//! Two steps, as the tools only offer them separately:
//!
//! 1. `euca-describe-tags` lists every instance carrying the inventory tag;
//!    the tag value `<replica-set>[,<role>]` selects ours.
//! 2. `euca-describe-instances <id>` resolves state, zone and IP for each.
//!
//! Output is tab separated. Instance lines are read positionally and empty
//! columns count, so they are split on single tabs.

use crate::error::{Error, Result};
use crate::runner::{CommandLine, CommandRunner};
use regex::Regex;
use warden_reconcile::{Error as ReconcileError, InventorySource};
use warden_topology::{CloudInstance, InstanceState, Role};

/// Default inventory tag key.
pub const DEFAULT_TAG_KEY: &str = "Replicaset";

const STATE_FIELD: usize = 5;
const ZONE_FIELD: usize = 11;
const IP_FIELD: usize = 17;

/// One `TAG` row of `euca-describe-tags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRow {
    pub instance_id: String,
    pub value: String,
}

/// Parse the `TAG` rows for `tag_key` out of `euca-describe-tags` output.
pub fn parse_tag_rows(output: &str, tag_key: &str) -> Result<Vec<TagRow>> {
    let re = Regex::new(&format!(
        r"(?i)^TAG\t+(\S+)\t+instance\t+{}\t+(\S+)",
        regex::escape(tag_key)
    ))?;
    Ok(output
        .lines()
        .filter_map(|line| re.captures(line))
        .map(|caps| TagRow {
            instance_id: caps[1].to_string(),
            value: caps[2].to_string(),
        })
        .collect())
}

/// Split an inventory tag value into replica-set name and role hint.
///
/// The value is compared case-insensitively, so it is lower-cased first.
pub fn parse_tag_value(value: &str) -> (String, Option<String>) {
    let lowered = value.to_lowercase();
    let mut fields = lowered.split(',');
    let replica_set = fields.next().unwrap_or_default().to_string();
    let role = fields.next().map(str::to_string);
    (replica_set, role)
}

/// Build a [`CloudInstance`] from `euca-describe-instances` output.
///
/// Placement is only read for running instances. Missing placement is kept
/// as `None` for [`CloudInstance::validate`] to reject.
pub fn parse_instance(id: &str, role: Role, output: &str) -> Result<CloudInstance> {
    let line = output
        .lines()
        .find(|l| l.get(..8).is_some_and(|head| head.eq_ignore_ascii_case("INSTANCE")))
        .ok_or_else(|| {
            Error::malformed(
                "euca-describe-instances",
                format!("no INSTANCE line for {}", id),
            )
        })?;
    let fields: Vec<&str> = line.split('\t').collect();
    let field = |index: usize| {
        fields
            .get(index)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    };

    let state = field(STATE_FIELD).ok_or_else(|| {
        Error::malformed(
            "euca-describe-instances",
            format!("failed to find current state of instance {}", id),
        )
    })?;
    let state = InstanceState::from(state);

    if state.is_running() {
        Ok(CloudInstance {
            id: id.to_string(),
            role,
            state,
            ip: field(IP_FIELD),
            availability_zone: field(ZONE_FIELD),
        })
    } else {
        Ok(CloudInstance::idle(id, role, state))
    }
}

/// [`InventorySource`] backed by euca2ools.
#[derive(Debug)]
pub struct EucaInventory<R> {
    runner: R,
    tag_key: String,
    describe_tags: String,
    describe_instances: String,
}

impl<R: CommandRunner> EucaInventory<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            tag_key: DEFAULT_TAG_KEY.to_string(),
            describe_tags: "euca-describe-tags".to_string(),
            describe_instances: "euca-describe-instances".to_string(),
        }
    }

    /// Use a different inventory tag key.
    pub fn with_tag_key(mut self, tag_key: impl Into<String>) -> Self {
        self.tag_key = tag_key.into();
        self
    }

    /// Use different tool binaries.
    pub fn with_binaries(mut self, describe_tags: impl Into<String>, describe_instances: impl Into<String>) -> Self {
        self.describe_tags = describe_tags.into();
        self.describe_instances = describe_instances.into();
        self
    }

    /// Instance ids and roles tagged for `replica_set`.
    pub fn tagged_instances(&self, replica_set: &str) -> Result<Vec<(String, Role)>> {
        let command = CommandLine::new(&self.describe_tags)
            .arg("--filter")
            .arg("resource-type=instance")
            .arg("--filter")
            .arg(format!("key={}", self.tag_key));
        let output = self.runner.run(&command)?;

        let wanted = replica_set.to_lowercase();
        Ok(parse_tag_rows(&output, &self.tag_key)?
            .into_iter()
            .filter_map(|row| {
                let (set, role) = parse_tag_value(&row.value);
                (set == wanted).then(|| (row.instance_id, Role::from_hint(role.as_deref())))
            })
            .collect())
    }

    /// Resolve one instance's state and placement.
    pub fn describe(&self, id: &str, role: Role) -> Result<CloudInstance> {
        let command = CommandLine::new(&self.describe_instances).arg(id);
        let output = self.runner.run(&command)?;
        parse_instance(id, role, &output)
    }

    fn fetch(&self, replica_set: &str) -> Result<Vec<CloudInstance>> {
        let tagged = self.tagged_instances(replica_set)?;
        tracing::debug!(count = tagged.len(), replica_set, "tagged instances");
        tagged
            .iter()
            .map(|(id, role)| self.describe(id, *role))
            .collect()
    }
}

impl<R: CommandRunner> InventorySource for EucaInventory<R> {
    fn list_instances(&self, replica_set: &str) -> warden_reconcile::Result<Vec<CloudInstance>> {
        self.fetch(replica_set)
            .map_err(|e| ReconcileError::Inventory(e.to_string()))
    }
}
