//! Replica-set access through the mongo shell.
//!
//! Every call is one `mongo <database> --quiet --eval <script>` run whose
//! script ends in `printjson(...)`. Reads decode the printed document into
//! the topology views; writes check the command reply's `ok` field.

use crate::error::{Error, Result};
use crate::runner::{CommandLine, CommandRunner};
use crate::shell_json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use warden_reconcile::{ConfigWriter, Error as ReconcileError, NewMember, ReplicaSetSource};
use warden_topology::{ReplicaConfig, ReplicaStatus, Tags};

/// Default database the shell connects to.
pub const DEFAULT_DATABASE: &str = "local";

#[derive(Debug, Deserialize)]
struct IsMasterReply {
    #[serde(default)]
    ismaster: bool,
}

/// [`ReplicaSetSource`] and [`ConfigWriter`] backed by the mongo shell.
#[derive(Debug)]
pub struct MongoShell<R> {
    runner: R,
    binary: String,
    database: String,
}

impl<R: CommandRunner> MongoShell<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            binary: "mongo".to_string(),
            database: DEFAULT_DATABASE.to_string(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    fn command(&self, script: String) -> CommandLine {
        CommandLine::new(&self.binary)
            .arg(&self.database)
            .arg("--quiet")
            .arg("--eval")
            .arg(script)
    }

    /// Evaluate `expr` and decode the document it prints.
    ///
    /// A document with `ok` other than 1 is the server refusing the
    /// command, whatever shape the caller expected.
    pub fn eval<T: DeserializeOwned>(&self, expr: &str) -> Result<T> {
        let output = self.runner.run(&self.command(format!("printjson({})", expr)))?;
        let doc: Value = shell_json::decode(expr, &output)?;
        check_ok(expr, &doc)?;
        serde_json::from_value(doc).map_err(|source| Error::Json {
            what: expr.to_string(),
            source,
        })
    }

    /// Evaluate a write and require an `ok: 1` reply.
    fn eval_write(&self, what: &str, expr: &str) -> Result<()> {
        let output = self.runner.run(&self.command(format!("printjson({})", expr)))?;
        let doc: Value = shell_json::decode(what, &output)?;
        if doc.get("ok").is_none() {
            return Err(Error::malformed(what, "reply has no ok field"));
        }
        check_ok(what, &doc)
    }

    /// Set the tags of `members[config_index]` and reconfigure.
    ///
    /// The configuration is re-read inside the same script so the write
    /// carries the live config version.
    pub fn set_member_tags(&self, config_index: usize, tags: &Tags) -> Result<()> {
        let tags = serde_json::to_string(tags).map_err(|source| Error::Json {
            what: "member tags".to_string(),
            source,
        })?;
        let expr = format!(
            "(function () {{ var c = rs.conf(); c.members[{}].tags = {}; return rs.reconfig(c); }})()",
            config_index, tags
        );
        self.eval_write("rs.reconfig", &expr)
    }

    /// Add `member` to the replica set.
    pub fn add(&self, member: &NewMember) -> Result<()> {
        let doc = member.to_json().map_err(|source| Error::Json {
            what: "new member".to_string(),
            source,
        })?;
        self.eval_write("rs.add", &format!("rs.add({})", doc))
    }
}

fn check_ok(what: &str, doc: &Value) -> Result<()> {
    match doc.get("ok").and_then(Value::as_f64) {
        Some(ok) if ok != 1.0 => Err(Error::Rejected {
            what: what.to_string(),
            message: doc
                .get("errmsg")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_string(),
        }),
        _ => Ok(()),
    }
}

impl<R: CommandRunner> ReplicaSetSource for MongoShell<R> {
    fn is_leader(&self) -> warden_reconcile::Result<bool> {
        self.eval::<IsMasterReply>("db.isMaster()")
            .map(|reply| reply.ismaster)
            .map_err(|e| ReconcileError::ReplicaSet(e.to_string()))
    }

    fn status(&self) -> warden_reconcile::Result<ReplicaStatus> {
        self.eval("rs.status()")
            .map_err(|e| ReconcileError::ReplicaSet(e.to_string()))
    }

    fn config(&self) -> warden_reconcile::Result<ReplicaConfig> {
        self.eval("rs.conf()")
            .map_err(|e| ReconcileError::ReplicaSet(e.to_string()))
    }
}

impl<R: CommandRunner> ConfigWriter for MongoShell<R> {
    fn update_member_tags(&mut self, config_index: usize, tags: &Tags) -> warden_reconcile::Result<()> {
        self.set_member_tags(config_index, tags)
            .map_err(|e| ReconcileError::Write(e.to_string()))
    }

    fn add_member(&mut self, member: &NewMember) -> warden_reconcile::Result<()> {
        self.add(member)
            .map_err(|e| ReconcileError::Write(e.to_string()))
    }
}
