//! Command-line adapters for replset-warden.
//!
//! - [`EucaInventory`]: cloud inventory through `euca-describe-tags` and
//!   `euca-describe-instances`
//! - [`MongoShell`]: replica-set reads and writes through the `mongo` shell
//!
//! Both run their tools through a [`CommandRunner`], so tests can replay
//! recorded output instead of spawning processes.

mod error;
pub mod euca;
pub mod mongo;
mod runner;
pub mod shell_json;

pub use error::{Error, Result};
pub use euca::{EucaInventory, DEFAULT_TAG_KEY};
pub use mongo::{MongoShell, DEFAULT_DATABASE};
#[cfg(test)]
use runner::ScriptedRunner;
pub use runner::{CommandLine, CommandRunner, ProcessRunner};
