//! Configuration for replset-warden
//!
//! Each setting is looked up on the command line (or its `WARDEN_*`
//! environment variable), then in the optional TOML file, then falls back
//! to its default.
//!
//! ```toml
//! replica_set = "rs0"
//! max_config_updates = 9
//!
//! [euca]
//! tag_key = "Replicaset"
//!
//! [mongo]
//! binary = "/usr/bin/mongo"
//! database = "local"
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use clap::Parser;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use warden_logging::LogSettings;
use warden_reconcile::{Settings, DEFAULT_MAX_CONFIG_UPDATES};
use warden_sources::{DEFAULT_DATABASE, DEFAULT_TAG_KEY};
use warden_topology::DEFAULT_MEMBER_PORT;

/// Errors resolving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no replica set given (--replica-set, WARDEN_REPLICA_SET or replica_set in the config file)")]
    MissingReplicaSet,

    #[error("invalid setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// replset-warden command line
#[derive(Debug, Default, Parser)]
#[command(name = "replset-warden")]
#[command(about = "Keeps a MongoDB replica set in line with the cloud instances tagged for it", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "WARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Replica set to reconcile, as named by the inventory tag
    #[arg(short = 's', long, env = "WARDEN_REPLICA_SET")]
    pub replica_set: Option<String>,

    /// Inventory tag key [default: Replicaset]
    #[arg(long, env = "WARDEN_TAG_KEY")]
    pub tag_key: Option<String>,

    /// Database the mongo shell connects to [default: local]
    #[arg(long, env = "WARDEN_DATABASE")]
    pub database: Option<String>,

    /// mongo shell binary [default: mongo]
    #[arg(long, env = "WARDEN_MONGO_BIN")]
    pub mongo_bin: Option<String>,

    /// euca-describe-tags binary
    #[arg(long, env = "WARDEN_EUCA_DESCRIBE_TAGS")]
    pub euca_describe_tags: Option<String>,

    /// euca-describe-instances binary
    #[arg(long, env = "WARDEN_EUCA_DESCRIBE_INSTANCES")]
    pub euca_describe_instances: Option<String>,

    /// Port new members are added with [default: 27017]
    #[arg(long, env = "WARDEN_MEMBER_PORT")]
    pub member_port: Option<u16>,

    /// Config writes allowed per run [default: 9]
    #[arg(long, env = "WARDEN_MAX_CONFIG_UPDATES")]
    pub max_config_updates: Option<u32>,

    /// Log level or filter directive [default: info]
    #[arg(long, env = "WARDEN_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "WARDEN_LOG_JSON")]
    pub log_json: bool,
}

/// Contents of the TOML config file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub replica_set: Option<String>,
    pub member_port: Option<u16>,
    pub max_config_updates: Option<u32>,
    pub euca: EucaSection,
    pub mongo: MongoSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EucaSection {
    pub tag_key: Option<String>,
    pub describe_tags: Option<String>,
    pub describe_instances: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MongoSection {
    pub binary: Option<String>,
    pub database: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    pub level: Option<String>,
    pub json: Option<bool>,
}

impl FileConfig {
    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardenConfig {
    pub replica_set: String,
    pub tag_key: String,
    pub database: String,
    pub mongo_bin: String,
    pub euca_describe_tags: String,
    pub euca_describe_instances: String,
    pub member_port: u16,
    pub max_config_updates: u32,
    pub log: LogSettings,
}

impl WardenConfig {
    /// Resolve `cli`, reading the config file it names, if any.
    pub fn resolve(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Combine command line and file settings.
    pub fn merge(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let replica_set = cli
            .replica_set
            .or(file.replica_set)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingReplicaSet)?;
        if replica_set.contains(',') {
            return Err(ConfigError::Invalid {
                name: "replica_set",
                reason: format!("{:?} must not contain ','", replica_set),
            });
        }

        let config = Self {
            replica_set,
            tag_key: cli
                .tag_key
                .or(file.euca.tag_key)
                .unwrap_or_else(|| DEFAULT_TAG_KEY.to_string()),
            database: cli
                .database
                .or(file.mongo.database)
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            mongo_bin: cli
                .mongo_bin
                .or(file.mongo.binary)
                .unwrap_or_else(|| "mongo".to_string()),
            euca_describe_tags: cli
                .euca_describe_tags
                .or(file.euca.describe_tags)
                .unwrap_or_else(|| "euca-describe-tags".to_string()),
            euca_describe_instances: cli
                .euca_describe_instances
                .or(file.euca.describe_instances)
                .unwrap_or_else(|| "euca-describe-instances".to_string()),
            member_port: cli
                .member_port
                .or(file.member_port)
                .unwrap_or(DEFAULT_MEMBER_PORT),
            max_config_updates: cli
                .max_config_updates
                .or(file.max_config_updates)
                .unwrap_or(DEFAULT_MAX_CONFIG_UPDATES),
            log: LogSettings {
                level: cli
                    .log_level
                    .or(file.logging.level)
                    .unwrap_or_else(|| LogSettings::default().level),
                json: cli.log_json || file.logging.json.unwrap_or(false),
            },
        };

        if config.member_port == 0 {
            return Err(ConfigError::Invalid {
                name: "member_port",
                reason: "must not be 0".to_string(),
            });
        }
        if config.tag_key.trim().is_empty() {
            return Err(ConfigError::Invalid {
                name: "tag_key",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(config)
    }

    /// Reconciler settings.
    pub fn settings(&self) -> Settings {
        Settings {
            replica_set: self.replica_set.clone(),
            member_port: self.member_port,
            max_config_updates: self.max_config_updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["replset-warden"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_apply_when_only_the_replica_set_is_given() {
        let config = WardenConfig::resolve(cli(&["--replica-set", "rs0"])).unwrap();
        assert_eq!(config.replica_set, "rs0");
        assert_eq!(config.tag_key, "Replicaset");
        assert_eq!(config.database, "local");
        assert_eq!(config.mongo_bin, "mongo");
        assert_eq!(config.euca_describe_tags, "euca-describe-tags");
        assert_eq!(config.euca_describe_instances, "euca-describe-instances");
        assert_eq!(config.member_port, 27017);
        assert_eq!(config.max_config_updates, 9);
        assert_eq!(config.log, LogSettings::default());
    }

    #[test]
    fn replica_set_is_required() {
        assert!(matches!(
            WardenConfig::resolve(cli(&[])),
            Err(ConfigError::MissingReplicaSet)
        ));
        assert!(matches!(
            WardenConfig::resolve(cli(&["-s", "  "])),
            Err(ConfigError::MissingReplicaSet)
        ));
    }

    #[test]
    fn file_fills_in_what_the_command_line_leaves_out() {
        let file = write_config(
            r#"
            replica_set = "rs1"
            max_config_updates = 3

            [euca]
            tag_key = "Cluster"

            [mongo]
            binary = "/opt/mongo/bin/mongo"

            [logging]
            level = "debug"
            json = true
            "#,
        );
        let path = file.path().to_str().unwrap();
        let config = WardenConfig::resolve(cli(&["-c", path, "--max-config-updates", "5"])).unwrap();

        assert_eq!(config.replica_set, "rs1");
        assert_eq!(config.tag_key, "Cluster");
        assert_eq!(config.mongo_bin, "/opt/mongo/bin/mongo");
        assert_eq!(config.database, "local");
        assert_eq!(config.max_config_updates, 5);
        assert_eq!(config.log.level, "debug");
        assert!(config.log.json);
    }

    #[test]
    fn command_line_wins_over_file() {
        let file = write_config("replica_set = \"rs1\"\nmember_port = 27018\n");
        let path = file.path().to_str().unwrap();
        let config = WardenConfig::resolve(cli(&["-c", path, "-s", "rs2"])).unwrap();
        assert_eq!(config.replica_set, "rs2");
        assert_eq!(config.member_port, 27018);
        assert_eq!(config.settings().member_port, 27018);
    }

    #[test]
    fn bad_files_are_reported() {
        let file = write_config("replica_set = \"rs0\"\nunknown_key = 1\n");
        let path = file.path().to_str().unwrap();
        assert!(matches!(
            WardenConfig::resolve(cli(&["-c", path])),
            Err(ConfigError::Parse { .. })
        ));

        let missing = file.path().with_extension("missing");
        let missing = missing.to_str().unwrap();
        assert!(matches!(
            WardenConfig::resolve(cli(&["-c", missing])),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(matches!(
            WardenConfig::resolve(cli(&["-s", "rs0,primary"])),
            Err(ConfigError::Invalid { name: "replica_set", .. })
        ));
        assert!(matches!(
            WardenConfig::resolve(cli(&["-s", "rs0", "--member-port", "0"])),
            Err(ConfigError::Invalid { name: "member_port", .. })
        ));
        assert!(Cli::try_parse_from(["replset-warden", "--member-port", "70000"]).is_err());
    }

    #[test]
    fn settings_carry_the_bound() {
        let config = WardenConfig::resolve(cli(&["-s", "rs0", "--max-config-updates", "0"])).unwrap();
        let settings = config.settings();
        assert_eq!(settings.replica_set, "rs0");
        assert_eq!(settings.max_config_updates, 0);
    }
}
