//! Node-level configuration: the deployment knobs layered on top of
//! `logpass_core::config::Config`'s network-compatibility constants,
//! plus the bits that are genuinely per-node (where to put the
//! database, where to put logs, how noisy to be).

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde_derive::{Deserialize, Serialize};

use logpass_core::config::{self as core_config, Config as DatabaseConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub rollbackable_blocks: u32,
    pub staking_duration: usize,
    pub miners_queue_size: usize,
    pub block_interval: u64,
    pub transaction_max_size: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            data_dir: PathBuf::from("./logpass-data"),
            log_dir: PathBuf::from("./logpass-logs"),
            log_level: "info".to_string(),
            rollbackable_blocks: core_config::DATABASE_ROLLBACKABLE_BLOCKS,
            staking_duration: core_config::STAKING_DURATION,
            miners_queue_size: core_config::MINERS_QUEUE_SIZE,
            block_interval: core_config::BLOCK_INTERVAL,
            transaction_max_size: core_config::TRANSACTION_MAX_SIZE,
        }
    }
}

impl NodeConfig {
    /// Loads from `path` if given, otherwise from the platform's
    /// standard config location under the app name `logpass-node`,
    /// creating a default file there the first time.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => confy::load_path(path)?,
            None => confy::load("logpass-node", "config")?,
        };
        Ok(config)
    }

    /// Projects the node-wide settings relevant to `logpass_core::database::Database`
    /// into its own `Config` type.
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig {
            rollbackable_blocks: self.rollbackable_blocks,
            staking_duration: self.staking_duration,
            miners_queue_size: self.miners_queue_size,
            block_interval: self.block_interval,
            transaction_max_size: self.transaction_max_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_database_config_matches_core_defaults() {
        let node_config = NodeConfig::default();
        let database_config = node_config.database_config();
        let core_default = DatabaseConfig::default();
        assert_eq!(database_config.rollbackable_blocks, core_default.rollbackable_blocks);
        assert_eq!(database_config.transaction_max_size, core_default.transaction_max_size);
    }

    #[test]
    fn loads_from_an_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        let config = NodeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.log_level, "info");
    }
}
