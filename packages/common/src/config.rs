use std::path::PathBuf;

use serde::Deserialize;

/// Asset storage configuration shared by every process that touches uploads.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory that asset locators resolve against. Default: "./data".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Maximum size of a single asset in bytes. Default: 10 MiB.
    #[serde(default = "default_max_asset_size")]
    pub max_asset_size: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./data")
}
fn default_max_asset_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_asset_size: default_max_asset_size(),
        }
    }
}
