//! Infrastructure implementation of the `InventoryStore` port.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::application::ports::InventoryStore;
use crate::domain::InventoryConfig;

/// Environment variable overriding the inventory location.
pub const INVENTORY_ENV: &str = "CNCTL_INVENTORY";

/// Production `InventoryStore` reading a YAML file from disk.
#[derive(Debug, Default, Clone)]
pub struct YamlInventoryStore {
    path: Option<PathBuf>,
}

impl YamlInventoryStore {
    /// Store resolving its path from `CNCTL_INVENTORY` or the home directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pinned to an explicit file (the `--inventory` flag).
    #[must_use]
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl InventoryStore for YamlInventoryStore {
    fn load(&self) -> Result<InventoryConfig> {
        let path = self.path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no inventory file, using built-in");
            return Ok(InventoryConfig::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(InventoryConfig::default());
        }
        serde_yaml::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.path {
            return Ok(path.clone());
        }
        if let Ok(val) = std::env::var(INVENTORY_ENV) {
            return Ok(PathBuf::from(val));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".cnctl").join("inventory.yaml"))
    }
}
