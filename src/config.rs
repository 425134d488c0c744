//! Store configuration
//!
//! Stored in ~/.config/mailvault/config.json. Every value can be overridden
//! by the caller; nothing here is consulted implicitly by the store itself.

use crate::store::BlobStore;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "default";

/// Where blobs live on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base directory shared by all namespaces
    pub data_path: PathBuf,
    /// Tenant (database) name; each gets its own subtree
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        let data_path = dirs::data_dir()
            .map(|d| d.join("mailvault"))
            .unwrap_or_else(|| PathBuf::from(".mailvault"));
        StoreConfig {
            data_path,
            namespace: default_namespace(),
        }
    }
}

impl StoreConfig {
    pub fn new(data_path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        StoreConfig {
            data_path: data_path.into(),
            namespace: namespace.into(),
        }
    }

    /// Default config file location (~/.config/mailvault/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("mailvault").join("config.json"))
    }

    /// Load a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: StoreConfig = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, falling back to defaults if it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config dir: {}", e)))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write config: {}", e)))?;
        Ok(())
    }

    /// Reject namespaces that would escape `data_path`
    pub fn validate(&self) -> Result<()> {
        let ns = self.namespace.as_str();
        if ns.is_empty() || ns == "." || ns == ".." || ns.contains(['/', '\\']) {
            return Err(Error::Config(format!("Invalid namespace: {:?}", ns)));
        }
        Ok(())
    }

    /// `<data_path>/<namespace>/email`
    pub fn blob_root(&self) -> PathBuf {
        self.data_path.join(&self.namespace).join("email")
    }

    /// Build a store for this namespace
    pub fn open_store(&self) -> Result<BlobStore> {
        self.validate()?;
        Ok(BlobStore::new(self.blob_root()))
    }
}
