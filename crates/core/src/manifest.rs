//! Optional manifest stored at the root of a catalog directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Locale;

/// Describes which edition of the army books a catalog holds.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CatalogManifest {
    /// Rules edition label, e.g. `"2024"`.
    #[serde(default)]
    pub edition: Option<String>,
    /// When the catalog data was last updated.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Locale to open when the user has no preference.
    #[serde(default)]
    pub default_locale: Option<Locale>,
}

impl CatalogManifest {
    /// Load the manifest from `path`, returning `None` if it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest {}", path.display()))?;
        let manifest = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse manifest {}", path.display()))?;
        Ok(Some(manifest))
    }

    /// Write the manifest to `path`, creating parent directories if needed.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create manifest directory {}", parent.display())
            })?;
        }

        let serialized =
            serde_json::to_string_pretty(self).context("failed to serialize catalog manifest")?;
        fs::write(path, serialized)
            .with_context(|| format!("failed to write manifest {}", path.display()))
    }
}

/// Manifest location inside a catalog root.
pub fn manifest_path(catalog_root: impl AsRef<Path>) -> PathBuf {
    catalog_root.as_ref().join("manifest.json")
}
