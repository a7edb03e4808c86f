//! Application configuration: file on disk layered with environment overrides.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{engine::RuleBook, models::Locale, save::SaveManager};

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "armylist";
/// Prefix of environment overrides, e.g. `ARMYLIST__DEFAULT_BUDGET=1500`.
pub const ENV_PREFIX: &str = "ARMYLIST";

const DEFAULT_CONFIG: &str = r#"# armylist configuration
# Every key is optional; missing keys fall back to built-in defaults.

catalog_root = "catalog"
default_budget = 800
default_locale = "pl"

[rules]
# Refuse commands that push the army over its point budget.
strict_budget = false

[rules.limits]
mage_points_per_slot = 500
elite_min = 2
hero_min = 4
general_max = 1
banner_min_budget = 1000
"#;

/// Runtime settings for the army builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory with one sub-directory per catalog locale.
    pub catalog_root: PathBuf,
    pub save_dir: PathBuf,
    pub export_dir: PathBuf,
    /// Point budget for a new roster.
    pub default_budget: u32,
    pub default_locale: Locale,
    pub rules: RuleBook,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_root: PathBuf::from("catalog"),
            save_dir: SaveManager::default_root(),
            export_dir: dirs::document_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(CONFIG_DIR),
            default_budget: 800,
            default_locale: Locale::from("pl"),
            rules: RuleBook::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (may be missing) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Location of `config.toml` under the user's config directory.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join("config.toml")
}

/// Write the default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn default_file_matches_built_in_defaults() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("armylist/config.toml");
        write_default_config(&path)?;
        assert!(path.exists());

        let loaded = AppConfig::load_from(&path)?;
        let defaults = AppConfig::default();
        assert_eq!(loaded.default_budget, 800);
        assert_eq!(loaded.default_locale, Locale::from("pl"));
        assert_eq!(loaded.rules, defaults.rules);
        assert_eq!(loaded.save_dir, defaults.save_dir);
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
default_budget = 2000
catalog_root = "/srv/armies"

[rules]
strict_budget = true

[rules.limits]
general_max = 2

[rules.heroes]
mage = ["sorcerer"]
"#,
        )?;

        let loaded = AppConfig::load_from(&path)?;
        assert_eq!(loaded.default_budget, 2000);
        assert_eq!(loaded.catalog_root, PathBuf::from("/srv/armies"));
        assert!(loaded.rules.strict_budget);
        assert_eq!(loaded.rules.limits.general_max, 2);
        assert_eq!(loaded.rules.limits.hero_min, 4);
        assert_eq!(loaded.rules.heroes.mage, vec!["sorcerer".to_string()]);
        Ok(())
    }

    #[test]
    fn existing_file_is_left_alone() -> Result<()> {
        let temp = tempdir()?;
        let path = temp.path().join("config.toml");
        fs::write(&path, "default_budget = 1234\n")?;
        write_default_config(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.default_budget, 1234);
        Ok(())
    }
}
