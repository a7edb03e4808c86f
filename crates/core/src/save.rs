//! Roster save files with an undo/redo history.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    engine::Roster,
    models::{FactionId, Locale},
};

/// Root directory under `~/.config` used for save files.
pub const DEFAULT_SAVE_DIR: &str = "armylist/saves";

/// Metadata describing a persisted roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveEntry {
    /// Absolute path to the save file on disk.
    pub path: PathBuf,
    /// Faction of the current snapshot, if one was chosen.
    pub faction: Option<FactionId>,
    /// Human readable save name.
    pub name: String,
    /// Point budget of the current snapshot.
    pub budget: u32,
    /// Timestamp when the save was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Serialized representation of a save file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavePayload {
    name: String,
    locale: Locale,
    saved_at: DateTime<Utc>,
    roster: Roster,
    #[serde(default)]
    history: Vec<Roster>,
    #[serde(default)]
    history_index: usize,
}

impl SavePayload {
    fn new(roster: &Roster, locale: &Locale, name: Option<&str>) -> Self {
        let display_name = name
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .or_else(|| roster.faction.as_ref().map(|faction| faction.to_string()))
            .unwrap_or_else(|| "Roster".to_string());
        let mut payload = Self {
            name: display_name,
            locale: locale.clone(),
            saved_at: Utc::now(),
            roster: roster.clone(),
            history: Vec::new(),
            history_index: 0,
        };
        payload.normalize_history();
        payload
    }

    /// Display name of the save.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog locale that was active when the roster was saved.
    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Time of the last write.
    pub fn saved_at(&self) -> DateTime<Utc> {
        self.saved_at
    }

    /// Borrow the active roster snapshot.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Consume the payload and return the active roster.
    pub fn into_roster(self) -> Roster {
        self.roster
    }

    /// Number of recorded snapshots.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Index of the active snapshot.
    pub fn history_index(&self) -> usize {
        self.history_index
    }

    fn entry(&self, path: PathBuf) -> SaveEntry {
        SaveEntry {
            path,
            faction: self.roster.faction.clone(),
            name: self.name.clone(),
            budget: self.roster.budget,
            updated_at: self.saved_at,
        }
    }

    fn normalize_history(&mut self) {
        if self.history.is_empty() {
            self.history.push(self.roster.clone());
            self.history_index = 0;
        } else if self.history_index >= self.history.len() {
            self.history_index = self.history.len() - 1;
        }
        if let Some(current) = self.history.get(self.history_index).cloned() {
            self.roster = current;
        }
    }

    /// Record `roster` after the active snapshot, dropping any redo tail.
    fn push_state(&mut self, roster: &Roster, locale: &Locale) {
        self.normalize_history();
        self.history.truncate(self.history_index + 1);
        self.locale = locale.clone();
        if self.history.last() == Some(roster) {
            return;
        }
        self.history.push(roster.clone());
        self.history_index = self.history.len() - 1;
        self.roster = roster.clone();
        self.saved_at = Utc::now();
    }

    fn set_history_index(&mut self, index: usize) -> Result<()> {
        self.normalize_history();
        if index >= self.history.len() {
            return Err(anyhow!("history index {index} out of range"));
        }
        self.history_index = index;
        self.roster = self.history[index].clone();
        self.saved_at = Utc::now();
        Ok(())
    }
}

/// Manager responsible for loading and writing save files.
#[derive(Debug, Clone)]
pub struct SaveManager {
    root: PathBuf,
}

impl SaveManager {
    /// Create a new manager rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_SAVE_DIR)
    }

    /// Directory holding the save files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Return all readable saves, most recent first.
    pub fn entries(&self) -> Result<Vec<SaveEntry>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root).context("failed to read save directory")? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if entry.path().extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            match self.read_payload(entry.path()) {
                Ok(payload) => entries.push(payload.entry(entry.path())),
                Err(err) => warn!("Failed to read save {:?}: {err}", entry.path()),
            }
        }

        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(entries)
    }

    /// Write a new save file for `roster` and return its entry.
    pub fn create_save(
        &self,
        roster: &Roster,
        locale: &Locale,
        name: Option<&str>,
    ) -> Result<SaveEntry> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create {}", self.root.display()))?;

        let payload = SavePayload::new(roster, locale, name);
        let prefix = roster
            .faction
            .as_ref()
            .map(|faction| sanitize_component(faction.as_str()))
            .unwrap_or_else(|| "roster".to_string());
        let file_name = format!(
            "{}_{}.json",
            prefix,
            payload.saved_at.format("%Y%m%d%H%M%S%3f")
        );
        let path = self.root.join(file_name);
        self.write_payload(&path, &payload)?;
        info!("created save {}", path.display());

        Ok(payload.entry(path))
    }

    /// Record a new snapshot in an existing save.
    pub fn update_save(
        &self,
        entry: &SaveEntry,
        roster: &Roster,
        locale: &Locale,
    ) -> Result<SaveEntry> {
        let mut payload = self.read_payload(&entry.path)?;
        payload.push_state(roster, locale);
        self.write_payload(&entry.path, &payload)?;
        Ok(payload.entry(entry.path.clone()))
    }

    /// Load payload for the provided entry.
    pub fn load(&self, entry: &SaveEntry) -> Result<SavePayload> {
        let mut payload = self.read_payload(&entry.path)?;
        payload.normalize_history();
        Ok(payload)
    }

    /// Load most recent save entry, if any.
    pub fn latest(&self) -> Result<Option<SaveEntry>> {
        let entries = self.entries()?;
        Ok(entries.into_iter().next())
    }

    /// Move the active history snapshot without changing the history itself.
    pub fn set_history_index(
        &self,
        entry: &SaveEntry,
        index: usize,
    ) -> Result<(SaveEntry, SavePayload)> {
        let mut payload = self.read_payload(&entry.path)?;
        payload
            .set_history_index(index)
            .with_context(|| format!("failed to set history index to {index}"))?;
        self.write_payload(&entry.path, &payload)?;
        Ok((payload.entry(entry.path.clone()), payload))
    }

    /// Remove the save file behind `entry`.
    pub fn delete(&self, entry: &SaveEntry) -> Result<()> {
        fs::remove_file(&entry.path)
            .with_context(|| format!("failed to delete {}", entry.path.display()))
    }

    fn write_payload(&self, path: &Path, payload: &SavePayload) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let serialised = serde_json::to_vec_pretty(payload)?;
        fs::write(path, serialised).with_context(|| format!("failed to write {}", path.display()))
    }

    fn read_payload(&self, path: impl AsRef<Path>) -> Result<SavePayload> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let payload = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(payload)
    }
}

pub(crate) fn sanitize_component(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
            result.push(ch);
        }
    }
    if result.is_empty() {
        "save".to_string()
    } else {
        result
    }
}
