#![allow(missing_docs)]

//! Flat army snapshot for printing or sharing.

use std::{
    fmt,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    engine::{CostEngine, RosterEntry, RosterError, RosterStore},
    models::{EntryCategory, EntryId, FactionId, LoadoutSlot, Locale, StatBlock, TemplateId},
    save::sanitize_component,
};

/// One roster entry with everything needed to render it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub id: EntryId,
    pub template: TemplateId,
    pub name: String,
    pub category: EntryCategory,
    pub count: u32,
    pub base_cost: u32,
    /// Models plus loadout.
    pub unit_cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatBlock>,
    #[serde(default)]
    pub special_rules: Vec<String>,
    #[serde(default)]
    pub spells: Vec<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub banners: Vec<String>,
}

impl ExportEntry {
    fn from_entry(entry: &RosterEntry) -> Self {
        let names = |slot: LoadoutSlot| -> Vec<String> {
            entry
                .loadout
                .slot(slot)
                .iter()
                .map(|item| item.name.clone())
                .collect()
        };
        Self {
            id: entry.id,
            template: entry.template.id.clone(),
            name: entry.template.name.clone(),
            category: entry.category,
            count: entry.count,
            base_cost: entry.template.base_cost,
            unit_cost: CostEngine::unit_cost(entry),
            stats: entry.template.stats.clone(),
            special_rules: entry.template.special_rules.clone(),
            spells: names(LoadoutSlot::Spell),
            items: names(LoadoutSlot::Item),
            artifacts: names(LoadoutSlot::Artifact),
            banners: names(LoadoutSlot::Banner),
        }
    }

    fn loadout(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Spells", &self.spells),
            ("Items", &self.items),
            ("Artifacts", &self.artifacts),
            ("Banners", &self.banners),
        ]
    }
}

/// Army sheet derived from one roster snapshot; no rule is re-derived by readers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportPayload {
    pub faction: FactionId,
    pub faction_name: String,
    pub locale: Locale,
    pub budget: u32,
    pub total_cost: u32,
    pub legal: bool,
    /// Failed composition checks in display form.
    #[serde(default)]
    pub problems: Vec<String>,
    #[serde(default)]
    pub special_rules: Vec<String>,
    #[serde(default)]
    pub flavor_text: Vec<String>,
    pub entries: Vec<ExportEntry>,
    pub exported_at: DateTime<Utc>,
}

impl ExportPayload {
    /// Snapshot the store's current roster.
    pub fn from_store(store: &RosterStore) -> Result<Self, RosterError> {
        let roster = store.snapshot();
        let faction_id = roster
            .faction
            .clone()
            .ok_or(RosterError::NoFactionSelected)?;
        let faction = store
            .catalog()
            .faction(&faction_id)
            .ok_or_else(|| RosterError::UnknownFaction(faction_id.clone()))?;
        let verdict = store.verdict();

        Ok(Self {
            faction: faction_id,
            faction_name: faction.name.clone(),
            locale: store.catalog().locale.clone(),
            budget: roster.budget,
            total_cost: CostEngine::total_cost(&roster),
            legal: verdict.is_legal(),
            problems: verdict.failures().map(ToString::to_string).collect(),
            special_rules: faction.special_rules.clone(),
            flavor_text: faction.flavor_text.clone(),
            entries: roster
                .grouped()
                .into_iter()
                .map(ExportEntry::from_entry)
                .collect(),
            exported_at: Utc::now(),
        })
    }

    /// File name stem shared by the JSON and text exports.
    pub fn file_stem(&self) -> String {
        format!(
            "{}_{}",
            sanitize_component(self.faction.as_str()),
            self.exported_at.format("%Y%m%d%H%M%S")
        )
    }

    pub fn write_json(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(format!("{}.json", self.file_stem()));
        let serialised = serde_json::to_vec_pretty(self).context("failed to serialize export")?;
        write_file(&path, &serialised)?;
        Ok(path)
    }

    pub fn write_text(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(format!("{}.txt", self.file_stem()));
        write_file(&path, self.to_string().as_bytes())?;
        Ok(path)
    }
}

/// Plain-text army sheet.
impl fmt::Display for ExportPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.faction_name)?;
        writeln!(f, "Points: {} / {}", self.total_cost, self.budget)?;
        if self.legal {
            writeln!(f, "Legal: yes")?;
        } else {
            writeln!(f, "Legal: no")?;
            for problem in &self.problems {
                writeln!(f, "  ! {problem}")?;
            }
        }

        if !self.special_rules.is_empty() || !self.flavor_text.is_empty() {
            writeln!(f, "\nSpecial rules:")?;
            for line in self.special_rules.iter().chain(&self.flavor_text) {
                writeln!(f, "  - {line}")?;
            }
        }

        writeln!(f, "\nUnits:")?;
        for entry in &self.entries {
            writeln!(
                f,
                "  {} x{} ({} pts) [{}]",
                entry.name, entry.count, entry.unit_cost, entry.category
            )?;
            if let Some(stats) = entry.stats.as_ref().filter(|stats| !stats.is_empty()) {
                let line = stats
                    .fields()
                    .into_iter()
                    .map(|(label, value)| format!("{label}: {value}"))
                    .collect::<Vec<_>>()
                    .join("  ");
                writeln!(f, "    {line}")?;
            }
            for rule in &entry.special_rules {
                writeln!(f, "    - {rule}")?;
            }
            for (label, names) in entry.loadout() {
                if !names.is_empty() {
                    writeln!(f, "    {label}: {}", names.join(", "))?;
                }
            }
        }
        Ok(())
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    info!("exported army to {}", path.display());
    Ok(())
}
