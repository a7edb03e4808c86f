#![allow(missing_docs)]

//! Read-only unit and wargear catalog, one per locale.

mod loader;
mod store;

use serde::{Deserialize, Serialize};

pub use loader::{discover_locales, CatalogLoader};
pub use store::CatalogStore;

use crate::models::{
    FactionId, LoadoutEntry, LoadoutId, LoadoutSlot, Locale, TemplateId, UnitCategory,
    UnitTemplate,
};

/// A faction and every unit it can field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    #[serde(default)]
    pub special_rules: Vec<String>,
    #[serde(default)]
    pub flavor_text: Vec<String>,
    /// Units in catalog order, categories in [`UnitCategory::ALL`] order.
    pub units: Vec<UnitTemplate>,
}

impl Faction {
    pub fn template(&self, id: &TemplateId) -> Option<&UnitTemplate> {
        self.units.iter().find(|unit| &unit.id == id)
    }

    pub fn units_in(&self, category: UnitCategory) -> impl Iterator<Item = &UnitTemplate> + '_ {
        self.units
            .iter()
            .filter(move |unit| unit.category == category)
    }
}

/// Everything loaded for one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub locale: Locale,
    pub factions: Vec<Faction>,
    #[serde(default)]
    pub spells: Vec<LoadoutEntry>,
    #[serde(default)]
    pub items: Vec<LoadoutEntry>,
    #[serde(default)]
    pub artifacts: Vec<LoadoutEntry>,
    #[serde(default)]
    pub banners: Vec<LoadoutEntry>,
}

impl Catalog {
    pub fn empty(locale: Locale) -> Self {
        Self {
            locale,
            factions: Vec::new(),
            spells: Vec::new(),
            items: Vec::new(),
            artifacts: Vec::new(),
            banners: Vec::new(),
        }
    }

    pub fn faction(&self, id: &FactionId) -> Option<&Faction> {
        self.factions.iter().find(|faction| &faction.id == id)
    }

    /// Catalog list backing `slot`.
    pub fn loadout(&self, slot: LoadoutSlot) -> &[LoadoutEntry] {
        match slot {
            LoadoutSlot::Spell => &self.spells,
            LoadoutSlot::Item => &self.items,
            LoadoutSlot::Artifact => &self.artifacts,
            LoadoutSlot::Banner => &self.banners,
        }
    }

    pub fn loadout_named(&self, slot: LoadoutSlot, name: &str) -> Option<&LoadoutEntry> {
        self.loadout(slot).iter().find(|entry| entry.name == name)
    }

    pub fn loadout_by_id(&self, slot: LoadoutSlot, id: &LoadoutId) -> Option<&LoadoutEntry> {
        self.loadout(slot).iter().find(|entry| &entry.id == id)
    }
}
