//! Roster aggregate and derived counts.

use serde::{Deserialize, Serialize};

use crate::models::{
    EntryCategory, EntryId, FactionId, HeroSubtype, LoadoutEntry, LoadoutSlot, UnitTemplate,
};

/// Wargear attached to one roster entry, one ordered list per slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loadout {
    #[serde(default)]
    pub spells: Vec<LoadoutEntry>,
    #[serde(default)]
    pub items: Vec<LoadoutEntry>,
    #[serde(default)]
    pub artifacts: Vec<LoadoutEntry>,
    #[serde(default)]
    pub banners: Vec<LoadoutEntry>,
}

impl Loadout {
    pub fn slot(&self, slot: LoadoutSlot) -> &[LoadoutEntry] {
        match slot {
            LoadoutSlot::Spell => &self.spells,
            LoadoutSlot::Item => &self.items,
            LoadoutSlot::Artifact => &self.artifacts,
            LoadoutSlot::Banner => &self.banners,
        }
    }

    pub(crate) fn slot_mut(&mut self, slot: LoadoutSlot) -> &mut Vec<LoadoutEntry> {
        match slot {
            LoadoutSlot::Spell => &mut self.spells,
            LoadoutSlot::Item => &mut self.items,
            LoadoutSlot::Artifact => &mut self.artifacts,
            LoadoutSlot::Banner => &mut self.banners,
        }
    }

    /// Summed cost of one slot.
    pub fn slot_cost(&self, slot: LoadoutSlot) -> u32 {
        self.slot(slot)
            .iter()
            .fold(0u32, |sum, entry| sum.saturating_add(entry.cost))
    }

    /// Every attached entry with its slot, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (LoadoutSlot, &LoadoutEntry)> + '_ {
        LoadoutSlot::ALL
            .into_iter()
            .flat_map(move |slot| self.slot(slot).iter().map(move |entry| (slot, entry)))
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

/// One unit selected into the roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: EntryId,
    pub template: UnitTemplate,
    pub category: EntryCategory,
    /// Current number of models.
    pub count: u32,
    #[serde(default)]
    pub loadout: Loadout,
}

impl RosterEntry {
    pub fn hero_subtype(&self) -> Option<HeroSubtype> {
        self.category.hero_subtype()
    }

    pub fn is_champion(&self) -> bool {
        self.category.is_hero() && self.template.is_champion()
    }

    pub fn is_general(&self) -> bool {
        self.category.is_hero() && self.template.is_general()
    }
}

/// The player's army list for one faction under one point budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction: Option<FactionId>,
    pub budget: u32,
    #[serde(default)]
    pub entries: Vec<RosterEntry>,
    #[serde(default)]
    pub(crate) next_entry: u64,
}

impl Roster {
    /// An empty roster with no faction chosen.
    pub fn new(budget: u32) -> Self {
        Self {
            faction: None,
            budget,
            entries: Vec::new(),
            next_entry: 1,
        }
    }

    /// An empty roster for `faction`.
    pub fn for_faction(faction: FactionId, budget: u32) -> Self {
        Self {
            faction: Some(faction),
            ..Self::new(budget)
        }
    }

    pub fn entry(&self, id: EntryId) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub(crate) fn entry_mut(&mut self, id: EntryId) -> Option<&mut RosterEntry> {
        self.entries.iter_mut().find(|entry| entry.id == id)
    }

    pub(crate) fn allocate_id(&mut self) -> EntryId {
        let id = EntryId(self.next_entry.max(1));
        self.next_entry = id.0 + 1;
        id
    }

    /// Raise the id counter past every stored entry.
    pub(crate) fn normalize_ids(&mut self) {
        let highest = self.entries.iter().map(|entry| entry.id.0).max().unwrap_or(0);
        self.next_entry = self.next_entry.max(highest + 1);
    }

    /// Entries grouped by category in display order, insertion order within a group.
    pub fn grouped(&self) -> Vec<&RosterEntry> {
        EntryCategory::ORDER
            .iter()
            .flat_map(|category| {
                self.entries
                    .iter()
                    .filter(move |entry| entry.category == *category)
            })
            .collect()
    }

    pub fn counts(&self) -> RosterCounts {
        RosterCounts::of(self)
    }
}

/// Per-category counts, recomputed from the entry list on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterCounts {
    pub basic: u32,
    pub elite: u32,
    pub rare: u32,
    pub unique: u32,
    pub command_group: u32,
    pub mage: u32,
    pub general: u32,
    pub model: u32,
    pub champion: u32,
    pub heroes: u32,
    /// Banners carried by command group entries.
    pub banners: u32,
}

impl RosterCounts {
    pub fn of(roster: &Roster) -> Self {
        let mut counts = Self::default();
        for entry in &roster.entries {
            match entry.category {
                EntryCategory::Basic => counts.basic += 1,
                EntryCategory::Elite => counts.elite += 1,
                EntryCategory::Rare => counts.rare += 1,
                EntryCategory::Unique => counts.unique += 1,
                EntryCategory::HeroCommandGroup => {
                    counts.command_group += 1;
                    counts.banners += entry.loadout.banners.len() as u32;
                }
                EntryCategory::HeroMage => counts.mage += 1,
                EntryCategory::HeroModel => counts.model += 1,
                // Generals are counted by tag below, not by subtype.
                EntryCategory::HeroGeneral => {}
            }
            if entry.category.is_hero() {
                counts.heroes += 1;
            }
            if entry.is_general() {
                counts.general += 1;
            }
            if entry.is_champion() {
                counts.champion += 1;
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures;

    #[test]
    fn counts_are_derived_from_entries() {
        let catalog = fixtures::catalog();
        let faction = &catalog.factions[0];
        let mut roster = Roster::for_faction(faction.id.clone(), 2000);
        for name in ["Spearmen", "Spearmen", "Knights", "Captain", "Battle Mage"] {
            let template = fixtures::template(&catalog, name).clone();
            let id = roster.allocate_id();
            roster.entries.push(RosterEntry {
                id,
                category: EntryCategory::of(&template),
                count: 1,
                template,
                loadout: Loadout::default(),
            });
        }

        let counts = roster.counts();
        assert_eq!(counts.basic, 2);
        assert_eq!(counts.elite, 1);
        assert_eq!(counts.heroes, 2);
        assert_eq!(counts.mage, 1);
        assert_eq!(counts.champion, 1);
        assert_eq!(counts.model, 1);
    }

    #[test]
    fn grouped_orders_by_category_then_insertion() {
        let catalog = fixtures::catalog();
        let mut roster = Roster::for_faction(catalog.factions[0].id.clone(), 1000);
        for name in ["Battle Mage", "Spearmen", "Knights", "Archers"] {
            let template = fixtures::template(&catalog, name).clone();
            let id = roster.allocate_id();
            roster.entries.push(RosterEntry {
                id,
                category: EntryCategory::of(&template),
                count: 1,
                template,
                loadout: Loadout::default(),
            });
        }

        let names: Vec<_> = roster
            .grouped()
            .into_iter()
            .map(|entry| entry.template.name.as_str())
            .collect();
        assert_eq!(names, vec!["Spearmen", "Archers", "Knights", "Battle Mage"]);
    }

    #[test]
    fn ids_continue_past_restored_entries() {
        let mut roster = Roster::new(500);
        roster.next_entry = 0;
        assert_eq!(roster.allocate_id(), EntryId(1));

        roster.next_entry = 2;
        let template = fixtures::template(&fixtures::catalog(), "Spearmen").clone();
        roster.entries.push(RosterEntry {
            id: EntryId(7),
            category: EntryCategory::Basic,
            count: 10,
            template,
            loadout: Loadout::default(),
        });
        roster.normalize_ids();
        assert_eq!(roster.allocate_id(), EntryId(8));
    }
}
