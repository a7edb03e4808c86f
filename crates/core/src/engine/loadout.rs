//! Per-entry and army-wide wargear caps.

use super::{
    error::{ArmyCap, CapKind, RosterError},
    limits::{LimitPolicy, LimitRules},
    roster::{Loadout, Roster, RosterEntry},
};
use crate::models::{HeroSubtype, LoadoutEntry, LoadoutSlot, UnitTemplate};

/// Count and point caps for one slot of one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotCaps {
    pub count: u32,
    /// `None` when the slot has no point cap.
    pub points: Option<u32>,
}

/// Decides whether a loadout entry may be attached.
#[derive(Debug, Clone, Copy)]
pub struct LoadoutManager<'a> {
    rules: &'a LimitRules,
}

impl<'a> LoadoutManager<'a> {
    pub fn new(rules: &'a LimitRules) -> Self {
        Self { rules }
    }

    /// Hero subtype allowed to fill `slot`.
    pub const fn holder(slot: LoadoutSlot) -> HeroSubtype {
        match slot {
            LoadoutSlot::Spell | LoadoutSlot::Item => HeroSubtype::Mage,
            LoadoutSlot::Artifact => HeroSubtype::General,
            LoadoutSlot::Banner => HeroSubtype::CommandGroup,
        }
    }

    pub fn eligible(entry: &RosterEntry, slot: LoadoutSlot) -> bool {
        entry.hero_subtype() == Some(Self::holder(slot))
    }

    /// Slots `entry` may fill at all.
    pub fn slots_for(entry: &RosterEntry) -> Vec<LoadoutSlot> {
        LoadoutSlot::ALL
            .into_iter()
            .filter(|slot| Self::eligible(entry, *slot))
            .collect()
    }

    /// Artifacts and banners reuse the item value, and only when it is set.
    pub fn caps(&self, template: &UnitTemplate, slot: LoadoutSlot) -> SlotCaps {
        let wargear = template.wargear;
        let item_value = (wargear.max_item_value > 0).then_some(wargear.max_item_value);
        match slot {
            LoadoutSlot::Spell => SlotCaps {
                count: wargear.max_spell_count,
                points: Some(wargear.max_spell_value),
            },
            LoadoutSlot::Item => SlotCaps {
                count: wargear.max_item_count,
                points: Some(wargear.max_item_value),
            },
            LoadoutSlot::Artifact => SlotCaps {
                count: self.rules.artifacts_per_general,
                points: item_value,
            },
            LoadoutSlot::Banner => SlotCaps {
                count: self.rules.banners_per_unit,
                points: item_value,
            },
        }
    }

    /// Check that `candidate` may join `slot` on `entry` within `roster`.
    pub fn check_add(
        &self,
        roster: &Roster,
        entry: &RosterEntry,
        slot: LoadoutSlot,
        candidate: &LoadoutEntry,
    ) -> Result<(), RosterError> {
        if !Self::eligible(entry, slot) {
            return Err(RosterError::IneligibleLoadout {
                slot,
                holder: entry.category,
            });
        }

        if slot == LoadoutSlot::Banner
            && !LimitPolicy::new(self.rules).banners_allowed(roster.budget)
        {
            return Err(RosterError::ArmyWideCapExceeded {
                cap: ArmyCap::BannersBelowBudget {
                    threshold: self.rules.banner_min_budget,
                },
            });
        }

        let caps = self.caps(&entry.template, slot);
        let current = entry.loadout.slot(slot);
        if current.len() as u32 >= caps.count {
            return Err(RosterError::LoadoutCapExceeded {
                slot,
                cap: CapKind::Count,
                limit: caps.count,
            });
        }

        if slot == LoadoutSlot::Banner && roster.counts().banners >= self.rules.banners_total {
            return Err(RosterError::ArmyWideCapExceeded {
                cap: ArmyCap::Banners {
                    limit: self.rules.banners_total,
                },
            });
        }

        if let Some(limit) = caps.points {
            let spent = entry.loadout.slot_cost(slot);
            if spent.saturating_add(candidate.cost) > limit {
                return Err(RosterError::LoadoutCapExceeded {
                    slot,
                    cap: CapKind::Points,
                    limit,
                });
            }
        }

        Ok(())
    }

    /// Drop every entry called `name` from `slot`; returns how many went.
    pub fn remove(loadout: &mut Loadout, slot: LoadoutSlot, name: &str) -> usize {
        let list = loadout.slot_mut(slot);
        let before = list.len();
        list.retain(|entry| entry.name != name);
        before - list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures;

    fn entry_named<'r>(roster: &'r Roster, name: &str) -> &'r RosterEntry {
        roster
            .entries
            .iter()
            .find(|entry| entry.template.name == name)
            .expect("entry present")
    }

    #[test]
    fn only_matching_subtypes_are_eligible() {
        let mut store = fixtures::store(2000);
        fixtures::add(&mut store, "Battle Mage");
        fixtures::add(&mut store, "Grand Marshal");
        fixtures::add(&mut store, "Captain");
        let roster = store.snapshot();

        let mage = entry_named(&roster, "Battle Mage");
        assert_eq!(
            LoadoutManager::slots_for(mage),
            vec![LoadoutSlot::Spell, LoadoutSlot::Item]
        );
        let general = entry_named(&roster, "Grand Marshal");
        assert_eq!(
            LoadoutManager::slots_for(general),
            vec![LoadoutSlot::Artifact]
        );
        assert!(LoadoutManager::slots_for(entry_named(&roster, "Captain")).is_empty());
    }

    #[test]
    fn point_cap_counts_what_is_already_carried() {
        let rules = LimitRules::default();
        let manager = LoadoutManager::new(&rules);
        let mut store = fixtures::store(2000);
        fixtures::add(&mut store, "Battle Mage");
        let mut roster = (*store.snapshot()).clone();
        roster.entries[0]
            .loadout
            .spells
            .push(LoadoutEntry::new("spell-2", "Doom", 35));

        let entry = &roster.entries[0];
        let shield = LoadoutEntry::new("spell-1", "Shield", 20);
        assert_eq!(
            manager.check_add(&roster, entry, LoadoutSlot::Spell, &shield),
            Err(RosterError::LoadoutCapExceeded {
                slot: LoadoutSlot::Spell,
                cap: CapKind::Points,
                limit: 50,
            })
        );
        let cheap = LoadoutEntry::new("spell-x", "Spark", 15);
        assert_eq!(
            manager.check_add(&roster, entry, LoadoutSlot::Spell, &cheap),
            Ok(())
        );
    }

    #[test]
    fn artifact_and_banner_points_apply_only_when_set() {
        let rules = LimitRules::default();
        let manager = LoadoutManager::new(&rules);
        let catalog = fixtures::catalog();

        let mut template = fixtures::template(&catalog, "Grand Marshal").clone();
        assert_eq!(
            manager.caps(&template, LoadoutSlot::Artifact),
            SlotCaps {
                count: 1,
                points: Some(100)
            }
        );
        template.wargear.max_item_value = 0;
        assert_eq!(
            manager.caps(&template, LoadoutSlot::Artifact),
            SlotCaps {
                count: 1,
                points: None
            }
        );
        assert_eq!(manager.caps(&template, LoadoutSlot::Item).points, Some(0));
    }

    #[test]
    fn remove_drops_every_entry_with_the_name() {
        let mut loadout = Loadout::default();
        loadout.items.push(LoadoutEntry::new("item-0", "Charm", 15));
        loadout.items.push(LoadoutEntry::new("item-1", "Sword", 30));
        loadout.items.push(LoadoutEntry::new("item-0", "Charm", 15));

        assert_eq!(LoadoutManager::remove(&mut loadout, LoadoutSlot::Item, "Charm"), 2);
        assert_eq!(LoadoutManager::remove(&mut loadout, LoadoutSlot::Item, "Charm"), 0);
        assert_eq!(loadout.items.len(), 1);
    }
}
