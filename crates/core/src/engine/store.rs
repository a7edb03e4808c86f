//! Owner of roster state; applies commands one at a time.

use std::sync::Arc;

use tracing::{debug, info};

use super::{
    cost::CostEngine,
    error::{ArmyCap, LimitedCategory, RosterError},
    limits::{LimitPolicy, LimitSet},
    loadout::LoadoutManager,
    roster::{Loadout, Roster, RosterEntry},
    validate::{Validator, Verdict},
    RuleBook,
};
use crate::{
    catalog::{Catalog, Faction},
    models::{EntryCategory, EntryId, FactionId, LoadoutSlot, SizeBounds, TemplateId, UnitTemplate},
};

/// A request from the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectFaction(FactionId),
    /// Return to faction selection, discarding the roster.
    ClearFaction,
    AddUnit(TemplateId),
    RemoveUnit(EntryId),
    IncreaseCount(EntryId),
    DecreaseCount(EntryId),
    SetUnitCount { entry: EntryId, delta: i64 },
    SetBudget(u32),
    AddLoadout {
        entry: EntryId,
        slot: LoadoutSlot,
        name: String,
    },
    RemoveLoadout {
        entry: EntryId,
        slot: LoadoutSlot,
        name: String,
    },
}

/// Snapshot after a command plus whether it was accepted.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub snapshot: Arc<Roster>,
    pub result: Result<(), RosterError>,
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        self.result.is_ok()
    }
}

/// The single writer of roster state.
///
/// Every accepted command replaces the current snapshot with a new one, so
/// previously handed-out snapshots never change. Rejected commands leave the
/// snapshot untouched.
#[derive(Debug, Clone)]
pub struct RosterStore {
    catalog: Arc<Catalog>,
    rules: RuleBook,
    roster: Arc<Roster>,
}

impl RosterStore {
    /// Start with an empty roster and no faction.
    pub fn new(catalog: Arc<Catalog>, rules: RuleBook, budget: u32) -> Self {
        Self {
            catalog,
            rules,
            roster: Arc::new(Roster::new(budget)),
        }
    }

    pub fn snapshot(&self) -> Arc<Roster> {
        Arc::clone(&self.roster)
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn rules(&self) -> &RuleBook {
        &self.rules
    }

    /// Faction of the current roster, if one is selected and known.
    pub fn faction(&self) -> Option<&Faction> {
        self.roster
            .faction
            .as_ref()
            .and_then(|id| self.catalog.faction(id))
    }

    pub fn limits(&self) -> LimitSet {
        LimitPolicy::new(&self.rules.limits).limits(self.roster.budget, self.roster.counts().basic)
    }

    pub fn total_cost(&self) -> u32 {
        CostEngine::total_cost(&self.roster)
    }

    pub fn verdict(&self) -> Verdict {
        Validator::evaluate(&self.roster, &self.rules.limits)
    }

    /// Apply one command and report the resulting snapshot.
    pub fn apply(&mut self, command: Command) -> Outcome {
        let result = match command {
            Command::SelectFaction(id) => self.select_faction(&id).map(drop),
            Command::ClearFaction => {
                self.clear_faction();
                Ok(())
            }
            Command::AddUnit(id) => self.add_unit(&id).map(drop),
            Command::RemoveUnit(entry) => self.remove_unit(entry).map(drop),
            Command::IncreaseCount(entry) => self.increase_count(entry).map(drop),
            Command::DecreaseCount(entry) => self.decrease_count(entry).map(drop),
            Command::SetUnitCount { entry, delta } => self.set_unit_count(entry, delta).map(drop),
            Command::SetBudget(points) => {
                self.set_budget(points);
                Ok(())
            }
            Command::AddLoadout { entry, slot, name } => {
                self.add_loadout(entry, slot, &name).map(drop)
            }
            Command::RemoveLoadout { entry, slot, name } => {
                self.remove_loadout(entry, slot, &name).map(drop)
            }
        };
        if let Err(err) = &result {
            debug!(code = err.code(), %err, "command rejected");
        }
        Outcome {
            snapshot: self.snapshot(),
            result,
        }
    }

    /// Reset to an empty roster for `id`, keeping the budget.
    pub fn select_faction(&mut self, id: &FactionId) -> Result<Arc<Roster>, RosterError> {
        let faction = self
            .catalog
            .faction(id)
            .ok_or_else(|| RosterError::UnknownFaction(id.clone()))?;
        info!(faction = %faction.name, "faction selected");
        Ok(self.commit(Roster::for_faction(id.clone(), self.roster.budget)))
    }

    pub fn clear_faction(&mut self) -> Arc<Roster> {
        self.commit(Roster::new(self.roster.budget))
    }

    /// Add a unit of `template` at its minimum size.
    pub fn add_unit(&mut self, template: &TemplateId) -> Result<EntryId, RosterError> {
        let faction_id = self
            .roster
            .faction
            .clone()
            .ok_or(RosterError::NoFactionSelected)?;
        let faction = self
            .catalog
            .faction(&faction_id)
            .ok_or_else(|| RosterError::UnknownFaction(faction_id.clone()))?;
        let template = faction
            .template(template)
            .ok_or_else(|| RosterError::UnknownTemplate(template.clone()))?
            .clone();

        let category = EntryCategory::of(&template);
        self.check_category_room(category, &template)?;

        let count = self.size_bounds(&template).min;
        self.check_budget(count.saturating_mul(template.base_cost))?;

        let mut next = (*self.roster).clone();
        let id = next.allocate_id();
        debug!(entry = %id, unit = %template.name, %category, "unit added");
        next.entries.push(RosterEntry {
            id,
            template,
            category,
            count,
            loadout: Loadout::default(),
        });
        self.commit(next);
        Ok(id)
    }

    /// Delete an entry together with everything it carried.
    pub fn remove_unit(&mut self, entry: EntryId) -> Result<Arc<Roster>, RosterError> {
        self.entry(entry)?;
        let mut next = (*self.roster).clone();
        next.entries.retain(|candidate| candidate.id != entry);
        debug!(%entry, "unit removed");
        Ok(self.commit(next))
    }

    pub fn increase_count(&mut self, entry: EntryId) -> Result<Arc<Roster>, RosterError> {
        self.set_unit_count(entry, 1)
    }

    pub fn decrease_count(&mut self, entry: EntryId) -> Result<Arc<Roster>, RosterError> {
        self.set_unit_count(entry, -1)
    }

    /// Change the unit size by `delta`; sizes outside the template bounds are refused.
    pub fn set_unit_count(
        &mut self,
        entry: EntryId,
        delta: i64,
    ) -> Result<Arc<Roster>, RosterError> {
        let current = self.entry(entry)?;
        let bounds = self.size_bounds(&current.template);
        let out_of_bounds = |requested| RosterError::SizeOutOfBounds {
            requested,
            min: bounds.min,
            max: bounds.max,
        };
        let count = i64::from(current.count);
        let requested = count
            .checked_add(delta)
            .ok_or_else(|| out_of_bounds(count.saturating_add(delta)))?;
        if !bounds.contains(requested) {
            return Err(out_of_bounds(requested));
        }
        let count = requested as u32;
        if count > current.count {
            let extra = (count - current.count).saturating_mul(current.template.base_cost);
            self.check_budget(extra)?;
        }

        let mut next = (*self.roster).clone();
        if let Some(target) = next.entry_mut(entry) {
            target.count = count;
        }
        Ok(self.commit(next))
    }

    /// Replace the budget. Entries that now break a limit are kept; the
    /// verdict reports them.
    pub fn set_budget(&mut self, points: u32) -> Arc<Roster> {
        let mut next = (*self.roster).clone();
        next.budget = points;
        debug!(budget = points, "budget changed");
        self.commit(next)
    }

    /// Attach the catalog `slot` entry called `name` to `entry`.
    pub fn add_loadout(
        &mut self,
        entry: EntryId,
        slot: LoadoutSlot,
        name: &str,
    ) -> Result<Arc<Roster>, RosterError> {
        let target = self.entry(entry)?;
        let candidate = self
            .catalog
            .loadout_named(slot, name)
            .ok_or_else(|| RosterError::UnknownLoadout {
                slot,
                name: name.to_string(),
            })?
            .clone();
        LoadoutManager::new(&self.rules.limits).check_add(&self.roster, target, slot, &candidate)?;
        self.check_budget(candidate.cost)?;

        let mut next = (*self.roster).clone();
        if let Some(target) = next.entry_mut(entry) {
            debug!(%entry, %slot, name = %candidate.name, "loadout added");
            target.loadout.slot_mut(slot).push(candidate);
        }
        Ok(self.commit(next))
    }

    /// Remove every `slot` entry called `name` from `entry`. Always allowed.
    pub fn remove_loadout(
        &mut self,
        entry: EntryId,
        slot: LoadoutSlot,
        name: &str,
    ) -> Result<Arc<Roster>, RosterError> {
        self.entry(entry)?;
        let mut next = (*self.roster).clone();
        let removed = next
            .entry_mut(entry)
            .map(|target| LoadoutManager::remove(&mut target.loadout, slot, name))
            .unwrap_or(0);
        if removed == 0 {
            return Ok(self.snapshot());
        }
        Ok(self.commit(next))
    }

    pub fn add_spell(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.add_loadout(entry, LoadoutSlot::Spell, name)
    }

    pub fn remove_spell(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.remove_loadout(entry, LoadoutSlot::Spell, name)
    }

    pub fn add_item(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.add_loadout(entry, LoadoutSlot::Item, name)
    }

    pub fn remove_item(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.remove_loadout(entry, LoadoutSlot::Item, name)
    }

    pub fn add_artifact(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.add_loadout(entry, LoadoutSlot::Artifact, name)
    }

    pub fn remove_artifact(
        &mut self,
        entry: EntryId,
        name: &str,
    ) -> Result<Arc<Roster>, RosterError> {
        self.remove_loadout(entry, LoadoutSlot::Artifact, name)
    }

    pub fn add_banner(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.add_loadout(entry, LoadoutSlot::Banner, name)
    }

    pub fn remove_banner(&mut self, entry: EntryId, name: &str) -> Result<Arc<Roster>, RosterError> {
        self.remove_loadout(entry, LoadoutSlot::Banner, name)
    }

    /// Adopt a roster loaded from persistence after checking its invariants.
    pub fn restore(&mut self, mut roster: Roster) -> Result<Arc<Roster>, RosterError> {
        if let Some(faction_id) = &roster.faction {
            let faction = self
                .catalog
                .faction(faction_id)
                .ok_or_else(|| RosterError::UnknownFaction(faction_id.clone()))?;
            for entry in &mut roster.entries {
                let Some(template) = faction.template(&entry.template.id) else {
                    return Err(RosterError::UnknownTemplate(entry.template.id.clone()));
                };
                // Saves may predate newer profile flags.
                entry.template.hero = template.hero;
                let bounds = self.size_bounds(&entry.template);
                if !bounds.contains(i64::from(entry.count)) {
                    return Err(RosterError::SizeOutOfBounds {
                        requested: i64::from(entry.count),
                        min: bounds.min,
                        max: bounds.max,
                    });
                }
            }
        } else if let Some(entry) = roster.entries.first() {
            return Err(RosterError::UnknownTemplate(entry.template.id.clone()));
        }
        roster.normalize_ids();
        info!(entries = roster.entries.len(), "roster restored");
        Ok(self.commit(roster))
    }

    /// Switch to a catalog in another locale, refreshing display text of
    /// every entry from the templates and loadout entries sharing its ids.
    pub fn relocalize(&mut self, catalog: Arc<Catalog>) -> Arc<Roster> {
        let mut next = (*self.roster).clone();
        if let Some(faction) = next.faction.as_ref().and_then(|id| catalog.faction(id)) {
            for entry in &mut next.entries {
                if let Some(template) = faction.template(&entry.template.id) {
                    entry.template.localize_from(template);
                }
                for slot in LoadoutSlot::ALL {
                    for item in entry.loadout.slot_mut(slot) {
                        if let Some(localized) = catalog.loadout_by_id(slot, &item.id) {
                            item.name = localized.name.clone();
                        }
                    }
                }
            }
        }
        info!(locale = %catalog.locale, "catalog locale switched");
        self.catalog = catalog;
        self.commit(next)
    }

    fn commit(&mut self, next: Roster) -> Arc<Roster> {
        self.roster = Arc::new(next);
        self.snapshot()
    }

    fn entry(&self, id: EntryId) -> Result<&RosterEntry, RosterError> {
        self.roster.entry(id).ok_or(RosterError::UnknownEntry(id))
    }

    fn size_bounds(&self, template: &UnitTemplate) -> SizeBounds {
        template.size_bounds(
            self.rules.limits.default_min_size,
            self.rules.limits.default_max_size,
        )
    }

    fn check_category_room(
        &self,
        category: EntryCategory,
        template: &UnitTemplate,
    ) -> Result<(), RosterError> {
        let counts = self.roster.counts();
        let budget = self.roster.budget;
        let policy = LimitPolicy::new(&self.rules.limits);
        let full = |category, current: u32, limit: u32| {
            if current >= limit {
                Err(RosterError::CategoryLimitExceeded { category, limit })
            } else {
                Ok(())
            }
        };

        match category {
            EntryCategory::Basic | EntryCategory::HeroModel | EntryCategory::HeroGeneral => Ok(()),
            EntryCategory::Elite => full(LimitedCategory::Elite, counts.elite, counts.basic),
            EntryCategory::Rare => full(LimitedCategory::Rare, counts.rare, policy.rare_max(budget)),
            EntryCategory::Unique => full(
                LimitedCategory::Unique,
                counts.unique,
                policy.unique_max(budget),
            ),
            EntryCategory::HeroCommandGroup => full(
                LimitedCategory::CommandGroup,
                counts.command_group,
                policy.command_group(budget).max,
            ),
            EntryCategory::HeroMage => {
                full(LimitedCategory::Mage, counts.mage, policy.mage_max(budget))
            }
        }?;

        if category.is_hero() && template.is_general() {
            let limit = self.rules.limits.general_max;
            if counts.general >= limit {
                return Err(RosterError::ArmyWideCapExceeded {
                    cap: ArmyCap::Generals { limit },
                });
            }
        }
        if category.is_hero() && template.is_champion() {
            full(
                LimitedCategory::Champion,
                counts.champion,
                policy.champion(budget).max,
            )?;
        }
        Ok(())
    }

    fn check_budget(&self, extra: u32) -> Result<(), RosterError> {
        if !self.rules.strict_budget {
            return Ok(());
        }
        let total = self.total_cost().saturating_add(extra);
        let budget = self.roster.budget;
        if total > budget {
            return Err(RosterError::BudgetExceeded { total, budget });
        }
        Ok(())
    }
}
