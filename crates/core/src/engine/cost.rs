use super::roster::{Roster, RosterEntry};
use crate::models::LoadoutSlot;

/// Point totals at unit and army granularity.
pub struct CostEngine;

impl CostEngine {
    /// Models times base cost plus every attached loadout entry.
    pub fn unit_cost(entry: &RosterEntry) -> u32 {
        let models = entry.count.saturating_mul(entry.template.base_cost);
        LoadoutSlot::ALL
            .into_iter()
            .map(|slot| entry.loadout.slot_cost(slot))
            .fold(models, u32::saturating_add)
    }

    pub fn total_cost(roster: &Roster) -> u32 {
        roster
            .entries
            .iter()
            .map(Self::unit_cost)
            .fold(0, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures;
    use crate::models::LoadoutEntry;

    #[test]
    fn unit_cost_adds_models_and_loadout() {
        let mut store = fixtures::store(1000);
        let archers = fixtures::add(&mut store, "Archers");
        let mut entry = store.snapshot().entry(archers).cloned().unwrap();
        assert_eq!(CostEngine::unit_cost(&entry), 100);

        entry.count = 12;
        entry.loadout.items.push(LoadoutEntry::new("item-0", "Charm", 15));
        entry.loadout.banners.push(LoadoutEntry::new("banner-0", "Flag", 25));
        assert_eq!(CostEngine::unit_cost(&entry), 12 * 10 + 15 + 25);
    }

    #[test]
    fn total_cost_sums_every_entry() {
        let mut store = fixtures::store(800);
        fixtures::add(&mut store, "Spearmen");
        fixtures::add(&mut store, "Spearmen");
        fixtures::add(&mut store, "Knights");
        assert_eq!(CostEngine::total_cost(&store.snapshot()), 350);
        assert_eq!(CostEngine::total_cost(&Roster::new(800)), 0);
    }
}
