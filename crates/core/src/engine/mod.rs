#![allow(missing_docs)]

//! Army composition rules engine.
//!
//! Everything here is synchronous and free of I/O. [`RosterStore`] owns the
//! current roster; limits, costs and the legality verdict are recomputed from
//! that roster whenever they are asked for.

mod classify;
mod cost;
mod error;
mod limits;
mod loadout;
mod roster;
mod store;
mod validate;

use serde::{Deserialize, Serialize};

pub use classify::{HeroClassifier, HeroKeywords};
pub use cost::CostEngine;
pub use error::{ArmyCap, CapKind, LimitedCategory, RosterError};
pub use limits::{Bounds, LimitPolicy, LimitRules, LimitSet, Tiered};
pub use loadout::{LoadoutManager, SlotCaps};
pub use roster::{Loadout, Roster, RosterCounts, RosterEntry};
pub use store::{Command, Outcome, RosterStore};
pub use validate::{Check, Rule, Validator, Verdict};

/// Every tunable constant of the rules engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleBook {
    pub limits: LimitRules,
    pub heroes: HeroKeywords,
    /// Refuse commands that would push the total over the budget. When off,
    /// overspending is only reported by the verdict.
    pub strict_budget: bool,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use super::{HeroClassifier, HeroKeywords, RosterStore, RuleBook};
    use crate::{
        catalog::{Catalog, Faction},
        models::{
            EntryId, FactionId, LoadoutEntry, TemplateId, UnitCategory, UnitTemplate,
            WargearBudget,
        },
    };

    struct Blueprint {
        name: &'static str,
        category: UnitCategory,
        cost: u32,
        size: Option<(u32, u32)>,
        tag: Option<&'static str>,
        wargear: WargearBudget,
    }

    fn unit(name: &'static str, category: UnitCategory, cost: u32) -> Blueprint {
        Blueprint {
            name,
            category,
            cost,
            size: None,
            tag: None,
            wargear: WargearBudget::default(),
        }
    }

    fn hero(name: &'static str, tag: &'static str, cost: u32, wargear: WargearBudget) -> Blueprint {
        Blueprint {
            tag: Some(tag),
            wargear,
            ..unit(name, UnitCategory::Hero, cost)
        }
    }

    fn faction(id: &str, name: &str, blueprints: Vec<Blueprint>) -> Faction {
        let keywords = HeroKeywords::default();
        let classifier = HeroClassifier::new(&keywords);
        let mut positions = std::collections::HashMap::new();
        let units = blueprints
            .into_iter()
            .map(|blueprint| {
                let index = positions.entry(blueprint.category).or_insert(0usize);
                let template = UnitTemplate {
                    id: TemplateId::new(format!("{id}/{}/{index}", blueprint.category.key())),
                    name: blueprint.name.to_string(),
                    base_cost: blueprint.cost,
                    min_size: blueprint.size.map(|(min, _)| min),
                    max_size: blueprint.size.map(|(_, max)| max),
                    category: blueprint.category,
                    subtype_tag: blueprint.tag.map(str::to_string),
                    hero: (blueprint.category == UnitCategory::Hero)
                        .then(|| classifier.profile(blueprint.tag)),
                    stats: None,
                    special_rules: Vec::new(),
                    wargear: blueprint.wargear,
                };
                *index += 1;
                template
            })
            .collect();
        Faction {
            id: FactionId::from(id),
            name: name.to_string(),
            special_rules: vec!["Disciplined".to_string()],
            flavor_text: Vec::new(),
            units,
        }
    }

    fn listing(slot: &str, entries: &[(&str, u32)]) -> Vec<LoadoutEntry> {
        entries
            .iter()
            .enumerate()
            .map(|(index, (name, cost))| LoadoutEntry::new(format!("{slot}-{index}"), *name, *cost))
            .collect()
    }

    /// Two factions: a full "Empire" list and a one-unit "Orcs" list.
    pub(crate) fn catalog() -> Catalog {
        let empire = faction(
            "empire",
            "Empire",
            vec![
                unit("Spearmen", UnitCategory::Basic, 100),
                Blueprint {
                    size: Some((10, 20)),
                    ..unit("Archers", UnitCategory::Basic, 10)
                },
                unit("Knights", UnitCategory::Elite, 150),
                unit("Cannon", UnitCategory::Rare, 120),
                unit("Steam Tank", UnitCategory::Unique, 250),
                hero("Captain", "Czempion", 50, WargearBudget::default()),
                hero(
                    "Battle Mage",
                    "Mag",
                    100,
                    WargearBudget {
                        max_spell_value: 50,
                        max_spell_count: 2,
                        max_item_value: 50,
                        max_item_count: 1,
                    },
                ),
                hero(
                    "Grand Marshal",
                    "Generał",
                    120,
                    WargearBudget {
                        max_item_value: 100,
                        ..WargearBudget::default()
                    },
                ),
                hero(
                    "Standard Bearer",
                    "Grupa dowódcza",
                    60,
                    WargearBudget {
                        max_item_value: 60,
                        ..WargearBudget::default()
                    },
                ),
                hero(
                    "Battle Wizard Champion",
                    "Czempion mag",
                    90,
                    WargearBudget {
                        max_spell_value: 50,
                        max_spell_count: 1,
                        ..WargearBudget::default()
                    },
                ),
            ],
        );
        let orcs = faction(
            "orcs",
            "Orcs",
            vec![unit("Boyz", UnitCategory::Basic, 60)],
        );

        Catalog {
            locale: "en".into(),
            factions: vec![empire, orcs],
            spells: listing("spell", &[("Fireball", 25), ("Shield", 20), ("Doom", 35)]),
            items: listing("item", &[("Charm", 15), ("Sword", 30)]),
            artifacts: listing("artifact", &[("Crown", 50), ("Orb", 40)]),
            banners: listing("banner", &[("War Banner", 25), ("Griffon Standard", 50)]),
        }
    }

    /// Fixture catalog plus one extra Empire hero classified from `tag`.
    pub(crate) fn catalog_with_hero(name: &'static str, tag: &'static str) -> Catalog {
        let mut catalog = catalog();
        let extra = faction(
            "empire",
            "Empire",
            vec![hero(name, tag, 150, WargearBudget::default())],
        );
        let empire = &mut catalog.factions[0];
        for mut template in extra.units {
            template.id = TemplateId::new(format!("empire/hero/{}", empire.units.len()));
            empire.units.push(template);
        }
        catalog
    }

    pub(crate) fn template<'c>(catalog: &'c Catalog, name: &str) -> &'c UnitTemplate {
        catalog
            .factions
            .iter()
            .flat_map(|faction| faction.units.iter())
            .find(|unit| unit.name == name)
            .unwrap_or_else(|| panic!("no fixture unit named {name}"))
    }

    pub(crate) fn template_id(store: &RosterStore, name: &str) -> TemplateId {
        template(store.catalog(), name).id.clone()
    }

    /// Store with default rules and the Empire selected.
    pub(crate) fn store(budget: u32) -> RosterStore {
        store_with(catalog(), budget)
    }

    pub(crate) fn store_with(catalog: Catalog, budget: u32) -> RosterStore {
        let mut store = RosterStore::new(Arc::new(catalog), RuleBook::default(), budget);
        store
            .select_faction(&FactionId::from("empire"))
            .expect("fixture faction");
        store
    }

    pub(crate) fn add(store: &mut RosterStore, name: &str) -> EntryId {
        let id = template_id(store, name);
        store
            .add_unit(&id)
            .unwrap_or_else(|err| panic!("adding {name}: {err}"))
    }
}
