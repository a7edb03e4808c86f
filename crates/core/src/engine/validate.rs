//! Legality verdict over a whole roster.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    cost::CostEngine,
    limits::{LimitPolicy, LimitRules},
    roster::Roster,
};

/// Named composition rule checked by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    BasicMinimum,
    EliteMinimum,
    EliteMaximum,
    RareMaximum,
    UniqueMaximum,
    PointBudget,
    GeneralMaximum,
    CommandGroupMinimum,
    CommandGroupMaximum,
    ChampionMinimum,
    ChampionMaximum,
    MageMaximum,
    HeroMinimum,
}

impl Rule {
    /// Stable reason code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::BasicMinimum => "basic_minimum",
            Self::EliteMinimum => "elite_minimum",
            Self::EliteMaximum => "elite_maximum",
            Self::RareMaximum => "rare_maximum",
            Self::UniqueMaximum => "unique_maximum",
            Self::PointBudget => "point_budget",
            Self::GeneralMaximum => "general_maximum",
            Self::CommandGroupMinimum => "command_group_minimum",
            Self::CommandGroupMaximum => "command_group_maximum",
            Self::ChampionMinimum => "champion_minimum",
            Self::ChampionMaximum => "champion_maximum",
            Self::MageMaximum => "mage_maximum",
            Self::HeroMinimum => "hero_minimum",
        }
    }

    const fn subject(self) -> &'static str {
        match self {
            Self::BasicMinimum => "basic units",
            Self::EliteMinimum | Self::EliteMaximum => "elite units",
            Self::RareMaximum => "rare units",
            Self::UniqueMaximum => "unique units",
            Self::PointBudget => "points",
            Self::GeneralMaximum => "generals",
            Self::CommandGroupMinimum | Self::CommandGroupMaximum => "command groups",
            Self::ChampionMinimum | Self::ChampionMaximum => "champions",
            Self::MageMaximum => "mages",
            Self::HeroMinimum => "heroes",
        }
    }

    const fn is_minimum(self) -> bool {
        matches!(
            self,
            Self::BasicMinimum
                | Self::EliteMinimum
                | Self::CommandGroupMinimum
                | Self::ChampionMinimum
                | Self::HeroMinimum
        )
    }
}

/// Outcome of one rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    pub rule: Rule,
    pub actual: u32,
    pub bound: u32,
    pub passed: bool,
}

impl Check {
    fn at_least(rule: Rule, actual: u32, bound: u32) -> Self {
        Self {
            rule,
            actual,
            bound,
            passed: actual >= bound,
        }
    }

    fn at_most(rule: Rule, actual: u32, bound: u32) -> Self {
        Self {
            rule,
            actual,
            bound,
            passed: actual <= bound,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.rule.is_minimum() {
            "minimum"
        } else {
            "maximum"
        };
        write!(
            f,
            "{}: {} ({kind} {})",
            self.rule.subject(),
            self.actual,
            self.bound
        )
    }
}

/// Conjunction of every rule, recomputed from the roster on each read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub checks: Vec<Check>,
}

impl Verdict {
    pub fn is_legal(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> + '_ {
        self.checks.iter().filter(|check| !check.passed)
    }

    pub fn failed_rules(&self) -> Vec<Rule> {
        self.failures().map(|check| check.rule).collect()
    }

    pub fn check(&self, rule: Rule) -> Option<&Check> {
        self.checks.iter().find(|check| check.rule == rule)
    }
}

/// Aggregates every composition rule into a [`Verdict`].
pub struct Validator;

impl Validator {
    pub fn evaluate(roster: &Roster, rules: &LimitRules) -> Verdict {
        let counts = roster.counts();
        let limits = LimitPolicy::new(rules).limits(roster.budget, counts.basic);
        let total = CostEngine::total_cost(roster);

        let checks = vec![
            Check::at_least(Rule::BasicMinimum, counts.basic, limits.basic_min),
            Check::at_least(Rule::EliteMinimum, counts.elite, limits.elite.min),
            Check::at_most(Rule::EliteMaximum, counts.elite, limits.elite.max),
            Check::at_most(Rule::RareMaximum, counts.rare, limits.rare_max),
            Check::at_most(Rule::UniqueMaximum, counts.unique, limits.unique_max),
            Check::at_most(Rule::PointBudget, total, roster.budget),
            Check::at_most(Rule::GeneralMaximum, counts.general, limits.general_max),
            Check::at_least(
                Rule::CommandGroupMinimum,
                counts.command_group,
                limits.command_group.min,
            ),
            Check::at_most(
                Rule::CommandGroupMaximum,
                counts.command_group,
                limits.command_group.max,
            ),
            Check::at_least(Rule::ChampionMinimum, counts.champion, limits.champion.min),
            Check::at_most(Rule::ChampionMaximum, counts.champion, limits.champion.max),
            Check::at_most(Rule::MageMaximum, counts.mage, limits.mage_max),
            Check::at_least(Rule::HeroMinimum, counts.heroes, limits.hero_min),
        ];

        Verdict { checks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::Catalog,
        engine::{fixtures, Loadout, RosterEntry},
        models::EntryCategory,
    };

    /// Empire roster holding one of each named unit, bypassing add-time caps.
    fn roster_of(catalog: &Catalog, budget: u32, names: &[&str]) -> Roster {
        let mut roster = Roster::for_faction(catalog.factions[0].id.clone(), budget);
        for name in names {
            let template = fixtures::template(catalog, name).clone();
            let id = roster.allocate_id();
            roster.entries.push(RosterEntry {
                id,
                category: EntryCategory::of(&template),
                count: 1,
                template,
                loadout: Loadout::default(),
            });
        }
        roster
    }

    fn failed(verdict: &Verdict, rule: Rule) -> (u32, u32) {
        let check = verdict.check(rule).copied().unwrap();
        assert!(!check.passed, "{rule:?} should fail");
        (check.actual, check.bound)
    }

    #[test]
    fn empty_roster_fails_minimums_only() {
        let verdict = Validator::evaluate(&Roster::new(800), &LimitRules::default());
        assert!(!verdict.is_legal());
        assert_eq!(
            verdict.failed_rules(),
            vec![
                Rule::BasicMinimum,
                Rule::EliteMinimum,
                Rule::CommandGroupMinimum,
                Rule::ChampionMinimum,
                Rule::HeroMinimum,
            ]
        );
    }

    #[test]
    fn complete_army_is_legal() {
        let mut store = fixtures::store(1000);
        for name in [
            "Spearmen",
            "Spearmen",
            "Knights",
            "Knights",
            "Standard Bearer",
            "Captain",
            "Grand Marshal",
            "Battle Mage",
        ] {
            fixtures::add(&mut store, name);
        }
        let verdict = store.verdict();
        assert!(verdict.is_legal(), "{:?}", verdict.failed_rules());
    }

    #[test]
    fn tightened_budget_is_reported_not_enforced() {
        let mut store = fixtures::store(2000);
        for name in ["Battle Mage", "Battle Mage", "Battle Mage", "Battle Mage"] {
            fixtures::add(&mut store, name);
        }
        store.set_budget(1000);

        assert_eq!(store.snapshot().entries.len(), 4);
        let verdict = store.verdict();
        let mages = verdict.check(Rule::MageMaximum).copied().unwrap();
        assert!(!mages.passed);
        assert_eq!((mages.actual, mages.bound), (4, 2));
        assert_eq!(mages.to_string(), "mages: 4 (maximum 2)");
    }

    #[test]
    fn over_budget_fails_point_rule() {
        let mut store = fixtures::store(300);
        fixtures::add(&mut store, "Spearmen");
        fixtures::add(&mut store, "Spearmen");
        fixtures::add(&mut store, "Knights");

        let verdict = store.verdict();
        let points = verdict.check(Rule::PointBudget).copied().unwrap();
        assert!(!points.passed);
        assert_eq!(points.actual, 350);
    }

    #[test]
    fn elite_maximum_tracks_removed_basics() {
        let mut store = fixtures::store(1000);
        let first = fixtures::add(&mut store, "Spearmen");
        fixtures::add(&mut store, "Spearmen");
        fixtures::add(&mut store, "Knights");
        fixtures::add(&mut store, "Knights");
        assert!(store.verdict().check(Rule::EliteMaximum).unwrap().passed);

        store.remove_unit(first).unwrap();
        let verdict = store.verdict();
        assert_eq!(failed(&verdict, Rule::EliteMaximum), (2, 1));
        assert!(!verdict.check(Rule::BasicMinimum).unwrap().passed);
    }

    #[test]
    fn category_maximums_tighten_with_budget() {
        let mut store = fixtures::store(1501);
        for _ in 0..5 {
            fixtures::add(&mut store, "Cannon");
        }
        for _ in 0..4 {
            fixtures::add(&mut store, "Steam Tank");
        }
        let verdict = store.verdict();
        assert!(verdict.check(Rule::RareMaximum).unwrap().passed);
        assert!(verdict.check(Rule::UniqueMaximum).unwrap().passed);

        store.set_budget(1500);
        let verdict = store.verdict();
        assert_eq!(failed(&verdict, Rule::RareMaximum), (5, 4));
        assert_eq!(failed(&verdict, Rule::UniqueMaximum), (4, 3));
    }

    #[test]
    fn hero_group_maximums_tighten_with_budget() {
        let mut store = fixtures::store(1501);
        for _ in 0..4 {
            fixtures::add(&mut store, "Standard Bearer");
            fixtures::add(&mut store, "Captain");
        }
        let verdict = store.verdict();
        assert!(verdict.check(Rule::CommandGroupMaximum).unwrap().passed);
        assert!(verdict.check(Rule::ChampionMaximum).unwrap().passed);

        store.set_budget(1500);
        let verdict = store.verdict();
        assert_eq!(failed(&verdict, Rule::CommandGroupMaximum), (4, 3));
        assert_eq!(failed(&verdict, Rule::ChampionMaximum), (4, 3));
    }

    #[test]
    fn generals_are_counted_by_tag() {
        let catalog = fixtures::catalog_with_hero("Arch Magister", "Mag generał");
        let roster = roster_of(&catalog, 1000, &["Arch Magister", "Grand Marshal"]);
        let verdict = Validator::evaluate(&roster, &LimitRules::default());

        assert_eq!(failed(&verdict, Rule::GeneralMaximum), (2, 1));
        assert_eq!(roster.counts().mage, 1);
        assert!(verdict.check(Rule::MageMaximum).unwrap().passed);
    }
}
