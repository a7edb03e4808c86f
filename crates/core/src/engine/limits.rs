//! Budget-indexed composition limits.

use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` count range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u32,
    pub max: u32,
}

impl Bounds {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub const fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Value that switches once the budget rises above `threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiered<T> {
    pub threshold: u32,
    pub at_or_below: T,
    pub above: T,
}

impl<T: Copy> Tiered<T> {
    pub const fn new(threshold: u32, at_or_below: T, above: T) -> Self {
        Self {
            threshold,
            at_or_below,
            above,
        }
    }

    /// Value in force for `budget`.
    pub fn at(&self, budget: u32) -> T {
        if budget <= self.threshold {
            self.at_or_below
        } else {
            self.above
        }
    }
}

/// Every numeric rule constant, loadable from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitRules {
    pub command_group: Tiered<Bounds>,
    pub champion: Tiered<Bounds>,
    /// Points of budget per permitted mage.
    pub mage_points_per_slot: u32,
    pub basic_min: Tiered<u32>,
    pub rare_max: Tiered<u32>,
    pub unique_max: Tiered<u32>,
    pub elite_min: u32,
    pub hero_min: u32,
    pub general_max: u32,
    pub artifacts_per_general: u32,
    pub banners_per_unit: u32,
    pub banners_total: u32,
    /// Smallest budget at which banners may be taken.
    pub banner_min_budget: u32,
    pub default_min_size: u32,
    pub default_max_size: u32,
}

impl Default for LimitRules {
    fn default() -> Self {
        Self {
            command_group: Tiered::new(1500, Bounds::new(1, 3), Bounds::new(2, 6)),
            champion: Tiered::new(1500, Bounds::new(1, 3), Bounds::new(1, 6)),
            mage_points_per_slot: 500,
            basic_min: Tiered::new(1000, 2, 4),
            rare_max: Tiered::new(1500, 4, 8),
            unique_max: Tiered::new(1500, 3, 6),
            elite_min: 2,
            hero_min: 4,
            general_max: 1,
            artifacts_per_general: 1,
            banners_per_unit: 1,
            banners_total: 1,
            banner_min_budget: 1000,
            default_min_size: 1,
            default_max_size: 99,
        }
    }
}

/// Limits in force for one budget and roster state. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSet {
    pub budget: u32,
    pub basic_min: u32,
    pub elite: Bounds,
    pub rare_max: u32,
    pub unique_max: u32,
    pub command_group: Bounds,
    pub champion: Bounds,
    pub mage_max: u32,
    pub general_max: u32,
    pub hero_min: u32,
    pub banners_allowed: bool,
    pub banners_total: u32,
}

/// Pure mapping from point budget to category limits.
#[derive(Debug, Clone, Copy)]
pub struct LimitPolicy<'a> {
    rules: &'a LimitRules,
}

impl<'a> LimitPolicy<'a> {
    pub fn new(rules: &'a LimitRules) -> Self {
        Self { rules }
    }

    pub fn command_group(&self, budget: u32) -> Bounds {
        self.rules.command_group.at(budget)
    }

    pub fn champion(&self, budget: u32) -> Bounds {
        self.rules.champion.at(budget)
    }

    /// `floor(budget / mage_points_per_slot)`; zero when the divisor is zero.
    pub fn mage_max(&self, budget: u32) -> u32 {
        budget
            .checked_div(self.rules.mage_points_per_slot)
            .unwrap_or(0)
    }

    pub fn basic_min(&self, budget: u32) -> u32 {
        self.rules.basic_min.at(budget)
    }

    pub fn rare_max(&self, budget: u32) -> u32 {
        self.rules.rare_max.at(budget)
    }

    pub fn unique_max(&self, budget: u32) -> u32 {
        self.rules.unique_max.at(budget)
    }

    /// Elite range; the maximum tracks the current number of basic units.
    pub fn elite(&self, basic_count: u32) -> Bounds {
        Bounds::new(self.rules.elite_min, basic_count)
    }

    pub fn banners_allowed(&self, budget: u32) -> bool {
        budget >= self.rules.banner_min_budget
    }

    /// Full limit set for `budget` given the current basic unit count.
    pub fn limits(&self, budget: u32, basic_count: u32) -> LimitSet {
        LimitSet {
            budget,
            basic_min: self.basic_min(budget),
            elite: self.elite(basic_count),
            rare_max: self.rare_max(budget),
            unique_max: self.unique_max(budget),
            command_group: self.command_group(budget),
            champion: self.champion(budget),
            mage_max: self.mage_max(budget),
            general_max: self.rules.general_max,
            hero_min: self.rules.hero_min,
            banners_allowed: self.banners_allowed(budget),
            banners_total: self.rules.banners_total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_group_breakpoint_is_inclusive_at_1500() {
        let rules = LimitRules::default();
        let policy = LimitPolicy::new(&rules);
        assert_eq!(policy.command_group(1499), Bounds::new(1, 3));
        assert_eq!(policy.command_group(1500), Bounds::new(1, 3));
        assert_eq!(policy.command_group(1501), Bounds::new(2, 6));
    }

    #[test]
    fn champion_minimum_stays_at_one() {
        let rules = LimitRules::default();
        let policy = LimitPolicy::new(&rules);
        assert_eq!(policy.champion(1500), Bounds::new(1, 3));
        assert_eq!(policy.champion(2000), Bounds::new(1, 6));
    }

    #[test]
    fn mage_max_floors_budget_over_500() {
        let rules = LimitRules::default();
        let policy = LimitPolicy::new(&rules);
        assert_eq!(policy.mage_max(499), 0);
        assert_eq!(policy.mage_max(1499), 2);
        assert_eq!(policy.mage_max(1500), 3);

        let zero = LimitRules {
            mage_points_per_slot: 0,
            ..LimitRules::default()
        };
        assert_eq!(LimitPolicy::new(&zero).mage_max(2000), 0);
    }

    #[test]
    fn category_tiers_switch_at_their_thresholds() {
        let rules = LimitRules::default();
        let policy = LimitPolicy::new(&rules);
        assert_eq!(policy.basic_min(1000), 2);
        assert_eq!(policy.basic_min(1001), 4);
        assert_eq!(policy.rare_max(1500), 4);
        assert_eq!(policy.rare_max(1501), 8);
        assert_eq!(policy.unique_max(1500), 3);
        assert_eq!(policy.unique_max(1501), 6);
    }

    #[test]
    fn banners_open_at_1000_points() {
        let rules = LimitRules::default();
        let policy = LimitPolicy::new(&rules);
        assert!(!policy.banners_allowed(999));
        assert!(policy.banners_allowed(1000));
    }

    #[test]
    fn limit_set_tracks_basic_count_for_elites() {
        let rules = LimitRules::default();
        let limits = LimitPolicy::new(&rules).limits(800, 3);
        assert_eq!(limits.elite, Bounds::new(2, 3));
        assert_eq!(limits.mage_max, 1);
        assert_eq!(limits.hero_min, 4);
        assert!(!limits.banners_allowed);
    }
}
