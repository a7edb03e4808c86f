//! Reasons a roster command is rejected.

use std::fmt;

use thiserror::Error;

use crate::models::{EntryCategory, EntryId, FactionId, LoadoutSlot, TemplateId};

/// Unit or hero group with an add-time count limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimitedCategory {
    Elite,
    Rare,
    Unique,
    CommandGroup,
    Champion,
    Mage,
}

impl fmt::Display for LimitedCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Elite => "elite unit",
            Self::Rare => "rare unit",
            Self::Unique => "unique unit",
            Self::CommandGroup => "command group",
            Self::Champion => "champion",
            Self::Mage => "mage",
        };
        f.write_str(label)
    }
}

/// Which per-slot cap an addition would break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapKind {
    Count,
    Points,
}

impl fmt::Display for CapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => f.write_str("count"),
            Self::Points => f.write_str("points"),
        }
    }
}

/// Limits that span the whole army rather than one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArmyCap {
    Generals { limit: u32 },
    Banners { limit: u32 },
    /// Banners are unavailable below `threshold` points.
    BannersBelowBudget { threshold: u32 },
}

impl fmt::Display for ArmyCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generals { limit } => write!(f, "general limit of {limit}"),
            Self::Banners { limit } => write!(f, "banner limit of {limit}"),
            Self::BannersBelowBudget { threshold } => {
                write!(f, "banner threshold of {threshold} points")
            }
        }
    }
}

/// A rejected roster command. The snapshot is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("{category} limit of {limit} reached")]
    CategoryLimitExceeded {
        category: LimitedCategory,
        limit: u32,
    },
    #[error("roster would cost {total} points, over the {budget} point budget")]
    BudgetExceeded { total: u32, budget: u32 },
    #[error("unit size {requested} outside {min}..={max}")]
    SizeOutOfBounds { requested: i64, min: u32, max: u32 },
    #[error("{slot} not available to a {holder}")]
    IneligibleLoadout {
        slot: LoadoutSlot,
        holder: EntryCategory,
    },
    #[error("{slot} {cap} cap of {limit} reached")]
    LoadoutCapExceeded {
        slot: LoadoutSlot,
        cap: CapKind,
        limit: u32,
    },
    #[error("army-wide {cap} reached")]
    ArmyWideCapExceeded { cap: ArmyCap },
    #[error("unknown faction `{0}`")]
    UnknownFaction(FactionId),
    #[error("unknown unit `{0}`")]
    UnknownTemplate(TemplateId),
    #[error("no roster entry {0}")]
    UnknownEntry(EntryId),
    #[error("no {slot} named `{name}` in the catalog")]
    UnknownLoadout { slot: LoadoutSlot, name: String },
    #[error("no faction selected")]
    NoFactionSelected,
}

impl RosterError {
    /// Stable machine-readable reason code.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CategoryLimitExceeded { .. } => "category_limit_exceeded",
            Self::BudgetExceeded { .. } => "budget_exceeded",
            Self::SizeOutOfBounds { .. } => "size_out_of_bounds",
            Self::IneligibleLoadout { .. } => "ineligible_loadout",
            Self::LoadoutCapExceeded { .. } => "loadout_cap_exceeded",
            Self::ArmyWideCapExceeded { .. } => "army_wide_cap_exceeded",
            Self::UnknownFaction(_) => "unknown_faction",
            Self::UnknownTemplate(_) => "unknown_template",
            Self::UnknownEntry(_) => "unknown_entry",
            Self::UnknownLoadout { .. } => "unknown_loadout",
            Self::NoFactionSelected => "no_faction_selected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_their_context() {
        let err = RosterError::CategoryLimitExceeded {
            category: LimitedCategory::Rare,
            limit: 4,
        };
        assert_eq!(err.to_string(), "rare unit limit of 4 reached");
        assert_eq!(err.code(), "category_limit_exceeded");

        let err = RosterError::ArmyWideCapExceeded {
            cap: ArmyCap::BannersBelowBudget { threshold: 1000 },
        };
        assert_eq!(
            err.to_string(),
            "army-wide banner threshold of 1000 points reached"
        );

        let err = RosterError::IneligibleLoadout {
            slot: LoadoutSlot::Artifact,
            holder: EntryCategory::HeroMage,
        };
        assert_eq!(err.to_string(), "artifact not available to a mage");
    }
}
