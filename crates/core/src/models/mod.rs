//! Shared domain models.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// Locale-independent faction identifier.
    FactionId
);
string_id!(
    /// Locale-independent unit template identifier.
    TemplateId
);
string_id!(
    /// Locale-independent identifier of a spell, item, artifact or banner.
    LoadoutId
);
string_id!(
    /// Catalog language code (`pl`, `en`, ...).
    Locale
);

/// Identifier of a unit inside one roster. Never reused within a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Catalog section a unit template is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Basic,
    Elite,
    Rare,
    Unique,
    Hero,
}

impl UnitCategory {
    /// All categories in display order.
    pub const ALL: [UnitCategory; 5] = [
        UnitCategory::Basic,
        UnitCategory::Elite,
        UnitCategory::Rare,
        UnitCategory::Unique,
        UnitCategory::Hero,
    ];

    /// Stable key used inside template identifiers.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Elite => "elite",
            Self::Rare => "rare",
            Self::Unique => "unique",
            Self::Hero => "hero",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Hero subtype governing which loadout slots a hero may fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeroSubtype {
    CommandGroup,
    Mage,
    General,
    /// Catch-all for heroes matching no other keyword.
    Model,
}

impl fmt::Display for HeroSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CommandGroup => "command group",
            Self::Mage => "mage",
            Self::General => "general",
            Self::Model => "hero",
        };
        f.write_str(label)
    }
}

/// Hero classification assigned once when the catalog is ingested.
///
/// `champion` and `general` are tracked independently of `subtype`: a hero
/// may count against the champion or general limits while holding any
/// subtype. A "Mag generał" is a mage for loadouts and a general for limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroProfile {
    pub subtype: HeroSubtype,
    pub champion: bool,
    #[serde(default)]
    pub general: bool,
}

/// Category a roster entry is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryCategory {
    Basic,
    Elite,
    Rare,
    Unique,
    HeroCommandGroup,
    HeroMage,
    HeroGeneral,
    HeroModel,
}

impl EntryCategory {
    /// Display order used when grouping a roster.
    pub const ORDER: [EntryCategory; 8] = [
        EntryCategory::Basic,
        EntryCategory::Elite,
        EntryCategory::Rare,
        EntryCategory::Unique,
        EntryCategory::HeroCommandGroup,
        EntryCategory::HeroGeneral,
        EntryCategory::HeroMage,
        EntryCategory::HeroModel,
    ];

    /// Resolve the roster category of a template.
    ///
    /// Hero templates without a profile fall back to `HeroModel`.
    pub fn of(template: &UnitTemplate) -> Self {
        match template.category {
            UnitCategory::Basic => Self::Basic,
            UnitCategory::Elite => Self::Elite,
            UnitCategory::Rare => Self::Rare,
            UnitCategory::Unique => Self::Unique,
            UnitCategory::Hero => {
                let subtype = template
                    .hero
                    .map(|profile| profile.subtype)
                    .unwrap_or(HeroSubtype::Model);
                Self::from_subtype(subtype)
            }
        }
    }

    /// Map a hero subtype onto its roster category.
    pub const fn from_subtype(subtype: HeroSubtype) -> Self {
        match subtype {
            HeroSubtype::CommandGroup => Self::HeroCommandGroup,
            HeroSubtype::Mage => Self::HeroMage,
            HeroSubtype::General => Self::HeroGeneral,
            HeroSubtype::Model => Self::HeroModel,
        }
    }

    /// Hero subtype, or `None` for regular units.
    pub const fn hero_subtype(self) -> Option<HeroSubtype> {
        match self {
            Self::HeroCommandGroup => Some(HeroSubtype::CommandGroup),
            Self::HeroMage => Some(HeroSubtype::Mage),
            Self::HeroGeneral => Some(HeroSubtype::General),
            Self::HeroModel => Some(HeroSubtype::Model),
            _ => None,
        }
    }

    /// Whether the entry counts as a hero.
    pub const fn is_hero(self) -> bool {
        self.hero_subtype().is_some()
    }
}

impl fmt::Display for EntryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.hero_subtype() {
            Some(subtype) => write!(f, "{subtype}"),
            None => {
                let label = match self {
                    Self::Basic => "basic",
                    Self::Elite => "elite",
                    Self::Rare => "rare",
                    _ => "unique",
                };
                f.write_str(label)
            }
        }
    }
}

/// Optional per-model characteristics, kept as the catalog spells them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub leadership: Option<String>,
    pub movement: Option<String>,
    pub weapon_skill: Option<String>,
    pub strength: Option<String>,
    pub toughness: Option<String>,
    pub attacks: Option<String>,
    pub wounds: Option<String>,
}

impl StatBlock {
    /// Label/value pairs for the populated characteristics.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("M", &self.movement),
            ("WS", &self.weapon_skill),
            ("S", &self.strength),
            ("T", &self.toughness),
            ("W", &self.wounds),
            ("A", &self.attacks),
            ("LD", &self.leadership),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|value| (label, value)))
        .collect()
    }

    /// True when no characteristic is present.
    pub fn is_empty(&self) -> bool {
        self.fields().is_empty()
    }
}

/// Spell and item allowances of a unit. Zero means "none allowed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WargearBudget {
    pub max_spell_value: u32,
    pub max_spell_count: u32,
    pub max_item_value: u32,
    pub max_item_count: u32,
}

/// Inclusive unit size range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBounds {
    pub min: u32,
    pub max: u32,
}

impl SizeBounds {
    /// Whether `value` lies inside the range.
    pub fn contains(self, value: i64) -> bool {
        value >= i64::from(self.min) && value <= i64::from(self.max)
    }
}

/// Immutable unit definition supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTemplate {
    pub id: TemplateId,
    pub name: String,
    /// Points per model.
    pub base_cost: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u32>,
    pub category: UnitCategory,
    /// Free-form hero type text as written in the catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hero: Option<HeroProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatBlock>,
    #[serde(default)]
    pub special_rules: Vec<String>,
    #[serde(default)]
    pub wargear: WargearBudget,
}

impl UnitTemplate {
    /// Size range, filling absent bounds with the supplied defaults.
    ///
    /// A maximum below the minimum is raised to the minimum.
    pub fn size_bounds(&self, default_min: u32, default_max: u32) -> SizeBounds {
        let min = self.min_size.unwrap_or(default_min);
        let max = self.max_size.unwrap_or(default_max).max(min);
        SizeBounds { min, max }
    }

    /// Whether the template is counted against the champion limits.
    pub fn is_champion(&self) -> bool {
        self.hero.map(|profile| profile.champion).unwrap_or(false)
    }

    /// Whether the template is counted against the army-wide general cap.
    pub fn is_general(&self) -> bool {
        self.hero.map(|profile| profile.general).unwrap_or(false)
    }

    /// Copy display text from the same template in another locale.
    ///
    /// Costs, bounds, category and hero profile stay untouched.
    pub fn localize_from(&mut self, other: &UnitTemplate) {
        self.name = other.name.clone();
        self.subtype_tag = other.subtype_tag.clone();
        self.stats = other.stats.clone();
        self.special_rules = other.special_rules.clone();
    }
}

/// Wargear slot on a roster entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadoutSlot {
    Spell,
    Item,
    Artifact,
    Banner,
}

impl LoadoutSlot {
    /// All slots in display order.
    pub const ALL: [LoadoutSlot; 4] = [
        LoadoutSlot::Spell,
        LoadoutSlot::Item,
        LoadoutSlot::Artifact,
        LoadoutSlot::Banner,
    ];

    /// Stable key used in identifiers and file names.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Spell => "spell",
            Self::Item => "item",
            Self::Artifact => "artifact",
            Self::Banner => "banner",
        }
    }
}

impl fmt::Display for LoadoutSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A spell, item, artifact or banner with its point cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutEntry {
    pub id: LoadoutId,
    pub name: String,
    pub cost: u32,
}

impl LoadoutEntry {
    /// Build an entry from its parts.
    pub fn new(id: impl Into<String>, name: impl Into<String>, cost: u32) -> Self {
        Self {
            id: LoadoutId(id.into()),
            name: name.into(),
            cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hero(subtype: HeroSubtype, champion: bool) -> UnitTemplate {
        UnitTemplate {
            id: TemplateId::from("f/hero/0"),
            name: "Hero".to_string(),
            base_cost: 50,
            min_size: None,
            max_size: None,
            category: UnitCategory::Hero,
            subtype_tag: None,
            hero: Some(HeroProfile {
                subtype,
                champion,
                general: subtype == HeroSubtype::General,
            }),
            stats: None,
            special_rules: Vec::new(),
            wargear: WargearBudget::default(),
        }
    }

    #[test]
    fn hero_templates_resolve_to_their_subtype_category() {
        assert_eq!(
            EntryCategory::of(&hero(HeroSubtype::Mage, false)),
            EntryCategory::HeroMage
        );
        let champion = hero(HeroSubtype::Model, true);
        assert_eq!(EntryCategory::of(&champion), EntryCategory::HeroModel);
        assert!(champion.is_champion());
    }

    #[test]
    fn size_bounds_fill_defaults_and_raise_inverted_max() {
        let mut template = hero(HeroSubtype::Model, false);
        assert_eq!(template.size_bounds(1, 99), SizeBounds { min: 1, max: 99 });

        template.min_size = Some(10);
        template.max_size = Some(5);
        assert_eq!(template.size_bounds(1, 99), SizeBounds { min: 10, max: 10 });
    }

    #[test]
    fn stat_block_lists_only_present_fields() {
        let stats = StatBlock {
            movement: Some("4".to_string()),
            leadership: Some("8".to_string()),
            ..StatBlock::default()
        };
        assert_eq!(stats.fields(), vec![("M", "4"), ("LD", "8")]);
        assert!(StatBlock::default().is_empty());
    }
}
