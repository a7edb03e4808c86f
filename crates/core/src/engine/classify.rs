//! Hero subtype classification from free-form catalog tags.

use serde::{Deserialize, Serialize};

use crate::models::{HeroProfile, HeroSubtype};

/// Lower-case substrings recognised in hero type tags, per subtype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroKeywords {
    pub command_group: Vec<String>,
    pub mage: Vec<String>,
    pub general: Vec<String>,
    pub champion: Vec<String>,
}

impl Default for HeroKeywords {
    fn default() -> Self {
        let words = |list: &[&str]| list.iter().map(|word| word.to_string()).collect();
        Self {
            command_group: words(&["grupa", "command group"]),
            mage: words(&["mag", "wizard"]),
            general: words(&["generał", "general"]),
            champion: words(&["czempion", "champion"]),
        }
    }
}

/// Maps a hero tag onto a [`HeroSubtype`].
///
/// Matching is case-insensitive substring containment checked in priority
/// order: command group, then mage, then general. The champion and general
/// predicates are evaluated separately and do not influence the subtype.
#[derive(Debug, Clone, Copy)]
pub struct HeroClassifier<'a> {
    keywords: &'a HeroKeywords,
}

impl<'a> HeroClassifier<'a> {
    pub fn new(keywords: &'a HeroKeywords) -> Self {
        Self { keywords }
    }

    pub fn classify(&self, tag: &str) -> HeroSubtype {
        let tag = tag.to_lowercase();
        if matches_any(&tag, &self.keywords.command_group) {
            HeroSubtype::CommandGroup
        } else if matches_any(&tag, &self.keywords.mage) {
            HeroSubtype::Mage
        } else if matches_any(&tag, &self.keywords.general) {
            HeroSubtype::General
        } else {
            HeroSubtype::Model
        }
    }

    pub fn is_champion(&self, tag: &str) -> bool {
        matches_any(&tag.to_lowercase(), &self.keywords.champion)
    }

    /// General keywords anywhere in the tag, whatever subtype wins.
    pub fn is_general(&self, tag: &str) -> bool {
        matches_any(&tag.to_lowercase(), &self.keywords.general)
    }

    /// Classification for a possibly absent tag.
    pub fn profile(&self, tag: Option<&str>) -> HeroProfile {
        let tag = tag.unwrap_or_default();
        HeroProfile {
            subtype: self.classify(tag),
            champion: self.is_champion(tag),
            general: self.is_general(tag),
        }
    }
}

fn matches_any(tag: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .any(|keyword| !keyword.is_empty() && tag.contains(&keyword))
}
