use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{Catalog, Faction};
use crate::{
    engine::{HeroClassifier, HeroKeywords},
    models::{
        FactionId, LoadoutEntry, LoadoutSlot, Locale, StatBlock, TemplateId, UnitCategory,
        UnitTemplate, WargearBudget,
    },
};

/// File holding the faction map inside a locale directory.
pub const UNITS_FILE: &str = "units.json";

static CATEGORY_KEYS: Lazy<HashMap<&'static str, UnitCategory>> = Lazy::new(|| {
    HashMap::from([
        ("oddziały podstawowe", UnitCategory::Basic),
        ("basic", UnitCategory::Basic),
        ("oddziały elitarne", UnitCategory::Elite),
        ("elite", UnitCategory::Elite),
        ("oddziały rzadkie", UnitCategory::Rare),
        ("rare", UnitCategory::Rare),
        ("oddziały unikalne", UnitCategory::Unique),
        ("unique", UnitCategory::Unique),
        ("bohaterowie", UnitCategory::Hero),
        ("heroes", UnitCategory::Hero),
    ])
});

static RAW_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)").expect("failed to compile catalog numeric regex"));

/// Reads locale catalogs from `<root>/<locale>/`.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    root: PathBuf,
    keywords: HeroKeywords,
}

impl CatalogLoader {
    pub fn new(root: impl Into<PathBuf>, keywords: HeroKeywords) -> Self {
        Self {
            root: root.into(),
            keywords,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load and classify the catalog for `locale`.
    pub fn load(&self, locale: &Locale) -> Result<Catalog> {
        let dir = self.root.join(locale.as_str());
        let units_path = dir.join(UNITS_FILE);
        let content = fs::read_to_string(&units_path)
            .with_context(|| format!("failed to read {}", units_path.display()))?;
        let raw: RawUnitsFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", units_path.display()))?;

        let classifier = HeroClassifier::new(&self.keywords);
        let factions = raw
            .factions
            .iter()
            .enumerate()
            .map(|(position, (name, body))| build_faction(position, name, body, &classifier))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("invalid faction data in {}", units_path.display()))?;

        let mut catalog = Catalog {
            factions,
            ..Catalog::empty(locale.clone())
        };
        for slot in LoadoutSlot::ALL {
            let list = load_loadout(&dir, slot)?;
            match slot {
                LoadoutSlot::Spell => catalog.spells = list,
                LoadoutSlot::Item => catalog.items = list,
                LoadoutSlot::Artifact => catalog.artifacts = list,
                LoadoutSlot::Banner => catalog.banners = list,
            }
        }

        info!(
            locale = %locale,
            factions = catalog.factions.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }
}

/// Locale directories under `root` that contain a units file, sorted.
pub fn discover_locales(root: impl AsRef<Path>) -> Result<Vec<Locale>> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(anyhow!("catalog directory missing: {}", root.display()));
    }

    let mut locales = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to scan {}", root.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !entry.path().join(UNITS_FILE).is_file() {
            warn!("Skipping {} – missing {}", name, UNITS_FILE);
            continue;
        }
        locales.push(Locale::new(name));
    }
    locales.sort();
    Ok(locales)
}

fn build_faction(
    position: usize,
    name: &str,
    body: &Value,
    classifier: &HeroClassifier<'_>,
) -> Result<Faction> {
    let object = body
        .as_object()
        .ok_or_else(|| anyhow!("faction {name} is not an object"))?;
    let id = object
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("faction-{position}"));

    let mut by_category: HashMap<UnitCategory, Vec<RawUnit>> = HashMap::new();
    for (key, value) in object {
        let Some(category) = CATEGORY_KEYS.get(key.trim().to_lowercase().as_str()) else {
            continue;
        };
        let units: Vec<RawUnit> = serde_json::from_value(value.clone())
            .with_context(|| format!("failed to parse {key} of {name}"))?;
        by_category.entry(*category).or_default().extend(units);
    }

    let mut units = Vec::new();
    for category in UnitCategory::ALL {
        let raw_units = by_category.remove(&category).unwrap_or_default();
        for (index, raw) in raw_units.into_iter().enumerate() {
            let fallback = format!("{id}/{}/{index}", category.key());
            match raw.into_template(fallback, category, classifier) {
                Some(template) => units.push(template),
                None => warn!("Skipping unnamed {} unit {} in {}", category, index, name),
            }
        }
    }

    Ok(Faction {
        id: FactionId::new(id),
        name: name.to_string(),
        special_rules: text_list(first_of(object, &["special_rule", "special_rules"])),
        flavor_text: text_list(object.get("flavor_text")),
        units,
    })
}

fn load_loadout(dir: &Path, slot: LoadoutSlot) -> Result<Vec<LoadoutEntry>> {
    let plural = format!("{}s", slot.key());
    let path = dir.join(format!("{plural}.json"));
    if !path.is_file() {
        warn!("No {} list at {}", slot, path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    let list = match value {
        Value::Array(items) => Value::Array(items),
        Value::Object(map) => map
            .into_iter()
            .find(|(key, _)| key.trim().to_lowercase() == plural)
            .map(|(_, list)| list)
            .unwrap_or(Value::Array(Vec::new())),
        _ => return Err(anyhow!("{} is neither a list nor an object", path.display())),
    };
    let raw: Vec<RawLoadout> = serde_json::from_value(list)
        .with_context(|| format!("failed to parse {} entries in {}", slot, path.display()))?;

    Ok(raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let name = entry.name.map(|name| name.trim().to_string());
            match name.filter(|name| !name.is_empty()) {
                Some(name) => Some(LoadoutEntry::new(
                    entry.id.unwrap_or_else(|| format!("{}-{index}", slot.key())),
                    name,
                    entry.cost.as_ref().and_then(parse_number).unwrap_or(0),
                )),
                None => {
                    warn!("Skipping unnamed {} at position {}", slot, index);
                    None
                }
            }
        })
        .collect())
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

/// A string, or a list of strings, as trimmed non-empty lines.
fn text_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(value_to_text)
            .collect(),
        Some(other) => value_to_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(num) => num.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Whole non-negative number from a JSON number or a string with leading digits.
fn parse_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(num) => num
            .as_u64()
            .or_else(|| num.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => RAW_NUMBER_RE
            .captures(s)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct RawUnitsFile {
    #[serde(alias = "frakcje", default)]
    factions: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawUnit {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "nazwa", alias = "name", default)]
    name: Option<String>,
    #[serde(rename = "punkty", alias = "cost", alias = "points", default)]
    cost: Option<Value>,
    #[serde(rename = "typ", alias = "type", default)]
    kind: Option<Value>,
    #[serde(rename = "minimal_unit_size", alias = "min_size", default)]
    min_size: Option<Value>,
    #[serde(rename = "maximum_unit_size", alias = "max_size", default)]
    max_size: Option<Value>,
    #[serde(rename = "_LD", alias = "leadership", default)]
    leadership: Option<Value>,
    #[serde(rename = "_M", alias = "movement", default)]
    movement: Option<Value>,
    #[serde(rename = "_WS", alias = "weapon_skill", default)]
    weapon_skill: Option<Value>,
    #[serde(rename = "_S", alias = "strength", default)]
    strength: Option<Value>,
    #[serde(rename = "_T", alias = "toughness", default)]
    toughness: Option<Value>,
    #[serde(rename = "_A", alias = "attacks", default)]
    attacks: Option<Value>,
    #[serde(rename = "_W", alias = "wounds", default)]
    wounds: Option<Value>,
    #[serde(rename = "_zasady_specjalne", alias = "special_rules", default)]
    special_rules: Option<Value>,
    #[serde(default)]
    max_spell_value: Option<Value>,
    #[serde(rename = "max_number_spells", alias = "max_spell_count", default)]
    max_spell_count: Option<Value>,
    #[serde(rename = "max_items_value", alias = "max_item_value", default)]
    max_item_value: Option<Value>,
    #[serde(rename = "max_number_items", alias = "max_item_count", default)]
    max_item_count: Option<Value>,
}

impl RawUnit {
    fn into_template(
        self,
        fallback_id: String,
        category: UnitCategory,
        classifier: &HeroClassifier<'_>,
    ) -> Option<UnitTemplate> {
        let name = self
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())?;
        let number = |value: &Option<Value>| value.as_ref().and_then(parse_number);
        let text = |value: &Option<Value>| value.as_ref().and_then(value_to_text);

        let subtype_tag = text(&self.kind);
        let hero = (category == UnitCategory::Hero)
            .then(|| classifier.profile(subtype_tag.as_deref()));
        let stats = StatBlock {
            leadership: text(&self.leadership),
            movement: text(&self.movement),
            weapon_skill: text(&self.weapon_skill),
            strength: text(&self.strength),
            toughness: text(&self.toughness),
            attacks: text(&self.attacks),
            wounds: text(&self.wounds),
        };

        Some(UnitTemplate {
            id: TemplateId::new(self.id.unwrap_or(fallback_id)),
            name,
            base_cost: number(&self.cost).unwrap_or(0),
            min_size: number(&self.min_size).filter(|size| *size > 0),
            max_size: number(&self.max_size).filter(|size| *size > 0),
            category,
            subtype_tag,
            hero,
            stats: (!stats.is_empty()).then_some(stats),
            special_rules: text_list(self.special_rules.as_ref()),
            wargear: WargearBudget {
                max_spell_value: number(&self.max_spell_value).unwrap_or(0),
                max_spell_count: number(&self.max_spell_count).unwrap_or(0),
                max_item_value: number(&self.max_item_value).unwrap_or(0),
                max_item_count: number(&self.max_item_count).unwrap_or(0),
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawLoadout {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "nazwa", alias = "name", default)]
    name: Option<String>,
    #[serde(rename = "koszt", alias = "cost", default)]
    cost: Option<Value>,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::HeroSubtype;
    use serde_json::json;
    use tempfile::tempdir;

    /// Write a two-locale catalog with matching structure under `root`.
    pub(crate) fn write_catalog(root: &Path) -> Result<()> {
        let polish = json!({
            "frakcje": {
                "Imperium": {
                    "special_rule": "Dyscyplina",
                    "flavor_text": ["Ludzie", "Stal"],
                    "oddziały podstawowe": [
                        { "nazwa": "Włócznicy", "punkty": "8", "minimal_unit_size": "10",
                          "maximum_unit_size": "30", "_M": "4", "_LD": 7 },
                        { "nazwa": "Łucznicy", "punkty": 9 }
                    ],
                    "oddziały elitarne": [ { "nazwa": "Rycerze", "punkty": "25 pkt" } ],
                    "bohaterowie": [
                        { "nazwa": "Czarodziej", "punkty": "90", "typ": "Mag",
                          "max_spell_value": "50", "max_number_spells": "2",
                          "max_items_value": "", "max_number_items": "1" },
                        { "nazwa": "Chorąży", "punkty": "70", "typ": "Grupa dowódcza, czempion",
                          "max_items_value": "50" },
                        { "nazwa": "Kapitan", "punkty": "60", "typ": "Czempion" },
                        { "punkty": "10" }
                    ]
                },
                "Orkowie": {
                    "oddziały podstawowe": [ { "nazwa": "Chłopaki", "punkty": "6" } ]
                }
            }
        });
        let english = json!({
            "factions": {
                "Empire": {
                    "special_rules": ["Discipline"],
                    "basic": [
                        { "name": "Spearmen", "cost": 8, "min_size": 10, "max_size": 30 },
                        { "name": "Archers", "cost": 9 }
                    ],
                    "elite": [ { "name": "Knights", "cost": 25 } ],
                    "heroes": [
                        { "name": "Wizard", "cost": 90, "type": "Mage" },
                        { "name": "Standard Bearer", "cost": 70, "type": "Command group, champion" },
                        { "name": "Captain", "cost": 60, "type": "Champion" }
                    ]
                },
                "Orcs": {
                    "basic": [ { "name": "Boyz", "cost": 6 } ]
                }
            }
        });

        fs::create_dir_all(root.join("pl"))?;
        fs::create_dir_all(root.join("en"))?;
        fs::create_dir_all(root.join("scratch"))?;
        fs::write(root.join("pl").join(UNITS_FILE), polish.to_string())?;
        fs::write(root.join("en").join(UNITS_FILE), english.to_string())?;
        fs::write(
            root.join("pl/spells.json"),
            json!({ "Spells": [ { "nazwa": "Kula ognia", "koszt": "25" } ] }).to_string(),
        )?;
        fs::write(
            root.join("en/spells.json"),
            json!({ "Spells": [ { "name": "Fireball", "cost": 25 } ] }).to_string(),
        )?;
        fs::write(
            root.join("pl/banners.json"),
            json!({ "Banners": [ { "nazwa": "Sztandar", "koszt": "30" } ] }).to_string(),
        )?;
        Ok(())
    }

    #[test]
    fn discovers_locale_directories() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;
        fs::write(temp.path().join("manifest.json"), "{}")?;

        let locales = discover_locales(temp.path())?;
        assert_eq!(locales, vec![Locale::from("en"), Locale::from("pl")]);
        assert!(discover_locales(temp.path().join("missing")).is_err());
        Ok(())
    }

    #[test]
    fn loads_source_shaped_catalog() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;
        let loader = CatalogLoader::new(temp.path(), HeroKeywords::default());

        let catalog = loader.load(&Locale::from("pl"))?;
        assert_eq!(catalog.factions.len(), 2);
        let empire = &catalog.factions[0];
        assert_eq!(empire.id.as_str(), "faction-0");
        assert_eq!(empire.name, "Imperium");
        assert_eq!(empire.special_rules, vec!["Dyscyplina".to_string()]);
        assert_eq!(empire.flavor_text.len(), 2);
        assert_eq!(empire.units.len(), 6, "unnamed hero is skipped");

        let spearmen = &empire.units[0];
        assert_eq!(spearmen.id.as_str(), "faction-0/basic/0");
        assert_eq!(spearmen.base_cost, 8);
        assert_eq!((spearmen.min_size, spearmen.max_size), (Some(10), Some(30)));
        let stats = spearmen.stats.as_ref().unwrap();
        assert_eq!(stats.fields(), vec![("M", "4"), ("LD", "7")]);
        assert_eq!(empire.units[2].base_cost, 25);

        let wizard = &empire.units[3];
        assert_eq!(wizard.id.as_str(), "faction-0/hero/0");
        assert_eq!(wizard.hero.unwrap().subtype, HeroSubtype::Mage);
        assert_eq!(wizard.wargear.max_spell_value, 50);
        assert_eq!(wizard.wargear.max_item_value, 0);
        assert_eq!(wizard.wargear.max_item_count, 1);

        let bearer = empire.units[4].hero.unwrap();
        assert_eq!(bearer.subtype, HeroSubtype::CommandGroup);
        assert!(bearer.champion);
        let captain = empire.units[5].hero.unwrap();
        assert_eq!(captain.subtype, HeroSubtype::Model);
        assert!(captain.champion);

        assert_eq!(catalog.spells, vec![LoadoutEntry::new("spell-0", "Kula ognia", 25)]);
        assert_eq!(catalog.banners[0].cost, 30);
        assert!(catalog.items.is_empty());
        Ok(())
    }

    #[test]
    fn parallel_locales_share_identifiers() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;
        let loader = CatalogLoader::new(temp.path(), HeroKeywords::default());
        let polish = loader.load(&Locale::from("pl"))?;
        let english = loader.load(&Locale::from("en"))?;

        let ids = |catalog: &Catalog| {
            catalog.factions[0]
                .units
                .iter()
                .map(|unit| unit.id.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&polish), ids(&english));
        assert_eq!(english.factions[1].id.as_str(), "faction-1");
        assert_eq!(english.spells[0].id, polish.spells[0].id);
        Ok(())
    }

    #[test]
    fn numbers_follow_leading_digits() {
        assert_eq!(parse_number(&json!("150")), Some(150));
        assert_eq!(parse_number(&json!(" 25 pkt")), Some(25));
        assert_eq!(parse_number(&json!(12)), Some(12));
        assert_eq!(parse_number(&json!("")), None);
        assert_eq!(parse_number(&json!("brak")), None);
        assert_eq!(parse_number(&json!(-3)), None);
    }

    #[test]
    fn missing_units_file_is_an_error() -> Result<()> {
        let temp = tempdir()?;
        let loader = CatalogLoader::new(temp.path(), HeroKeywords::default());
        let err = loader.load(&Locale::from("de")).unwrap_err();
        assert!(err.to_string().contains("units.json"));
        Ok(())
    }
}
