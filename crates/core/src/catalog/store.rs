use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::{anyhow, Result};
use parking_lot::RwLock;
use tracing::info;

use super::{discover_locales, Catalog, CatalogLoader, Faction};
use crate::{
    engine::HeroKeywords,
    manifest::{manifest_path, CatalogManifest},
    models::Locale,
};

/// Thread-safe cache of locale catalogs with one active locale.
#[derive(Clone)]
pub struct CatalogStore {
    inner: Arc<RwLock<Inner>>,
}

struct Inner {
    loader: CatalogLoader,
    manifest: Option<CatalogManifest>,
    locales: Vec<Locale>,
    active: Locale,
    cache: HashMap<Locale, Arc<Catalog>>,
}

impl CatalogStore {
    /// Open the catalog rooted at `root`.
    ///
    /// The active locale is `preferred` when available, else the manifest
    /// default, else the first discovered locale.
    pub fn open(
        root: impl Into<PathBuf>,
        keywords: HeroKeywords,
        preferred: Option<&Locale>,
    ) -> Result<Self> {
        let loader = CatalogLoader::new(root, keywords);
        let manifest = CatalogManifest::load(manifest_path(loader.root()))?;
        let locales = discover_locales(loader.root())?;
        let active = pick_locale(&locales, preferred, manifest.as_ref()).ok_or_else(|| {
            anyhow!("no catalog locales found in {}", loader.root().display())
        })?;
        info!(locale = %active, available = locales.len(), "catalog opened");

        Ok(Self {
            inner: Arc::new(RwLock::new(Inner {
                loader,
                manifest,
                locales,
                active,
                cache: HashMap::new(),
            })),
        })
    }

    pub fn root_path(&self) -> PathBuf {
        self.inner.read().loader.root().to_path_buf()
    }

    pub fn manifest(&self) -> Option<CatalogManifest> {
        self.inner.read().manifest.clone()
    }

    pub fn locales(&self) -> Vec<Locale> {
        self.inner.read().locales.clone()
    }

    pub fn locale(&self) -> Locale {
        self.inner.read().active.clone()
    }

    /// Catalog of the active locale, loading it on first use.
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        let mut inner = self.inner.write();
        let locale = inner.active.clone();
        inner.catalog_for(&locale)
    }

    /// Make `locale` active and return its catalog.
    pub fn set_locale(&self, locale: &Locale) -> Result<Arc<Catalog>> {
        let mut inner = self.inner.write();
        if !inner.locales.contains(locale) {
            return Err(anyhow!("unknown catalog locale {locale}"));
        }
        let catalog = inner.catalog_for(locale)?;
        inner.active = locale.clone();
        info!(%locale, "catalog locale changed");
        Ok(catalog)
    }

    /// Rescan the catalog root and drop every cached catalog.
    pub fn refresh(&self) -> Result<()> {
        let mut inner = self.inner.write();
        let locales = discover_locales(inner.loader.root())?;
        let manifest = CatalogManifest::load(manifest_path(inner.loader.root()))?;
        let active = pick_locale(&locales, Some(&inner.active), manifest.as_ref())
            .ok_or_else(|| anyhow!("no catalog locales left in {}", inner.loader.root().display()))?;
        inner.locales = locales;
        inner.manifest = manifest;
        inner.active = active;
        inner.cache.clear();
        Ok(())
    }

    /// Factions of the active locale whose name or id contains `query`,
    /// ignoring case.
    pub fn factions_matching(&self, query: &str) -> Result<Vec<Faction>> {
        let catalog = self.catalog()?;
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(catalog.factions.clone());
        }

        Ok(catalog
            .factions
            .iter()
            .filter(|faction| {
                faction.name.to_lowercase().contains(&needle)
                    || faction.id.as_str().to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }
}

impl Inner {
    fn catalog_for(&mut self, locale: &Locale) -> Result<Arc<Catalog>> {
        if let Some(catalog) = self.cache.get(locale) {
            return Ok(Arc::clone(catalog));
        }
        let catalog = Arc::new(self.loader.load(locale)?);
        self.cache.insert(locale.clone(), Arc::clone(&catalog));
        Ok(catalog)
    }
}

fn pick_locale(
    locales: &[Locale],
    preferred: Option<&Locale>,
    manifest: Option<&CatalogManifest>,
) -> Option<Locale> {
    let manifest_default = manifest.and_then(|manifest| manifest.default_locale.as_ref());
    [preferred, manifest_default]
        .into_iter()
        .flatten()
        .find(|locale| locales.contains(locale))
        .or_else(|| locales.first())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::loader::tests::write_catalog;
    use tempfile::tempdir;

    #[test]
    fn opens_preferred_locale_and_switches() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;

        let store = CatalogStore::open(temp.path(), HeroKeywords::default(), Some(&"pl".into()))?;
        assert_eq!(store.locale(), Locale::from("pl"));
        assert_eq!(store.locales().len(), 2);
        let polish = store.catalog()?;
        assert_eq!(polish.factions[0].name, "Imperium");
        assert!(Arc::ptr_eq(&polish, &store.catalog()?));

        let english = store.set_locale(&"en".into())?;
        assert_eq!(english.factions[0].name, "Empire");
        assert_eq!(store.locale(), Locale::from("en"));
        assert!(store.set_locale(&"de".into()).is_err());
        assert_eq!(store.locale(), Locale::from("en"));
        Ok(())
    }

    #[test]
    fn manifest_default_applies_without_preference() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;
        CatalogManifest {
            default_locale: Some("pl".into()),
            ..CatalogManifest::default()
        }
        .persist(manifest_path(temp.path()))?;

        let store = CatalogStore::open(temp.path(), HeroKeywords::default(), Some(&"de".into()))?;
        assert_eq!(store.locale(), Locale::from("pl"));

        let fallback = tempdir()?;
        write_catalog(fallback.path())?;
        let store = CatalogStore::open(fallback.path(), HeroKeywords::default(), None)?;
        assert_eq!(store.locale(), Locale::from("en"));
        Ok(())
    }

    #[test]
    fn filters_factions_case_insensitively() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;
        let store = CatalogStore::open(temp.path(), HeroKeywords::default(), Some(&"en".into()))?;

        let names = |factions: Vec<Faction>| {
            factions
                .into_iter()
                .map(|faction| faction.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(store.factions_matching("orc")?), vec!["Orcs"]);
        assert_eq!(names(store.factions_matching("  ")?).len(), 2);
        assert_eq!(names(store.factions_matching("FACTION-0")?), vec!["Empire"]);
        assert!(store.factions_matching("dwarf")?.is_empty());
        Ok(())
    }

    #[test]
    fn refresh_picks_up_new_locales() -> Result<()> {
        let temp = tempdir()?;
        write_catalog(temp.path())?;
        let store = CatalogStore::open(temp.path(), HeroKeywords::default(), None)?;
        assert_eq!(store.locales().len(), 2);

        std::fs::create_dir_all(temp.path().join("de"))?;
        std::fs::write(
            temp.path().join("de/units.json"),
            serde_json::json!({ "factions": {} }).to_string(),
        )?;
        store.refresh()?;
        assert_eq!(store.locales().len(), 3);
        assert!(store.set_locale(&"de".into())?.factions.is_empty());
        Ok(())
    }
}
