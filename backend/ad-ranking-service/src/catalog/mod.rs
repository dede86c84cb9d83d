// ============================================
// Ad Catalog
// ============================================
//
// Immutable, id-indexed set of ads held for a session.
// Catalog order is preserved: ranking ties fall back to it.

use crate::models::{Ad, AdCategory};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const REFERENCE_CATALOG: &str = include_str!("../../data/reference_catalog.json");

pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 10;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate ad id: {0}")]
    DuplicateId(String),

    #[error("Ad {id} has priority {priority}, expected 1-10")]
    InvalidPriority { id: String, priority: u8 },
}

pub type Result<T> = std::result::Result<T, CatalogError>;

#[derive(Debug, Clone, Default)]
pub struct AdCatalog {
    ads: Vec<Ad>,
    index: HashMap<String, usize>,
}

impl AdCatalog {
    pub fn from_ads(ads: Vec<Ad>) -> Result<Self> {
        let mut index = HashMap::with_capacity(ads.len());

        for (position, ad) in ads.iter().enumerate() {
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&ad.priority) {
                return Err(CatalogError::InvalidPriority {
                    id: ad.id.clone(),
                    priority: ad.priority,
                });
            }
            if index.insert(ad.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateId(ad.id.clone()));
            }
        }

        Ok(Self { ads, index })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let ads: Vec<Ad> = serde_json::from_str(raw)?;
        Self::from_ads(ads)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;

        info!(
            path = %path.display(),
            ad_count = catalog.len(),
            "Loaded ad catalog"
        );

        Ok(catalog)
    }

    /// Built-in 15-ad dataset covering all eight categories
    pub fn reference() -> Result<Self> {
        Self::from_json_str(REFERENCE_CATALOG)
    }

    pub fn get(&self, id: &str) -> Option<&Ad> {
        self.index.get(id).map(|&position| &self.ads[position])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ad> {
        self.ads.iter()
    }

    pub fn ads(&self) -> &[Ad] {
        &self.ads
    }

    pub fn len(&self) -> usize {
        self.ads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ads.is_empty()
    }

    pub fn categories(&self) -> Vec<AdCategory> {
        AdCategory::ALL
            .into_iter()
            .filter(|category| self.ads.iter().any(|ad| ad.category == *category))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn ad(id: &str, category: AdCategory, priority: u8, tags: &[&str]) -> Ad {
        Ad {
            id: id.to_string(),
            title: format!("Ad {}", id),
            description: String::new(),
            image_url: String::new(),
            category,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            target_audience: vec![],
            click_url: "#".to_string(),
            priority,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::ad;
    use super::*;

    #[test]
    fn test_reference_catalog_shape() {
        let catalog = AdCatalog::reference().unwrap();

        assert_eq!(catalog.len(), 15);
        assert_eq!(catalog.categories().len(), 8);
        assert_eq!(catalog.get("ad-1").unwrap().category, AdCategory::Technology);
        assert_eq!(catalog.ads()[0].id, "ad-1");
        assert!(catalog.get("ad-99").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = AdCatalog::from_ads(vec![
            ad("ad-1", AdCategory::Food, 5, &[]),
            ad("ad-1", AdCategory::Travel, 6, &[]),
        ]);

        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "ad-1"));
    }

    #[test]
    fn test_priority_out_of_range_rejected() {
        let result = AdCatalog::from_ads(vec![ad("ad-1", AdCategory::Food, 11, &[])]);
        assert!(matches!(
            result,
            Err(CatalogError::InvalidPriority { priority: 11, .. })
        ));

        let result = AdCatalog::from_ads(vec![ad("ad-1", AdCategory::Food, 0, &[])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, REFERENCE_CATALOG).unwrap();

        let catalog = AdCatalog::from_json_file(&path).unwrap();
        assert_eq!(catalog.len(), 15);

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            AdCatalog::from_json_file(&path),
            Err(CatalogError::Parse(_))
        ));
    }
}
