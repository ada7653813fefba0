//! Area catalog: region → ordered area codes, and area code → office name.
//!
//! Loaded once at startup and read-only afterwards.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tenki_core::RegionConfig;
use tracing::instrument;

use crate::error::CatalogError;
use crate::types::{AreaCode, RegionCode};

/// A selectable region and the areas it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub code: RegionCode,
    pub name: String,
    pub areas: Vec<AreaCode>,
}

impl From<&RegionConfig> for Region {
    fn from(config: &RegionConfig) -> Self {
        Self {
            code: RegionCode::new(config.code.as_str()),
            name: config.name.clone(),
            areas: config.areas.iter().map(|a| AreaCode::new(a.as_str())).collect(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AreaCatalog {
    regions: Vec<Region>,
    names: HashMap<AreaCode, String>,
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    centers: BTreeMap<String, RawCenter>,
    #[serde(default)]
    offices: HashMap<String, RawOffice>,
}

#[derive(Debug, Deserialize)]
struct RawCenter {
    name: String,
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawOffice {
    name: String,
}

impl AreaCatalog {
    pub fn new(regions: Vec<Region>, names: HashMap<AreaCode, String>) -> Self {
        Self { regions, names }
    }

    pub fn from_config(regions: &[RegionConfig], names: HashMap<AreaCode, String>) -> Self {
        Self::new(regions.iter().map(Region::from).collect(), names)
    }

    /// Build from an `area.json` body. An empty `regions` table derives one
    /// region per forecast center.
    pub fn from_slice(body: &[u8], regions: &[RegionConfig]) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_slice(body)
            .map_err(|e| CatalogError::Unavailable(format!("invalid catalog: {}", e)))?;

        if raw.offices.is_empty() {
            return Err(CatalogError::Unavailable("catalog has no offices".into()));
        }

        let names: HashMap<AreaCode, String> = raw
            .offices
            .into_iter()
            .map(|(code, office)| (AreaCode::new(code), office.name))
            .collect();

        let regions: Vec<Region> = if regions.is_empty() {
            raw.centers
                .into_iter()
                .map(|(code, center)| Region {
                    code: RegionCode::new(code),
                    name: center.name,
                    areas: center.children.into_iter().map(AreaCode::new).collect(),
                })
                .collect()
        } else {
            regions.iter().map(Region::from).collect()
        };

        for region in &regions {
            for area in region.areas.iter().filter(|a| !names.contains_key(*a)) {
                tracing::warn!("Area {} in region {} is not in the catalog", area, region.code);
            }
        }

        Ok(Self::new(regions, names))
    }

    /// Fetch and parse the catalog. Any failure is `CatalogError::Unavailable`.
    #[instrument(skip(client, regions), level = "info")]
    pub async fn load(
        client: &reqwest::Client,
        url: &str,
        regions: &[RegionConfig],
    ) -> Result<Self, CatalogError> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| CatalogError::Unavailable(e.to_string()))?;

        let catalog = Self::from_slice(&body, regions)?;
        tracing::info!(
            "Loaded area catalog: {} regions, {} offices",
            catalog.regions.len(),
            catalog.names.len()
        );
        Ok(catalog)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn region(&self, code: &RegionCode) -> Option<&Region> {
        self.regions.iter().find(|r| &r.code == code)
    }

    pub fn area_codes(&self, code: &RegionCode) -> Option<&[AreaCode]> {
        self.region(code).map(|r| r.areas.as_slice())
    }

    pub fn display_name(&self, area: &AreaCode) -> Option<&str> {
        self.names.get(area).map(String::as_str)
    }

    /// Resolve user input: a region code, a display name, or a 1-based index
    /// into `regions()`.
    pub fn resolve(&self, input: &str) -> Option<&Region> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }

        self.regions
            .iter()
            .find(|r| r.code.as_str() == input || r.name == input)
            .or_else(|| {
                input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| self.regions.get(i))
            })
    }
}
