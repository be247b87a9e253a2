//! Upstream endpoint lists and region rules, loaded from `config/sources.yaml`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::geo::BoundingBox;
use crate::types::Coordinate;
use crate::ConfigError;

const MAX_ZOOM: u8 = 18;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesFile {
    pub directory: DirectorySource,
    pub geocoder: GeocoderSource,
    pub catalog: CatalogSource,
    #[serde(default)]
    pub regions: RegionRules,
    pub categories: BTreeMap<String, PoiCategory>,
}

/// Mirrors of the primary POI source, tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectorySource {
    pub endpoints: Vec<String>,
}

/// Reverse-geocoder mirrors and the two precision levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderSource {
    pub endpoints: Vec<String>,
    #[serde(default = "default_coarse_zoom")]
    pub coarse_zoom: u8,
    #[serde(default = "default_fine_zoom")]
    pub fine_zoom: u8,
}

/// Base URLs of the secondary catalog service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSource {
    pub endpoints: Vec<String>,
}

fn default_coarse_zoom() -> u8 {
    10
}

fn default_fine_zoom() -> u8 {
    14
}

/// Rules the region locator applies on top of raw geocoder output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRules {
    /// Broad regions too large to scope a catalog lookup on their own.
    #[serde(default)]
    pub ambiguous: Vec<String>,
    /// Two-digit postcode prefix to region name.
    #[serde(default)]
    pub postcodes: BTreeMap<String, String>,
    /// Last-resort boxes for dense areas the geocoder often names vaguely.
    #[serde(default)]
    pub landmarks: Vec<LandmarkArea>,
}

impl Default for RegionRules {
    fn default() -> Self {
        let postcodes = [
            ("75", "Paris"),
            ("77", "Seine-et-Marne"),
            ("78", "Yvelines"),
            ("91", "Essonne"),
            ("92", "Hauts-de-Seine"),
            ("93", "Seine-Saint-Denis"),
            ("94", "Val-de-Marne"),
            ("95", "Val-d'Oise"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            ambiguous: vec!["Île-de-France".to_string()],
            postcodes,
            landmarks: vec![
                LandmarkArea {
                    name: "Paris".to_string(),
                    south: 48.815,
                    west: 2.224,
                    north: 48.902,
                    east: 2.470,
                },
                LandmarkArea {
                    name: "Lyon".to_string(),
                    south: 45.707,
                    west: 4.771,
                    north: 45.808,
                    east: 4.898,
                },
                LandmarkArea {
                    name: "Marseille".to_string(),
                    south: 43.169,
                    west: 5.228,
                    north: 43.391,
                    east: 5.532,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkArea {
    pub name: String,
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LandmarkArea {
    #[must_use]
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox {
            north_east: Coordinate {
                latitude: self.north,
                longitude: self.east,
            },
            south_west: Coordinate {
                latitude: self.south,
                longitude: self.west,
            },
        }
    }
}

/// A `key=value` tag equality used to select POIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPredicate {
    pub key: String,
    pub value: String,
}

/// A kind of POI: any record matching one of `tags` belongs to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoiCategory {
    pub tags: Vec<TagPredicate>,
    /// Display name for records that carry no `name` tag. Records without a
    /// name are dropped when this is unset.
    #[serde(default)]
    pub fallback_name: Option<String>,
}

impl PoiCategory {
    #[must_use]
    pub fn cinema() -> Self {
        Self {
            tags: vec![TagPredicate {
                key: "amenity".to_string(),
                value: "cinema".to_string(),
            }],
            fallback_name: Some("Cinéma".to_string()),
        }
    }
}

/// Load and validate the sources file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sources(path: &Path) -> Result<SourcesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourcesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let sources: SourcesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::SourcesFileParse)?;

    validate_sources(&sources)?;

    Ok(sources)
}

fn validate_sources(sources: &SourcesFile) -> Result<(), ConfigError> {
    validate_endpoints("directory", &sources.directory.endpoints)?;
    validate_endpoints("geocoder", &sources.geocoder.endpoints)?;
    validate_endpoints("catalog", &sources.catalog.endpoints)?;

    let geocoder = &sources.geocoder;
    if geocoder.coarse_zoom > geocoder.fine_zoom || geocoder.fine_zoom > MAX_ZOOM {
        return Err(ConfigError::Validation(format!(
            "geocoder zoom levels must satisfy coarse <= fine <= {MAX_ZOOM} (got {} / {})",
            geocoder.coarse_zoom, geocoder.fine_zoom
        )));
    }

    if sources.categories.is_empty() {
        return Err(ConfigError::Validation(
            "at least one POI category must be configured".to_string(),
        ));
    }
    for (name, category) in &sources.categories {
        if category.tags.is_empty() {
            return Err(ConfigError::Validation(format!(
                "category '{name}' has no tag predicates"
            )));
        }
        for tag in &category.tags {
            if !is_safe_tag_part(&tag.key) || !is_safe_tag_part(&tag.value) {
                return Err(ConfigError::Validation(format!(
                    "category '{name}' has an unusable tag predicate {}={}",
                    tag.key, tag.value
                )));
            }
        }
    }

    for (prefix, region) in &sources.regions.postcodes {
        if prefix.len() != 2 || !prefix.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::Validation(format!(
                "postcode prefix '{prefix}' for '{region}' must be two digits"
            )));
        }
    }

    let mut seen_landmarks = HashSet::new();
    for area in &sources.regions.landmarks {
        if area.south >= area.north || area.west >= area.east {
            return Err(ConfigError::Validation(format!(
                "landmark '{}' has an empty or inverted box",
                area.name
            )));
        }
        if !seen_landmarks.insert(area.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate landmark: '{}'",
                area.name
            )));
        }
    }

    Ok(())
}

fn validate_endpoints(source: &str, endpoints: &[String]) -> Result<(), ConfigError> {
    if endpoints.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{source} must list at least one endpoint"
        )));
    }
    for endpoint in endpoints {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Validation(format!(
                "{source} endpoint '{endpoint}' must be an http(s) URL"
            )));
        }
    }
    Ok(())
}

/// Tag parts are spliced into Overpass QL inside double quotes.
fn is_safe_tag_part(part: &str) -> bool {
    !part.trim().is_empty() && !part.contains(['"', '\\', '\n'])
}
