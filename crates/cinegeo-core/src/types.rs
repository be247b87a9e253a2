//! Domain records shared across the pipeline.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Builds a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] when either component is non-finite
    /// or outside [-90, 90] / [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Checks the range invariant on an already-built value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] for out-of-range or non-finite components.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::Validation(format!(
                "latitude {} is outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::Validation(format!(
                "longitude {} is outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

/// A circular search request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchArea {
    pub center: Coordinate,
    pub radius_km: f64,
}

impl SearchArea {
    pub const MIN_RADIUS_KM: f64 = 1.0;

    /// Returns a copy whose radius is clamped into `[1.0, cap_km]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if the center is out of range or the
    /// radius is not a finite number.
    pub fn clamped(&self, cap_km: f64) -> Result<Self, CoreError> {
        self.center.validate()?;
        if !self.radius_km.is_finite() {
            return Err(CoreError::Validation(format!(
                "radius {} is not a finite number of kilometres",
                self.radius_km
            )));
        }
        let cap = cap_km.max(Self::MIN_RADIUS_KM);
        Ok(Self {
            center: self.center,
            radius_km: self.radius_km.clamp(Self::MIN_RADIUS_KM, cap),
        })
    }
}

/// A named, geolocated place from the primary directory.
///
/// Identity is `(source_type, external_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    /// Upstream record kind, e.g. `node`, `way` or `relation`.
    pub source_type: String,
    pub external_id: String,
    pub name: String,
    pub coordinate: Coordinate,
    pub address: Option<String>,
    pub city: Option<String>,
    pub website: Option<String>,
    /// Distance from the request center, rounded to one decimal.
    pub distance_km: f64,
    pub source_tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<PoiEnrichment>,
}

impl PointOfInterest {
    #[must_use]
    pub fn identity(&self) -> (&str, &str) {
        (&self.source_type, &self.external_id)
    }
}

/// A region as named by the secondary catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogLocation {
    pub id: String,
    pub name: String,
}

/// An entity in the secondary catalog's own naming scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub display_name: String,
    pub address: Option<String>,
}

/// An accepted resolution of a POI against catalog entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMatch {
    pub entry: CatalogEntry,
    pub score: u32,
}

/// One titled item with its time slots grouped by variant (e.g. `VF`, `VO`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentRecord {
    pub title: String,
    pub duration: Option<String>,
    pub time_slots_by_variant: BTreeMap<String, Vec<String>>,
}

/// What gets attached to a POI once it has been matched in the catalog.
///
/// An empty `records` list means the venue was matched but lists nothing for
/// `date`; an unenriched POI has no `PoiEnrichment` at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiEnrichment {
    pub date: NaiveDate,
    pub region: String,
    pub entity_id: String,
    pub entity_name: String,
    pub records: Vec<EnrichmentRecord>,
}
