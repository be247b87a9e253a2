//! Nearby POI lookup against the Overpass-style primary directory.
//!
//! Upstream failure is not an error here: a search whose mirrors are all down
//! returns an empty list. Only invalid input is reported to the caller.

mod element;
mod query;

use std::collections::HashSet;

use cinegeo_core::{bounding_box, distance_km, PoiCategory, PointOfInterest, SearchArea};
use serde::Deserialize;

use crate::error::SourcesError;
use crate::failover::{Failover, RequestSpec};

use element::RawElement;

/// Radius and result-count bounds applied to every search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectoryLimits {
    pub radius_cap_km: f64,
    pub default_max_results: usize,
    pub max_results_ceiling: usize,
}

impl Default for DirectoryLimits {
    fn default() -> Self {
        Self {
            radius_cap_km: 100.0,
            default_max_results: 50,
            max_results_ceiling: 200,
        }
    }
}

impl DirectoryLimits {
    /// `None` or `0` means the default; anything else is clamped to
    /// `[1, ceiling]`.
    #[must_use]
    pub fn effective_max_results(&self, requested: Option<usize>) -> usize {
        match requested {
            None | Some(0) => self.default_max_results,
            Some(n) => n.min(self.max_results_ceiling),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct GeoDirectory {
    failover: Failover,
    limits: DirectoryLimits,
}

impl GeoDirectory {
    #[must_use]
    pub fn new(failover: Failover, limits: DirectoryLimits) -> Self {
        Self { failover, limits }
    }

    #[must_use]
    pub fn limits(&self) -> &DirectoryLimits {
        &self.limits
    }

    /// POIs of `category` within the (clamped) radius, nearest first, without
    /// duplicate identities, at most `max_results` of them.
    ///
    /// # Errors
    ///
    /// Returns [`SourcesError::Validation`] for an out-of-range center, a
    /// non-finite radius, or a center too close to a pole. No request is
    /// made in those cases.
    pub async fn find_nearby(
        &self,
        area: SearchArea,
        category: &PoiCategory,
        max_results: Option<usize>,
    ) -> Result<Vec<PointOfInterest>, SourcesError> {
        let area = area.clamped(self.limits.radius_cap_km)?;
        let bbox = bounding_box(area.center, area.radius_km)?;
        let max_results = self.limits.effective_max_results(max_results);

        let spec =
            RequestSpec::post_form("").param("data", query::build_query(&area, &bbox, category));

        let response: OverpassResponse = match self.failover.execute_json(&spec).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    source = %self.failover.upstream(),
                    error = %e,
                    "directory unavailable; returning no POIs"
                );
                return Ok(Vec::new());
            }
        };

        let received = response.elements.len();
        let mut malformed = 0usize;
        let mut seen = HashSet::new();
        let mut pois = Vec::new();

        for value in &response.elements {
            let Some(element) = RawElement::from_value(value) else {
                malformed += 1;
                tracing::debug!(record = %value, "dropping malformed directory record");
                continue;
            };
            let Some(poi) = to_poi(&element, &area, category) else {
                continue;
            };
            let (kind, id) = poi.identity();
            if seen.insert((kind.to_owned(), id.to_owned())) {
                pois.push(poi);
            }
        }

        pois.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
        pois.truncate(max_results);

        tracing::debug!(
            source = %self.failover.upstream(),
            received,
            malformed,
            count = pois.len(),
            radius_km = area.radius_km,
            "directory search complete"
        );

        Ok(pois)
    }
}

/// Drops records without a usable coordinate, outside the radius, or
/// without a name when the category has no fallback.
fn to_poi(
    element: &RawElement,
    area: &SearchArea,
    category: &PoiCategory,
) -> Option<PointOfInterest> {
    let coordinate = element.coordinate?;
    let distance = distance_km(area.center, coordinate);
    if distance > area.radius_km {
        return None;
    }

    let name = element
        .tag("name")
        .map(str::to_string)
        .or_else(|| category.fallback_name.clone())?;

    Some(PointOfInterest {
        source_type: element.kind.clone(),
        external_id: element.id.clone(),
        name,
        coordinate,
        address: element.address(),
        city: element.tag("addr:city").map(str::to_string),
        website: element.website().map(str::to_string),
        distance_km: round_one_decimal(distance),
        source_tags: element.tags.clone(),
        enrichment: None,
    })
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use cinegeo_core::Coordinate;
    use serde_json::json;

    use super::*;

    fn area() -> SearchArea {
        SearchArea {
            center: Coordinate {
                latitude: 43.6045,
                longitude: 1.4442,
            },
            radius_km: 10.0,
        }
    }

    #[test]
    fn effective_max_results_uses_default_and_ceiling() {
        let limits = DirectoryLimits::default();
        assert_eq!(limits.effective_max_results(None), 50);
        assert_eq!(limits.effective_max_results(Some(0)), 50);
        assert_eq!(limits.effective_max_results(Some(7)), 7);
        assert_eq!(limits.effective_max_results(Some(10_000)), 200);
    }

    #[test]
    fn nameless_record_uses_category_fallback() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 1, "lat": 43.61, "lon": 1.45
        }))
        .unwrap();
        let poi = to_poi(&el, &area(), &PoiCategory::cinema()).unwrap();
        assert_eq!(poi.name, "Cinéma");
    }

    #[test]
    fn nameless_record_is_dropped_without_fallback() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 1, "lat": 43.61, "lon": 1.45
        }))
        .unwrap();
        let category = PoiCategory {
            fallback_name: None,
            ..PoiCategory::cinema()
        };
        assert!(to_poi(&el, &area(), &category).is_none());
    }

    #[test]
    fn record_beyond_radius_is_dropped() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 1, "lat": 44.5, "lon": 1.45, "tags": {"name": "Far"}
        }))
        .unwrap();
        assert!(to_poi(&el, &area(), &PoiCategory::cinema()).is_none());
    }

    #[test]
    fn distance_is_rounded_to_one_decimal() {
        assert!((round_one_decimal(4.96) - 5.0).abs() < f64::EPSILON);
        assert!((round_one_decimal(1.04) - 1.0).abs() < f64::EPSILON);
    }
}
