//! Overpass QL query construction.

use cinegeo_core::{BoundingBox, PoiCategory, SearchArea};

/// Upper bound on records requested from the directory per query.
pub(crate) const UPSTREAM_RECORD_LIMIT: usize = 1000;

/// Server-side evaluation budget, in seconds.
pub(crate) const QUERY_TIMEOUT_SECS: u64 = 25;

const ELEMENT_KINDS: [&str; 3] = ["node", "way", "relation"];

/// One union over every element kind and every tag predicate, restricted to
/// `bbox` globally and to the circle per statement. Ways and relations are
/// asked for their centroid.
pub(crate) fn build_query(
    area: &SearchArea,
    bbox: &BoundingBox,
    category: &PoiCategory,
) -> String {
    let radius_m = area.radius_km * 1000.0;
    let lat = area.center.latitude;
    let lon = area.center.longitude;

    let mut statements = String::new();
    for tag in &category.tags {
        for kind in ELEMENT_KINDS {
            statements.push_str(&format!(
                "{kind}[\"{key}\"=\"{value}\"](around:{radius_m:.0},{lat:.6},{lon:.6});",
                key = tag.key,
                value = tag.value,
            ));
        }
    }

    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}][bbox:{s:.6},{w:.6},{n:.6},{e:.6}];({statements});out center {UPSTREAM_RECORD_LIMIT};",
        s = bbox.south_west.latitude,
        w = bbox.south_west.longitude,
        n = bbox.north_east.latitude,
        e = bbox.north_east.longitude,
    )
}

#[cfg(test)]
mod tests {
    use cinegeo_core::{bounding_box, Coordinate, TagPredicate};

    use super::*;

    fn toulouse(radius_km: f64) -> SearchArea {
        SearchArea {
            center: Coordinate {
                latitude: 43.6045,
                longitude: 1.4442,
            },
            radius_km,
        }
    }

    #[test]
    fn cinema_query_covers_all_element_kinds() {
        let area = toulouse(5.0);
        let bbox = bounding_box(area.center, area.radius_km).unwrap();
        let q = build_query(&area, &bbox, &PoiCategory::cinema());

        assert!(q.starts_with("[out:json][timeout:25][bbox:"));
        assert!(q.contains("node[\"amenity\"=\"cinema\"](around:5000,43.604500,1.444200);"));
        assert!(q.contains("way[\"amenity\"=\"cinema\"](around:5000,"));
        assert!(q.contains("relation[\"amenity\"=\"cinema\"](around:5000,"));
        assert!(q.ends_with(");out center 1000;"));
    }

    #[test]
    fn each_predicate_gets_its_own_statements() {
        let area = toulouse(2.0);
        let bbox = bounding_box(area.center, area.radius_km).unwrap();
        let category = PoiCategory {
            tags: vec![
                TagPredicate {
                    key: "amenity".to_string(),
                    value: "theatre".to_string(),
                },
                TagPredicate {
                    key: "amenity".to_string(),
                    value: "arts_centre".to_string(),
                },
            ],
            fallback_name: None,
        };
        let q = build_query(&area, &bbox, &category);
        assert_eq!(q.matches("(around:2000,").count(), 6);
        assert!(q.contains("\"arts_centre\""));
    }

    /// Pulls `(s, w, n, e)` back out of the `[bbox:…]` setting.
    fn bbox_of(query: &str) -> [f64; 4] {
        let start = query.find("[bbox:").unwrap() + "[bbox:".len();
        let end = start + query[start..].find(']').unwrap();
        let edges: Vec<f64> = query[start..end]
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect();
        [edges[0], edges[1], edges[2], edges[3]]
    }

    #[test]
    fn query_box_wraps_to_all_longitudes_across_antimeridian() {
        let area = SearchArea {
            center: Coordinate {
                latitude: -16.8,
                longitude: 179.95,
            },
            radius_km: 10.0,
        };
        let bbox = bounding_box(area.center, area.radius_km).unwrap();
        let [s, w, n, e] = bbox_of(&build_query(&area, &bbox, &PoiCategory::cinema()));

        assert!(s < -16.8 && n > -16.8);
        assert!(w <= -179.98, "west edge {w} excludes points past the antimeridian");
        assert!(e >= 180.0);
    }

    #[test]
    fn query_box_covers_cap_edge_near_pole() {
        let area = SearchArea {
            center: Coordinate {
                latitude: 88.0,
                longitude: 0.0,
            },
            radius_km: 100.0,
        };
        let bbox = bounding_box(area.center, area.radius_km).unwrap();
        let [s, w, n, e] = bbox_of(&build_query(&area, &bbox, &PoiCategory::cinema()));

        assert!(s <= 88.1 && n >= 88.1);
        assert!(w <= 26.3 && e >= 26.3, "box [{w}, {e}] misses a point 99 km away");
    }
}
