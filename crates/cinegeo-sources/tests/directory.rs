//! Integration tests for `GeoDirectory::find_nearby` against a mock
//! Overpass interpreter.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cinegeo_core::{Coordinate, PoiCategory, SearchArea};
use cinegeo_sources::{build_http_client, DirectoryLimits, Failover, GeoDirectory, SourcesError};

const TOULOUSE: Coordinate = Coordinate {
    latitude: 43.6045,
    longitude: 1.4442,
};

/// Degrees of latitude per kilometre on a 6371 km sphere.
const DEG_PER_KM: f64 = 1.0 / 111.195;

fn directory(targets: Vec<String>) -> GeoDirectory {
    let client = build_http_client(5, "cinegeo-test/0.1").expect("test client");
    GeoDirectory::new(
        Failover::new(client, "directory", targets),
        DirectoryLimits::default(),
    )
}

fn interpreter(server: &MockServer) -> String {
    format!("{}/api/interpreter", server.uri())
}

fn node(id: u64, km_north: f64, name: Option<&str>) -> serde_json::Value {
    let mut tags = json!({"amenity": "cinema"});
    if let Some(name) = name {
        tags["name"] = json!(name);
    }
    json!({
        "type": "node",
        "id": id,
        "lat": TOULOUSE.latitude + km_north * DEG_PER_KM,
        "lon": TOULOUSE.longitude,
        "tags": tags
    })
}

async fn mount_elements(server: &MockServer, elements: Vec<serde_json::Value>) {
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("amenity"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": 0.6,
            "elements": elements
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn single_cinema_five_km_away_is_returned_first() {
    let server = MockServer::start().await;
    mount_elements(&server, vec![node(1001, 5.0, Some("ABC"))]).await;

    let pois = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: TOULOUSE,
                radius_km: 30.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await
        .expect("search should succeed");

    assert_eq!(pois.len(), 1);
    assert_eq!(pois[0].name, "ABC");
    assert_eq!(pois[0].source_type, "node");
    assert_eq!(pois[0].external_id, "1001");
    assert!((pois[0].distance_km - 5.0).abs() < 0.05, "got {}", pois[0].distance_km);
}

#[tokio::test]
async fn results_are_sorted_deduplicated_and_filtered() {
    let server = MockServer::start().await;
    mount_elements(
        &server,
        vec![
            node(1, 8.0, Some("Far")),
            node(2, 1.0, Some("Near")),
            node(2, 1.0, Some("Near (duplicate)")),
            json!({
                "type": "way", "id": 2,
                "center": {"lat": TOULOUSE.latitude + 3.0 * DEG_PER_KM, "lon": TOULOUSE.longitude},
                "tags": {"name": "Same id, other kind"}
            }),
            node(3, 25.0, Some("Outside radius")),
            json!({"type": "node", "id": 4, "tags": {"name": "No coordinates"}}),
            json!({"type": "node", "lat": TOULOUSE.latitude, "lon": TOULOUSE.longitude}),
        ],
    )
    .await;

    let pois = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: TOULOUSE,
                radius_km: 10.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await
        .expect("search should succeed");

    let names: Vec<&str> = pois.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Near", "Same id, other kind", "Far"]);
    assert!(pois
        .windows(2)
        .all(|pair| pair[0].distance_km <= pair[1].distance_km));
}

#[tokio::test]
async fn oversized_radius_is_clamped_before_querying() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("around%3A100000%2C"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [node(1, 150.0, Some("Beyond the cap"))]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pois = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: TOULOUSE,
                radius_km: 5000.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await
        .expect("search should succeed");

    assert!(pois.is_empty(), "records beyond the capped radius must be dropped");
}

#[tokio::test]
async fn result_count_is_capped() {
    let server = MockServer::start().await;
    let elements = (1u32..=10)
        .map(|i| node(u64::from(i), f64::from(i) * 0.5, Some("Screen")))
        .collect();
    mount_elements(&server, elements).await;

    let pois = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: TOULOUSE,
                radius_km: 20.0,
            },
            &PoiCategory::cinema(),
            Some(3),
        )
        .await
        .expect("search should succeed");

    let ids: Vec<&str> = pois.iter().map(|p| p.external_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
}

#[tokio::test]
async fn all_mirrors_down_yields_empty_list() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    for server in [&first, &second] {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(504))
            .expect(1)
            .mount(server)
            .await;
    }

    let pois = directory(vec![interpreter(&first), interpreter(&second)])
        .find_nearby(
            SearchArea {
                center: TOULOUSE,
                radius_km: 10.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await
        .expect("outage must not be an error");

    assert!(pois.is_empty());
}

#[tokio::test]
async fn invalid_center_is_rejected_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
        .expect(0)
        .mount(&server)
        .await;

    let result = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: Coordinate {
                    latitude: 91.0,
                    longitude: 0.0,
                },
                radius_km: 10.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await;

    assert!(matches!(result, Err(SourcesError::Validation(_))));
}

#[tokio::test]
async fn polar_center_is_rejected_without_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"elements": []})))
        .expect(0)
        .mount(&server)
        .await;

    let result = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: Coordinate {
                    latitude: 89.95,
                    longitude: 10.0,
                },
                radius_km: 10.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await;

    assert!(matches!(result, Err(SourcesError::Validation(_))));
}

#[tokio::test]
async fn search_across_antimeridian_keeps_far_side_records() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/interpreter"))
        .and(body_string_contains("%2C-180.000000%2C"))
        .and(body_string_contains("%2C180.000000%5D"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "elements": [{
                "type": "node", "id": 42,
                "lat": -16.8, "lon": -179.98,
                "tags": {"amenity": "cinema", "name": "Taveuni Screen"}
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pois = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: Coordinate {
                    latitude: -16.8,
                    longitude: 179.95,
                },
                radius_km: 10.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await
        .expect("search should succeed");

    assert_eq!(pois.len(), 1);
    assert!((pois[0].distance_km - 7.5).abs() < 0.05, "got {}", pois[0].distance_km);
}

#[tokio::test]
async fn high_latitude_search_keeps_cap_edge_records() {
    let server = MockServer::start().await;
    mount_elements(
        &server,
        vec![json!({
            "type": "node", "id": 88,
            "lat": 88.1, "lon": 26.3,
            "tags": {"amenity": "cinema", "name": "Polar Screen"}
        })],
    )
    .await;

    let pois = directory(vec![interpreter(&server)])
        .find_nearby(
            SearchArea {
                center: Coordinate {
                    latitude: 88.0,
                    longitude: 0.0,
                },
                radius_km: 100.0,
            },
            &PoiCategory::cinema(),
            None,
        )
        .await
        .expect("search should succeed");

    assert_eq!(pois.len(), 1);
    assert_eq!(pois[0].name, "Polar Screen");
}
