//! Typed view of one Overpass element.

use std::collections::BTreeMap;

use cinegeo_core::Coordinate;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawElement {
    pub kind: String,
    pub id: String,
    pub coordinate: Option<Coordinate>,
    pub tags: BTreeMap<String, String>,
}

impl RawElement {
    /// `None` when the element lacks a type or id. Coordinates come from
    /// `lat`/`lon` when both parse, else from `center`; numeric strings are
    /// accepted.
    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let kind = value.get("type")?.as_str()?.to_string();
        let id = match value.get("id")? {
            Value::Number(n) => n.to_string(),
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return None,
        };

        let coordinate = coordinate_of(value)
            .or_else(|| value.get("center").and_then(coordinate_of))
            .filter(|c| c.validate().is_ok());

        let tags = value
            .get("tags")
            .and_then(Value::as_object)
            .map(|tags| {
                tags.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            kind,
            id,
            coordinate,
            tags,
        })
    }

    pub(crate) fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// `"{housenumber} {street}, {postcode} {city}"`, with whichever parts exist.
    pub(crate) fn address(&self) -> Option<String> {
        let street = self.tag("addr:street");
        let number = self.tag("addr:housenumber");
        let postcode = self.tag("addr:postcode");
        let city = self.tag("addr:city");

        let mut parts = Vec::new();
        match (number, street) {
            (Some(number), Some(street)) => parts.push(format!("{number} {street}")),
            (None, Some(street)) => parts.push(street.to_string()),
            _ => {}
        }
        match (postcode, city) {
            (Some(postcode), Some(city)) => parts.push(format!("{postcode} {city}")),
            (None, Some(city)) => parts.push(city.to_string()),
            _ => {}
        }

        (!parts.is_empty()).then(|| parts.join(", "))
    }

    pub(crate) fn website(&self) -> Option<&str> {
        self.tag("website").or_else(|| self.tag("contact:website"))
    }
}

fn coordinate_of(value: &Value) -> Option<Coordinate> {
    Some(Coordinate {
        latitude: number_of(value.get("lat")?)?,
        longitude: number_of(value.get("lon")?)?,
    })
}

fn number_of(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn node_uses_direct_coordinates() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 12, "lat": 43.6, "lon": 1.44,
            "center": {"lat": 0.0, "lon": 0.0},
            "tags": {"name": "ABC"}
        }))
        .unwrap();
        assert_eq!(el.id, "12");
        assert!((el.coordinate.unwrap().latitude - 43.6).abs() < 1e-9);
    }

    #[test]
    fn way_falls_back_to_center() {
        let el = RawElement::from_value(&json!({
            "type": "way", "id": 7, "center": {"lat": 48.87, "lon": 2.348}
        }))
        .unwrap();
        assert!((el.coordinate.unwrap().longitude - 2.348).abs() < 1e-9);
    }

    #[test]
    fn string_coordinates_are_parsed_and_garbage_is_dropped() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 1, "lat": "45.76", "lon": "4.83"
        }))
        .unwrap();
        assert!(el.coordinate.is_some());

        let el = RawElement::from_value(&json!({
            "type": "node", "id": 2, "lat": "north", "lon": "4.83"
        }))
        .unwrap();
        assert!(el.coordinate.is_none());
    }

    #[test]
    fn missing_id_is_malformed() {
        assert!(RawElement::from_value(&json!({"type": "node", "lat": 1.0, "lon": 1.0})).is_none());
    }

    #[test]
    fn address_combines_available_fragments() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 3,
            "tags": {
                "addr:housenumber": "1",
                "addr:street": "Boulevard Poissonnière",
                "addr:postcode": "75002",
                "addr:city": "Paris"
            }
        }))
        .unwrap();
        assert_eq!(
            el.address().as_deref(),
            Some("1 Boulevard Poissonnière, 75002 Paris")
        );

        let fragments_without_street_or_city = RawElement::from_value(&json!({
            "type": "node", "id": 4,
            "tags": {"addr:housenumber": "9", "addr:postcode": "31000"}
        }))
        .unwrap();
        assert_eq!(fragments_without_street_or_city.address(), None);
    }

    #[test]
    fn website_falls_back_to_contact_tag() {
        let el = RawElement::from_value(&json!({
            "type": "node", "id": 5,
            "tags": {"contact:website": "https://example.org"}
        }))
        .unwrap();
        assert_eq!(el.website(), Some("https://example.org"));
    }
}
