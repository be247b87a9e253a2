//! Reverse-geocoder response shape and the rules that pick a region from it.

use cinegeo_core::{normalize, RegionRules};
use serde::Deserialize;

/// Nominatim `format=jsonv2` reverse response. Failures arrive as a 200 with
/// an `error` field and no address, which deserializes to an empty address.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReverseResponse {
    #[serde(default)]
    pub address: ReverseAddress,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ReverseAddress {
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub municipality: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Extraction {
    pub region: Option<String>,
    /// A broad field named an ambiguous super-region that could not be narrowed.
    pub ambiguous: bool,
}

fn present(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// Specific fields first (`city`, `town`, `village`, `municipality`), then
/// broad ones (`county`, `state`). A broad field naming an ambiguous
/// super-region is replaced by the postcode-prefix lookup, or skipped.
pub(crate) fn extract_region(address: &ReverseAddress, rules: &RegionRules) -> Extraction {
    let specific = [
        &address.city,
        &address.town,
        &address.village,
        &address.municipality,
    ];
    if let Some(name) = specific.into_iter().find_map(|f| present(f.as_ref())) {
        return Extraction {
            region: Some(name.to_string()),
            ambiguous: false,
        };
    }

    let mut ambiguous = false;
    for broad in [&address.county, &address.state] {
        let Some(name) = present(broad.as_ref()) else {
            continue;
        };
        if !is_ambiguous(name, rules) {
            return Extraction {
                region: Some(name.to_string()),
                ambiguous,
            };
        }
        if let Some(region) = region_from_postcode(address.postcode.as_deref(), rules) {
            return Extraction {
                region: Some(region.to_string()),
                ambiguous: false,
            };
        }
        ambiguous = true;
    }

    Extraction {
        region: None,
        ambiguous,
    }
}

fn is_ambiguous(name: &str, rules: &RegionRules) -> bool {
    let name = normalize(name);
    rules.ambiguous.iter().any(|a| normalize(a) == name)
}

fn region_from_postcode<'a>(postcode: Option<&str>, rules: &'a RegionRules) -> Option<&'a str> {
    let digits: String = postcode?
        .trim()
        .chars()
        .take_while(char::is_ascii_digit)
        .take(2)
        .collect();
    if digits.len() < 2 {
        return None;
    }
    rules.postcodes.get(&digits).map(String::as_str)
}
