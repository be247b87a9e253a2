//! Showtime payload conversion.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use cinegeo_core::{EnrichmentRecord, ReferenceZone};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// `HH:MM` in the reference zone for offset-bearing timestamps, `HH:MM` as
/// written for naive ones, and the input unchanged for anything else.
pub(crate) fn format_time_slot(raw: &str, zone: ReferenceZone) -> String {
    let trimmed = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return zone
            .localize(instant.with_timezone(&Utc))
            .format("%H:%M")
            .to_string();
    }

    let naive = trimmed.parse::<NaiveDateTime>().ok().or_else(|| {
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
    });

    match naive {
        Some(local) => local.format("%H:%M").to_string(),
        None => raw.to_string(),
    }
}

/// One showtime item. Every array-of-strings field other than `title` and
/// `duration` is a variant. Items without a title are dropped.
pub(crate) fn to_record(value: &Value, zone: ReferenceZone) -> Option<EnrichmentRecord> {
    let object = value.as_object()?;
    let title = object
        .get("title")?
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())?
        .to_string();
    let duration = object
        .get("duration")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let mut time_slots_by_variant = BTreeMap::new();
    for (key, field) in object {
        if key == "title" || key == "duration" {
            continue;
        }
        let Some(items) = field.as_array() else {
            continue;
        };
        let slots: Vec<String> = items
            .iter()
            .filter_map(Value::as_str)
            .map(|slot| format_time_slot(slot, zone))
            .collect();
        if !slots.is_empty() {
            time_slots_by_variant.insert(key.clone(), slots);
        }
    }

    Some(EnrichmentRecord {
        title,
        duration,
        time_slots_by_variant,
    })
}
