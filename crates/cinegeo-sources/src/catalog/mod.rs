//! Client for the showtime catalog: locations, the venues in a location, and
//! a venue's showtimes for a date.
//!
//! Identifiers are the catalog's own (`ville-115755`, `B0242`) and are only
//! ever obtained from its listings.

mod slots;

use chrono::NaiveDate;
use cinegeo_core::{CatalogEntry, CatalogLocation, EnrichmentRecord, ReferenceZone};
use serde_json::Value;

use crate::failover::{FetchError, Failover, RequestSpec};

#[derive(Debug, Clone)]
pub struct CatalogClient {
    failover: Failover,
    zone: ReferenceZone,
}

impl CatalogClient {
    #[must_use]
    pub fn new(failover: Failover, zone: ReferenceZone) -> Self {
        Self { failover, zone }
    }

    #[must_use]
    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    /// `GET {base}/locations`. Entries without an id or name are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when no mirror returned a JSON array.
    pub async fn list_locations(&self) -> Result<Vec<CatalogLocation>, FetchError> {
        let raw: Vec<Value> = self
            .failover
            .execute_json(&RequestSpec::get("locations"))
            .await?;

        Ok(raw
            .iter()
            .filter_map(|item| {
                Some(CatalogLocation {
                    id: id_of(item)?,
                    name: text_of(item, "name")?,
                })
            })
            .collect())
    }

    /// `GET {base}/locations/{id}/venues`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when no mirror returned a JSON array.
    pub async fn list_entries(&self, location_id: &str) -> Result<Vec<CatalogEntry>, FetchError> {
        let spec = RequestSpec::get("locations")
            .segment(location_id)
            .segment("venues");
        let raw: Vec<Value> = self.failover.execute_json(&spec).await?;

        Ok(raw
            .iter()
            .filter_map(|item| {
                Some(CatalogEntry {
                    id: id_of(item)?,
                    display_name: text_of(item, "name")?,
                    address: text_of(item, "address"),
                })
            })
            .collect())
    }

    /// `GET {base}/venues/{id}/showtimes?date=YYYY-MM-DD`, with every time
    /// slot reformatted to `HH:MM` where it parses.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when no mirror returned a JSON array.
    pub async fn list_records(
        &self,
        entity_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<EnrichmentRecord>, FetchError> {
        let spec = RequestSpec::get("venues")
            .segment(entity_id)
            .segment("showtimes")
            .param("date", date.format("%Y-%m-%d"));
        let raw: Vec<Value> = self.failover.execute_json(&spec).await?;

        let records: Vec<EnrichmentRecord> = raw
            .iter()
            .filter_map(|item| slots::to_record(item, self.zone))
            .collect();
        if records.len() < raw.len() {
            tracing::debug!(
                entity = entity_id,
                dropped = raw.len() - records.len(),
                "dropping untitled showtime items"
            );
        }
        Ok(records)
    }
}

fn id_of(item: &Value) -> Option<String> {
    match item.get("id")? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_of(item: &Value, key: &str) -> Option<String> {
    item.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
