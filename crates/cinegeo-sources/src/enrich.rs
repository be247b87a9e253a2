//! Attaches catalog showtimes to the nearest POIs.
//!
//! Each POI is enriched independently. Any failure along the chain (region,
//! catalog location, venue list, name match, showtimes) leaves that POI
//! untouched and is only logged; the batch always completes.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use cinegeo_core::{CatalogEntry, CatalogLocation, PoiEnrichment, PointOfInterest};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::cache::BoundedCache;
use crate::catalog::CatalogClient;
use crate::region::RegionLocator;
use crate::resolve::{resolve_label, EntityResolver};

/// Why a POI was left unenriched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingName,
    InvalidCoordinate,
    NoRegion,
    NoCatalogLocation,
    CatalogUnavailable,
    NoEntityMatch,
    RecordsUnavailable,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::MissingName => "missing_name",
            SkipReason::InvalidCoordinate => "invalid_coordinate",
            SkipReason::NoRegion => "no_region",
            SkipReason::NoCatalogLocation => "no_catalog_location",
            SkipReason::CatalogUnavailable => "catalog_unavailable",
            SkipReason::NoEntityMatch => "no_entity_match",
            SkipReason::RecordsUnavailable => "records_unavailable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub attempted: usize,
    pub enriched: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSettings {
    /// Upper bound on POIs enriched at the same time.
    pub max_concurrent: usize,
    /// Number of per-location venue lists kept.
    pub catalog_cache_capacity: u64,
    pub cache_ttl: Option<Duration>,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            catalog_cache_capacity: 256,
            cache_ttl: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichmentCoordinator {
    regions: RegionLocator,
    catalog: CatalogClient,
    resolver: EntityResolver,
    max_concurrent: usize,
    locations: BoundedCache<(), Arc<Vec<CatalogLocation>>>,
    entries: BoundedCache<String, Arc<Vec<CatalogEntry>>>,
}

impl EnrichmentCoordinator {
    #[must_use]
    pub fn new(
        regions: RegionLocator,
        catalog: CatalogClient,
        resolver: EntityResolver,
        settings: EnrichmentSettings,
    ) -> Self {
        Self {
            regions,
            catalog,
            resolver,
            max_concurrent: settings.max_concurrent.max(1),
            locations: BoundedCache::new(1, settings.cache_ttl),
            entries: BoundedCache::new(settings.catalog_cache_capacity, settings.cache_ttl),
        }
    }

    /// Enriches the first `limit` POIs in place. Order is preserved and no
    /// error is ever returned; see the summary for what happened.
    pub async fn enrich(
        &self,
        pois: &mut [PointOfInterest],
        date: NaiveDate,
        limit: usize,
    ) -> EnrichmentSummary {
        let outcomes: Vec<Result<(), SkipReason>> = stream::iter(pois.iter_mut().take(limit))
            .map(|poi| self.enrich_one(poi, date))
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let enriched = outcomes.iter().filter(|o| o.is_ok()).count();
        let summary = EnrichmentSummary {
            attempted: outcomes.len(),
            enriched,
            skipped: outcomes.len() - enriched,
        };

        tracing::info!(
            date = %date,
            attempted = summary.attempted,
            enriched = summary.enriched,
            skipped = summary.skipped,
            "enrichment complete"
        );

        summary
    }

    async fn enrich_one(
        &self,
        poi: &mut PointOfInterest,
        date: NaiveDate,
    ) -> Result<(), SkipReason> {
        let outcome = self.lookup(poi, date).await;
        match outcome {
            Ok(enrichment) => {
                tracing::debug!(
                    poi = %poi.name,
                    region = %enrichment.region,
                    entity = %enrichment.entity_id,
                    count = enrichment.records.len(),
                    "poi enriched"
                );
                poi.enrichment = Some(enrichment);
                Ok(())
            }
            Err(reason) => {
                tracing::debug!(
                    poi = %poi.name,
                    external_id = %poi.external_id,
                    reason = %reason,
                    "poi not enriched"
                );
                Err(reason)
            }
        }
    }

    async fn lookup(
        &self,
        poi: &PointOfInterest,
        date: NaiveDate,
    ) -> Result<PoiEnrichment, SkipReason> {
        if poi.name.trim().is_empty() {
            return Err(SkipReason::MissingName);
        }
        if poi.coordinate.validate().is_err() {
            return Err(SkipReason::InvalidCoordinate);
        }

        let region = self
            .regions
            .region_for(poi.coordinate)
            .await
            .ok_or(SkipReason::NoRegion)?;

        let locations = self
            .catalog_locations()
            .await
            .ok_or(SkipReason::CatalogUnavailable)?;
        let location = resolve_label(&region, locations.as_slice(), |l| l.name.as_str())
            .ok_or(SkipReason::NoCatalogLocation)?;

        let entries = self
            .catalog_entries(&location.id)
            .await
            .ok_or(SkipReason::CatalogUnavailable)?;

        let matched = self
            .resolver
            .resolve(&poi.name, Some(&region), entries.as_slice())
            .ok_or(SkipReason::NoEntityMatch)?;

        let records = match self.catalog.list_records(&matched.entry.id, date).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    poi = %poi.name,
                    entity = %matched.entry.id,
                    error = %e,
                    "showtimes unavailable"
                );
                return Err(SkipReason::RecordsUnavailable);
            }
        };

        Ok(PoiEnrichment {
            date,
            region,
            entity_id: matched.entry.id,
            entity_name: matched.entry.display_name,
            records,
        })
    }

    /// Fetched once per process; a failed fetch is retried on the next call.
    async fn catalog_locations(&self) -> Option<Arc<Vec<CatalogLocation>>> {
        if let Some(cached) = self.locations.get(&()).await {
            return Some(cached);
        }
        match self.catalog.list_locations().await {
            Ok(locations) => {
                let locations = Arc::new(locations);
                self.locations.insert((), Arc::clone(&locations)).await;
                Some(locations)
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog location list unavailable");
                None
            }
        }
    }

    async fn catalog_entries(&self, location_id: &str) -> Option<Arc<Vec<CatalogEntry>>> {
        let key = location_id.to_string();
        if let Some(cached) = self.entries.get(&key).await {
            return Some(cached);
        }
        match self.catalog.list_entries(location_id).await {
            Ok(entries) => {
                tracing::debug!(
                    location = location_id,
                    count = entries.len(),
                    "catalog venues cached"
                );
                let entries = Arc::new(entries);
                self.entries.insert(key, Arc::clone(&entries)).await;
                Some(entries)
            }
            Err(e) => {
                tracing::warn!(location = location_id, error = %e, "catalog venues unavailable");
                None
            }
        }
    }
}
