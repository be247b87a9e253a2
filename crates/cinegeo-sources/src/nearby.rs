//! Request-level entry point: center, radius and category in, report out.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use cinegeo_core::{
    AppConfig, Coordinate, PoiCategory, PointOfInterest, PositionSource, ReferenceZone,
    SearchArea, SourcesFile,
};
use serde::Serialize;

use crate::cache::ttl_from_secs;
use crate::catalog::CatalogClient;
use crate::directory::{DirectoryLimits, GeoDirectory};
use crate::enrich::{EnrichmentCoordinator, EnrichmentSettings, EnrichmentSummary};
use crate::error::SourcesError;
use crate::failover::{build_http_client, Failover};
use crate::region::{RegionCacheSettings, RegionLocator};
use crate::resolve::EntityResolver;

pub const DEFAULT_RADIUS_KM: f64 = 10.0;
pub const DEFAULT_CATEGORY: &str = "cinema";

#[derive(Debug, Clone, PartialEq)]
pub struct NearbyRequest {
    /// Falls back to the latest recorded position.
    pub center: Option<Coordinate>,
    pub radius_km: Option<f64>,
    pub max_results: Option<usize>,
    pub category: String,
    pub enrich: bool,
    pub enrich_limit: Option<usize>,
    /// Defaults to today in the reference zone.
    pub date: Option<NaiveDate>,
}

impl Default for NearbyRequest {
    fn default() -> Self {
        Self {
            center: None,
            radius_km: None,
            max_results: None,
            category: DEFAULT_CATEGORY.to_string(),
            enrich: false,
            enrich_limit: None,
            date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyReport {
    pub center: Coordinate,
    /// Radius actually searched, after clamping.
    pub radius_km: f64,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    pub count: usize,
    pub pois: Vec<PointOfInterest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichmentSummary>,
}

pub struct NearbyService {
    directory: GeoDirectory,
    enrichment: EnrichmentCoordinator,
    position: Arc<dyn PositionSource>,
    categories: BTreeMap<String, PoiCategory>,
    zone: ReferenceZone,
    default_enrich_limit: usize,
}

impl NearbyService {
    #[must_use]
    pub fn new(
        directory: GeoDirectory,
        enrichment: EnrichmentCoordinator,
        position: Arc<dyn PositionSource>,
        categories: BTreeMap<String, PoiCategory>,
        zone: ReferenceZone,
        default_enrich_limit: usize,
    ) -> Self {
        Self {
            directory,
            enrichment,
            position,
            categories,
            zone,
            default_enrich_limit,
        }
    }

    /// Wires every component from loaded configuration, sharing one HTTP
    /// client across all upstreams.
    ///
    /// # Errors
    ///
    /// Returns [`SourcesError::Client`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &AppConfig,
        sources: &SourcesFile,
        position: Arc<dyn PositionSource>,
    ) -> Result<Self, SourcesError> {
        let client = build_http_client(config.request_timeout_secs, &config.user_agent)?;
        let ttl = ttl_from_secs(config.cache_ttl_secs);

        let directory = GeoDirectory::new(
            Failover::new(
                client.clone(),
                "directory",
                sources.directory.endpoints.clone(),
            ),
            DirectoryLimits {
                radius_cap_km: config.radius_cap_km,
                default_max_results: config.default_max_results,
                max_results_ceiling: config.max_results_ceiling,
            },
        );

        let regions = RegionLocator::new(
            Failover::new(
                client.clone(),
                "geocoder",
                sources.geocoder.endpoints.clone(),
            ),
            &sources.geocoder,
            sources.regions.clone(),
            RegionCacheSettings {
                capacity: config.region_cache_capacity,
                precision: config.region_cache_precision,
                ttl,
            },
        );

        let catalog = CatalogClient::new(
            Failover::new(client, "catalog", sources.catalog.endpoints.clone()),
            config.reference_zone,
        );

        let enrichment = EnrichmentCoordinator::new(
            regions,
            catalog,
            EntityResolver::new(config.match_threshold),
            EnrichmentSettings {
                max_concurrent: config.enrich_max_concurrent,
                catalog_cache_capacity: config.catalog_cache_capacity,
                cache_ttl: ttl,
            },
        );

        Ok(Self::new(
            directory,
            enrichment,
            position,
            sources.categories.clone(),
            config.reference_zone,
            config.enrich_limit,
        ))
    }

    /// # Errors
    ///
    /// - [`SourcesError::UnknownCategory`] for a category not in the sources file
    /// - [`SourcesError::NoPosition`] when no center is given or recorded
    /// - [`SourcesError::Validation`] for an invalid center or radius
    ///
    /// Upstream outages never produce an error; they yield fewer POIs or
    /// less enrichment.
    pub async fn nearby(&self, request: NearbyRequest) -> Result<NearbyReport, SourcesError> {
        let category = self
            .categories
            .get(&request.category)
            .ok_or_else(|| SourcesError::UnknownCategory(request.category.clone()))?;

        let center = match request.center {
            Some(center) => center,
            None => self
                .position
                .latest_position()
                .ok_or(SourcesError::NoPosition)?,
        };

        let area = SearchArea {
            center,
            radius_km: request.radius_km.unwrap_or(DEFAULT_RADIUS_KM),
        }
        .clamped(self.directory.limits().radius_cap_km)?;

        let mut pois = self
            .directory
            .find_nearby(area, category, request.max_results)
            .await?;

        let (date, enrichment) = if request.enrich {
            let date = request.date.unwrap_or_else(|| self.zone.today());
            let limit = request.enrich_limit.unwrap_or(self.default_enrich_limit);
            let summary = self.enrichment.enrich(&mut pois, date, limit).await;
            (Some(date), Some(summary))
        } else {
            (None, None)
        };

        tracing::info!(
            category = %request.category,
            latitude = center.latitude,
            longitude = center.longitude,
            radius_km = area.radius_km,
            count = pois.len(),
            "nearby search complete"
        );

        Ok(NearbyReport {
            center,
            radius_km: area.radius_km,
            category: request.category,
            date,
            count: pois.len(),
            pois,
            enrichment,
        })
    }
}
