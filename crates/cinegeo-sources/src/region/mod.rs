//! Coordinate to administrative region name, via reverse geocoding.

mod address;

use std::time::Duration;

use cinegeo_core::{Coordinate, GeocoderSource, RegionRules};

use crate::cache::BoundedCache;
use crate::failover::{Failover, RequestSpec};

use address::{extract_region, Extraction, ReverseResponse};

/// Cache sizing for region lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionCacheSettings {
    pub capacity: u64,
    /// Decimal places kept in the cache key; 3 is roughly a 111 m cell.
    pub precision: u32,
    pub ttl: Option<Duration>,
}

impl Default for RegionCacheSettings {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            precision: 3,
            ttl: None,
        }
    }
}

/// Resolves coordinates to region names. Never fails: absence is an answer.
#[derive(Debug, Clone)]
pub struct RegionLocator {
    failover: Failover,
    rules: RegionRules,
    coarse_zoom: u8,
    fine_zoom: u8,
    precision: usize,
    cache: BoundedCache<String, Option<String>>,
}

impl RegionLocator {
    #[must_use]
    pub fn new(
        failover: Failover,
        geocoder: &GeocoderSource,
        rules: RegionRules,
        cache: RegionCacheSettings,
    ) -> Self {
        Self {
            failover,
            rules,
            coarse_zoom: geocoder.coarse_zoom,
            fine_zoom: geocoder.fine_zoom,
            precision: usize::try_from(cache.precision).unwrap_or(3),
            cache: BoundedCache::new(cache.capacity, cache.ttl),
        }
    }

    /// 1. cached answer for the rounded cell, if any
    /// 2. coarse reverse geocode
    /// 3. one fine pass when the coarse answer was an ambiguous super-region
    /// 4. landmark boxes
    ///
    /// The outcome is cached unless every geocoder pass failed upstream.
    pub async fn region_for(&self, coordinate: Coordinate) -> Option<String> {
        let key = self.cache_key(coordinate);
        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!(cell = %key, region = ?cached, "region cache hit");
            return cached;
        }

        let mut answered = false;
        let mut region = None;

        if let Some(coarse) = self.reverse(coordinate, self.coarse_zoom).await {
            answered = true;
            region = coarse.region;
            if region.is_none() && coarse.ambiguous && self.fine_zoom != self.coarse_zoom {
                if let Some(fine) = self.reverse(coordinate, self.fine_zoom).await {
                    region = fine.region;
                }
            }
        }

        if region.is_none() {
            region = self.landmark_for(coordinate);
            if let Some(name) = &region {
                tracing::debug!(cell = %key, region = %name, "region from landmark box");
            }
        }

        if answered {
            self.cache.insert(key, region.clone()).await;
        } else {
            tracing::warn!(
                cell = %key,
                region = ?region,
                "geocoder unavailable; region not cached"
            );
        }

        region
    }

    /// `None` when the geocoder could not be reached at all.
    async fn reverse(&self, coordinate: Coordinate, zoom: u8) -> Option<Extraction> {
        let spec = RequestSpec::get("")
            .param("format", "jsonv2")
            .param("lat", coordinate.latitude)
            .param("lon", coordinate.longitude)
            .param("zoom", zoom)
            .param("addressdetails", 1);

        match self.failover.execute_json::<ReverseResponse>(&spec).await {
            Ok(response) => Some(extract_region(&response.address, &self.rules)),
            Err(e) => {
                tracing::warn!(
                    source = %self.failover.upstream(),
                    zoom,
                    error = %e,
                    "reverse geocode failed"
                );
                None
            }
        }
    }

    fn landmark_for(&self, coordinate: Coordinate) -> Option<String> {
        self.rules
            .landmarks
            .iter()
            .find(|area| area.bounds().contains(coordinate))
            .map(|area| area.name.clone())
    }

    fn cache_key(&self, coordinate: Coordinate) -> String {
        format!(
            "{:.*},{:.*}",
            self.precision, coordinate.latitude, self.precision, coordinate.longitude
        )
    }
}
