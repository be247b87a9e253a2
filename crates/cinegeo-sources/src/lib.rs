//! Upstream clients and the nearby-POI pipeline: mirrored fetching, the
//! primary directory, reverse geocoding, the showtime catalog, fuzzy entity
//! resolution and enrichment.

pub mod cache;
pub mod catalog;
pub mod directory;
pub mod enrich;
pub mod error;
pub mod failover;
pub mod nearby;
pub mod region;
pub mod resolve;

pub use cache::BoundedCache;
pub use catalog::CatalogClient;
pub use directory::{DirectoryLimits, GeoDirectory};
pub use enrich::{EnrichmentCoordinator, EnrichmentSettings, EnrichmentSummary, SkipReason};
pub use error::SourcesError;
pub use failover::{build_http_client, Failover, FetchError, FetchFailure, RequestSpec};
pub use nearby::{NearbyReport, NearbyRequest, NearbyService};
pub use region::{RegionCacheSettings, RegionLocator};
pub use resolve::{resolve_label, EntityResolver, DEFAULT_MATCH_THRESHOLD};
