//! Shared configuration, domain types and pure helpers for cinegeo.
//!
//! Nothing in this crate performs network I/O. The upstream clients and the
//! resolution pipeline live in `cinegeo-sources`.

pub mod app_config;
pub mod config;
pub mod geo;
pub mod position;
pub mod sources;
pub mod text;
pub mod types;
pub mod zone;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{bounding_box, distance_km, BoundingBox, EARTH_RADIUS_KM, MAX_SUPPORTED_LATITUDE};
pub use position::{PositionEntry, PositionError, PositionLog, PositionSource};
pub use sources::{
    load_sources, CatalogSource, DirectorySource, GeocoderSource, LandmarkArea, PoiCategory,
    RegionRules, SourcesFile, TagPredicate,
};
pub use text::{normalize, tokens};
pub use types::{
    CatalogEntry, CatalogLocation, Coordinate, EnrichmentRecord, EntityMatch, PoiEnrichment,
    PointOfInterest, SearchArea,
};
pub use zone::ReferenceZone;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sources file {path}: {source}")]
    SourcesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse sources file: {0}")]
    SourcesFileParse(#[from] serde_yaml::Error),

    #[error("sources validation error: {0}")]
    Validation(String),
}
