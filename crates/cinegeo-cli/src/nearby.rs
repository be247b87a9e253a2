//! `nearby` command handler.

use std::sync::Arc;

use chrono::NaiveDate;
use cinegeo_core::{AppConfig, Coordinate, PositionLog};
use cinegeo_sources::{NearbyRequest, NearbyService};

/// Turns raw flags into a request. `lat`/`lon` are validated here so a bad
/// center fails before any configuration or network work.
///
/// # Errors
///
/// Returns an error if only one of `lat`/`lon` is given or they are out of range.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_request(
    lat: Option<f64>,
    lon: Option<f64>,
    radius_km: Option<f64>,
    max_results: Option<usize>,
    category: String,
    enrich: bool,
    enrich_limit: Option<usize>,
    date: Option<NaiveDate>,
) -> anyhow::Result<NearbyRequest> {
    let center = match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)?),
        (None, None) => None,
        _ => anyhow::bail!("--lat and --lon must be given together"),
    };

    Ok(NearbyRequest {
        center,
        radius_km,
        max_results,
        category,
        enrich,
        enrich_limit,
        date,
    })
}

/// Loads the sources file, runs one search and prints the report as JSON.
///
/// # Errors
///
/// Returns an error if the sources file is invalid, the HTTP client cannot be
/// built, or the request itself is rejected. Upstream outages are not errors.
pub(crate) async fn run_nearby(
    config: &AppConfig,
    log: Arc<PositionLog>,
    request: NearbyRequest,
) -> anyhow::Result<()> {
    let sources = cinegeo_core::load_sources(&config.sources_path)?;
    tracing::debug!(
        path = %config.sources_path.display(),
        categories = sources.categories.len(),
        "sources loaded"
    );

    let service = NearbyService::from_config(config, &sources, log)?;
    let report = service.nearby(request).await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
