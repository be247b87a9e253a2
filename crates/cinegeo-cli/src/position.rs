//! `position` command handlers.

use cinegeo_core::{Coordinate, PositionEntry, PositionLog};

/// # Errors
///
/// Returns an error for an out-of-range coordinate or an unwritable log.
pub(crate) fn run_record(
    log: &PositionLog,
    lat: f64,
    lon: f64,
    accuracy: Option<f64>,
) -> anyhow::Result<()> {
    let coordinate = Coordinate::new(lat, lon)?;
    let entry = log.append(coordinate, accuracy)?;
    tracing::info!(
        path = %log.path().display(),
        latitude = entry.latitude,
        longitude = entry.longitude,
        "position recorded"
    );
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the log exists but cannot be read or parsed.
pub(crate) fn run_latest(log: &PositionLog) -> anyhow::Result<()> {
    match log.latest()? {
        Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
        None => println!("no position recorded in {}", log.path().display()),
    }
    Ok(())
}

/// Prints `{"count": n, "locations": [...]}`.
///
/// # Errors
///
/// Returns an error if the log exists but cannot be read or parsed.
pub(crate) fn run_list(log: &PositionLog) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&listing(&log.entries()?))?);
    Ok(())
}

/// # Errors
///
/// Returns an error if the emptied log cannot be written.
pub(crate) fn run_clear(log: &PositionLog) -> anyhow::Result<()> {
    let removed = log.clear()?;
    tracing::info!(path = %log.path().display(), removed, "position log cleared");
    println!("cleared {removed} position(s) from {}", log.path().display());
    Ok(())
}

pub(crate) fn listing(entries: &[PositionEntry]) -> serde_json::Value {
    serde_json::json!({
        "count": entries.len(),
        "locations": entries,
    })
}
