//! Fixed reference timezone used for "today" and for HH:MM display.

use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};

const CENTRAL_EUROPEAN_NAMES: &[&str] = &[
    "Europe/Paris",
    "Europe/Brussels",
    "Europe/Berlin",
    "Europe/Madrid",
    "Europe/Rome",
    "CET",
];

/// The zone in which enrichment dates and showtimes are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceZone {
    /// CET/CEST with the EU summer-time rule (last Sunday of March to last
    /// Sunday of October, switching at 01:00 UTC).
    CentralEuropean,
    Utc,
    Fixed(FixedOffset),
}

impl ReferenceZone {
    /// UTC offset in effect at `instant`.
    #[must_use]
    pub fn offset_at(&self, instant: DateTime<Utc>) -> FixedOffset {
        match self {
            ReferenceZone::CentralEuropean => {
                if is_eu_summer_time(instant) {
                    hours(2)
                } else {
                    hours(1)
                }
            }
            ReferenceZone::Utc => Utc.fix(),
            ReferenceZone::Fixed(offset) => *offset,
        }
    }

    #[must_use]
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        instant.with_timezone(&self.offset_at(instant))
    }

    /// Calendar date of `instant` in this zone.
    #[must_use]
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        self.localize(instant).date_naive()
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

impl FromStr for ReferenceZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if CENTRAL_EUROPEAN_NAMES.contains(&trimmed) {
            return Ok(ReferenceZone::CentralEuropean);
        }
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(ReferenceZone::Utc);
        }
        if trimmed.starts_with('+') || trimmed.starts_with('-') {
            return trimmed
                .parse::<FixedOffset>()
                .map(ReferenceZone::Fixed)
                .map_err(|e| format!("invalid UTC offset '{trimmed}': {e}"));
        }
        Err(format!(
            "unsupported timezone '{trimmed}'; use Europe/Paris, UTC or a fixed offset like +01:00"
        ))
    }
}

fn hours(h: i32) -> FixedOffset {
    FixedOffset::east_opt(h * 3600).unwrap_or_else(|| Utc.fix())
}

fn is_eu_summer_time(instant: DateTime<Utc>) -> bool {
    let year = instant.year();
    let (Some(start), Some(end)) = (
        last_sunday_switch(year, 3),
        last_sunday_switch(year, 10),
    ) else {
        return false;
    };
    instant >= start && instant < end
}

/// 01:00 UTC on the last Sunday of `month`.
fn last_sunday_switch(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let last_day = NaiveDate::from_ymd_opt(year, month + 1, 1)?.pred_opt()?;
    let back = i64::from(last_day.weekday().num_days_from_sunday());
    let sunday = last_day - Duration::days(back);
    Some(Utc.from_utc_datetime(&sunday.and_hms_opt(1, 0, 0)?))
}
