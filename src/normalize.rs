//! Field coercion: text coordinates, dates and counts to typed values.
//!
//! A row whose coordinates (or, when required, date) fail to coerce is
//! dropped, never an error. Drops are tallied in [`RunStats`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::config::BoundingBox;
use crate::model::{RawEvent, SafetyEvent};
use crate::stats::RunStats;

/// Per-report normalization rules.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NormalizeOptions {
    /// Rows outside this box are dropped.
    pub bounds: Option<BoundingBox>,
    /// Rows without a parseable incident date are dropped.
    pub require_date: bool,
}

/// Why a row did not survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DropReason {
    /// Latitude or longitude missing or not a number.
    InvalidCoordinates,
    /// Coordinates outside [-90, 90] x [-180, 180].
    OutOfRange,
    /// Coordinates outside the configured bounding box.
    OutsideBounds,
    /// Date missing or unparseable where one is required.
    MissingDate,
}

/// Parses a coordinate, rejecting non-finite values.
pub fn parse_coordinate(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parses the incident date shapes seen in the dataset.
pub fn parse_incident_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    // Socrata floating timestamp, with or without fractional seconds.
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a non-negative count. Integral floats (`"2.0"`) are accepted;
/// anything else, including a missing value, counts as zero.
pub fn parse_count(value: Option<&str>) -> u32 {
    let Some(value) = value.map(str::trim) else {
        return 0;
    };
    if let Ok(n) = value.parse::<u32>() {
        return n;
    }
    match value.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 => f.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn in_globe(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Coerces one raw record.
pub fn normalize(raw: &RawEvent, options: &NormalizeOptions) -> Result<SafetyEvent, DropReason> {
    let (Some(latitude), Some(longitude)) = (
        parse_coordinate(raw.latitude.as_deref()),
        parse_coordinate(raw.longitude.as_deref()),
    ) else {
        return Err(DropReason::InvalidCoordinates);
    };

    if !in_globe(latitude, longitude) {
        return Err(DropReason::OutOfRange);
    }

    if let Some(bounds) = &options.bounds
        && !bounds.contains(latitude, longitude)
    {
        return Err(DropReason::OutsideBounds);
    }

    let incident_date = raw.incident_date.as_deref().and_then(parse_incident_date);
    if options.require_date && incident_date.is_none() {
        return Err(DropReason::MissingDate);
    }

    Ok(SafetyEvent {
        agency: raw.agency.clone(),
        event_type: raw.event_type.clone(),
        incident_date,
        latitude,
        longitude,
        total_fatalities: parse_count(raw.total_fatalities.as_deref()),
        total_injuries: parse_count(raw.total_injuries.as_deref()),
        location_type: raw.location_type.clone(),
        approximate_address: raw.approximate_address.clone(),
    })
}

/// Coerces every record, dropping (and counting) the ones that fail.
pub fn normalize_all(
    raws: &[RawEvent],
    options: &NormalizeOptions,
    stats: &mut RunStats,
) -> Vec<SafetyEvent> {
    let mut events = Vec::with_capacity(raws.len());

    for raw in raws {
        match normalize(raw, options) {
            Ok(event) => events.push(event),
            Err(reason) => {
                debug!(
                    ?reason,
                    latitude = raw.latitude.as_deref(),
                    longitude = raw.longitude.as_deref(),
                    date = raw.incident_date.as_deref(),
                    "Dropping record"
                );
                stats.record_drop(reason);
            }
        }
    }

    stats.normalized = events.len();
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lat: &str, lon: &str, date: Option<&str>, fatalities: &str) -> RawEvent {
        RawEvent {
            agency: Some("MTA New York City Transit".to_string()),
            latitude: Some(lat.to_string()),
            longitude: Some(lon.to_string()),
            incident_date: date.map(str::to_string),
            total_fatalities: Some(fatalities.to_string()),
            ..Default::default()
        }
    }

    fn nyc() -> NormalizeOptions {
        NormalizeOptions {
            bounds: Some(BoundingBox::NYC),
            require_date: false,
        }
    }

    #[test]
    fn test_normalize_valid_row() {
        let event = normalize(&raw("40.75", "-73.98", Some("2019-03-01"), "2"), &nyc()).unwrap();
        assert_eq!(event.latitude, 40.75);
        assert_eq!(event.longitude, -73.98);
        assert_eq!(event.total_fatalities, 2);
        assert_eq!(
            event.incident_date,
            NaiveDate::from_ymd_opt(2019, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
    }

    #[test]
    fn test_unparseable_latitude_is_dropped() {
        let result = normalize(&raw("abc", "-73.98", Some("2019-03-01"), "5"), &nyc());
        assert_eq!(result, Err(DropReason::InvalidCoordinates));

        let no_bounds = NormalizeOptions::default();
        let result = normalize(&raw("abc", "-73.98", Some("2019-03-01"), "5"), &no_bounds);
        assert_eq!(result, Err(DropReason::InvalidCoordinates));
    }

    #[test]
    fn test_missing_longitude_is_dropped() {
        let mut r = raw("40.75", "-73.98", None, "1");
        r.longitude = None;
        assert_eq!(normalize(&r, &nyc()), Err(DropReason::InvalidCoordinates));
    }

    #[test]
    fn test_non_finite_coordinates_are_dropped() {
        let result = normalize(&raw("NaN", "-73.98", None, "1"), &NormalizeOptions::default());
        assert_eq!(result, Err(DropReason::InvalidCoordinates));
        let result = normalize(&raw("40.7", "inf", None, "1"), &NormalizeOptions::default());
        assert_eq!(result, Err(DropReason::InvalidCoordinates));
    }

    #[test]
    fn test_out_of_range_is_dropped() {
        let options = NormalizeOptions::default();
        assert_eq!(
            normalize(&raw("91.0", "0.0", None, "1"), &options),
            Err(DropReason::OutOfRange)
        );
        assert_eq!(
            normalize(&raw("0.0", "-180.5", None, "1"), &options),
            Err(DropReason::OutOfRange)
        );
        assert!(normalize(&raw("-90", "180", None, "1"), &options).is_ok());
    }

    #[test]
    fn test_bounding_box_drops_outside_rows() {
        let result = normalize(&raw("34.0", "-118.2", Some("2019-04-01"), "1"), &nyc());
        assert_eq!(result, Err(DropReason::OutsideBounds));

        let unbounded = normalize(
            &raw("34.0", "-118.2", Some("2019-04-01"), "1"),
            &NormalizeOptions::default(),
        );
        assert!(unbounded.is_ok());
    }

    #[test]
    fn test_required_date() {
        let options = NormalizeOptions {
            bounds: Some(BoundingBox::NYC),
            require_date: true,
        };
        assert_eq!(
            normalize(&raw("40.75", "-73.98", Some("yesterday"), "1"), &options),
            Err(DropReason::MissingDate)
        );
        assert_eq!(
            normalize(&raw("40.75", "-73.98", None, "1"), &options),
            Err(DropReason::MissingDate)
        );

        let lenient = normalize(&raw("40.75", "-73.98", Some("yesterday"), "1"), &nyc()).unwrap();
        assert_eq!(lenient.incident_date, None);
    }

    #[test]
    fn test_zero_fatalities_pass_normalization() {
        let event = normalize(&raw("40.75", "-73.98", None, "0"), &nyc()).unwrap();
        assert_eq!(event.total_fatalities, 0);
    }

    #[test]
    fn test_parse_incident_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2019, 3, 1)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap();
        assert_eq!(parse_incident_date("2019-03-01T14:30:00.000"), Some(expected));
        assert_eq!(parse_incident_date("2019-03-01T14:30:00"), Some(expected));
        assert_eq!(parse_incident_date("2019-03-01T14:30:00Z"), Some(expected));
        assert_eq!(parse_incident_date("2019-03-01T10:30:00-04:00"), Some(expected));
        assert_eq!(parse_incident_date("2019-03-01 14:30:00"), Some(expected));
        assert_eq!(
            parse_incident_date("2019-03-01"),
            NaiveDate::from_ymd_opt(2019, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert_eq!(parse_incident_date("03/01/2019"), None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(Some("3")), 3);
        assert_eq!(parse_count(Some(" 2.0 ")), 2);
        assert_eq!(parse_count(Some("2.5")), 0);
        assert_eq!(parse_count(Some("-1")), 0);
        assert_eq!(parse_count(Some("many")), 0);
        assert_eq!(parse_count(None), 0);
    }

    #[test]
    fn test_normalize_all_counts_drops() {
        let raws = vec![
            raw("40.75", "-73.98", None, "1"),
            raw("abc", "-73.98", None, "1"),
            raw("34.0", "-118.2", None, "1"),
            raw("95.0", "-73.98", None, "1"),
        ];
        let mut stats = RunStats::default();
        let events = normalize_all(&raws, &nyc(), &mut stats);

        assert_eq!(events.len(), 1);
        assert_eq!(stats.normalized, 1);
        assert_eq!(stats.dropped_invalid_coordinates, 1);
        assert_eq!(stats.dropped_outside_bounds, 1);
        assert_eq!(stats.dropped_out_of_range, 1);
        assert_eq!(stats.dropped(), 3);
    }

    #[test]
    fn test_survivors_satisfy_bounds() {
        let raws: Vec<RawEvent> = [
            ("40.4", "-74.3"),
            ("41.0", "-73.7"),
            ("40.39", "-74.0"),
            ("40.7", "-73.69"),
            ("-91", "0"),
        ]
        .iter()
        .map(|(lat, lon)| raw(lat, lon, None, "1"))
        .collect();

        let events = normalize_all(&raws, &nyc(), &mut RunStats::default());
        assert_eq!(events.len(), 2);
        for e in &events {
            assert!((-90.0..=90.0).contains(&e.latitude));
            assert!((-180.0..=180.0).contains(&e.longitude));
            assert!(BoundingBox::NYC.contains(e.latitude, e.longitude));
        }
    }
}
