//! Record types carried through the pipeline and the keys reports group by.

use chrono::{Datelike, NaiveDateTime};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// Label substituted wherever an event or location type is missing.
pub const UNKNOWN: &str = "Unknown";

/// A dataset row as extracted through the field schema, before coercion.
///
/// Numeric JSON values are carried in their textual form so that the
/// normalizer handles `"40.75"` and `40.75` the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawEvent {
    pub agency: Option<String>,
    pub event_type: Option<String>,
    pub incident_date: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub total_fatalities: Option<String>,
    pub total_injuries: Option<String>,
    pub location_type: Option<String>,
    pub approximate_address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
}

/// One reported incident after normalization.
///
/// Coordinates are always finite and inside the globe (and inside the
/// bounding box, when the run used one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyEvent {
    pub agency: Option<String>,
    pub event_type: Option<String>,
    pub incident_date: Option<NaiveDateTime>,
    pub latitude: f64,
    pub longitude: f64,
    pub total_fatalities: u32,
    pub total_injuries: u32,
    pub location_type: Option<String>,
    pub approximate_address: Option<String>,
}

impl SafetyEvent {
    pub fn is_fatal(&self) -> bool {
        self.total_fatalities > 0
    }

    pub fn event_type_label(&self) -> &str {
        self.event_type.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn location_type_label(&self) -> &str {
        self.location_type.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn year_month(&self) -> Option<YearMonth> {
        self.incident_date.as_ref().map(YearMonth::from_datetime)
    }

    pub fn year(&self) -> Option<i32> {
        self.incident_date.map(|d| d.year())
    }
}

/// Calendar month key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Decimal places kept when bucketing coordinates (about 111 m).
pub const COORDINATE_PRECISION: i32 = 3;

/// A coordinate pair rounded to [`COORDINATE_PRECISION`] decimal places.
///
/// Stored as scaled integers so it can be hashed; rounding is half away
/// from zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoordinateKey {
    lat_scaled: i64,
    lon_scaled: i64,
}

impl CoordinateKey {
    fn scale() -> f64 {
        10f64.powi(COORDINATE_PRECISION)
    }

    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        let scale = Self::scale();
        Self {
            lat_scaled: (latitude * scale).round() as i64,
            lon_scaled: (longitude * scale).round() as i64,
        }
    }

    pub fn of(event: &SafetyEvent) -> Self {
        Self::from_degrees(event.latitude, event.longitude)
    }

    pub fn latitude(&self) -> f64 {
        self.lat_scaled as f64 / Self::scale()
    }

    pub fn longitude(&self) -> f64 {
        self.lon_scaled as f64 / Self::scale()
    }
}

impl fmt::Display for CoordinateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.latitude(), self.longitude())
    }
}

impl Serialize for CoordinateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CoordinateKey", 2)?;
        state.serialize_field("latitude", &self.latitude())?;
        state.serialize_field("longitude", &self.longitude())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event_at(lat: f64, lon: f64) -> SafetyEvent {
        SafetyEvent {
            agency: Some("MTA New York City Transit".to_string()),
            event_type: None,
            incident_date: NaiveDate::from_ymd_opt(2019, 3, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
            latitude: lat,
            longitude: lon,
            total_fatalities: 1,
            total_injuries: 0,
            location_type: None,
            approximate_address: None,
        }
    }

    #[test]
    fn test_coordinate_key_rounds_to_three_places() {
        let a = CoordinateKey::from_degrees(40.75049, -73.98011);
        let b = CoordinateKey::from_degrees(40.7496, -73.9804);
        assert_eq!(a, b);
        assert!((a.latitude() - 40.75).abs() < 1e-9);
        assert!((a.longitude() - -73.98).abs() < 1e-9);
    }

    #[test]
    fn test_coordinate_key_separates_neighbours() {
        let a = CoordinateKey::from_degrees(40.750, -73.980);
        let b = CoordinateKey::from_degrees(40.751, -73.980);
        assert_ne!(a, b);
    }

    #[test]
    fn test_coordinate_key_serializes_degrees() {
        let key = CoordinateKey::from_degrees(40.7128, -74.006);
        let json = serde_json::to_value(key).unwrap();
        assert_eq!(json["latitude"], 40.713);
        assert_eq!(json["longitude"], -74.006);
    }

    #[test]
    fn test_year_month_display_and_order() {
        let march = YearMonth { year: 2019, month: 3 };
        let december = YearMonth { year: 2018, month: 12 };
        assert_eq!(march.to_string(), "2019-03");
        assert!(december < march);
    }

    #[test]
    fn test_labels_fall_back_to_unknown() {
        let event = event_at(40.7, -74.0);
        assert_eq!(event.event_type_label(), UNKNOWN);
        assert_eq!(event.location_type_label(), UNKNOWN);
        assert_eq!(event.year(), Some(2019));
        assert_eq!(event.year_month(), Some(YearMonth { year: 2019, month: 3 }));
    }
}
