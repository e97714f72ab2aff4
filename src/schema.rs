//! Static field schema for the safety-events dataset.
//!
//! Each logical field lists the dataset columns that may carry it, in order
//! of preference. The first column that is present, non-null and non-blank
//! wins. Datasets that name a column differently get a new entry here rather
//! than a runtime guess.

use serde_json::{Map, Value};

use crate::model::RawEvent;

/// A logical field, its column fallback chain, and where it lands on
/// [`RawEvent`].
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub value: fn(&RawEvent) -> Option<&str>,
}

pub const AGENCY: Field = Field {
    name: "agency",
    columns: &["agency", "agency_name"],
    value: |e| e.agency.as_deref(),
};
pub const EVENT_TYPE: Field = Field {
    name: "event_type",
    columns: &["event_type", "event_category"],
    value: |e| e.event_type.as_deref(),
};
pub const INCIDENT_DATE: Field = Field {
    name: "incident_date",
    columns: &["incident_date", "event_date", "date"],
    value: |e| e.incident_date.as_deref(),
};
pub const LATITUDE: Field = Field {
    name: "latitude",
    columns: &["latitude", "lat"],
    value: |e| e.latitude.as_deref(),
};
pub const LONGITUDE: Field = Field {
    name: "longitude",
    columns: &["longitude", "lon", "lng"],
    value: |e| e.longitude.as_deref(),
};
pub const TOTAL_FATALITIES: Field = Field {
    name: "total_fatalities",
    columns: &["total_fatalities", "fatalities"],
    value: |e| e.total_fatalities.as_deref(),
};
pub const TOTAL_INJURIES: Field = Field {
    name: "total_injuries",
    columns: &["total_injuries", "injuries"],
    value: |e| e.total_injuries.as_deref(),
};
pub const LOCATION_TYPE: Field = Field {
    name: "location_type",
    columns: &["location_type"],
    value: |e| e.location_type.as_deref(),
};
pub const APPROXIMATE_ADDRESS: Field = Field {
    name: "approximate_address",
    columns: &["approximate_address", "address"],
    value: |e| e.approximate_address.as_deref(),
};
pub const STATE: Field = Field {
    name: "state",
    columns: &["state"],
    value: |e| e.state.as_deref(),
};
pub const CITY: Field = Field {
    name: "city",
    columns: &["city"],
    value: |e| e.city.as_deref(),
};

/// Every field, in the order reports list them.
pub const FIELDS: &[Field] = &[
    AGENCY,
    EVENT_TYPE,
    INCIDENT_DATE,
    LATITUDE,
    LONGITUDE,
    TOTAL_FATALITIES,
    TOTAL_INJURIES,
    LOCATION_TYPE,
    APPROXIMATE_ADDRESS,
    STATE,
    CITY,
];

impl Field {
    /// Returns the first usable value along the fallback chain.
    pub fn extract(&self, record: &Map<String, Value>) -> Option<String> {
        self.columns
            .iter()
            .find_map(|column| record.get(*column).and_then(as_text))
    }
}

/// Textual form of a scalar JSON value. Nulls, blanks, arrays and objects
/// count as absent.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

impl RawEvent {
    /// Extracts every schema field from a flat JSON record.
    pub fn from_record(record: &Map<String, Value>) -> Self {
        RawEvent {
            agency: AGENCY.extract(record),
            event_type: EVENT_TYPE.extract(record),
            incident_date: INCIDENT_DATE.extract(record),
            latitude: LATITUDE.extract(record),
            longitude: LONGITUDE.extract(record),
            total_fatalities: TOTAL_FATALITIES.extract(record),
            total_injuries: TOTAL_INJURIES.extract(record),
            location_type: LOCATION_TYPE.extract(record),
            approximate_address: APPROXIMATE_ADDRESS.extract(record),
            state: STATE.extract(record),
            city: CITY.extract(record),
        }
    }

    /// Value of a schema field on this record.
    pub fn get(&self, field: &Field) -> Option<&str> {
        (field.value)(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fixture must be an object"),
        }
    }

    #[test]
    fn test_first_column_wins() {
        let record = object(json!({ "agency": "MTA Bus", "agency_name": "Other" }));
        assert_eq!(AGENCY.extract(&record).as_deref(), Some("MTA Bus"));
    }

    #[test]
    fn test_falls_back_past_null_and_blank() {
        let record = object(json!({ "agency": null, "agency_name": "NYC Transit" }));
        assert_eq!(AGENCY.extract(&record).as_deref(), Some("NYC Transit"));

        let record = object(json!({ "latitude": "   ", "lat": "40.7" }));
        assert_eq!(LATITUDE.extract(&record).as_deref(), Some("40.7"));
    }

    #[test]
    fn test_numbers_become_text() {
        let record = object(json!({ "total_fatalities": 2, "latitude": 40.75 }));
        let raw = RawEvent::from_record(&record);
        assert_eq!(raw.total_fatalities.as_deref(), Some("2"));
        assert_eq!(raw.latitude.as_deref(), Some("40.75"));
    }

    #[test]
    fn test_nested_values_are_absent() {
        let record = object(json!({ "latitude": { "value": 40.7 }, "city": ["NY"] }));
        let raw = RawEvent::from_record(&record);
        assert_eq!(raw.latitude, None);
        assert_eq!(raw.city, None);
    }

    #[test]
    fn test_get_matches_fields() {
        let record = object(json!({
            "agency": "MTA",
            "event_type": "Suicide",
            "city": "New York"
        }));
        let raw = RawEvent::from_record(&record);
        assert_eq!(raw.get(&AGENCY), Some("MTA"));
        assert_eq!(raw.get(&EVENT_TYPE), Some("Suicide"));
        assert_eq!(raw.get(&CITY), Some("New York"));
        assert_eq!(raw.get(&STATE), None);
        assert_eq!(FIELDS.len(), 11);
    }

    #[test]
    fn test_each_field_reads_its_own_slot() {
        for field in FIELDS {
            let mut record = Map::new();
            record.insert(field.columns[0].to_string(), json!("x"));
            let raw = RawEvent::from_record(&record);
            for other in FIELDS {
                let expected = (other.name == field.name).then_some("x");
                assert_eq!(raw.get(other), expected, "{} set, {} read", field.name, other.name);
            }
        }
    }
}
