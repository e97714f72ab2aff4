//! Data types produced by the aggregation stage.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::model::CoordinateKey;

/// One aggregate bucket: the reporter-facing output shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket<K> {
    pub key: K,
    pub fatalities: u64,
    pub incidents: usize,
    /// Modal event type, or "Unknown".
    pub event_type: String,
    /// Modal location type, or "Unknown".
    pub location_type: String,
}

/// Flat CSV row for a coordinate bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinateRow {
    pub rank: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub fatalities: u64,
    pub incidents: usize,
    pub event_type: String,
    pub location_type: String,
}

impl CoordinateRow {
    pub fn from_ranked(buckets: &[Bucket<CoordinateKey>]) -> Vec<CoordinateRow> {
        buckets
            .iter()
            .enumerate()
            .map(|(i, b)| CoordinateRow {
                rank: i + 1,
                latitude: b.key.latitude(),
                longitude: b.key.longitude(),
                fatalities: b.fatalities,
                incidents: b.incidents,
                event_type: b.event_type.clone(),
                location_type: b.location_type.clone(),
            })
            .collect()
    }
}

/// Headline totals over the fatal incidents of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub incidents: usize,
    pub fatalities: u64,
    pub injuries: u64,
    pub first_date: Option<NaiveDateTime>,
    pub last_date: Option<NaiveDateTime>,
}
