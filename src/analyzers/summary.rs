//! Whole-run figures: totals, single deadliest incidents, and the dataset
//! overview printed by the `summary` report.

use chrono::Datelike;
use serde::Serialize;

use crate::analyzers::types::Totals;
use crate::analyzers::utility::value_counts;
use crate::model::{RawEvent, SafetyEvent};
use crate::normalize::parse_incident_date;
use crate::schema::FIELDS;

/// Number of single incidents listed as the deadliest.
pub const TOP_INCIDENTS: usize = 10;

pub fn totals(events: &[SafetyEvent]) -> Totals {
    let dates = events.iter().filter_map(|e| e.incident_date);
    Totals {
        incidents: events.len(),
        fatalities: events.iter().map(|e| u64::from(e.total_fatalities)).sum(),
        injuries: events.iter().map(|e| u64::from(e.total_injuries)).sum(),
        first_date: dates.clone().min(),
        last_date: dates.max(),
    }
}

/// The `n` events with the most fatalities; equal counts keep input order.
pub fn deadliest_incidents(events: &[SafetyEvent], n: usize) -> Vec<&SafetyEvent> {
    let mut ranked: Vec<&SafetyEvent> = events.iter().collect();
    ranked.sort_by(|a, b| b.total_fatalities.cmp(&a.total_fatalities));
    ranked.truncate(n);
    ranked
}

/// Number of location types listed in the incident statistics.
pub const TOP_LOCATION_TYPES: usize = 5;

/// The `n` most common location types. Events without one are not counted.
pub fn location_type_counts(events: &[SafetyEvent], n: usize) -> Vec<(String, usize)> {
    let mut counts = value_counts(events.iter().filter_map(|e| e.location_type.as_deref()));
    counts.truncate(n);
    counts
}

/// Overview of the agency-matched records, before any coercion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub records: usize,
    /// `(field, missing)` for every schema field. Value counts below leave
    /// missing values out; they are only reported here.
    pub missing: Vec<(&'static str, usize)>,
    pub by_agency: Vec<(String, usize)>,
    pub by_event_type: Vec<(String, usize)>,
    pub by_location_type: Vec<(String, usize)>,
    pub by_city: Vec<(String, usize)>,
    /// Incidents per year, chronological. Unparseable dates are left out.
    pub by_year: Vec<(i32, usize)>,
    pub undated: usize,
}

impl DatasetSummary {
    pub const TOP_AGENCIES: usize = 20;
    pub const TOP_EVENT_TYPES: usize = 15;
    pub const TOP_LOCATIONS: usize = 20;

    pub fn from_events(events: &[RawEvent]) -> Self {
        let missing = FIELDS
            .iter()
            .map(|field| {
                let absent = events.iter().filter(|e| e.get(field).is_none()).count();
                (field.name, absent)
            })
            .collect();

        let mut years: Vec<(i32, usize)> = Vec::new();
        let mut undated = 0;
        for event in events {
            match event.incident_date.as_deref().and_then(parse_incident_date) {
                Some(date) => match years.iter_mut().find(|(y, _)| *y == date.year()) {
                    Some((_, count)) => *count += 1,
                    None => years.push((date.year(), 1)),
                },
                None => undated += 1,
            }
        }
        years.sort_by_key(|(year, _)| *year);

        DatasetSummary {
            records: events.len(),
            missing,
            by_agency: top_counts(events, |e| e.agency.as_deref(), Self::TOP_AGENCIES),
            by_event_type: top_counts(
                events,
                |e| e.event_type.as_deref(),
                Self::TOP_EVENT_TYPES,
            ),
            by_location_type: top_counts(
                events,
                |e| e.location_type.as_deref(),
                Self::TOP_LOCATIONS,
            ),
            by_city: top_counts(events, |e| e.city.as_deref(), Self::TOP_LOCATIONS),
            by_year: years,
            undated,
        }
    }
}

fn top_counts<'a>(
    events: &'a [RawEvent],
    label: impl Fn(&'a RawEvent) -> Option<&'a str>,
    limit: usize,
) -> Vec<(String, usize)> {
    let mut counts = value_counts(events.iter().filter_map(label));
    counts.truncate(limit);
    counts
}
