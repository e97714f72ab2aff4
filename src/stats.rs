use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::SafetyEvent;
use crate::normalize::DropReason;

/// Counters for one pipeline run, one CSV row per run in the run log.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunStats {
    pub timestamp: DateTime<Utc>,
    pub report: Option<String>,
    pub source: Option<String>,

    // stage counts
    pub fetched: usize,
    pub agency_matches: usize,
    pub normalized: usize,
    pub fatal_incidents: usize,
    pub fatalities: u64,
    pub injuries: u64,

    // normalizer drops
    pub dropped_invalid_coordinates: usize,
    pub dropped_out_of_range: usize,
    pub dropped_outside_bounds: usize,
    pub dropped_missing_date: usize,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            timestamp: Utc::now(),
            ..Default::default()
        }
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::InvalidCoordinates => self.dropped_invalid_coordinates += 1,
            DropReason::OutOfRange => self.dropped_out_of_range += 1,
            DropReason::OutsideBounds => self.dropped_outside_bounds += 1,
            DropReason::MissingDate => self.dropped_missing_date += 1,
        }
    }

    pub fn dropped(&self) -> usize {
        self.dropped_invalid_coordinates
            + self.dropped_out_of_range
            + self.dropped_outside_bounds
            + self.dropped_missing_date
    }

    /// Records the fatal events that reached the reporter.
    pub fn record_fatal(&mut self, events: &[SafetyEvent]) {
        self.fatal_incidents = events.len();
        self.fatalities = events.iter().map(|e| u64::from(e.total_fatalities)).sum();
        self.injuries = events.iter().map(|e| u64::from(e.total_injuries)).sum();
    }

    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    /// Share of agency-matched rows that survived as fatal incidents.
    pub fn fatal_pct(&self) -> f64 {
        Self::pct(self.fatal_incidents, self.agency_matches)
    }

    /// Attach error information to the run.
    pub fn with_error(mut self, error_type: &str, error_message: &str) -> Self {
        self.error_type = Some(error_type.to_string());
        self.error_message = Some(error_message.to_string());
        self
    }

    /// Set run metadata (report name and data source)
    pub fn with_run_info(mut self, report: &str, source: &str) -> Self {
        self.report = Some(report.to_string());
        self.source = Some(source.to_string());
        self
    }
}
