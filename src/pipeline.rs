//! The shared fetch → filter → normalize → select pipeline.
//!
//! Every report runs the same stages; they differ only in the
//! [`NormalizeOptions`] they ask for and in the renderer that consumes the
//! result.

use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetch::{HttpClient, load_events};
use crate::filter::{filter_agency, select_fatal};
use crate::model::{RawEvent, SafetyEvent};
use crate::normalize::{NormalizeOptions, normalize_all};
use crate::stats::RunStats;

/// Keeps the records of the configured agencies.
///
/// # Errors
///
/// [`PipelineError::NoAgencyMatches`] when nothing matches.
pub fn match_agencies(
    events: Vec<RawEvent>,
    config: &PipelineConfig,
    stats: &mut RunStats,
) -> Result<Vec<RawEvent>, PipelineError> {
    stats.fetched = events.len();
    info!(keywords = ?config.agency_keywords, "Filtering for New York transit agencies");

    let matched = filter_agency(events, &config.agency_keywords);
    stats.agency_matches = matched.len();
    info!(count = matched.len(), "Found incidents for matching agencies");

    if matched.is_empty() {
        return Err(PipelineError::NoAgencyMatches {
            keywords: config.agency_keywords.clone(),
        });
    }
    Ok(matched)
}

/// Normalizes matched records and keeps the fatal ones.
///
/// # Errors
///
/// [`PipelineError::NoFatalIncidents`] when nothing survives.
pub fn fatal_events(
    matched: &[RawEvent],
    options: &NormalizeOptions,
    stats: &mut RunStats,
) -> Result<Vec<SafetyEvent>, PipelineError> {
    let normalized = normalize_all(matched, options, stats);
    if stats.dropped() > 0 {
        warn!(
            dropped = stats.dropped(),
            invalid_coordinates = stats.dropped_invalid_coordinates,
            out_of_range = stats.dropped_out_of_range,
            outside_bounds = stats.dropped_outside_bounds,
            missing_date = stats.dropped_missing_date,
            "Records dropped during normalization"
        );
    }

    let fatal = select_fatal(normalized);
    stats.record_fatal(&fatal);
    info!(
        fatal_incidents = stats.fatal_incidents,
        fatalities = stats.fatalities,
        "Fatal incidents with valid coordinates"
    );

    if fatal.is_empty() {
        return Err(PipelineError::NoFatalIncidents);
    }
    Ok(fatal)
}

/// Runs every stage over records that are already loaded.
pub fn process(
    events: Vec<RawEvent>,
    config: &PipelineConfig,
    options: &NormalizeOptions,
    stats: &mut RunStats,
) -> Result<Vec<SafetyEvent>, PipelineError> {
    let matched = match_agencies(events, config, stats)?;
    fatal_events(&matched, options, stats)
}

/// Loads the dataset and runs every stage.
#[tracing::instrument(skip_all, fields(source = %config.endpoint))]
pub async fn run<C: HttpClient>(
    client: &C,
    config: &PipelineConfig,
    options: &NormalizeOptions,
    stats: &mut RunStats,
) -> Result<Vec<SafetyEvent>, PipelineError> {
    let events = load_events(client, config).await?;
    process(events, config, options, stats)
}
