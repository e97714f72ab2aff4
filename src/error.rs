//! Error type shared by the fetch and filtering stages.

use thiserror::Error;

/// Errors that abort a pipeline run.
///
/// Per-row coercion failures never show up here; the normalizer drops those
/// rows and counts them in [`RunStats`](crate::stats::RunStats).
#[derive(Debug, Error)]
pub enum PipelineError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("{url} returned status {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// Status code returned by the server.
        status: reqwest::StatusCode,
    },

    /// The source string is neither a valid URL nor usable as a path.
    #[error("invalid source URL '{url}': {message}")]
    InvalidUrl {
        /// The offending source.
        url: String,
        /// Parser message.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (local source file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No record's agency matched the configured keywords.
    #[error("no records matched agency keywords {keywords:?}")]
    NoAgencyMatches {
        /// Keywords that were tried.
        keywords: Vec<String>,
    },

    /// Every matched record was dropped before reaching the reporter.
    #[error("no fatal incidents with valid coordinates remain after filtering")]
    NoFatalIncidents,
}

impl PipelineError {
    /// Returns `true` for the conditions that end a run gracefully rather
    /// than as a failure.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            PipelineError::NoAgencyMatches { .. } | PipelineError::NoFatalIncidents
        )
    }

    /// Short machine-friendly label, used as `error_type` in run stats.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Http(_) | PipelineError::Status { .. } => "fetch_error",
            PipelineError::InvalidUrl { .. } => "invalid_source",
            PipelineError::Json(_) => "parse_error",
            PipelineError::Io(_) => "io_error",
            PipelineError::NoAgencyMatches { .. } => "no_agency_matches",
            PipelineError::NoFatalIncidents => "no_fatal_incidents",
        }
    }
}
