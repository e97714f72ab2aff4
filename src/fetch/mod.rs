//! Dataset retrieval: one GET against the Socrata endpoint, or a read of a
//! local JSON file with the same shape.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model::RawEvent;
use crate::parser::parse_events;

/// Fetches `url` and returns the response body.
///
/// # Errors
///
/// Fails on an unparseable URL, a transport error, or a non-success status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>, PipelineError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| PipelineError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PipelineError::Status {
            url: url.to_string(),
            status,
        });
    }

    Ok(resp.bytes().await?.to_vec())
}

/// Appends the Socrata `$limit` parameter to the endpoint.
pub fn dataset_url(endpoint: &str, limit: u64) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{endpoint}{separator}$limit={limit}")
}

/// Loads and parses every record from the configured source.
#[tracing::instrument(skip(client, config), fields(source = %config.endpoint, limit = config.limit))]
pub async fn load_events<C: HttpClient>(
    client: &C,
    config: &PipelineConfig,
) -> Result<Vec<RawEvent>, PipelineError> {
    let bytes = if config.is_remote() {
        let url = dataset_url(&config.endpoint, config.limit);
        info!(url = %url, "Downloading FTA Major Safety Events data");
        fetch_bytes(client, &url).await?
    } else {
        info!("Reading safety events from local file");
        tokio::fs::read(&config.endpoint).await?
    };
    debug!(bytes = bytes.len(), "Dataset received, parsing");

    let events = parse_events(&bytes)?;
    info!(count = events.len(), "Loaded safety events");
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_url_appends_limit() {
        assert_eq!(
            dataset_url("https://data.transportation.gov/resource/9ivb-8ae9.json", 50_000),
            "https://data.transportation.gov/resource/9ivb-8ae9.json?$limit=50000"
        );
    }

    #[test]
    fn test_dataset_url_extends_existing_query() {
        assert_eq!(
            dataset_url("https://example.org/x.json?$order=incident_date", 10),
            "https://example.org/x.json?$order=incident_date&$limit=10"
        );
    }

    #[tokio::test]
    async fn test_fetch_bytes_rejects_bad_url() {
        let client = BasicClient::new();
        let result = fetch_bytes(&client, "not a url").await;
        assert!(matches!(result, Err(PipelineError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_load_events_from_local_file() {
        let path = std::env::temp_dir().join("fta_fatalities_test_load.json");
        std::fs::write(&path, r#"[{ "agency": "MTA", "latitude": "40.75" }]"#).unwrap();

        let config = PipelineConfig {
            endpoint: path.display().to_string(),
            ..Default::default()
        };
        let events = load_events(&BasicClient::new(), &config).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].latitude.as_deref(), Some("40.75"));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_load_events_missing_file() {
        let config = PipelineConfig {
            endpoint: "/nonexistent/fta_events.json".to_string(),
            ..Default::default()
        };
        let result = load_events(&BasicClient::new(), &config).await;
        assert!(matches!(result, Err(PipelineError::Io(_))));
    }
}
