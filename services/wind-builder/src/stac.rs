//! STAC target-time discovery collaborator.
//!
//! Queries a STAC catalog for the most relevant observation timestamp in
//! a calendar-day window. Discovery is strictly best-effort: any
//! transport failure, unparsable payload or empty result falls back to a
//! fixed default time on the same date, with a warning.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// HTTP timeout for a catalog search.
const SEARCH_TIMEOUT: Duration = Duration::from_secs(60);

/// STAC search client bound to one catalog collection.
pub struct StacDiscovery {
    client: Client,
    endpoint: String,
    collection: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    datetime: Option<String>,
    #[serde(default)]
    properties: Option<FeatureProperties>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    datetime: Option<String>,
    #[serde(default)]
    start_datetime: Option<String>,
}

impl Feature {
    /// The feature's timestamp string, wherever the catalog put it.
    fn timestamp(&self) -> Option<&str> {
        self.datetime
            .as_deref()
            .or_else(|| self.properties.as_ref()?.datetime.as_deref())
            .or_else(|| self.properties.as_ref()?.start_datetime.as_deref())
    }
}

impl StacDiscovery {
    pub fn new(endpoint: String, collection: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(SEARCH_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for STAC discovery")?;
        Ok(Self {
            client,
            endpoint,
            collection,
        })
    }

    /// Observation timestamp for `date`, or `fallback` when discovery
    /// yields nothing usable.
    pub async fn discover(&self, date: NaiveDate, fallback: DateTime<Utc>) -> DateTime<Utc> {
        match self.search(date).await {
            Ok(Some(found)) => {
                debug!(%found, collection = %self.collection, "Discovered observation time");
                found
            }
            Ok(None) => {
                warn!(
                    %date,
                    collection = %self.collection,
                    "No observation in window, using default target time"
                );
                fallback
            }
            Err(e) => {
                warn!(
                    %date,
                    error = %e,
                    "STAC discovery failed, using default target time"
                );
                fallback
            }
        }
    }

    async fn search(&self, date: NaiveDate) -> Result<Option<DateTime<Utc>>> {
        let window_start = date
            .and_hms_opt(0, 0, 0)
            .context("invalid window start")?
            .and_utc();
        let window_end = window_start + chrono::Duration::days(1);

        let url = format!("{}/search", self.endpoint.trim_end_matches('/'));
        let payload = json!({
            "collections": [self.collection],
            "datetime": format!(
                "{}/{}",
                window_start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
                window_end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
            ),
            "limit": 10,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("search request to {url} failed"))?
            .error_for_status()
            .context("search returned an error status")?;

        let body: SearchResponse = response
            .json()
            .await
            .context("search response was not valid JSON")?;

        Ok(first_in_window(&body, window_start, window_end))
    }
}

/// First feature timestamp that parses and falls inside [start, end).
fn first_in_window(
    response: &SearchResponse,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    for feature in &response.features {
        let Some(raw) = feature.timestamp() else {
            continue;
        };
        let Ok(parsed) = DateTime::parse_from_rfc3339(raw) else {
            continue;
        };
        let utc = parsed.with_timezone(&Utc);
        if utc >= start && utc < end {
            return Some(utc);
        }
    }
    None
}
