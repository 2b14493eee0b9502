use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    model::CityCandidate,
    provider::{MAX_CANDIDATES, truncate_body},
};

use super::GeocodingProvider;

#[derive(Debug, Clone)]
pub struct GeoNamesProvider {
    username: String,
    base_url: String,
    http: Client,
}

impl GeoNamesProvider {
    pub fn new(username: String, base_url: String, http: Client) -> Self {
        Self {
            username,
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Status and body of one search call. Errors carry no URL, since the query
    /// string holds the account name.
    async fn fetch(&self, query: &str) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
        let url = format!("{}/searchJSON", self.base_url);
        let max_rows = MAX_CANDIDATES.to_string();

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", query),
                ("maxRows", max_rows.as_str()),
                ("username", self.username.as_str()),
            ])
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        let status = res.status();
        let body = res.text().await.map_err(reqwest::Error::without_url)?;
        Ok((status, body))
    }
}

#[derive(Debug, Deserialize)]
struct GnEntry {
    name: String,
    #[serde(rename = "countryName", default)]
    country_name: String,
}

/// GeoNames reports account problems (unknown user, exhausted credits) with a
/// 200 status and this object instead of results.
#[derive(Debug, Deserialize)]
struct GnStatus {
    #[serde(default)]
    message: String,
    value: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct GnSearchResponse {
    #[serde(default)]
    geonames: Vec<GnEntry>,
    status: Option<GnStatus>,
}

/// Candidates from a success-status body, or why the body carries none worth
/// warning about.
fn parse_candidates(body: &str) -> Result<Vec<CityCandidate>, String> {
    let parsed: GnSearchResponse = serde_json::from_str(body).map_err(|e| {
        format!(
            "failed to parse search JSON: {e}; body: {}",
            truncate_body(body)
        )
    })?;

    if let Some(status) = parsed.status {
        return Err(match status.value {
            Some(code) => format!("service error {code}: {}", status.message),
            None => format!("service error: {}", status.message),
        });
    }

    Ok(parsed
        .geonames
        .into_iter()
        .take(MAX_CANDIDATES)
        .map(|e| CityCandidate {
            name: e.name,
            country_name: e.country_name,
        })
        .collect())
}

#[async_trait]
impl GeocodingProvider for GeoNamesProvider {
    async fn search(&self, query: &str) -> Vec<CityCandidate> {
        let (status, body) = match self.fetch(query).await {
            Ok(res) => res,
            Err(e) => {
                tracing::warn!("GeoNames request for {query:?} failed: {e}");
                return Vec::new();
            }
        };

        if !status.is_success() {
            tracing::debug!(
                "GeoNames returned status {status} for {query:?}: {}",
                truncate_body(&body)
            );
            return Vec::new();
        }

        match parse_candidates(&body) {
            Ok(candidates) => {
                tracing::debug!(
                    "GeoNames returned {} candidate(s) for {query:?}",
                    candidates.len()
                );
                candidates
            }
            Err(reason) => {
                tracing::warn!("GeoNames search for {query:?} yielded nothing: {reason}");
                Vec::new()
            }
        }
    }
}
