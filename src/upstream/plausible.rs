use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::trait_def::{
    AggregateRequest, AggregateResults, BreakdownRequest, ResultsEnvelope, StatsProvider,
    UpstreamError, UpstreamResult,
};
use crate::config::UpstreamConfig;

/// Client for the Plausible Stats API (v1)
#[derive(Clone)]
pub struct PlausibleClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl PlausibleClient {
    pub fn from_config(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("pagestats/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Self::from_reqwest(&config.base_url, config.api_key.clone(), client)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, api_key: SecretString, client: Client) -> UpstreamResult<Self> {
        let parsed =
            Url::parse(base_url).map_err(|_| UpstreamError::InvalidBaseUrl(base_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UpstreamError::InvalidBaseUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> UpstreamResult<T> {
        let url = format!("{}/{endpoint}", self.base_url);
        debug!(%url, ?params, "requesting upstream stats");

        let response = self
            .client
            .get(&url)
            .bearer_auth(self.api_key.expose_secret())
            .query(params)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ResultsEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| UpstreamError::Decode {
                message: e.to_string(),
                body,
            })?;

        Ok(envelope.results)
    }
}

#[async_trait]
impl StatsProvider for PlausibleClient {
    async fn aggregate(&self, request: &AggregateRequest) -> UpstreamResult<AggregateResults> {
        let params = [
            ("site_id", request.site_id.clone()),
            ("period", "custom".to_string()),
            ("date", request.date.clone()),
            ("metrics", request.metrics.clone()),
            ("filters", request.filters.clone()),
        ];
        self.get("aggregate", &params).await
    }

    async fn breakdown(&self, request: &BreakdownRequest) -> UpstreamResult<Vec<Value>> {
        let params = [
            ("site_id", request.site_id.clone()),
            ("period", "custom".to_string()),
            ("date", request.date.clone()),
            ("property", request.property.clone()),
            ("metrics", request.metrics.clone()),
            ("filters", request.filters.clone()),
            ("limit", request.limit.to_string()),
        ];
        self.get("breakdown", &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SecretString {
        SecretString::from("test-key".to_string())
    }

    #[test]
    fn base_url_is_normalized() {
        let client =
            PlausibleClient::from_reqwest("https://plausible.io/api/v1/stats/", key(), Client::new())
                .unwrap();
        assert_eq!(client.base_url(), "https://plausible.io/api/v1/stats");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = PlausibleClient::from_reqwest("not a url", key(), Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, UpstreamError::InvalidBaseUrl(_)));

        let err = PlausibleClient::from_reqwest("ftp://example.com", key(), Client::new())
            .err()
            .unwrap();
        assert!(matches!(err, UpstreamError::InvalidBaseUrl(_)));
    }
}
