use std::time::Duration;

use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::analytics::StatsReport;
use crate::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Please fill in all fields (missing: {})", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid server URL '{0}'")]
    InvalidServerUrl(String),
    #[error("request to stats server failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("stats server returned HTTP {status}: {message}")]
    Server { status: u16, message: String },
    #[error("unexpected response from stats server: {0}")]
    Decode(String),
}

/// Form input as the user supplied it; any field may be missing.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub site_id: Option<String>,
    pub page_url: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// A complete report request, serialized as the stats query string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub site_id: String,
    pub start_date: String,
    pub end_date: String,
    pub page_url: String,
}

impl ReportInput {
    /// Presence check only; format errors are left to the server.
    pub fn validate(self) -> Result<ReportRequest, ClientError> {
        let filled = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let page_url = filled(self.page_url);
        let start_date = filled(self.start_date);
        let end_date = filled(self.end_date);
        let site_id = filled(self.site_id);

        match (site_id, start_date, end_date, page_url) {
            (Some(site_id), Some(start_date), Some(end_date), Some(page_url)) => {
                Ok(ReportRequest {
                    site_id,
                    start_date,
                    end_date,
                    page_url,
                })
            }
            (site_id, start_date, end_date, page_url) => {
                let missing = [
                    ("siteId", site_id.is_none()),
                    ("startDate", start_date.is_none()),
                    ("endDate", end_date.is_none()),
                    ("pageUrl", page_url.is_none()),
                ]
                .into_iter()
                .filter_map(|(name, absent)| absent.then_some(name))
                .collect();
                Err(ClientError::MissingFields(missing))
            }
        }
    }
}

/// HTTP client for `GET /api/stats`
#[derive(Clone)]
pub struct StatsClient {
    client: Client,
    stats_url: Url,
}

impl StatsClient {
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(concat!("pagestats-report/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Self::from_reqwest(server_url, client)
    }

    pub fn from_reqwest(server_url: &str, client: Client) -> Result<Self, ClientError> {
        let invalid = || ClientError::InvalidServerUrl(server_url.to_string());

        // Trailing slash so a path prefix on the server URL is kept by `join`
        let base = Url::parse(&format!("{}/", server_url.trim_end_matches('/')))
            .map_err(|_| invalid())?;
        if base.cannot_be_a_base() {
            return Err(invalid());
        }
        let stats_url = base.join("api/stats").map_err(|_| invalid())?;

        Ok(Self { client, stats_url })
    }

    pub async fn fetch(&self, request: &ReportRequest) -> Result<StatsReport, ClientError> {
        debug!(url = %self.stats_url, ?request, "requesting stats report");

        let response = self
            .client
            .get(self.stats_url.clone())
            .query(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ClientError::Server {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Validate `input`, then fetch the report. No request is sent when a
/// field is missing.
pub async fn request_report(
    client: &StatsClient,
    input: ReportInput,
) -> Result<(ReportRequest, StatsReport), ClientError> {
    let request = input.validate()?;
    let report = client.fetch(&request).await?;
    Ok((request, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_named_in_order() {
        let input = ReportInput {
            site_id: Some("example.com".into()),
            page_url: Some(" ".into()),
            start_date: None,
            end_date: Some("2024-05-14".into()),
        };

        let err = input.validate().unwrap_err();
        assert!(matches!(
            &err,
            ClientError::MissingFields(fields) if fields == &["startDate", "pageUrl"]
        ));
        assert_eq!(
            err.to_string(),
            "Please fill in all fields (missing: startDate, pageUrl)"
        );
    }

    #[test]
    fn dates_are_not_checked_client_side() {
        let request = ReportInput {
            site_id: Some("example.com".into()),
            page_url: Some("/blog/".into()),
            start_date: Some("yesterday".into()),
            end_date: Some("today".into()),
        }
        .validate()
        .unwrap();
        assert_eq!(request.start_date, "yesterday");
    }

    #[test]
    fn stats_url_is_derived_from_server_url() {
        let client = StatsClient::from_reqwest("http://localhost:5000/", Client::new()).unwrap();
        assert_eq!(client.stats_url.as_str(), "http://localhost:5000/api/stats");

        assert!(matches!(
            StatsClient::from_reqwest("localhost", Client::new()),
            Err(ClientError::InvalidServerUrl(_))
        ));
    }

    #[test]
    fn server_path_prefix_is_kept() {
        let client =
            StatsClient::from_reqwest("http://host/stats-proxy", Client::new()).unwrap();
        assert_eq!(client.stats_url.as_str(), "http://host/stats-proxy/api/stats");

        let client =
            StatsClient::from_reqwest("http://host/stats-proxy/", Client::new()).unwrap();
        assert_eq!(client.stats_url.as_str(), "http://host/stats-proxy/api/stats");
    }
}
