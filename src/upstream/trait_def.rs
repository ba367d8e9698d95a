use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::analytics::MetricValue;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned HTTP {status}")]
    Status { status: u16, body: String },
    #[error("failed to decode upstream response: {message}")]
    Decode { message: String, body: String },
    #[error("invalid upstream base URL '{0}'")]
    InvalidBaseUrl(String),
}

impl UpstreamError {
    /// Raw upstream body, when the failure carried one
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } | Self::Decode { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_timeout())
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Parameters of an `aggregate` call over a custom period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRequest {
    pub site_id: String,
    /// `<start>,<end>`
    pub date: String,
    /// Comma-separated metric names
    pub metrics: String,
    /// `;`-joined `key==value` predicates
    pub filters: String,
}

/// Parameters of a `breakdown` call over a custom period
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakdownRequest {
    pub site_id: String,
    pub date: String,
    /// Dimension to group by, e.g. `visit:source`
    pub property: String,
    pub metrics: String,
    pub filters: String,
    pub limit: usize,
}

/// `results` object of an aggregate response
///
/// Only metrics that were requested are present; a metric without data
/// comes back as `{"value": null}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AggregateResults {
    #[serde(default)]
    pub pageviews: Option<MetricValue<Option<u64>>>,
    #[serde(default)]
    pub time_on_page: Option<MetricValue<Option<f64>>>,
}

impl AggregateResults {
    pub fn pageviews(&self) -> u64 {
        self.pageviews.and_then(|m| m.value).unwrap_or(0)
    }

    /// Time on page in seconds, 0 when absent or null
    pub fn time_on_page(&self) -> f64 {
        self.time_on_page
            .and_then(|m| m.value)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResultsEnvelope<T> {
    pub results: T,
}

/// Decode raw breakdown rows into a concrete row type.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> UpstreamResult<Vec<T>> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value::<T>(row.clone()).map_err(|e| UpstreamError::Decode {
                message: e.to_string(),
                body: row.to_string(),
            })
        })
        .collect()
}

#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Scalar totals for the requested metrics
    async fn aggregate(&self, request: &AggregateRequest) -> UpstreamResult<AggregateResults>;

    /// Ranked rows grouped by `request.property`, in upstream order
    async fn breakdown(&self, request: &BreakdownRequest) -> UpstreamResult<Vec<Value>>;
}
