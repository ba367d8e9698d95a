//! Data models for page statistics

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Date format accepted for `startDate` / `endDate` (ISO `YYYY-MM-DD`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

const FILTER_SEPARATORS: [char; 2] = [';', '|'];

/// Raw query parameters of `GET /api/stats`
///
/// Every field is optional at the wire level so that a missing parameter
/// is reported as an invalid request instead of an extractor rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQueryParams {
    pub site_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page_url: Option<String>,
}

/// A validated stats query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub site_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub page_url: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("{0}")]
    Malformed(String),
    #[error("missing required parameter(s): {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("{field} must be a date in YYYY-MM-DD format, got '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("startDate {start} is after endDate {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("{field} must not contain '{separator}'")]
    FilterSeparator {
        field: &'static str,
        separator: char,
    },
}

impl StatsQueryParams {
    /// Validate presence, date format and ordering.
    pub fn validate(&self) -> Result<StatsQuery, QueryError> {
        let present = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let site_id = present(&self.site_id);
        let start_date = present(&self.start_date);
        let end_date = present(&self.end_date);
        let page_url = present(&self.page_url);

        let mut missing = Vec::new();
        if site_id.is_none() {
            missing.push("siteId");
        }
        if start_date.is_none() {
            missing.push("startDate");
        }
        if end_date.is_none() {
            missing.push("endDate");
        }
        if page_url.is_none() {
            missing.push("pageUrl");
        }

        let (Some(site_id), Some(start_date), Some(end_date), Some(page_url)) =
            (site_id, start_date, end_date, page_url)
        else {
            return Err(QueryError::Missing(missing));
        };

        let start = parse_date("startDate", &start_date)?;
        let end = parse_date("endDate", &end_date)?;
        if start > end {
            return Err(QueryError::InvertedRange { start, end });
        }

        check_filter_value("siteId", &site_id)?;
        check_filter_value("pageUrl", &page_url)?;

        Ok(StatsQuery {
            site_id,
            start_date: start,
            end_date: end,
            page_url,
        })
    }
}

/// `;` joins filter predicates upstream and `|` ORs values within one
fn check_filter_value(field: &'static str, value: &str) -> Result<(), QueryError> {
    match value.chars().find(|c| FILTER_SEPARATORS.contains(c)) {
        Some(separator) => Err(QueryError::FilterSeparator { field, separator }),
        None => Ok(()),
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, QueryError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| QueryError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

impl StatsQuery {
    /// Upstream `date` parameter for a custom period
    pub fn date_range(&self) -> String {
        format!(
            "{},{}",
            self.start_date.format(DATE_FORMAT),
            self.end_date.format(DATE_FORMAT)
        )
    }

    /// Filter restricting results to the queried page
    pub fn page_filter(&self) -> String {
        format!("event:page=={}", self.page_url)
    }

    /// Page filter narrowed to a single traffic source
    ///
    /// Source names come from the upstream, so a literal `|` is escaped
    /// rather than rejected.
    pub fn source_filter(&self, source: &str) -> String {
        format!(
            "{};visit:source=={}",
            self.page_filter(),
            source.replace('|', "\\|")
        )
    }
}

/// A single scalar metric as reported by the aggregate endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricValue<T> {
    pub value: T,
}

/// Page-level totals over the date range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetric {
    pub pageviews: MetricValue<u64>,
    /// Seconds
    pub time_on_page: MetricValue<f64>,
}

/// One traffic-source row of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdownEntry {
    pub source: String,
    pub pageviews: u64,
    pub visitors: u64,
    /// Seconds, 0 when the source has no time-on-page data
    pub time_on_page: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPageEntry {
    pub entry_page: String,
    pub visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitPageEntry {
    pub exit_page: String,
    pub visitors: u64,
}

/// Combined response of `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub page_specific: AggregateMetric,
    pub sources: Vec<SourceBreakdownEntry>,
    pub entry_pages: Vec<EntryPageEntry>,
    pub exit_pages: Vec<ExitPageEntry>,
}
