//! Fan-out/fan-in assembly of a page report
//!
//! A report is built from a fixed sequence of upstream calls:
//! page totals, the top traffic sources, one time-on-page lookup per
//! source, then the entry and exit page breakdowns. Any failure aborts
//! the whole report; partial results are never returned.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::analytics::models::{
    AggregateMetric, EntryPageEntry, ExitPageEntry, MetricValue, SourceBreakdownEntry,
    StatsQuery, StatsReport,
};
use crate::config::StatsConfig;
use crate::upstream::{
    decode_rows, AggregateRequest, BreakdownRequest, StatsProvider, UpstreamError,
    UpstreamResult,
};

const PAGE_METRICS: &str = "pageviews,time_on_page";
const SOURCE_METRICS: &str = "pageviews,visitors";
const TIME_ON_PAGE_METRIC: &str = "time_on_page";
const VISITORS_METRIC: &str = "visitors";

const SOURCE_PROPERTY: &str = "visit:source";
const ENTRY_PAGE_PROPERTY: &str = "visit:entry_page";
const EXIT_PAGE_PROPERTY: &str = "visit:exit_page";

/// Source row as returned by the breakdown endpoint, before time-on-page
/// is attached
#[derive(Debug, Deserialize)]
struct SourceRow {
    source: String,
    #[serde(default)]
    pageviews: u64,
    #[serde(default)]
    visitors: u64,
}

pub struct StatsAggregator {
    provider: Arc<dyn StatsProvider>,
    settings: StatsConfig,
}

impl StatsAggregator {
    pub fn new(provider: Arc<dyn StatsProvider>, settings: StatsConfig) -> Self {
        Self { provider, settings }
    }

    /// Build the combined report for one page over one date range.
    pub async fn build_report(&self, query: &StatsQuery) -> UpstreamResult<StatsReport> {
        let limit = self.settings.effective_limit();

        let page_specific = self.page_totals(query).await?;
        debug!(
            pageviews = page_specific.pageviews.value,
            "fetched page totals"
        );

        let rows = self.top_sources(query, limit).await?;
        debug!(sources = rows.len(), "fetched source breakdown");

        let sources = self.attach_time_on_page(query, rows).await?;

        let entry_pages: Vec<EntryPageEntry> =
            self.page_breakdown(query, ENTRY_PAGE_PROPERTY, limit).await?;
        let exit_pages: Vec<ExitPageEntry> =
            self.page_breakdown(query, EXIT_PAGE_PROPERTY, limit).await?;

        Ok(StatsReport {
            page_specific,
            sources,
            entry_pages,
            exit_pages,
        })
    }

    async fn page_totals(&self, query: &StatsQuery) -> UpstreamResult<AggregateMetric> {
        let results = self
            .provider
            .aggregate(&AggregateRequest {
                site_id: query.site_id.clone(),
                date: query.date_range(),
                metrics: PAGE_METRICS.to_string(),
                filters: query.page_filter(),
            })
            .await?;

        Ok(AggregateMetric {
            pageviews: MetricValue {
                value: results.pageviews(),
            },
            time_on_page: MetricValue {
                value: results.time_on_page(),
            },
        })
    }

    async fn top_sources(&self, query: &StatsQuery, limit: usize) -> UpstreamResult<Vec<SourceRow>> {
        let rows = self
            .provider
            .breakdown(&self.breakdown_request(query, SOURCE_PROPERTY, SOURCE_METRICS, limit))
            .await?;

        let mut rows: Vec<SourceRow> = decode_rows(rows)?;
        rows.truncate(limit);
        Ok(rows)
    }

    /// One aggregate lookup per source, at most `effective_concurrency()`
    /// in flight. Output order matches `rows`.
    async fn attach_time_on_page(
        &self,
        query: &StatsQuery,
        rows: Vec<SourceRow>,
    ) -> UpstreamResult<Vec<SourceBreakdownEntry>> {
        let concurrency = self.settings.effective_concurrency();

        stream::iter(rows)
            .map(|row| async move {
                let results = self
                    .provider
                    .aggregate(&AggregateRequest {
                        site_id: query.site_id.clone(),
                        date: query.date_range(),
                        metrics: TIME_ON_PAGE_METRIC.to_string(),
                        filters: query.source_filter(&row.source),
                    })
                    .await?;

                Ok::<_, UpstreamError>(SourceBreakdownEntry {
                    source: row.source,
                    pageviews: row.pageviews,
                    visitors: row.visitors,
                    time_on_page: results.time_on_page(),
                })
            })
            .buffered(concurrency)
            .try_collect()
            .await
    }

    async fn page_breakdown<T>(
        &self,
        query: &StatsQuery,
        property: &str,
        limit: usize,
    ) -> UpstreamResult<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let rows = self
            .provider
            .breakdown(&self.breakdown_request(query, property, VISITORS_METRIC, limit))
            .await?;

        let mut rows: Vec<T> = decode_rows(rows)?;
        rows.truncate(limit);
        Ok(rows)
    }

    fn breakdown_request(
        &self,
        query: &StatsQuery,
        property: &str,
        metrics: &str,
        limit: usize,
    ) -> BreakdownRequest {
        BreakdownRequest {
            site_id: query.site_id.clone(),
            date: query.date_range(),
            property: property.to_string(),
            metrics: metrics.to_string(),
            filters: query.page_filter(),
            limit,
        }
    }
}
