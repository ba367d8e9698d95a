//! Page statistics module
//!
//! Query validation, the report data model, and the aggregator that
//! assembles a report from upstream aggregate and breakdown calls.

pub mod aggregator;
pub mod models;

pub use aggregator::StatsAggregator;
pub use models::{
    AggregateMetric, EntryPageEntry, ExitPageEntry, MetricValue, QueryError,
    SourceBreakdownEntry, StatsQuery, StatsQueryParams, StatsReport,
};
