//! Report client for the stats API
//!
//! Collects a page URL and date range, asks a running `pagestats` server
//! for the combined report, and renders it as text.

pub mod client;
pub mod render;

pub use client::{request_report, ClientError, ReportInput, ReportRequest, StatsClient};
pub use render::{format_time, render_report, ReportView};
