use std::fmt;

use crate::analytics::StatsReport;

use super::client::ReportRequest;

/// Format a duration in seconds as `m:ss`.
///
/// Fractional seconds are rounded; negative or non-finite input is
/// treated as zero. Minutes are not padded.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Plain-text view of a report, one section per breakdown
pub struct ReportView<'a> {
    pub request: &'a ReportRequest,
    pub report: &'a StatsReport,
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (request, report) = (self.request, self.report);

        writeln!(f, "Health Check: {} ({})", request.page_url, request.site_id)?;
        writeln!(f, "{} to {}", request.start_date, request.end_date)?;
        writeln!(f)?;
        writeln!(f, "Total Views: {}", report.page_specific.pageviews.value)?;
        writeln!(
            f,
            "Avg Time on Page: {}",
            format_time(report.page_specific.time_on_page.value)
        )?;

        write_section(f, "Top Traffic Sources", &report.sources, |f, source| {
            writeln!(
                f,
                "  - {}: {} visitors, {} average time on page",
                source.source,
                source.visitors,
                format_time(source.time_on_page)
            )
        })?;
        write_section(f, "Entry Pages", &report.entry_pages, |f, entry| {
            writeln!(f, "  - {}: {} unique entrances", entry.entry_page, entry.visitors)
        })?;
        write_section(f, "Exit Pages", &report.exit_pages, |f, exit| {
            writeln!(f, "  - {}: {} unique exits", exit.exit_page, exit.visitors)
        })
    }
}

fn write_section<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    rows: &[T],
    mut line: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(f)?;
    writeln!(f, "{title}:")?;
    if rows.is_empty() {
        return writeln!(f, "  (none)");
    }
    for row in rows {
        line(f, row)?;
    }
    Ok(())
}

/// Render a report as plain text.
pub fn render_report(request: &ReportRequest, report: &StatsReport) -> String {
    ReportView { request, report }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AggregateMetric, EntryPageEntry, MetricValue, SourceBreakdownEntry};

    #[test]
    fn format_time_pads_seconds_only() {
        assert_eq!(format_time(125.0), "2:05");
        assert_eq!(format_time(59.0), "0:59");
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(600.0), "10:00");
    }

    #[test]
    fn format_time_rounds_and_clamps() {
        assert_eq!(format_time(64.6), "1:05");
        assert_eq!(format_time(-3.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn report_lists_every_section() {
        let request = ReportRequest {
            site_id: "example.com".into(),
            start_date: "2024-05-01".into(),
            end_date: "2024-05-14".into(),
            page_url: "/blog/".into(),
        };

        let report = StatsReport {
            page_specific: AggregateMetric {
                pageviews: MetricValue { value: 1200 },
                time_on_page: MetricValue { value: 125.0 },
            },
            sources: vec![SourceBreakdownEntry {
                source: "Google".into(),
                pageviews: 900,
                visitors: 700,
                time_on_page: 59.0,
            }],
            entry_pages: vec![EntryPageEntry {
                entry_page: "/".into(),
                visitors: 40,
            }],
            exit_pages: vec![],
        };

        let text = render_report(&request, &report);

        assert!(text.starts_with("Health Check: /blog/ (example.com)\n2024-05-01 to 2024-05-14\n"));
        assert!(text.contains("Total Views: 1200"));
        assert!(text.contains("Avg Time on Page: 2:05"));
        assert!(text.contains("  - Google: 700 visitors, 0:59 average time on page"));
        assert!(text.contains("  - /: 40 unique entrances"));
        assert!(text.contains("Exit Pages:\n  (none)"));
    }
}
