use crate::campaign::EndpointRun;
use crate::stats::EndpointSummary;

use super::{CampaignReport, format_ms};

const ABSENT: &str = "-";

const LEGEND: [&str; 4] = [
    "All times are in milliseconds.",
    "  TTFB: time to first byte, from sending the request to the first response byte.",
    "  CDN: TTFB minus the origin time reported by x-source-response-time (network + edge).",
    "  Origin: mean of x-source-response-time, the origin's own processing time.",
];

/// Minimal boxed text table.
struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(header: &[&str]) -> Self {
        Self {
            header: header.iter().map(|cell| (*cell).to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.header.iter().map(|cell| cell.chars().count()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }
        widths
    }

    fn render(&self) -> String {
        let widths = self.widths();
        let border = widths
            .iter()
            .map(|width| "-".repeat(width.saturating_add(2)))
            .collect::<Vec<_>>()
            .join("+");
        let border = format!("+{}+", border);

        let mut lines = vec![border.clone(), render_row(&self.header, &widths), border.clone()];
        lines.extend(self.rows.iter().map(|row| render_row(row, &widths)));
        lines.push(border);
        lines.join("\n")
    }
}

fn render_row(cells: &[String], widths: &[usize]) -> String {
    let cells = widths
        .iter()
        .enumerate()
        .map(|(pos, width)| {
            let cell = cells.get(pos).map_or("", String::as_str);
            let pad = width.saturating_sub(cell.chars().count());
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("|");
    format!("|{}|", cells)
}

fn optional_ms(value: Option<f64>) -> String {
    value.map_or_else(|| ABSENT.to_owned(), format_ms)
}

/// Per-round table for one endpoint.
#[must_use]
pub fn render_detail_table(run: &EndpointRun) -> String {
    let mut table = Table::new(&[
        "#",
        "Status",
        "Reused",
        "TTFB(ms)",
        "Origin(ms)",
        "CDN(ms)",
        "Protocol",
        "Error",
    ]);
    for sample in &run.samples {
        if let Some(err) = sample.error.as_deref() {
            table.push(vec![
                sample.index.to_string(),
                ABSENT.to_owned(),
                ABSENT.to_owned(),
                ABSENT.to_owned(),
                ABSENT.to_owned(),
                ABSENT.to_owned(),
                ABSENT.to_owned(),
                err.to_owned(),
            ]);
            continue;
        }
        let cdn = sample.origin_ms.map(|_| sample.cdn_latency_ms);
        table.push(vec![
            sample.index.to_string(),
            sample.status_code.to_string(),
            (if sample.reused { "Yes" } else { "No" }).to_owned(),
            format_ms(sample.ttfb_ms()),
            optional_ms(sample.origin_ms),
            optional_ms(cdn),
            sample.actual_protocol.clone(),
            String::new(),
        ]);
    }
    format!(
        "{} ({} @ {}) details:\n{}",
        run.endpoint.name,
        run.endpoint.protocol,
        run.endpoint.ip,
        table.render()
    )
}

/// Side-by-side comparison of every endpoint, followed by the legend.
#[must_use]
pub fn render_summary_table(summaries: &[EndpointSummary]) -> String {
    let mut table = Table::new(&[
        "Endpoint",
        "Protocol",
        "OK/Total",
        "TTFB avg",
        "TTFB P50",
        "TTFB P90",
        "TTFB P99",
        "TTFB min",
        "TTFB max",
        "CDN avg",
        "CDN P50",
        "CDN P90",
        "CDN P99",
        "Origin avg",
    ]);
    for summary in summaries {
        let cdn = summary.cdn();
        table.push(vec![
            summary.endpoint_name.clone(),
            summary.protocol.to_string(),
            format!("{}/{}", summary.success, summary.total),
            format_ms(summary.ttfb.mean),
            format_ms(summary.ttfb.p50),
            format_ms(summary.ttfb.p90),
            format_ms(summary.ttfb.p99),
            format_ms(summary.ttfb.min),
            format_ms(summary.ttfb.max),
            optional_ms(cdn.map(|dist| dist.mean)),
            optional_ms(cdn.map(|dist| dist.p50)),
            optional_ms(cdn.map(|dist| dist.p90)),
            optional_ms(cdn.map(|dist| dist.p99)),
            optional_ms(summary.origin_avg()),
        ]);
    }
    format!("Summary:\n{}\n\n{}", table.render(), LEGEND.join("\n"))
}

/// Prints every detail table and the summary to stdout.
pub fn print_console_report(report: &CampaignReport) {
    for run in &report.runs {
        println!();
        println!("{}", render_detail_table(run));
    }
    if !report.summaries.is_empty() {
        println!();
        println!("{}", render_summary_table(&report.summaries));
    }
}
