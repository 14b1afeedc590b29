use std::path::{Path, PathBuf};

use crate::campaign::EndpointRun;
use crate::domain::duration_ms;
use crate::error::AppResult;
use crate::stats::EndpointSummary;

use super::{
    CampaignReport, DISPLAY_TIMESTAMP_FORMAT, format_ms, report_path, write_report_file,
};

const STYLE: &str = r"
body { font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; margin: 2rem; color: #1f2933; background: #f5f7fa; }
h1 { margin-bottom: 0.25rem; }
h2 { margin-top: 2rem; border-bottom: 2px solid #d9e2ec; padding-bottom: 0.25rem; }
.meta { color: #52606d; margin-bottom: 1.5rem; }
table { border-collapse: collapse; width: 100%; margin: 0.75rem 0 1.5rem; background: #fff; }
th, td { border: 1px solid #d9e2ec; padding: 0.4rem 0.6rem; text-align: right; font-variant-numeric: tabular-nums; }
th { background: #334e68; color: #fff; }
td.name, th.name { text-align: left; }
tr.failed td { background: #fff5f5; color: #c53030; }
.fast { color: #2f855a; font-weight: 600; }
.ok { color: #2b6cb0; }
.slow { color: #c05621; }
.very-slow { color: #c53030; font-weight: 600; }
.legend { color: #52606d; font-size: 0.9rem; }
";

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const fn ttfb_class(ms: f64) -> &'static str {
    if ms < 100.0 {
        "fast"
    } else if ms < 300.0 {
        "ok"
    } else if ms < 500.0 {
        "slow"
    } else {
        "very-slow"
    }
}

const fn cdn_class(ms: f64) -> &'static str {
    if ms < 50.0 {
        "fast"
    } else if ms < 150.0 {
        "ok"
    } else if ms < 300.0 {
        "slow"
    } else {
        "very-slow"
    }
}

fn ms_cell(value: f64, class: &str) -> String {
    format!("<td class=\"{}\">{}</td>", class, format_ms(value))
}

fn optional_cell(value: Option<f64>, class: fn(f64) -> &'static str) -> String {
    value.map_or_else(|| "<td>-</td>".to_owned(), |ms| ms_cell(ms, class(ms)))
}

fn summary_row(summary: &EndpointSummary) -> String {
    let cdn = summary.cdn();
    let cells = [
        format!("<td class=\"name\">{}</td>", html_escape(&summary.endpoint_name)),
        format!("<td>{}/{}</td>", summary.success, summary.total),
        ms_cell(summary.ttfb.mean, ttfb_class(summary.ttfb.mean)),
        ms_cell(summary.ttfb.p50, ttfb_class(summary.ttfb.p50)),
        ms_cell(summary.ttfb.p90, ttfb_class(summary.ttfb.p90)),
        ms_cell(summary.ttfb.p99, ttfb_class(summary.ttfb.p99)),
        ms_cell(summary.ttfb.min, ttfb_class(summary.ttfb.min)),
        ms_cell(summary.ttfb.max, ttfb_class(summary.ttfb.max)),
        optional_cell(cdn.map(|dist| dist.mean), cdn_class),
        optional_cell(cdn.map(|dist| dist.p50), cdn_class),
        optional_cell(cdn.map(|dist| dist.p90), cdn_class),
        optional_cell(cdn.map(|dist| dist.p99), cdn_class),
        optional_cell(summary.origin_avg(), |_| ""),
    ];
    format!("<tr>{}</tr>", cells.concat())
}

fn summary_section(report: &CampaignReport) -> String {
    report
        .protocol_groups()
        .into_iter()
        .map(|(protocol, group)| {
            let rows = group
                .into_iter()
                .map(summary_row)
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                r#"<h3>{protocol}</h3>
<table>
  <thead>
    <tr>
      <th class="name">Endpoint</th><th>OK/Total</th>
      <th>TTFB avg</th><th>TTFB P50</th><th>TTFB P90</th><th>TTFB P99</th><th>TTFB min</th><th>TTFB max</th>
      <th>CDN avg</th><th>CDN P50</th><th>CDN P90</th><th>CDN P99</th><th>Origin avg</th>
    </tr>
  </thead>
  <tbody>
{rows}
  </tbody>
</table>"#,
                protocol = protocol,
                rows = rows,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn detail_section(run: &EndpointRun) -> String {
    let rows = run
        .samples
        .iter()
        .map(|sample| {
            if let Some(err) = sample.error.as_deref() {
                return format!(
                    "<tr class=\"failed\"><td>{}</td><td colspan=\"6\"></td><td class=\"name\">{}</td></tr>",
                    sample.index,
                    html_escape(err)
                );
            }
            let ttfb = duration_ms(sample.ttfb);
            let cdn = sample.origin_ms.map(|_| sample.cdn_latency_ms);
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td>{}{}{}<td>{}</td><td></td></tr>",
                sample.index,
                sample.status_code,
                if sample.reused { "Yes" } else { "No" },
                ms_cell(ttfb, ttfb_class(ttfb)),
                optional_cell(sample.origin_ms, |_| ""),
                optional_cell(cdn, cdn_class),
                html_escape(&sample.actual_protocol),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"<h3>{label} <small>{ip}</small></h3>
<table>
  <thead>
    <tr>
      <th>#</th><th>Status</th><th>Reused</th><th>TTFB (ms)</th><th>Origin (ms)</th><th>CDN (ms)</th><th>Protocol</th><th class="name">Error</th>
    </tr>
  </thead>
  <tbody>
{rows}
  </tbody>
</table>"#,
        label = html_escape(&run.endpoint.label()),
        ip = html_escape(&run.endpoint.ip),
        rows = rows,
    )
}

/// Self-contained HTML page for a finished campaign.
#[must_use]
pub fn render_html(report: &CampaignReport) -> String {
    let details = report
        .runs
        .iter()
        .map(detail_section)
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>edgeprobe report: {domain}</title>
<style>{style}</style>
</head>
<body>
<h1>CDN latency report</h1>
<div class="meta">
  <div>Target: https://{domain}{path}</div>
  <div>Rounds: {rounds} &bull; Endpoints: {endpoints}</div>
  <div>Started: {started} &bull; Finished: {finished} &bull; Duration: {duration}s</div>
</div>

<h2>Summary</h2>
{summary}
<p class="legend">All times in milliseconds. TTFB: request sent to first response byte.
CDN: TTFB minus the origin time from x-source-response-time. Origin: the origin's own processing time.</p>

<h2>Details</h2>
{details}

<footer class="legend">Generated by edgeprobe &bull; {finished}</footer>
</body>
</html>
"#,
        domain = html_escape(&report.domain),
        path = html_escape(&report.path),
        style = STYLE,
        rounds = report.test_count,
        endpoints = report.endpoints.len(),
        started = report.started_at.format(DISPLAY_TIMESTAMP_FORMAT),
        finished = report.finished_at.format(DISPLAY_TIMESTAMP_FORMAT),
        duration = format!("{:.2}", report.duration().as_secs_f64()),
        summary = summary_section(report),
        details = details,
    )
}

/// Writes `<output_dir>/reports/<stamp>.html` and returns its path.
///
/// # Errors
///
/// Returns an error when the report directory or file cannot be written.
pub async fn write_html_report(report: &CampaignReport, output_dir: &Path) -> AppResult<PathBuf> {
    let path = report_path(output_dir, report, "html").await?;
    write_report_file(&path, render_html(report).as_bytes()).await?;
    Ok(path)
}
