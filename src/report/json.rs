use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};

use crate::domain::{RequestSample, duration_ms};
use crate::error::{AppError, AppResult, ReportError};
use crate::stats::{Distribution, EndpointSummary};

use super::{CampaignReport, report_path, write_report_file};

fn sample_json(sample: &RequestSample) -> Value {
    json!({
        "index": sample.index,
        "ttfb_ms": sample.ttfb_ms(),
        "origin_ms": sample.origin_ms,
        "cdn_latency_ms": sample.origin_ms.map(|_| sample.cdn_latency_ms),
        "status_code": sample.status_code,
        "reused": sample.reused,
        "protocol": sample.actual_protocol,
        "error": sample.error,
    })
}

fn distribution_json(dist: &Distribution) -> Value {
    json!({
        "avg": dist.mean,
        "min": dist.min,
        "max": dist.max,
        "p50": dist.p50,
        "p90": dist.p90,
        "p95": dist.p95,
        "p99": dist.p99,
    })
}

fn summary_json(summary: &EndpointSummary) -> Value {
    json!({
        "endpoint": summary.endpoint_name,
        "protocol": summary.protocol,
        "total": summary.total,
        "success": summary.success,
        "failures": summary.failures,
        "has_cdn_data": summary.has_cdn_data,
        "ttfb_ms": distribution_json(&summary.ttfb),
        "cdn_latency_ms": summary.cdn().map(distribution_json),
        "origin_avg_ms": summary.origin_avg(),
    })
}

/// JSON document for a finished campaign. Absent CDN fields are `null`.
#[must_use]
pub fn render_json(report: &CampaignReport) -> Value {
    let results: Map<String, Value> = report
        .runs
        .iter()
        .map(|run| {
            let samples = run.samples.iter().map(sample_json).collect();
            (run.endpoint.label(), Value::Array(samples))
        })
        .collect();
    let summaries: Vec<Value> = report.summaries.iter().map(summary_json).collect();

    json!({
        "start_time": report.started_at.to_rfc3339(),
        "end_time": report.finished_at.to_rfc3339(),
        "duration_ms": duration_ms(report.duration()),
        "config": {
            "domain": report.domain,
            "path": report.path,
            "test_count": report.test_count,
            "endpoints": report.endpoints,
        },
        "results": results,
        "summaries": summaries,
    })
}

/// Writes `<output_dir>/reports/<stamp>.json` and returns its path.
///
/// # Errors
///
/// Returns an error when the report directory or file cannot be written.
pub async fn write_json_report(report: &CampaignReport, output_dir: &Path) -> AppResult<PathBuf> {
    let path = report_path(output_dir, report, "json").await?;
    let payload = serde_json::to_vec_pretty(&render_json(report))
        .map_err(|err| AppError::report(ReportError::Serialize { source: err }))?;
    write_report_file(&path, &payload).await?;
    Ok(path)
}
