use std::time::Duration;

use super::*;
use crate::domain::{Endpoint, Protocol, RequestSample};

const fn close(left: f64, right: f64) -> bool {
    (left - right).abs() < 1e-9
}

fn endpoint() -> Endpoint {
    Endpoint::new("edge-a", "203.0.113.10", Protocol::Http2)
}

fn samples_with_origin(ttfbs: &[u64], origin: Option<f64>) -> Vec<RequestSample> {
    ttfbs
        .iter()
        .enumerate()
        .map(|(pos, ttfb)| {
            RequestSample::success(
                pos.saturating_add(1),
                Duration::from_millis(*ttfb),
                origin,
                200,
                pos > 0,
                "HTTP/2.0",
            )
        })
        .collect()
}

#[test]
fn percentile_uses_lower_nearest_rank() -> Result<(), String> {
    let values: Vec<f64> = (1..=100).map(f64::from).collect();
    let p50 = percentile(&values, P50);
    if !close(p50, 50.0) {
        return Err(format!("Expected index 49 (value 50), got {}", p50));
    }
    let p99 = percentile(&values, P99);
    if !close(p99, 99.0) {
        return Err(format!("Expected index 98 (value 99), got {}", p99));
    }
    Ok(())
}

#[test]
fn percentile_bounds_are_min_and_max() -> Result<(), String> {
    let values = [3.5, 7.0, 9.25, 12.0, 40.0];
    if !close(percentile(&values, 0.0), 3.5) {
        return Err("P0 should be the minimum".to_owned());
    }
    if !close(percentile(&values, 1.0), 40.0) {
        return Err("P100 should be the maximum".to_owned());
    }
    Ok(())
}

#[test]
fn percentile_of_empty_set_is_zero() -> Result<(), String> {
    if !close(percentile(&[], P90), 0.0) {
        return Err("Empty percentile should be zero".to_owned());
    }
    Ok(())
}

#[test]
fn distribution_sorts_before_ranking() -> Result<(), String> {
    let dist = Distribution::from_values(vec![50.0, 70.0, 60.0, 80.0, 40.0]);
    if !close(dist.p50, 60.0) || !close(dist.min, 40.0) || !close(dist.max, 80.0) {
        return Err(format!("Unexpected distribution: {:?}", dist));
    }
    if !close(dist.mean, 60.0) {
        return Err(format!("Unexpected mean: {}", dist.mean));
    }
    if !close(dist.p99, 70.0) {
        return Err(format!("Unexpected p99: {}", dist.p99));
    }
    Ok(())
}

#[test]
fn summary_decomposes_latency_with_constant_origin() -> Result<(), String> {
    let samples = samples_with_origin(&[100, 120, 110, 130, 90], Some(50.0));
    let summary = summarize(&endpoint(), &samples);

    let expected = [50.0, 70.0, 60.0, 80.0, 40.0];
    for (sample, cdn) in samples.iter().zip(expected) {
        if !close(sample.cdn_latency_ms, cdn) {
            return Err(format!(
                "Round {} cdn latency {} != {}",
                sample.index, sample.cdn_latency_ms, cdn
            ));
        }
    }
    if summary.total != 5 || summary.success != 5 || summary.failures != 0 {
        return Err(format!("Unexpected counts: {:?}", summary));
    }
    let cdn = summary
        .cdn()
        .ok_or_else(|| "Expected CDN data".to_owned())?;
    if !close(cdn.p50, 60.0) {
        return Err(format!("Unexpected CDN p50: {}", cdn.p50));
    }
    if !close(summary.ttfb.p50, 110.0) {
        return Err(format!("Unexpected TTFB p50: {}", summary.ttfb.p50));
    }
    match summary.origin_avg() {
        Some(avg) if close(avg, 50.0) => Ok(()),
        other => Err(format!("Unexpected origin mean: {:?}", other)),
    }
}

#[test]
fn summary_without_origin_header_has_no_cdn_data() -> Result<(), String> {
    let samples = samples_with_origin(&[100, 120, 110], None);
    let summary = summarize(&endpoint(), &samples);
    if summary.has_cdn_data {
        return Err("Expected has_cdn_data to be false".to_owned());
    }
    if summary.cdn().is_some() || summary.origin_avg().is_some() {
        return Err("CDN fields should be absent".to_owned());
    }
    if !close(summary.ttfb.mean, 110.0) {
        return Err(format!("Unexpected TTFB mean: {}", summary.ttfb.mean));
    }
    Ok(())
}

#[test]
fn summary_zero_origin_is_not_cdn_data() -> Result<(), String> {
    let samples = samples_with_origin(&[100, 120], Some(0.0));
    let summary = summarize(&endpoint(), &samples);
    if summary.has_cdn_data {
        return Err("Zero origin time alone should not flag CDN data".to_owned());
    }
    for sample in &samples {
        if !close(sample.cdn_latency_ms, sample.ttfb_ms()) {
            return Err("Zero origin should leave CDN latency equal to TTFB".to_owned());
        }
    }
    Ok(())
}

#[test]
fn summary_counts_failures_separately() -> Result<(), String> {
    let mut samples = samples_with_origin(&[100, 120, 110, 130, 90], Some(50.0));
    if let Some(slot) = samples.get_mut(2) {
        *slot = RequestSample::failure(3, "Request timed out after 500ms.");
    }
    let summary = summarize(&endpoint(), &samples);
    if summary.total != 5 || summary.success != 4 || summary.failures != 1 {
        return Err(format!("Unexpected counts: {:?}", summary));
    }
    if !close(summary.ttfb.min, 90.0) || !close(summary.ttfb.max, 130.0) {
        return Err(format!("Failure leaked into TTFB stats: {:?}", summary.ttfb));
    }
    if !close(summary.ttfb.mean, 110.0) {
        return Err(format!("Unexpected TTFB mean: {}", summary.ttfb.mean));
    }
    Ok(())
}

#[test]
fn summary_with_only_failures_is_zeroed() -> Result<(), String> {
    let samples: Vec<RequestSample> = (1..=3)
        .map(|index| RequestSample::failure(index, "connection refused"))
        .collect();
    let summary = summarize(&endpoint(), &samples);
    if summary.success != 0 || summary.failures != 3 {
        return Err(format!("Unexpected counts: {:?}", summary));
    }
    if summary.ttfb != Distribution::default() || summary.cdn().is_some() {
        return Err(format!("Expected zeroed stats: {:?}", summary));
    }
    if !summary.ttfb.mean.is_finite() {
        return Err("Mean must not be NaN".to_owned());
    }
    Ok(())
}

#[test]
fn summary_is_idempotent() -> Result<(), String> {
    let mut samples = samples_with_origin(&[100, 120, 110, 130, 90], Some(45.5));
    samples.push(RequestSample::failure(6, "boom"));
    let first = summarize(&endpoint(), &samples);
    let second = summarize(&endpoint(), &samples);
    if first != second {
        return Err("Summaries differ between runs".to_owned());
    }
    Ok(())
}
