//! Per-endpoint aggregation of raw samples.
mod percentiles;

#[cfg(test)]
mod tests;

use serde::Serialize;

use crate::domain::{Endpoint, Protocol, RequestSample};

pub use percentiles::{Distribution, P50, P90, P95, P99, mean, percentile};

/// Aggregate over one endpoint's samples.
///
/// `cdn_latency` and `origin_avg_ms` only carry meaning when `has_cdn_data`
/// is set; read them through [`EndpointSummary::cdn`] and
/// [`EndpointSummary::origin_avg`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub endpoint_name: String,
    pub protocol: Protocol,
    pub total: usize,
    pub success: usize,
    pub failures: usize,
    pub has_cdn_data: bool,
    pub ttfb: Distribution,
    pub cdn_latency: Distribution,
    pub origin_avg_ms: f64,
}

impl EndpointSummary {
    #[must_use]
    pub const fn cdn(&self) -> Option<&Distribution> {
        if self.has_cdn_data {
            Some(&self.cdn_latency)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn origin_avg(&self) -> Option<f64> {
        if self.has_cdn_data {
            Some(self.origin_avg_ms)
        } else {
            None
        }
    }
}

/// Summarizes one endpoint's full sample sequence.
///
/// Failures only count toward `total` and `failures`. CDN latency and the
/// origin mean are taken over successful samples that carried an origin time.
#[must_use]
pub fn summarize(endpoint: &Endpoint, samples: &[RequestSample]) -> EndpointSummary {
    let successes: Vec<&RequestSample> = samples
        .iter()
        .filter(|sample| sample.is_success())
        .collect();
    let with_origin: Vec<(f64, f64)> = successes
        .iter()
        .filter_map(|sample| {
            sample
                .origin_ms
                .map(|origin| (origin, sample.cdn_latency_ms))
        })
        .collect();
    let origins: Vec<f64> = with_origin.iter().map(|(origin, _)| *origin).collect();
    let ttfb_values = successes.iter().map(|sample| sample.ttfb_ms()).collect();
    let cdn_values = with_origin.iter().map(|(_, cdn)| *cdn).collect();

    EndpointSummary {
        endpoint_name: endpoint.name.clone(),
        protocol: endpoint.protocol,
        total: samples.len(),
        success: successes.len(),
        failures: samples.len().saturating_sub(successes.len()),
        has_cdn_data: origins.iter().any(|origin| *origin > 0.0),
        ttfb: Distribution::from_values(ttfb_values),
        cdn_latency: Distribution::from_values(cdn_values),
        origin_avg_ms: mean(&origins),
    }
}
