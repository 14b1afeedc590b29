use tracing::{info, warn};

use crate::domain::{Endpoint, RequestSample};

/// Receives campaign progress as it happens.
pub trait CampaignObserver: Send + Sync {
    fn round_started(&self, round: usize, total_rounds: usize, width: usize);

    fn probe_finished(&self, endpoint: &Endpoint, sample: &RequestSample);
}

/// Writes one progress line per round and per probe through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CampaignObserver for TracingObserver {
    fn round_started(&self, round: usize, total_rounds: usize, width: usize) {
        info!(
            "Round {}/{} ({} concurrent requests)",
            round, total_rounds, width
        );
    }

    fn probe_finished(&self, endpoint: &Endpoint, sample: &RequestSample) {
        if let Some(err) = sample.error.as_deref() {
            warn!("  [{}/{}] error: {}", endpoint.name, endpoint.protocol, err);
            return;
        }
        let connection = if sample.reused { "reused" } else { "new" };
        let origin = sample
            .origin_ms
            .map_or_else(|| "-".to_owned(), |origin| format!("{:.2}ms", origin));
        info!(
            "  [{}/{}] TTFB: {:.2}ms, origin: {}, CDN: {:.2}ms [{}] [{}] status {}",
            endpoint.name,
            endpoint.protocol,
            sample.ttfb_ms(),
            origin,
            sample.cdn_latency_ms,
            connection,
            sample.actual_protocol,
            sample.status_code
        );
    }
}
