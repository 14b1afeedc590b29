use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;

use crate::domain::RequestSample;

use super::CampaignTarget;

/// Probes every target concurrently and returns once all of them finished.
///
/// Samples come back in target order regardless of completion order.
pub(crate) async fn run_round(targets: &[CampaignTarget], round: usize) -> Vec<RequestSample> {
    let tasks = targets.iter().map(|target| {
        let prober = Arc::clone(&target.prober);
        tokio::spawn(async move { prober.probe(round).await })
    });

    join_all(tasks)
        .await
        .into_iter()
        .zip(targets)
        .map(|(joined, target)| {
            joined.unwrap_or_else(|err| {
                warn!(
                    "Probe task for {} aborted in round {}: {}",
                    target.endpoint.label(),
                    round,
                    err
                );
                RequestSample::failure(round, format!("Probe task failed: {}", err))
            })
        })
        .collect()
}
