//! Round-synchronized probing of every endpoint.
mod observer;
mod round;


use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::domain::{Endpoint, RequestSample};
use crate::probe::Prober;

pub use observer::{CampaignObserver, TracingObserver};

/// One endpoint and the prober bound to it.
#[derive(Clone)]
pub struct CampaignTarget {
    pub endpoint: Endpoint,
    pub prober: Arc<dyn Prober>,
}

impl CampaignTarget {
    #[must_use]
    pub const fn new(endpoint: Endpoint, prober: Arc<dyn Prober>) -> Self {
        Self { endpoint, prober }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundPlan {
    pub rounds: usize,
    /// Sleep between rounds; never applied after the last one.
    pub pause: Duration,
}

/// Samples of one endpoint in round order.
#[derive(Debug, Clone)]
pub struct EndpointRun {
    pub endpoint: Endpoint,
    pub samples: Vec<RequestSample>,
}

#[derive(Debug, Clone)]
pub struct CampaignOutcome {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub runs: Vec<EndpointRun>,
}

/// Runs `plan.rounds` rounds over all targets.
///
/// Round N+1 starts only after every probe of round N returned, so each
/// endpoint's samples line up with the round they were taken in. The
/// campaign always runs to completion; probe failures are recorded as
/// samples.
pub async fn run_campaign(
    targets: &[CampaignTarget],
    plan: RoundPlan,
    observer: &dyn CampaignObserver,
) -> CampaignOutcome {
    let started_at = Local::now();
    let mut runs: Vec<EndpointRun> = targets
        .iter()
        .map(|target| EndpointRun {
            endpoint: target.endpoint.clone(),
            samples: Vec::with_capacity(plan.rounds),
        })
        .collect();

    for round in 1..=plan.rounds {
        observer.round_started(round, plan.rounds, targets.len());
        let samples = round::run_round(targets, round).await;
        for (run, sample) in runs.iter_mut().zip(samples) {
            observer.probe_finished(&run.endpoint, &sample);
            run.samples.push(sample);
        }

        if round < plan.rounds && !plan.pause.is_zero() {
            debug!("Pausing {:?} before round {}", plan.pause, round.saturating_add(1));
            tokio::time::sleep(plan.pause).await;
        }
    }

    CampaignOutcome {
        started_at,
        finished_at: Local::now(),
        runs,
    }
}
