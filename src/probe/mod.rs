//! One measured GET per call: timing, reuse, and the origin time header.
mod origin;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use http::Uri;
use http::header::{HOST, USER_AGENT};
use tracing::debug;

use crate::domain::{Protocol, RequestSample, version_label};
use crate::error::{ProbeError, ValidationError, error_chain};
use crate::transport::TransportHandle;

pub use origin::parse_origin_time;

/// Response header carrying origin processing time in seconds.
pub const ORIGIN_TIME_HEADER: &str = "x-source-response-time";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// The URL every endpoint is probed with.
#[derive(Debug, Clone)]
pub struct ProbeTarget {
    pub uri: Uri,
    /// Virtual host sent as Host and used for SNI.
    pub host: String,
    /// Budget for one whole exchange, body included.
    pub timeout: Duration,
}

impl ProbeTarget {
    /// # Errors
    ///
    /// Returns an error when `https://<domain><path>` is not a valid URI.
    pub fn new(domain: &str, path: &str, timeout: Duration) -> Result<Self, ValidationError> {
        let url = format!("https://{}{}", domain, path);
        let uri = url
            .parse::<Uri>()
            .map_err(|source| ValidationError::InvalidUrl {
                url: url.clone(),
                source,
            })?;
        Ok(Self {
            uri,
            host: domain.to_owned(),
            timeout,
        })
    }
}

/// Anything that can produce one sample per round.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, round: usize) -> RequestSample;
}

/// Probes one endpoint through its pinned transport handle.
pub struct HttpProber {
    handle: TransportHandle,
    target: Arc<ProbeTarget>,
}

impl HttpProber {
    #[must_use]
    pub const fn new(handle: TransportHandle, target: Arc<ProbeTarget>) -> Self {
        Self { handle, target }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, round: usize) -> RequestSample {
        measure_request(&self.handle, &self.target, round).await
    }
}

/// Issues exactly one GET and turns the outcome into a sample.
///
/// Never fails: errors become failure samples carrying the error chain.
pub async fn measure_request(
    handle: &TransportHandle,
    target: &ProbeTarget,
    index: usize,
) -> RequestSample {
    match exchange(handle, target, index).await {
        Ok(sample) => sample,
        Err(err) => RequestSample::failure(index, error_chain(&err)),
    }
}

async fn exchange(
    handle: &TransportHandle,
    target: &ProbeTarget,
    index: usize,
) -> Result<RequestSample, ProbeError> {
    let request = build_request(handle.protocol(), target)?;
    let timed_out = || ProbeError::TimedOut {
        timeout_ms: target.timeout.as_millis(),
    };

    let start = Instant::now();
    let (head, body) = tokio::time::timeout(target.timeout, handle.send(request, start))
        .await
        .map_err(|_elapsed| timed_out())??;
    let ttfb = head.first_byte.saturating_duration_since(start);

    let origin_ms = head
        .headers
        .get(ORIGIN_TIME_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_origin_time);

    let remaining = target.timeout.saturating_sub(start.elapsed());
    match tokio::time::timeout(remaining, body.drain()).await {
        Ok(Ok(bytes)) => debug!("Round {} body drained ({} bytes)", index, bytes),
        Ok(Err(err)) => debug!("Round {} body drain failed: {}", index, error_chain(&err)),
        Err(_elapsed) => debug!("Round {} body drain cut off: {}", index, timed_out()),
    }

    Ok(RequestSample::success(
        index,
        ttfb,
        origin_ms,
        head.status.as_u16(),
        head.reused,
        version_label(head.version),
    ))
}

fn build_request(
    protocol: Protocol,
    target: &ProbeTarget,
) -> Result<http::Request<()>, ProbeError> {
    let mut builder = http::Request::builder()
        .method(http::Method::GET)
        .uri(target.uri.clone())
        .header(USER_AGENT, BROWSER_USER_AGENT);
    // Framed protocols carry the host in :authority.
    if protocol == Protocol::Http1 {
        builder = builder.header(HOST, target.host.as_str());
    }
    builder
        .body(())
        .map_err(|source| ProbeError::BuildRequest { source })
}
