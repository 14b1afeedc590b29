//! Forced-IP transport handles, one per endpoint.
mod connector;
mod quic;
mod tls;
mod trace;


use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{HeaderMap, StatusCode, Version};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use rustls::pki_types::CertificateDer;
use tokio_rustls::TlsConnector;

use crate::domain::{Endpoint, Protocol};
use crate::error::{AppError, AppResult, ProbeError, TransportError};

pub use connector::{PinnedConnector, PinnedStream};
pub use quic::{H3Stream, QuicTransport};
pub use tls::client_config;
pub use trace::{ConnTrace, TracedStream};

/// Idle pooled connections are dropped after this long.
pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
pub const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Knobs shared by every handle in a campaign.
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Bounds connection setup (TCP connect plus TLS handshake).
    pub timeout: Duration,
    /// Trusted in addition to the bundled web PKI roots.
    pub extra_roots: Vec<CertificateDer<'static>>,
}

impl TransportOptions {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            extra_roots: Vec::new(),
        }
    }
}

type PooledClient = Client<PinnedConnector, Empty<Bytes>>;

enum HandleInner {
    Pooled(Box<PooledClient>),
    Quic(Box<QuicTransport>),
}

/// A client bound to one endpoint's IP and protocol.
///
/// Built once before the campaign and shared by every round. Safe to use
/// concurrently; pools synchronize internally.
pub struct TransportHandle {
    protocol: Protocol,
    ip: IpAddr,
    inner: HandleInner,
}

/// Response head as seen by the probe.
#[derive(Debug)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub version: Version,
    pub headers: HeaderMap,
    pub reused: bool,
    /// When the first response byte arrived.
    pub first_byte: Instant,
}

/// Body left to read after the head has been timed.
pub enum PendingBody {
    Http(Incoming),
    Http3(Box<H3Stream>),
}

impl PendingBody {
    /// Reads the body to completion so the connection can return to the pool.
    ///
    /// # Errors
    ///
    /// Returns an error when the body stream fails.
    pub async fn drain(self) -> Result<u64, ProbeError> {
        match self {
            PendingBody::Http(mut body) => {
                let mut total = 0u64;
                while let Some(frame) = body.frame().await {
                    let frame = frame.map_err(|source| ProbeError::Body { source })?;
                    if let Some(data) = frame.data_ref() {
                        let len = u64::try_from(data.len()).unwrap_or(u64::MAX);
                        total = total.saturating_add(len);
                    }
                }
                Ok(total)
            }
            PendingBody::Http3(mut stream) => quic::drain(&mut stream).await,
        }
    }
}

/// Builds the transport handle for one endpoint.
///
/// The endpoint's IP must parse; there is no fallback to resolving the
/// virtual host name.
///
/// # Errors
///
/// Returns an error when the IP does not parse or TLS/QUIC configuration
/// cannot be built.
pub fn build_transport(
    endpoint: &Endpoint,
    options: &TransportOptions,
) -> AppResult<TransportHandle> {
    let ip: IpAddr = endpoint.ip.trim().parse().map_err(|source| {
        AppError::transport(TransportError::InvalidAddress {
            value: endpoint.ip.clone(),
            source,
        })
    })?;

    let inner = match endpoint.protocol {
        Protocol::Http1 | Protocol::Http2 => {
            let tls = client_config(endpoint.protocol, &options.extra_roots)?;
            let tls = TlsConnector::from(Arc::new(tls));
            let connector = PinnedConnector::new(ip, tls, options.timeout);
            let mut builder = Client::builder(TokioExecutor::new());
            builder
                .pool_idle_timeout(POOL_IDLE_TIMEOUT)
                .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
                .pool_timer(TokioTimer::new());
            HandleInner::Pooled(Box::new(builder.build(connector)))
        }
        Protocol::Http3 => {
            HandleInner::Quic(Box::new(QuicTransport::new(ip, &options.extra_roots)?))
        }
    };

    Ok(TransportHandle {
        protocol: endpoint.protocol,
        ip,
        inner,
    })
}

impl TransportHandle {
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        self.protocol
    }

    #[must_use]
    pub const fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Sends one request and returns as soon as the response head is in.
    ///
    /// HTTP/1.x responses are stamped with the first plaintext byte read off
    /// the connection after the request was written. Framed protocols carry
    /// control traffic on the same connection, so there the arrival of the
    /// stream's response head is used instead.
    ///
    /// # Errors
    ///
    /// Returns an error when the connection cannot be established or the
    /// exchange fails before the head arrives.
    pub async fn send(
        &self,
        request: http::Request<()>,
        start: Instant,
    ) -> Result<(ResponseHead, PendingBody), ProbeError> {
        match &self.inner {
            HandleInner::Pooled(client) => {
                let response = client
                    .request(request.map(|()| Empty::new()))
                    .await
                    .map_err(|source| ProbeError::Request { source })?;
                let head_at = Instant::now();
                let (parts, body) = response.into_parts();
                let trace = parts.extensions.get::<ConnTrace>();
                let reused = trace.is_some_and(ConnTrace::claim);
                let first_byte = match parts.version {
                    Version::HTTP_09 | Version::HTTP_10 | Version::HTTP_11 => trace
                        .and_then(|trace| trace.first_read_after(start))
                        .unwrap_or(head_at),
                    _ => head_at,
                };
                Ok((
                    ResponseHead {
                        status: parts.status,
                        version: parts.version,
                        headers: parts.headers,
                        reused,
                        first_byte,
                    },
                    PendingBody::Http(body),
                ))
            }
            HandleInner::Quic(quic) => {
                let (stream, response, reused) = quic.send(request).await?;
                let first_byte = Instant::now();
                let (parts, ()) = response.into_parts();
                Ok((
                    ResponseHead {
                        status: parts.status,
                        version: parts.version,
                        headers: parts.headers,
                        reused,
                        first_byte,
                    },
                    PendingBody::Http3(Box::new(stream)),
                ))
            }
        }
    }
}
