use std::net::SocketAddr;

use thiserror::Error;

/// Failures while building a transport handle. These exclude the endpoint from
/// the campaign.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid override address '{value}': {source}")]
    InvalidAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("Invalid TLS configuration: {source}")]
    Tls {
        #[source]
        source: rustls::Error,
    },
    #[error("Invalid extra root certificate: {source}")]
    InvalidRoot {
        #[source]
        source: rustls::Error,
    },
    #[error("Invalid QUIC configuration: {message}")]
    Quic { message: String },
}

/// Failures of the forced-IP dial performed by the pinned connector.
#[derive(Debug, Error)]
pub enum DialError {
    #[error("URL has no host.")]
    MissingHost,
    #[error("Unsupported scheme '{scheme}'. Only https is measured.")]
    UnsupportedScheme { scheme: String },
    #[error("Connect to {addr} timed out after {timeout_ms}ms.")]
    Timeout { addr: SocketAddr, timeout_ms: u128 },
    #[error("Connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid TLS server name '{host}': {source}")]
    ServerName {
        host: String,
        #[source]
        source: rustls::pki_types::InvalidDnsNameError,
    },
    #[error("TLS handshake with {host} via {addr} failed: {source}")]
    Handshake {
        host: String,
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Failures of a single measured exchange. Recorded as sample data, never
/// propagated past the probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Failed to build request: {source}")]
    BuildRequest {
        #[source]
        source: http::Error,
    },
    #[error("Request failed: {source}")]
    Request {
        #[source]
        source: hyper_util::client::legacy::Error,
    },
    #[error("Failed to read response body: {source}")]
    Body {
        #[source]
        source: hyper::Error,
    },
    #[error("URL has no host.")]
    MissingHost,
    #[error("Failed to bind UDP socket {addr}: {source}")]
    BindUdp {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("QUIC connect to {addr} failed: {source}")]
    QuicConnect {
        addr: SocketAddr,
        #[source]
        source: quinn::ConnectError,
    },
    #[error("QUIC handshake with {addr} failed: {source}")]
    QuicHandshake {
        addr: SocketAddr,
        #[source]
        source: quinn::ConnectionError,
    },
    #[error("HTTP/3 {stage} failed: {message}")]
    Http3 { stage: &'static str, message: String },
    #[error("Request timed out after {timeout_ms}ms.")]
    TimedOut { timeout_ms: u128 },
}
