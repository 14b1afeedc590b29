use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ValidationError;

/// Transport protocol a handle is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Protocol {
    #[serde(rename = "HTTP/1.1")]
    Http1,
    #[serde(rename = "HTTP/2")]
    Http2,
    #[serde(rename = "HTTP/3")]
    Http3,
}

impl Protocol {
    /// Display order used by grouped reports.
    pub const REPORT_ORDER: [Protocol; 3] = [Protocol::Http3, Protocol::Http2, Protocol::Http1];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Protocol::Http1 => "HTTP/1.1",
            Protocol::Http2 => "HTTP/2",
            Protocol::Http3 => "HTTP/3",
        }
    }

    /// The single ALPN identifier offered during the TLS handshake.
    #[must_use]
    pub const fn alpn(self) -> &'static [u8] {
        match self {
            Protocol::Http1 => b"http/1.1",
            Protocol::Http2 => b"h2",
            Protocol::Http3 => b"h3",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http/1.1" | "http1" | "h1" | "http/1" => Ok(Protocol::Http1),
            "http/2" | "http2" | "h2" | "http/2.0" => Ok(Protocol::Http2),
            "http/3" | "http3" | "h3" | "http/3.0" => Ok(Protocol::Http3),
            _ => Err(ValidationError::UnsupportedProtocol {
                value: value.to_owned(),
            }),
        }
    }
}

/// Label for the protocol version a response actually arrived on.
#[must_use]
pub fn version_label(version: http::Version) -> &'static str {
    match version {
        http::Version::HTTP_09 => "HTTP/0.9",
        http::Version::HTTP_10 => "HTTP/1.0",
        http::Version::HTTP_11 => "HTTP/1.1",
        http::Version::HTTP_2 => "HTTP/2.0",
        http::Version::HTTP_3 => "HTTP/3.0",
        _ => "unknown",
    }
}

/// One named node under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub ip: String,
    pub protocol: Protocol,
}

impl Endpoint {
    #[must_use]
    pub fn new(name: impl Into<String>, ip: impl Into<String>, protocol: Protocol) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            protocol,
        }
    }

    /// Report key, e.g. `edge-a (HTTP/2)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.protocol)
    }
}
