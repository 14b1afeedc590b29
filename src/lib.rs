//! Core library for the `edgeprobe` CLI.
//!
//! Probes a fixed set of CDN edge IPs in synchronized rounds over HTTP/1.1,
//! HTTP/2, or HTTP/3, splits each time-to-first-byte into CDN and origin
//! shares using the origin's `x-source-response-time` header, and renders
//! per-endpoint statistics to the console, JSON, and HTML.
pub mod args;
pub mod campaign;
pub mod config;
pub mod domain;
pub mod entry;
pub mod error;
pub mod logger;
pub mod probe;
pub mod report;
pub mod stats;
pub mod transport;

#[cfg(test)]
mod test_support;
