//! Campaign domain types shared by the transport, probe, and report layers.
mod endpoint;
mod sample;


pub use endpoint::{Endpoint, Protocol, version_label};
pub use sample::{RequestSample, duration_ms};
