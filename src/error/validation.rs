use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing domain (set `domain` in the config file).")]
    MissingDomain,
    #[error("Invalid domain '{value}'. Expected a bare host name, optionally with a port.")]
    InvalidDomain { value: String },
    #[error("Invalid request path '{value}'. Paths must start with '/'.")]
    InvalidPath { value: String },
    #[error("Invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: http::uri::InvalidUri,
    },
    #[error("Invalid round count '{value}': {source}")]
    InvalidRounds {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Round count must be >= 1.")]
    ZeroRounds,
    #[error("No endpoints configured.")]
    NoEndpoints,
    #[error("No endpoint could be prepared for probing.")]
    NoUsableEndpoints,
    #[error("Endpoint {index} has an empty name.")]
    EndpointNameEmpty { index: usize },
    #[error("Endpoint '{name}' has an empty IP address.")]
    EndpointIpEmpty { name: String },
    #[error("Endpoint '{name}' is listed twice for {protocol}.")]
    DuplicateEndpoint { name: String, protocol: String },
    #[error("Unsupported protocol '{value}'. Use HTTP/1.1, HTTP/2, or HTTP/3.")]
    UnsupportedProtocol { value: String },
    #[error("Duration must not be empty.")]
    DurationEmpty,
    #[error("Invalid duration '{value}'.")]
    InvalidDurationFormat { value: String },
    #[error("Invalid duration '{value}': {source}")]
    InvalidDurationNumber {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Duration overflow.")]
    DurationOverflow,
    #[error("Invalid duration unit '{unit}'.")]
    InvalidDurationUnit { unit: String },
    #[error("Duration must be > 0.")]
    DurationZero,
}
