mod app;
mod config;
mod report;
mod transport;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use report::ReportError;
pub use transport::{DialError, ProbeError, TransportError};
pub use validation::ValidationError;

/// Renders an error and its source chain on one line, e.g.
/// `Request failed: client error (Connect): Connect to 10.0.0.1:443 failed: ...`.
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
