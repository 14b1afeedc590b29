use std::time::Duration;

use serde::Deserialize;

use crate::error::ValidationError;

/// On-disk campaign configuration (`.toml` or `.json`).
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub domain: Option<String>,
    pub path: Option<String>,
    pub test_count: Option<usize>,
    pub timeout: Option<DurationValue>,
    pub interval: Option<DurationValue>,
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub ip: String,
    #[serde(default = "default_protocol")]
    pub protocol: String,
}

fn default_protocol() -> String {
    "HTTP/1.1".to_owned()
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct OutputConfig {
    pub dir: Option<String>,
    #[serde(default)]
    pub enable_log: bool,
    #[serde(default)]
    pub enable_json: bool,
    #[serde(default)]
    pub enable_html: bool,
}

/// A duration given either as whole seconds or as text such as `"250ms"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => super::parse_duration_value(text),
        }
    }

    pub(crate) fn to_pause(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => super::parse_duration_allow_zero(text),
        }
    }
}
