use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::ArgMatches;
use clap::parser::ValueSource;

use crate::args::{DEFAULT_PATH, ProbeArgs};
use crate::domain::{Endpoint, Protocol};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};

use super::types::{ConfigFile, EndpointConfig};

/// Validated settings for one campaign.
#[derive(Debug, Clone)]
pub struct CampaignSettings {
    pub domain: String,
    pub path: String,
    pub rounds: usize,
    pub timeout: Duration,
    pub interval: Duration,
    pub endpoints: Vec<Endpoint>,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSettings {
    pub dir: PathBuf,
    pub log: bool,
    pub json: bool,
    pub html: bool,
}

/// Merges the config file with CLI arguments and validates the result.
///
/// Flags given on the command line win over the file; the file wins over
/// CLI defaults.
///
/// # Errors
///
/// Returns an error when a required value is missing or any value is invalid.
pub fn apply_config(
    args: &ProbeArgs,
    matches: &ArgMatches,
    config: &ConfigFile,
) -> AppResult<CampaignSettings> {
    let domain = validate_domain(config.domain.as_deref())?;
    let path = validate_path(config.path.as_deref())?;

    let rounds = if is_cli(matches, "rounds") {
        args.rounds
    } else {
        config.test_count.unwrap_or(args.rounds)
    };
    if rounds == 0 {
        return Err(AppError::validation(ValidationError::ZeroRounds));
    }

    let timeout = match config.timeout.as_ref() {
        Some(value) if !is_cli(matches, "timeout") => value
            .to_duration()
            .map_err(|source| invalid_field("timeout", source))?,
        _ => args.timeout,
    };

    let interval = match config.interval.as_ref() {
        Some(value) if !is_cli(matches, "interval") => value
            .to_pause()
            .map_err(|source| invalid_field("interval", source))?,
        _ => args.interval,
    };

    let endpoints = validate_endpoints(&config.endpoints)?;

    let dir = match config.output.dir.as_ref() {
        Some(dir) if !is_cli(matches, "output_dir") => dir.clone(),
        _ => args.output_dir.clone(),
    };

    Ok(CampaignSettings {
        domain,
        path,
        rounds,
        timeout,
        interval,
        endpoints,
        output: OutputSettings {
            dir: PathBuf::from(dir),
            log: args.log_file || config.output.enable_log,
            json: args.json || config.output.enable_json,
            html: args.html || config.output.enable_html,
        },
    })
}

fn is_cli(matches: &ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(ValueSource::CommandLine)
}

const fn invalid_field(field: &'static str, source: ValidationError) -> AppError {
    AppError::Config(ConfigError::InvalidField { field, source })
}

fn validate_domain(domain: Option<&str>) -> AppResult<String> {
    let domain = domain
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .ok_or_else(|| AppError::validation(ValidationError::MissingDomain))?;
    let malformed = domain.contains("://")
        || domain
            .chars()
            .any(|ch| ch.is_whitespace() || matches!(ch, '/' | '?' | '#' | '@'));
    if malformed {
        return Err(AppError::validation(ValidationError::InvalidDomain {
            value: domain.to_owned(),
        }));
    }
    Ok(domain.to_owned())
}

fn validate_path(path: Option<&str>) -> AppResult<String> {
    let path = path.map(str::trim).unwrap_or_default();
    if path.is_empty() {
        return Ok(DEFAULT_PATH.to_owned());
    }
    if !path.starts_with('/') {
        return Err(AppError::validation(ValidationError::InvalidPath {
            value: path.to_owned(),
        }));
    }
    Ok(path.to_owned())
}

fn validate_endpoints(configs: &[EndpointConfig]) -> AppResult<Vec<Endpoint>> {
    if configs.is_empty() {
        return Err(AppError::validation(ValidationError::NoEndpoints));
    }

    let mut seen: BTreeSet<(String, Protocol)> = BTreeSet::new();
    let mut endpoints = Vec::with_capacity(configs.len());
    for (pos, config) in configs.iter().enumerate() {
        let name = config.name.trim();
        if name.is_empty() {
            return Err(AppError::validation(ValidationError::EndpointNameEmpty {
                index: pos.saturating_add(1),
            }));
        }
        let ip = config.ip.trim();
        if ip.is_empty() {
            return Err(AppError::validation(ValidationError::EndpointIpEmpty {
                name: name.to_owned(),
            }));
        }
        let protocol: Protocol = config
            .protocol
            .parse()
            .map_err(|source| invalid_field("endpoint protocol", source))?;
        if !seen.insert((name.to_owned(), protocol)) {
            return Err(AppError::validation(ValidationError::DuplicateEndpoint {
                name: name.to_owned(),
                protocol: protocol.to_string(),
            }));
        }
        endpoints.push(Endpoint::new(name, ip, protocol));
    }
    Ok(endpoints)
}
