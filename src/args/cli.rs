use clap::Parser;
use std::time::Duration;

use super::defaults::{DEFAULT_INTERVAL, DEFAULT_OUTPUT_DIR, DEFAULT_ROUNDS, DEFAULT_TIMEOUT};
use super::parsers::{parse_duration_arg, parse_pause_arg, parse_rounds};

#[derive(Debug, Parser, Clone)]
#[clap(
    name = "edgeprobe",
    version,
    about = "Compare CDN edge latency across pinned IPs over HTTP/1.1, HTTP/2, and HTTP/3, splitting time-to-first-byte into CDN and origin shares."
)]
pub struct ProbeArgs {
    /// Config file (.toml or .json); defaults to edgeprobe.toml, then edgeprobe.json
    #[arg(value_name = "CONFIG")]
    pub config: Option<String>,

    /// Enable debug logging
    #[arg(long = "verbose", short = 'v')]
    pub verbose: bool,

    /// Rounds to run; every endpoint is probed once per round
    #[arg(long = "rounds", short = 'n', default_value = DEFAULT_ROUNDS, value_parser = parse_rounds)]
    pub rounds: usize,

    /// Pause between rounds (supports ms/s/m/h, 0 disables)
    #[arg(long = "interval", short = 'i', default_value = DEFAULT_INTERVAL, value_parser = parse_pause_arg)]
    pub interval: Duration,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", short = 't', default_value = DEFAULT_TIMEOUT, value_parser = parse_duration_arg)]
    pub timeout: Duration,

    /// Directory for reports and logs
    #[arg(long = "output-dir", short = 'o', default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: String,

    /// Write a JSON report to <output-dir>/reports
    #[arg(long = "json")]
    pub json: bool,

    /// Write an HTML report to <output-dir>/reports
    #[arg(long = "html")]
    pub html: bool,

    /// Mirror log output to <output-dir>/logs
    #[arg(long = "log-file")]
    pub log_file: bool,
}
