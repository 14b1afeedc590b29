use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use tracing::{debug, error, info};

use crate::args::ProbeArgs;
use crate::campaign::{CampaignTarget, RoundPlan, TracingObserver, run_campaign};
use crate::config::{CampaignSettings, apply_config, load_config};
use crate::error::{AppError, AppResult, ConfigError, ValidationError};
use crate::logger::{create_log_file, init_logging};
use crate::probe::{HttpProber, ProbeTarget};
use crate::report::{
    CampaignReport, print_console_report, write_html_report, write_json_report,
};
use crate::transport::{TransportOptions, build_transport};

const RULE: &str = "==========================================================";

/// Parses arguments, loads the config, and runs one campaign to completion.
///
/// # Errors
///
/// Returns an error when arguments or config are invalid, no endpoint can be
/// prepared, or a report cannot be written.
pub fn run() -> AppResult<()> {
    let matches = ProbeArgs::command().get_matches();
    let args = ProbeArgs::from_arg_matches(&matches)?;

    let Some((config_path, config)) = load_config(args.config.as_deref())? else {
        return Err(AppError::config(ConfigError::NotFound));
    };
    let settings = apply_config(&args, &matches, &config)?;

    let (log_path, log_file) = if settings.output.log {
        let (path, file) = create_log_file(&settings.output.dir)?;
        (Some(path), Some(file))
    } else {
        (None, None)
    };
    init_logging(args.verbose, log_file);
    info!("Loaded config from {}", config_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run_async(&settings, log_path.as_deref()))
}

async fn run_async(settings: &CampaignSettings, log_path: Option<&Path>) -> AppResult<()> {
    log_banner(settings);

    let target = ProbeTarget::new(&settings.domain, &settings.path, settings.timeout)
        .map_err(AppError::validation)?;
    let targets = prepare_targets(settings, &Arc::new(target));
    if targets.is_empty() {
        return Err(AppError::validation(ValidationError::NoUsableEndpoints));
    }

    let plan = RoundPlan {
        rounds: settings.rounds,
        pause: settings.interval,
    };
    let outcome = run_campaign(&targets, plan, &TracingObserver).await;
    let report = CampaignReport::new(settings, outcome);

    print_console_report(&report);

    let mut written: Vec<PathBuf> = Vec::new();
    if settings.output.json {
        written.push(write_json_report(&report, &settings.output.dir).await?);
    }
    if settings.output.html {
        written.push(write_html_report(&report, &settings.output.dir).await?);
    }

    log_footer(&report, &written, log_path);
    Ok(())
}

/// One prober per endpoint; endpoints whose handle cannot be built are
/// logged and left out.
fn prepare_targets(settings: &CampaignSettings, target: &Arc<ProbeTarget>) -> Vec<CampaignTarget> {
    let options = TransportOptions::new(settings.timeout);
    settings
        .endpoints
        .iter()
        .filter_map(|endpoint| match build_transport(endpoint, &options) {
            Ok(handle) => {
                debug!(
                    "Prepared {} handle for {} pinned to {}",
                    handle.protocol(),
                    endpoint.name,
                    handle.ip()
                );
                let prober = HttpProber::new(handle, Arc::clone(target));
                Some(CampaignTarget::new(endpoint.clone(), Arc::new(prober)))
            }
            Err(err) => {
                error!("Skipping endpoint {}: {}", endpoint.label(), err);
                None
            }
        })
        .collect()
}

fn log_banner(settings: &CampaignSettings) {
    info!("{}", RULE);
    info!("CDN latency campaign");
    info!("  Domain:   {}", settings.domain);
    info!("  Path:     {}", settings.path);
    info!("  Rounds:   {}", settings.rounds);
    info!("  Timeout:  {:?}", settings.timeout);
    info!("  Interval: {:?}", settings.interval);
    info!("  Endpoints ({}):", settings.endpoints.len());
    for endpoint in &settings.endpoints {
        info!("    - {} {} [{}]", endpoint.name, endpoint.ip, endpoint.protocol);
    }
    info!("{}", RULE);
}

fn log_footer(report: &CampaignReport, written: &[PathBuf], log_path: Option<&Path>) {
    info!("{}", RULE);
    info!(
        "Campaign finished in {:.2}s",
        report.duration().as_secs_f64()
    );
    for path in written {
        info!("Report written to {}", path.display());
    }
    if let Some(path) = log_path {
        info!("Log written to {}", path.display());
    }
    info!("{}", RULE);
}
