//! Console, JSON, and HTML renderings of a finished campaign.
mod console;
mod html;
mod json;


use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::campaign::{CampaignOutcome, EndpointRun};
use crate::config::CampaignSettings;
use crate::domain::{Endpoint, Protocol};
use crate::error::{AppError, AppResult, ReportError};
use crate::stats::{EndpointSummary, summarize};

pub use console::{print_console_report, render_detail_table, render_summary_table};
pub use html::{render_html, write_html_report};
pub use json::{render_json, write_json_report};

/// File-name stamp shared by reports and the log file.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
const DISPLAY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything the report writers need, computed once after the campaign.
#[derive(Debug, Clone)]
pub struct CampaignReport {
    pub domain: String,
    pub path: String,
    pub test_count: usize,
    /// Endpoints as configured, including any excluded at handle construction.
    pub endpoints: Vec<Endpoint>,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub runs: Vec<EndpointRun>,
    pub summaries: Vec<EndpointSummary>,
}

impl CampaignReport {
    #[must_use]
    pub fn new(settings: &CampaignSettings, outcome: CampaignOutcome) -> Self {
        let summaries = outcome
            .runs
            .iter()
            .map(|run| summarize(&run.endpoint, &run.samples))
            .collect();
        Self {
            domain: settings.domain.clone(),
            path: settings.path.clone(),
            test_count: settings.rounds,
            endpoints: settings.endpoints.clone(),
            started_at: outcome.started_at,
            finished_at: outcome.finished_at,
            runs: outcome.runs,
            summaries,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.finished_at
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn file_stem(&self) -> String {
        self.started_at.format(FILE_TIMESTAMP_FORMAT).to_string()
    }

    /// Summaries grouped by protocol, HTTP/3 first; empty groups are skipped.
    #[must_use]
    pub fn protocol_groups(&self) -> Vec<(Protocol, Vec<&EndpointSummary>)> {
        Protocol::REPORT_ORDER
            .iter()
            .filter_map(|protocol| {
                let group: Vec<&EndpointSummary> = self
                    .summaries
                    .iter()
                    .filter(|summary| summary.protocol == *protocol)
                    .collect();
                if group.is_empty() {
                    None
                } else {
                    Some((*protocol, group))
                }
            })
            .collect()
    }
}

/// `<output_dir>/reports/<stamp>.<extension>`, creating the directory.
pub(crate) async fn report_path(
    output_dir: &Path,
    report: &CampaignReport,
    extension: &str,
) -> AppResult<PathBuf> {
    let dir = output_dir.join("reports");
    tokio::fs::create_dir_all(&dir).await.map_err(|err| {
        AppError::report(ReportError::CreateDir {
            path: dir.clone(),
            source: err,
        })
    })?;
    Ok(dir.join(format!("{}.{}", report.file_stem(), extension)))
}

pub(crate) async fn write_report_file(path: &Path, contents: &[u8]) -> AppResult<()> {
    let write = async {
        let file = tokio::fs::File::create(path).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(contents).await?;
        writer.flush().await
    };
    write.await.map_err(|err| {
        AppError::report(ReportError::Write {
            path: path.to_path_buf(),
            source: err,
        })
    })
}

fn format_ms(value: f64) -> String {
    format!("{:.2}", value)
}
