use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::error::{AppError, AppResult, ReportError};
use crate::report::FILE_TIMESTAMP_FORMAT;

fn env_filter(verbose: bool) -> EnvFilter {
    std::env::var("EDGEPROBE_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("info")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        )
}

/// Creates `<output_dir>/logs/<stamp>.log`.
///
/// # Errors
///
/// Returns an error when the log directory or file cannot be created.
pub fn create_log_file(output_dir: &Path) -> AppResult<(PathBuf, File)> {
    let dir = output_dir.join("logs");
    std::fs::create_dir_all(&dir).map_err(|err| {
        AppError::report(ReportError::CreateDir {
            path: dir.clone(),
            source: err,
        })
    })?;
    let path = dir.join(format!("{}.log", Local::now().format(FILE_TIMESTAMP_FORMAT)));
    let file = File::create(&path).map_err(|err| {
        AppError::report(ReportError::CreateLog {
            path: path.clone(),
            source: err,
        })
    })?;
    Ok((path, file))
}

/// Installs the global subscriber. With a log file, every event is written
/// to stdout and the file, without ANSI colors.
pub fn init_logging(verbose: bool, log_file: Option<File>) {
    let filter = env_filter(verbose);
    let result = match log_file {
        Some(file) => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stdout.and(Mutex::new(file)))
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        None => {
            let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    };

    if let Err(err) = result {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}
