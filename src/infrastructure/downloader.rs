use crate::domain::errors::AppError;
use crate::infrastructure::process::{CommandSpec, ProcessRunner, tail};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Fetches the audio track behind a video locator.
pub trait MediaDownloader: Send + Sync {
    fn fetch_audio(&self, locator: &str, destination: &Path) -> Result<(), AppError>;
}

/// Downloads through `yt-dlp`, extracting the audio into the destination's
/// container (taken from its extension).
pub struct YtDlpDownloader {
    program: String,
    timeout_secs: u64,
    runner: Arc<dyn ProcessRunner>,
}

impl YtDlpDownloader {
    pub fn new(program: impl Into<String>, timeout_secs: u64, runner: Arc<dyn ProcessRunner>) -> Self {
        YtDlpDownloader {
            program: program.into(),
            timeout_secs,
            runner,
        }
    }

    fn command(&self, locator: &str, destination: &Path) -> Result<CommandSpec, AppError> {
        let format = destination
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| AppError::InvalidInput(format!("{} has no extension", destination.display())))?;
        let template = destination.with_extension("%(ext)s");
        Ok(CommandSpec::new(&self.program)
            .arg("--no-playlist")
            .arg("--extract-audio")
            .arg("--audio-format")
            .arg(format)
            .arg("--output")
            .path_arg(&template)
            .arg(locator)
            .timeout_secs(self.timeout_secs))
    }
}

impl MediaDownloader for YtDlpDownloader {
    fn fetch_audio(&self, locator: &str, destination: &Path) -> Result<(), AppError> {
        let locator = locator.trim();
        if locator.is_empty() {
            return Err(AppError::VideoNotFound("no video link given".to_string()));
        }

        info!("Downloading audio from {}", locator);
        let report = self.runner.run(&self.command(locator, destination)?)?;
        if !report.is_success() {
            let reason = tail(&report.stderr, 1);
            report.into_result().map_err(|e| match e {
                AppError::ProcessFailed { .. } => AppError::VideoNotFound(format!("{}: {}", locator, reason)),
                other => other,
            })?;
        }
        if !destination.exists() {
            return Err(AppError::VideoNotFound(format!(
                "{} produced no audio at {}",
                locator,
                destination.display()
            )));
        }
        Ok(())
    }
}
