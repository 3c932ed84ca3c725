//! Train and infer runs over one subject's directory tree.

mod inference;
mod training;

pub use inference::{InferenceReport, Upload};
pub use training::TrainingReport;

use crate::config::AppConfig;
use crate::domain::errors::AppError;
use crate::infrastructure::archive::Archiver;
use crate::infrastructure::downloader::{MediaDownloader, YtDlpDownloader};
use crate::infrastructure::layout::list_subjects;
use crate::infrastructure::process::{ProcessRunner, SystemRunner};
use crate::infrastructure::separator::{Separator, SpleeterSeparator};
use crate::infrastructure::toolchain::{ToolchainScripts, ToolchainTimeouts, VoiceToolchain};
use crate::preprocessing::normalizer::Normalizer;
use crate::preprocessing::segmenter::Segmenter;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Status line shown to the user after a successful run.
pub const DONE: &str = "Done!";

pub struct Pipeline {
    data_dir: PathBuf,
    config_template: PathBuf,
    segmenter: Segmenter,
    normalizer: Normalizer,
    downloader: Box<dyn MediaDownloader>,
    separator: Box<dyn Separator>,
    toolchain: VoiceToolchain,
    archiver: Archiver,
    show_progress: bool,
}

impl Pipeline {
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        Self::with_runner(config, Arc::new(SystemRunner::new()))
    }

    /// Builds every external collaborator on top of one process runner.
    pub fn with_runner(config: &AppConfig, runner: Arc<dyn ProcessRunner>) -> Result<Self, AppError> {
        let tools = &config.tools;
        let timeouts = &config.timeouts;
        Ok(Pipeline {
            data_dir: config.paths.data_dir.clone(),
            config_template: config.paths.config_template.clone(),
            segmenter: Segmenter::new(config.segmentation.window_ms)?,
            normalizer: Normalizer::new(
                config.normalization.sample_rate,
                config.normalization.bits_per_sample,
            ),
            downloader: Box::new(YtDlpDownloader::new(
                &tools.downloader,
                timeouts.download_secs,
                runner.clone(),
            )),
            separator: Box::new(SpleeterSeparator::new(
                &tools.separator,
                &tools.separator_model,
                timeouts.separation_secs,
                runner.clone(),
            )),
            toolchain: VoiceToolchain::new(
                &config.paths.toolchain_dir,
                &tools.python,
                &tools.cuda_visible_devices,
                ToolchainScripts {
                    binarize: tools.binarize_script.clone(),
                    train: tools.train_script.clone(),
                    infer: tools.infer_script.clone(),
                },
                ToolchainTimeouts {
                    binarize_secs: timeouts.binarize_secs,
                    training_secs: timeouts.training_secs,
                    inference_secs: timeouts.inference_secs,
                },
                runner.clone(),
            ),
            archiver: Archiver::new(&tools.archiver, timeouts.archive_secs, runner),
            show_progress: true,
        })
    }

    pub fn with_downloader(mut self, downloader: Box<dyn MediaDownloader>) -> Self {
        self.downloader = downloader;
        self
    }

    pub fn with_separator(mut self, separator: Box<dyn Separator>) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn subjects(&self) -> Result<Vec<String>, AppError> {
        list_subjects(&self.data_dir)
    }

    fn progress_bar(&self, len: u64, message: String) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let style = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .map(|style| style.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        pb.set_message(message);
        pb
    }
}
