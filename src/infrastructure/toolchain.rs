use crate::domain::errors::AppError;
use crate::infrastructure::process::{CommandSpec, ProcessReport, ProcessRunner};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Scripts of the diff-svc checkout, relative to its root.
#[derive(Debug, Clone)]
pub struct ToolchainScripts {
    pub binarize: String,
    pub train: String,
    pub infer: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ToolchainTimeouts {
    pub binarize_secs: u64,
    pub training_secs: u64,
    pub inference_secs: u64,
}

/// Drives the external singing-voice-conversion toolchain. Every script runs
/// with the checkout on `PYTHONPATH` and the configured GPU visible.
pub struct VoiceToolchain {
    root: PathBuf,
    python: String,
    cuda_visible_devices: String,
    scripts: ToolchainScripts,
    timeouts: ToolchainTimeouts,
    runner: Arc<dyn ProcessRunner>,
}

impl VoiceToolchain {
    pub fn new(
        root: impl Into<PathBuf>,
        python: impl Into<String>,
        cuda_visible_devices: impl Into<String>,
        scripts: ToolchainScripts,
        timeouts: ToolchainTimeouts,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        VoiceToolchain {
            root: root.into(),
            python: python.into(),
            cuda_visible_devices: cuda_visible_devices.into(),
            scripts,
            timeouts,
            runner,
        }
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn raw_audio_dir(&self) -> PathBuf {
        self.raw_dir().join("audio")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.root.join("results")
    }

    fn script(&self, script: &str, timeout_secs: u64) -> CommandSpec {
        CommandSpec::new(&self.python)
            .path_arg(&self.root.join(script))
            .env("PYTHONPATH", self.root.to_string_lossy())
            .env("CUDA_VISIBLE_DEVICES", &self.cuda_visible_devices)
            .timeout_secs(timeout_secs)
    }

    fn run(&self, spec: CommandSpec) -> Result<ProcessReport, AppError> {
        self.runner.run(&spec)?.into_result()
    }

    pub fn binarize(&self, config: &Path) -> Result<ProcessReport, AppError> {
        info!("Binarizing dataset with {}", config.display());
        self.run(
            self.script(&self.scripts.binarize, self.timeouts.binarize_secs)
                .arg("--config")
                .path_arg(config),
        )
    }

    pub fn train(&self, config: &Path, exp_name: &str) -> Result<ProcessReport, AppError> {
        info!("Training model {}", exp_name);
        self.run(
            self.script(&self.scripts.train, self.timeouts.training_secs)
                .arg("--config")
                .path_arg(config)
                .arg("--exp_name")
                .arg(exp_name)
                .arg("--reset"),
        )
    }

    pub fn infer(&self, config: &Path, model_path: &Path, subject: &str) -> Result<ProcessReport, AppError> {
        info!("Running inference with {}", model_path.display());
        self.run(
            self.script(&self.scripts.infer, self.timeouts.inference_secs)
                .arg("--config")
                .path_arg(config)
                .arg("--model_path")
                .path_arg(model_path)
                .arg("--artist_name")
                .arg(subject),
        )
    }

    /// Empties `raw/` and copies the inputs into `raw/audio/`.
    pub fn stage_inputs(&self, files: &[PathBuf]) -> Result<Vec<PathBuf>, AppError> {
        let raw = self.raw_dir();
        if raw.exists() {
            fs::remove_dir_all(&raw)?;
        }
        let audio_dir = self.raw_audio_dir();
        fs::create_dir_all(&audio_dir)?;

        let mut staged = Vec::with_capacity(files.len());
        for file in files {
            let name = file
                .file_name()
                .ok_or_else(|| AppError::InvalidInput(format!("{} has no file name", file.display())))?;
            let target = audio_dir.join(name);
            fs::copy(file, &target)?;
            staged.push(target);
        }
        Ok(staged)
    }
}
