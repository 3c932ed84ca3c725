#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use voxprep::config::AppConfig;
use voxprep::domain::entities::{AudioBuffer, StemPair};
use voxprep::domain::errors::AppError;
use voxprep::infrastructure::audio::write_wav;
use voxprep::infrastructure::downloader::MediaDownloader;
use voxprep::infrastructure::process::{CommandSpec, ProcessOutcome, ProcessReport, ProcessRunner};
use voxprep::infrastructure::separator::Separator;

static COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn scratch_dir(name: &str) -> PathBuf {
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir()
        .join("voxprep-it")
        .join(format!("{}-{}-{}", name, std::process::id(), n));
    if dir.exists() {
        fs::remove_dir_all(&dir).unwrap();
    }
    fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn ramp(frames: usize, sample_rate: u32) -> AudioBuffer {
    AudioBuffer::mono((0..frames).map(|i| i as f32).collect(), sample_rate)
}

/// Config rooted in a scratch directory with a 1s window at 8kHz so no
/// resampling happens.
pub fn test_config(root: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.data_dir = root.join("data");
    config.paths.toolchain_dir = root.join("diff-svc");
    config.paths.config_template = root.join("config_nsf.yaml");
    config.segmentation.window_ms = 1000;
    config.normalization.sample_rate = 8000;
    fs::write(
        &config.paths.config_template,
        "raw_data_dir: data/${artist_name}/vocal\nbinary_data_dir: data/binary/${artist_name}\n",
    )
    .unwrap();
    config
}

/// Records every command. Fails any command whose line contains `fail_on`;
/// otherwise fakes the files `zip` and the inference script would create.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<CommandSpec>>,
    pub fail_on: Option<String>,
}

impl FakeRunner {
    pub fn failing_on(pattern: &str) -> Self {
        FakeRunner {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(pattern.to_string()),
        }
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(CommandSpec::command_line).collect()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec) -> Result<ProcessReport, AppError> {
        self.calls.lock().unwrap().push(spec.clone());
        let line = spec.command_line();
        if self.fail_on.as_ref().is_some_and(|p| line.contains(p.as_str())) {
            return Ok(ProcessReport {
                outcome: ProcessOutcome::NonZeroExit { code: Some(1) },
                stderr: format!("{} failed", spec.program),
                ..ProcessReport::success(&spec.program)
            });
        }
        if spec.program == "zip" {
            fs::write(&spec.args[1], b"PK").unwrap();
        }
        if line.contains("infer.py") {
            let results = Path::new(&spec.args[0]).parent().unwrap().join("results");
            fs::create_dir_all(&results).unwrap();
            fs::write(results.join("converted.wav"), b"").unwrap();
        }
        Ok(ProcessReport::success(&spec.program))
    }
}

pub struct FakeDownloader {
    pub audio: Option<AudioBuffer>,
}

impl MediaDownloader for FakeDownloader {
    fn fetch_audio(&self, locator: &str, destination: &Path) -> Result<(), AppError> {
        match &self.audio {
            Some(audio) => write_wav(destination, audio),
            None => Err(AppError::VideoNotFound(locator.to_string())),
        }
    }
}

/// Copies each clip to `vocals.wav` and `accompaniment.wav`. Fails on the
/// call numbered `fail_at` (1-based) when set.
pub struct FakeSeparator {
    pub calls: Arc<AtomicUsize>,
    pub fail_at: Option<usize>,
}

impl FakeSeparator {
    pub fn new(calls: Arc<AtomicUsize>) -> Self {
        FakeSeparator { calls, fail_at: None }
    }
}

impl Separator for FakeSeparator {
    fn separate(&self, input: &Path, output_dir: &Path) -> Result<StemPair, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_at == Some(call) {
            return Err(AppError::ProcessFailed {
                program: "spleeter".to_string(),
                code: Some(1),
                stderr: String::new(),
            });
        }
        let dir = output_dir.join(input.file_stem().unwrap());
        fs::create_dir_all(&dir)?;
        let stems = StemPair {
            vocals: dir.join("vocals.wav"),
            accompaniment: dir.join("accompaniment.wav"),
        };
        fs::copy(input, &stems.vocals)?;
        fs::copy(input, &stems.accompaniment)?;
        Ok(stems)
    }
}
