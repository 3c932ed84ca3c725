use crate::domain::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "VOXPREP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "voxprep.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub segmentation: SegmentationConfig,
    pub normalization: NormalizationConfig,
    pub tools: ToolsConfig,
    pub timeouts: TimeoutsConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub toolchain_dir: PathBuf,
    pub config_template: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub window_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub downloader: String,
    pub separator: String,
    pub separator_model: String,
    pub python: String,
    pub archiver: String,
    pub cuda_visible_devices: String,
    pub binarize_script: String,
    pub train_script: String,
    pub infer_script: String,
}

/// Seconds per step; 0 disables the limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    pub download_secs: u64,
    pub separation_secs: u64,
    pub binarize_secs: u64,
    pub training_secs: u64,
    pub inference_secs: u64,
    pub archive_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            toolchain_dir: PathBuf::from("diff-svc"),
            config_template: PathBuf::from("config_nsf.yaml"),
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self { window_ms: 15_000 }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            bits_per_sample: 16,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            downloader: "yt-dlp".to_string(),
            separator: "spleeter".to_string(),
            separator_model: "spleeter:2stems".to_string(),
            python: "python".to_string(),
            archiver: "zip".to_string(),
            cuda_visible_devices: "0".to_string(),
            binarize_script: "preprocessing/binarize.py".to_string(),
            train_script: "run.py".to_string(),
            infer_script: "infer.py".to_string(),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            download_secs: 900,
            separation_secs: 600,
            binarize_secs: 3600,
            training_secs: 0,
            inference_secs: 3600,
            archive_secs: 300,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7860".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads the file if present, otherwise falls back to the defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config_str = fs::read_to_string(path)?;
        let config = Self::from_toml(&config_str)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn resolve_path() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.segmentation.window_ms, 15_000);
        assert_eq!(config.normalization.sample_rate, 44_100);
        assert_eq!(config.tools.separator_model, "spleeter:2stems");
        assert_eq!(config.paths.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [segmentation]
            window_ms = 10000

            [tools]
            python = "python3"
            "#,
        )
        .unwrap();
        assert_eq!(config.segmentation.window_ms, 10_000);
        assert_eq!(config.tools.python, "python3");
        assert_eq!(config.tools.downloader, "yt-dlp");
        assert_eq!(config.timeouts.training_secs, 0);
    }

    #[test]
    fn malformed_toml_is_a_config_error() {
        assert!(matches!(
            AppConfig::from_toml("[segmentation\nwindow_ms = 1"),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/voxprep.toml")).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7860");
    }
}
