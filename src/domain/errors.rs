use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Audio processing error: {0}")]
    Audio(#[from] dasp_rs::AudioError),
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
    #[error("Decoding error: {0}")]
    Decode(#[from] symphonia::core::errors::Error),
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Video not found: {0}")]
    VideoNotFound(String),
    #[error("No model found for subject '{0}'")]
    ModelNotFound(String),
    #[error("No files were uploaded")]
    EmptyUpload,
    #[error("Template error: {0}")]
    Template(String),
    #[error("Expected output is missing: {}", .0.display())]
    MissingOutput(PathBuf),
    #[error("{program} exited with status {}", exit_code(.code))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("{program} timed out after {seconds}s")]
    ProcessTimedOut { program: String, seconds: u64 },
}

fn exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "unknown (terminated by signal)".to_string(),
    }
}
