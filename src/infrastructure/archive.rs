use crate::domain::errors::AppError;
use crate::infrastructure::process::{CommandSpec, ProcessRunner};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Packs a directory with the `zip` tool.
pub struct Archiver {
    program: String,
    timeout_secs: u64,
    runner: Arc<dyn ProcessRunner>,
}

impl Archiver {
    pub fn new(program: impl Into<String>, timeout_secs: u64, runner: Arc<dyn ProcessRunner>) -> Self {
        Archiver {
            program: program.into(),
            timeout_secs,
            runner,
        }
    }

    /// Replaces `archive` with a fresh recursive archive of `source_dir`.
    pub fn archive(&self, source_dir: &Path, archive: &Path) -> Result<(), AppError> {
        if !source_dir.is_dir() {
            return Err(AppError::MissingOutput(source_dir.to_path_buf()));
        }
        if archive.exists() {
            fs::remove_file(archive)?;
        }
        let spec = CommandSpec::new(&self.program)
            .arg("-r")
            .path_arg(archive)
            .path_arg(source_dir)
            .timeout_secs(self.timeout_secs);
        self.runner.run(&spec)?.into_result()?;

        if !archive.exists() {
            return Err(AppError::MissingOutput(archive.to_path_buf()));
        }
        info!("Archived {} into {}", source_dir.display(), archive.display());
        Ok(())
    }
}
