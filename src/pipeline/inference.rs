use super::Pipeline;
use crate::domain::entities::Subject;
use crate::domain::errors::AppError;
use crate::infrastructure::layout::SubjectLayout;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// One file received from the infer form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InferenceReport {
    pub subject: String,
    pub checkpoint: PathBuf,
    pub inputs: usize,
    pub archive: PathBuf,
}

impl Pipeline {
    /// Writes uploads into the subject's `uploads/` directory, replacing
    /// whatever an earlier run left there. Parts without a file name or
    /// content are skipped.
    pub fn store_uploads(&self, subject: &Subject, uploads: Vec<Upload>) -> Result<Vec<PathBuf>, AppError> {
        let layout = SubjectLayout::new(&self.data_dir, subject);
        if !layout.exists() {
            return Err(AppError::ModelNotFound(subject.name.clone()));
        }
        let dir = layout.uploads_dir();
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
        fs::create_dir_all(&dir)?;

        let mut stored = Vec::new();
        for upload in uploads {
            if upload.bytes.is_empty() {
                continue;
            }
            let name = Path::new(&upload.file_name)
                .file_name()
                .ok_or_else(|| AppError::InvalidInput(format!("bad upload name '{}'", upload.file_name)))?;
            let path = dir.join(name);
            fs::write(&path, &upload.bytes)?;
            stored.push(path);
        }
        Ok(stored)
    }

    /// Converts the given files with the subject's newest checkpoint and packs
    /// the toolchain's results into `results.zip`.
    pub fn infer(&self, subject: &Subject, files: &[PathBuf]) -> Result<InferenceReport, AppError> {
        let layout = SubjectLayout::new(&self.data_dir, subject);
        let checkpoint = layout.latest_checkpoint(subject)?;
        if files.is_empty() {
            return Err(AppError::EmptyUpload);
        }
        let config = layout.config();
        if !config.is_file() {
            return Err(AppError::MissingOutput(config));
        }
        info!("Using checkpoint {}", checkpoint.display());

        let staged = self.toolchain.stage_inputs(files)?;
        self.toolchain.infer(&config, &checkpoint, &subject.slug)?;

        let archive = layout.results_archive();
        self.archiver.archive(&self.toolchain.results_dir(), &archive)?;

        Ok(InferenceReport {
            subject: subject.slug.clone(),
            checkpoint,
            inputs: staged.len(),
            archive,
        })
    }
}
