use crate::domain::entities::Subject;
use crate::domain::errors::AppError;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-subject directory tree under the data root:
/// `{name}/{origin.mp3, split/, tmp/, vocal/, checkpoints/, config.yaml, uploads/, results.zip}`.
#[derive(Debug, Clone)]
pub struct SubjectLayout {
    root: PathBuf,
}

impl SubjectLayout {
    pub fn new(data_dir: &Path, subject: &Subject) -> Self {
        SubjectLayout {
            root: data_dir.join(&subject.slug),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn origin(&self) -> PathBuf {
        self.root.join("origin.mp3")
    }

    pub fn split_dir(&self) -> PathBuf {
        self.root.join("split")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn vocal_dir(&self) -> PathBuf {
        self.root.join("vocal")
    }

    pub fn checkpoints_dir(&self) -> PathBuf {
        self.root.join("checkpoints")
    }

    pub fn config(&self) -> PathBuf {
        self.root.join("config.yaml")
    }

    pub fn uploads_dir(&self) -> PathBuf {
        self.root.join("uploads")
    }

    pub fn results_archive(&self) -> PathBuf {
        self.root.join("results.zip")
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn setup(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// The lexicographically greatest `*.ckpt` file.
    pub fn latest_checkpoint(&self, subject: &Subject) -> Result<PathBuf, AppError> {
        let dir = self.checkpoints_dir();
        if !dir.is_dir() {
            return Err(AppError::ModelNotFound(subject.name.clone()));
        }
        files_with_extension(&dir, "ckpt")?
            .pop()
            .ok_or_else(|| AppError::ModelNotFound(subject.name.clone()))
    }
}

/// Files directly under `dir` with the given extension, sorted by name.
pub fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, AppError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Sorted names of the subject directories under the data root.
pub fn list_subjects(data_dir: &Path) -> Result<Vec<String>, AppError> {
    if !data_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
