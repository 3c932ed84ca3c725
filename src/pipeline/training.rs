use super::Pipeline;
use crate::domain::entities::Subject;
use crate::domain::errors::AppError;
use crate::infrastructure::layout::SubjectLayout;
use crate::infrastructure::template::render_config;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub subject: String,
    pub segments: usize,
    pub vocals: usize,
    pub config: PathBuf,
    pub substitutions: usize,
}

impl Pipeline {
    /// Download, segment, separate, normalize, then binarize and train.
    /// Each step must finish before the next starts; the first failure ends
    /// the run and leaves whatever was already written on disk.
    pub fn train(&self, subject: &Subject, locator: &str) -> Result<TrainingReport, AppError> {
        let layout = SubjectLayout::new(&self.data_dir, subject);
        layout.setup()?;
        info!("Preparing dataset for {} in {}", subject.name, layout.root().display());

        let origin = layout.origin();
        self.downloader.fetch_audio(locator, &origin)?;

        let pb = self.progress_bar(0, format!("{} Processing", subject.name));
        let segments = self
            .segmenter
            .process_file(&origin, &layout.split_dir(), &subject.slug, &pb)?;
        pb.finish_with_message("Segmentation completed!");
        info!("Split {} into {} segments", origin.display(), segments.len());
        if segments.is_empty() {
            return Err(AppError::VideoNotFound(format!("{} decoded to no audio", locator.trim())));
        }

        let tmp_dir = layout.tmp_dir();
        fs::create_dir_all(&tmp_dir)?;
        let pb = self.progress_bar(segments.len() as u64, "Separating vocals".to_string());
        let mut stems = Vec::with_capacity(segments.len());
        for segment in &segments {
            stems.push(self.separator.separate(segment, &tmp_dir)?);
            pb.inc(1);
        }
        pb.finish_with_message("Separation completed!");

        let vocal_dir = layout.vocal_dir();
        if vocal_dir.exists() {
            fs::remove_dir_all(&vocal_dir)?;
        }
        fs::create_dir_all(&vocal_dir)?;
        let pb = self.progress_bar(stems.len() as u64, "Normalizing vocals".to_string());
        for (i, stem) in stems.iter().enumerate() {
            let output = vocal_dir.join(format!("{}{}.wav", subject.slug, i + 1));
            self.normalizer.process_file(&stem.vocals, &output)?;
            pb.inc(1);
        }
        pb.finish_with_message("Normalization completed!");

        fs::remove_dir_all(layout.split_dir())?;
        fs::remove_dir_all(&tmp_dir)?;

        let config = layout.config();
        let substitutions = render_config(&self.config_template, &config, &subject.slug)?;

        self.toolchain.binarize(&config)?;
        self.toolchain.train(&config, &subject.slug)?;
        info!("Training finished for {}", subject.name);

        Ok(TrainingReport {
            subject: subject.slug.clone(),
            segments: segments.len(),
            vocals: stems.len(),
            config,
            substitutions,
        })
    }
}
