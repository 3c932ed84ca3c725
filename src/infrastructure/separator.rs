use crate::domain::entities::StemPair;
use crate::domain::errors::AppError;
use crate::infrastructure::process::{CommandSpec, ProcessRunner};
use std::path::Path;
use std::sync::Arc;

/// Splits a mixed clip into vocal and accompaniment layers.
pub trait Separator: Send + Sync {
    fn separate(&self, input: &Path, output_dir: &Path) -> Result<StemPair, AppError>;
}

/// Spleeter two-stem separation. Each input `x.wav` ends up as
/// `output_dir/x/{vocals,accompaniment}.wav`.
pub struct SpleeterSeparator {
    program: String,
    model: String,
    timeout_secs: u64,
    runner: Arc<dyn ProcessRunner>,
}

impl SpleeterSeparator {
    pub fn new(
        program: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
        runner: Arc<dyn ProcessRunner>,
    ) -> Self {
        SpleeterSeparator {
            program: program.into(),
            model: model.into(),
            timeout_secs,
            runner,
        }
    }
}

impl Separator for SpleeterSeparator {
    fn separate(&self, input: &Path, output_dir: &Path) -> Result<StemPair, AppError> {
        let stem = input
            .file_stem()
            .ok_or_else(|| AppError::InvalidInput(format!("{} has no file name", input.display())))?;
        let spec = CommandSpec::new(&self.program)
            .arg("separate")
            .arg("-p")
            .arg(&self.model)
            .arg("-o")
            .path_arg(output_dir)
            .path_arg(input)
            .timeout_secs(self.timeout_secs);
        self.runner.run(&spec)?.into_result()?;

        let stems = StemPair {
            vocals: output_dir.join(stem).join("vocals.wav"),
            accompaniment: output_dir.join(stem).join("accompaniment.wav"),
        };
        if !stems.vocals.exists() {
            return Err(AppError::MissingOutput(stems.vocals));
        }
        Ok(stems)
    }
}
