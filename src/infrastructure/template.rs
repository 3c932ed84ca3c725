use crate::domain::errors::AppError;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const SUBJECT_PLACEHOLDER: &str = "${artist_name}";

/// Replaces every subject placeholder in `template` and writes the result to
/// `output`. The written file is read back and compared before returning the
/// number of replacements.
pub fn render_config(template: &Path, output: &Path, subject: &str) -> Result<usize, AppError> {
    let source = fs::read_to_string(template)?;
    let replacements = source.matches(SUBJECT_PLACEHOLDER).count();
    if replacements == 0 {
        warn!("{} has no {} placeholder", template.display(), SUBJECT_PLACEHOLDER);
    }
    let rendered = source.replace(SUBJECT_PLACEHOLDER, subject);

    fs::write(output, &rendered)?;
    let written = fs::read_to_string(output)?;
    if written != rendered {
        return Err(AppError::Template(format!("{} was not written back intact", output.display())));
    }
    if subject != SUBJECT_PLACEHOLDER && written.contains(SUBJECT_PLACEHOLDER) {
        return Err(AppError::Template(format!(
            "{} still contains {}",
            output.display(),
            SUBJECT_PLACEHOLDER
        )));
    }
    info!("Rendered {} ({} substitutions)", output.display(), replacements);
    Ok(replacements)
}
