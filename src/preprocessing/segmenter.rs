use crate::domain::entities::{AudioBuffer, Segment};
use crate::domain::errors::AppError;
use crate::infrastructure::audio::{decode_file, write_wav};
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Splits a recording into consecutive fixed-length windows.
///
/// The last window keeps whatever is left over; it is never padded and never
/// merged into the window before it.
pub struct Segmenter {
    window_ms: u64,
}

impl Segmenter {
    pub fn new(window_ms: u64) -> Result<Self, AppError> {
        if window_ms == 0 {
            return Err(AppError::InvalidInput("segment window must be positive".to_string()));
        }
        Ok(Segmenter { window_ms })
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Window length in frames at the given sample rate.
    pub fn window_frames(&self, sample_rate: u32) -> Result<usize, AppError> {
        let frames = self.window_ms * sample_rate as u64 / 1000;
        if frames == 0 {
            return Err(AppError::InvalidInput(format!(
                "a {}ms window holds no frames at {}Hz",
                self.window_ms, sample_rate
            )));
        }
        Ok(frames as usize)
    }

    pub fn split<'a>(&self, audio: &'a AudioBuffer) -> Result<Segments<'a>, AppError> {
        let window = self.window_frames(audio.sample_rate)?;
        Ok(Segments {
            audio,
            start: 0,
            end: window,
            window,
            part: 1,
        })
    }

    pub fn process_file(
        &self,
        path: &Path,
        output_dir: &Path,
        prefix: &str,
        progress: &ProgressBar,
    ) -> Result<Vec<PathBuf>, AppError> {
        let audio = decode_file(path)?;
        self.save_segments(&audio, output_dir, prefix, progress)
    }

    /// Writes `{prefix}{n}.wav` for every window, stopping at the first
    /// failed write. Files already written stay on disk.
    pub fn save_segments(
        &self,
        audio: &AudioBuffer,
        output_dir: &Path,
        prefix: &str,
        progress: &ProgressBar,
    ) -> Result<Vec<PathBuf>, AppError> {
        fs::create_dir_all(output_dir)?;
        progress.set_length(audio.frames() as u64);

        let mut written = Vec::new();
        for segment in self.split(audio)? {
            let output_path = output_dir.join(format!("{}.wav", segment.name(prefix)));
            write_wav(&output_path, &segment.audio)?;
            debug!(path = %output_path.display(), frames = segment.audio.frames(), "wrote segment");
            progress.inc(segment.audio.frames() as u64);
            written.push(output_path);
        }
        Ok(written)
    }
}

/// Lazy cursor over the windows of one buffer.
pub struct Segments<'a> {
    audio: &'a AudioBuffer,
    start: usize,
    end: usize,
    window: usize,
    part: usize,
}

impl Iterator for Segments<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        let total = self.audio.frames();
        if self.start >= total {
            return None;
        }
        let segment = Segment::new(self.part, self.audio.slice_frames(self.start, self.end.min(total)));
        self.start += self.window;
        self.end += self.window;
        self.part += 1;
        Some(segment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.audio.frames().saturating_sub(self.start).div_ceil(self.window);
        (remaining, Some(remaining))
    }
}
