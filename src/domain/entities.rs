use crate::domain::errors::AppError;
use std::path::PathBuf;

/// Decoded PCM audio. Samples are interleaved by channel.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        AudioBuffer {
            samples,
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioBuffer::new(samples, sample_rate, 1, 16)
    }

    /// Number of frames (one sample per channel).
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            channels => self.samples.len() / channels as usize,
        }
    }

    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    pub fn is_empty(&self) -> bool {
        self.frames() == 0
    }

    /// Copies frames `[start, end)` into a new buffer with the same format.
    pub fn slice_frames(&self, start: usize, end: usize) -> AudioBuffer {
        let channels = self.channels.max(1) as usize;
        let end = end.min(self.frames());
        let start = start.min(end);
        AudioBuffer::new(
            self.samples[start * channels..end * channels].to_vec(),
            self.sample_rate,
            self.channels,
            self.bits_per_sample,
        )
    }
}

/// One fixed-window slice of a larger recording. `index` starts at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub index: usize,
    pub audio: AudioBuffer,
}

impl Segment {
    pub fn new(index: usize, audio: AudioBuffer) -> Self {
        Segment { index, audio }
    }

    pub fn name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.index)
    }
}

/// The person a dataset and model are built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub name: String,
    pub slug: String,
}

impl Subject {
    pub fn new(name: &str) -> Result<Self, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("subject name is empty".to_string()));
        }
        if name.contains('/') || name.contains('\\') || name.contains('\0') || name.starts_with('.') {
            return Err(AppError::InvalidInput(format!(
                "subject name '{}' must not start with '.' or contain path separators",
                name.escape_default()
            )));
        }
        Ok(Subject {
            name: name.to_string(),
            slug: name.replace(' ', "_"),
        })
    }
}

/// Files written by a separator for one input clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StemPair {
    pub vocals: PathBuf,
    pub accompaniment: PathBuf,
}
