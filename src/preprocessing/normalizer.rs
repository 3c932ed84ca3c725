use crate::domain::entities::AudioBuffer;
use crate::domain::errors::AppError;
use crate::infrastructure::audio::{read_wav, write_wav};
use dasp_rs::signal_processing::resampling::resample;
use std::path::Path;

/// Brings separated vocals to the training format: one channel, fixed rate,
/// fixed bit depth.
pub struct Normalizer {
    target_sample_rate: u32,
    target_bits: u16,
}

impl Normalizer {
    pub fn new(target_sample_rate: u32, target_bits: u16) -> Self {
        Normalizer {
            target_sample_rate,
            target_bits,
        }
    }

    pub fn normalize(&self, audio: &AudioBuffer) -> Result<AudioBuffer, AppError> {
        let mono = downmix(audio);
        let samples = if audio.sample_rate != self.target_sample_rate && !mono.is_empty() {
            resample(&mono, audio.sample_rate, self.target_sample_rate)?
        } else {
            mono
        };
        Ok(AudioBuffer::new(samples, self.target_sample_rate, 1, self.target_bits))
    }

    pub fn process_file(&self, input: &Path, output: &Path) -> Result<(), AppError> {
        let audio = read_wav(input)?;
        write_wav(output, &self.normalize(&audio)?)
    }
}

fn downmix(audio: &AudioBuffer) -> Vec<f32> {
    match audio.channels {
        0 | 1 => audio.samples.clone(),
        channels => audio
            .samples
            .chunks_exact(channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect(),
    }
}
