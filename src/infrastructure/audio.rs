use crate::domain::entities::AudioBuffer;
use crate::domain::errors::AppError;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::warn;

/// Decodes any container symphonia knows about (mp3, wav, ...) into an
/// interleaved buffer, keeping the source channel layout.
pub fn decode_file(path: &Path) -> Result<AudioBuffer, AppError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;
    let mut format = probed.format;

    let (track_id, codec_params) = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .map(|t| (t.id, t.codec_params.clone()))
        .ok_or_else(|| AppError::InvalidInput(format!("no audio track in {}", path.display())))?;

    let mut decoder = symphonia::default::get_codecs().make(&codec_params, &DecoderOptions::default())?;
    let mut sample_rate = codec_params.sample_rate;
    let mut channels = codec_params.channels.map(|c| c.count() as u16);
    let bits_per_sample = codec_params.bits_per_sample.unwrap_or(16) as u16;
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate.get_or_insert(spec.rate);
                channels.get_or_insert(spec.channels.count() as u16);
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(sample_buf.samples());
            }
            Err(SymphoniaError::DecodeError(reason)) => {
                warn!(path = %path.display(), reason, "skipping undecodable packet");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let sample_rate = sample_rate
        .ok_or_else(|| AppError::InvalidInput(format!("unknown sample rate in {}", path.display())))?;
    Ok(AudioBuffer::new(
        samples,
        sample_rate,
        channels.unwrap_or(1),
        bits_per_sample,
    ))
}

pub fn read_wav(path: &Path) -> Result<AudioBuffer, AppError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let samples = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let scale = int_scale(spec.bits_per_sample);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(AudioBuffer::new(samples, spec.sample_rate, spec.channels, spec.bits_per_sample))
}

/// Writes integer PCM at the buffer's bit depth (8, 16, 24 or 32).
pub fn write_wav(path: &Path, audio: &AudioBuffer) -> Result<(), AppError> {
    if !matches!(audio.bits_per_sample, 8 | 16 | 24 | 32) {
        return Err(AppError::InvalidInput(format!(
            "unsupported bit depth {}",
            audio.bits_per_sample
        )));
    }
    let spec = WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate,
        bits_per_sample: audio.bits_per_sample,
        sample_format: SampleFormat::Int,
    };
    let scale = int_scale(audio.bits_per_sample);
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in &audio.samples {
        let value = (sample * scale).round().clamp(-scale, scale - 1.0);
        writer.write_sample(value as i32)?;
    }
    writer.finalize()?;
    Ok(())
}

fn int_scale(bits_per_sample: u16) -> f32 {
    (1u64 << (bits_per_sample.clamp(1, 32) - 1)) as f32
}
