//! Audio decoding to mono PCM using symphonia

use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to open audio file {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to probe audio format {path}: {message}")]
    Probe { path: String, message: String },
    #[error("No audio track found in {0}")]
    NoTrack(String),
    #[error("No sample rate in audio track of {0}")]
    NoSampleRate(String),
    #[error("Failed to create audio decoder: {0}")]
    Decoder(String),
    #[error("No decodable samples in {0}")]
    Empty(String),
}

/// Mono PCM signal with its sample rate
#[derive(Debug, Clone)]
pub struct MonoSignal {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoSignal {
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Decode an audio file to mono f32 samples, averaging channels
pub fn decode_to_mono(path: &Path) -> Result<MonoSignal, DecodeError> {
    let (mut format, track_id, sample_rate) = open_format(path)?;

    let codec_params = format
        .tracks()
        .iter()
        .find(|t| t.id == track_id)
        .map(|t| t.codec_params.clone())
        .ok_or_else(|| DecodeError::NoTrack(path.display().to_string()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Decoder(e.to_string()))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                log::warn!("Error reading packet: {:?}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("Error decoding packet: {:?}", e);
                continue;
            }
        };

        let spec = *decoded.spec();
        let capacity = decoded.capacity() as u64;

        let mut sample_buf = SampleBuffer::<f32>::new(capacity, spec);
        sample_buf.copy_interleaved_ref(decoded);

        let samples = sample_buf.samples();

        let channels = spec.channels.count();
        if channels > 1 {
            for chunk in samples.chunks(channels) {
                let mono: f32 = chunk.iter().sum::<f32>() / channels as f32;
                all_samples.push(mono);
            }
        } else {
            all_samples.extend_from_slice(samples);
        }
    }

    if all_samples.is_empty() {
        return Err(DecodeError::Empty(path.display().to_string()));
    }

    log::debug!(
        "Decoded {} samples ({:.1}s) at {}Hz from {:?}",
        all_samples.len(),
        all_samples.len() as f32 / sample_rate as f32,
        sample_rate,
        path
    );

    Ok(MonoSignal {
        samples: all_samples,
        sample_rate,
    })
}

/// Measure the playable length of an audio file
///
/// Uses the container's frame count when present, decodes the whole stream
/// when it is not, and finally asks lofty for the tagged properties.
pub fn probe_duration(path: &Path) -> Result<Duration, DecodeError> {
    match header_duration(path) {
        Ok(Some(duration)) => return Ok(duration),
        Ok(None) => {}
        Err(e) => log::debug!("Header probe failed for {:?}: {}", path, e),
    }

    match decode_to_mono(path) {
        Ok(signal) => return Ok(Duration::from_secs_f64(signal.duration_secs())),
        Err(e) => log::debug!("Full decode failed for {:?}: {}", path, e),
    }

    properties_duration(path)
}

fn header_duration(path: &Path) -> Result<Option<Duration>, DecodeError> {
    let (format, track_id, sample_rate) = open_format(path)?;

    let n_frames = format
        .tracks()
        .iter()
        .find(|t| t.id == track_id)
        .and_then(|t| t.codec_params.n_frames);

    Ok(n_frames
        .filter(|&n| n > 0)
        .map(|n| Duration::from_secs_f64(n as f64 / sample_rate as f64)))
}

fn properties_duration(path: &Path) -> Result<Duration, DecodeError> {
    use lofty::prelude::*;

    let tagged = lofty::read_from_path(path).map_err(|e| DecodeError::Probe {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let duration = tagged.properties().duration();
    if duration.is_zero() {
        return Err(DecodeError::Empty(path.display().to_string()));
    }
    Ok(duration)
}

fn open_format(path: &Path) -> Result<(Box<dyn FormatReader>, u32, u32), DecodeError> {
    let file = std::fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Probe {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoTrack(path.display().to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|&sr| sr > 0)
        .ok_or_else(|| DecodeError::NoSampleRate(path.display().to_string()))?;

    Ok((format, track_id, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_requires_file() {
        let result = decode_to_mono(Path::new("/nonexistent/file.wav"));
        assert!(matches!(result, Err(DecodeError::Open { .. })));
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        assert!(probe_duration(&path).is_err());
    }

    #[test]
    fn test_mono_signal_duration() {
        let signal = MonoSignal {
            samples: vec![0.0; 22050],
            sample_rate: 44100,
        };
        assert!((signal.duration_secs() - 0.5).abs() < 1e-9);
    }
}
