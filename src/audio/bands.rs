//! Three-band energy envelopes
//!
//! A coarse low/mid/high split of the STFT magnitude, used to colour the
//! per-stem waveforms in the front end:
//! 1. STFT magnitude with a hop chosen so the frame count is close to the
//!    requested length (`hop = len / frames`, at least 1)
//! 2. Frequency bins cut into three equal contiguous thirds
//! 3. Mean magnitude per band per frame
//! 4. Each curve scaled by its own peak to `0..=255`
//! 5. Each curve resampled to exactly the requested length

use super::decode::decode_to_mono;
use super::resample::resample_bytes;
use crate::model::Envelope;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use std::f32::consts::PI;
use std::path::Path;

/// Default analysis window, matching the usual 2048-point STFT
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Computes [`Envelope`]s from mono signals
#[derive(Debug, Clone)]
pub struct BandEnergyExtractor {
    fft_size: usize,
}

impl BandEnergyExtractor {
    pub fn new() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
        }
    }

    /// Use a different STFT window length (clamped to at least 2)
    pub fn with_fft_size(mut self, fft_size: usize) -> Self {
        self.fft_size = fft_size.max(2);
        self
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Decode `path` and extract an envelope of `frames` points
    ///
    /// Never fails: an unreadable file yields a zero envelope.
    pub fn extract_file(&self, path: &Path, frames: usize) -> Envelope {
        match decode_to_mono(path) {
            Ok(signal) => self.extract(&signal.samples, frames),
            Err(e) => {
                log::warn!("Band extraction failed for {:?}: {}", path, e);
                Envelope::zeros(frames)
            }
        }
    }

    /// Extract an envelope of exactly `frames` points from `samples`
    pub fn extract(&self, samples: &[f32], frames: usize) -> Envelope {
        if frames == 0 {
            return Envelope::zeros(0);
        }
        if samples.is_empty() {
            return Envelope::zeros(frames);
        }

        let hop = (samples.len() / frames).max(1);
        let [low, mid, high] = self.band_curves(samples, hop);

        Envelope {
            low: resample_bytes(&normalize_to_byte(&low), frames),
            mid: resample_bytes(&normalize_to_byte(&mid), frames),
            high: resample_bytes(&normalize_to_byte(&high), frames),
        }
    }

    /// Mean STFT magnitude of each frequency third, one value per frame
    fn band_curves(&self, samples: &[f32], hop: usize) -> [Vec<f32>; 3] {
        let n_fft = self.fft_size;
        let bins = n_fft / 2 + 1;
        let low_end = bins / 3;
        let mid_end = 2 * bins / 3;

        // Centered frames: the signal is zero-padded by half a window each side
        let pad = n_fft / 2;
        let frame_count = 1 + samples.len() / hop;

        let window = hann_window(n_fft);
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];

        let mut curves = [
            Vec::with_capacity(frame_count),
            Vec::with_capacity(frame_count),
            Vec::with_capacity(frame_count),
        ];

        for frame in 0..frame_count {
            let center = frame * hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let sample = (center + i)
                    .checked_sub(pad)
                    .and_then(|idx| samples.get(idx))
                    .copied()
                    .filter(|s| s.is_finite())
                    .unwrap_or(0.0);
                *slot = Complex::new(sample * window[i], 0.0);
            }

            fft.process_with_scratch(&mut buffer, &mut scratch);

            let magnitudes = buffer[..bins].iter().map(|c| c.norm());
            let mut sums = [0.0f32; 3];
            for (bin, mag) in magnitudes.enumerate() {
                let band = if bin < low_end {
                    0
                } else if bin < mid_end {
                    1
                } else {
                    2
                };
                sums[band] += mag;
            }

            let widths = [low_end, mid_end - low_end, bins - mid_end];
            for band in 0..3 {
                let mean = if widths[band] > 0 {
                    sums[band] / widths[band] as f32
                } else {
                    0.0
                };
                curves[band].push(mean);
            }
        }

        curves
    }
}

impl Default for BandEnergyExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Periodic Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / size as f32).cos())
        .collect()
}

/// Scale a curve by its own peak into `0..=255`, truncating
fn normalize_to_byte(curve: &[f32]) -> Vec<u8> {
    let peak = curve.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return vec![0; curve.len()];
    }
    curve
        .iter()
        .map(|&v| ((v / peak) * 255.0).clamp(0.0, 255.0) as u8)
        .collect()
}
