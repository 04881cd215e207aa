//! Per-stem envelope assembly for both resolution tiers

use crate::audio::{decode_to_mono, BandEnergyExtractor};
use crate::model::{Envelope, Stem, StemEnvelopeSet};
use std::path::Path;

/// `wav` and `nav` tiers for all four stems
#[derive(Debug, Clone, PartialEq)]
pub struct StemEnvelopes {
    pub wav: StemEnvelopeSet,
    pub nav: StemEnvelopeSet,
}

/// Builds envelopes from the separator's stem files
#[derive(Debug, Clone)]
pub struct StemAssembler {
    extractor: BandEnergyExtractor,
    nav_stride: usize,
}

impl StemAssembler {
    pub fn new(extractor: BandEnergyExtractor, nav_stride: usize) -> Self {
        Self {
            extractor,
            nav_stride: nav_stride.max(1),
        }
    }

    /// Extract every stem found in `stems_dir`
    ///
    /// Missing or undecodable stems get zero envelopes of the right length.
    pub fn assemble(&self, stems_dir: &Path, wav_frames: usize, nav_frames: usize) -> StemEnvelopes {
        let mut wav = StemEnvelopeSet::zeros(wav_frames);
        let mut nav = StemEnvelopeSet::zeros(nav_frames);

        for stem in Stem::ALL {
            let path = stems_dir.join(stem.file_name());
            if !path.is_file() {
                log::warn!("Stem file not found: {:?}", path);
                continue;
            }

            log::info!("Processing stem {}: {:?}", stem.name(), path);
            let (stem_wav, stem_nav) = self.extract_tiers(&path, wav_frames, nav_frames);
            wav.set(stem, stem_wav);
            nav.set(stem, stem_nav);
        }

        StemEnvelopes { wav, nav }
    }

    /// Decode once, then extract the fine tier and the decimated coarse tier
    fn extract_tiers(&self, path: &Path, wav_frames: usize, nav_frames: usize) -> (Envelope, Envelope) {
        let signal = match decode_to_mono(path) {
            Ok(signal) => signal,
            Err(e) => {
                log::warn!("Failed to decode stem {:?}: {}", path, e);
                return (Envelope::zeros(wav_frames), Envelope::zeros(nav_frames));
            }
        };

        let wav = self.extractor.extract(&signal.samples, wav_frames);
        let decimated = decimate(&signal.samples, self.nav_stride, nav_frames);
        let nav = self.extractor.extract(&decimated, nav_frames);
        (wav, nav)
    }
}

/// Keep every `stride`-th sample; inputs of at most `min_len` samples are
/// returned whole
fn decimate(samples: &[f32], stride: usize, min_len: usize) -> Vec<f32> {
    if samples.len() <= min_len {
        return samples.to_vec();
    }
    samples.iter().step_by(stride.max(1)).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_decimate() {
        let samples: Vec<f32> = (0..20).map(|i| i as f32).collect();
        assert_eq!(decimate(&samples, 5, 10), vec![0.0, 5.0, 10.0, 15.0]);
        assert_eq!(decimate(&samples, 5, 20).len(), 20);
        // only the input length is compared, the result may be shorter
        assert_eq!(decimate(&samples, 5, 19).len(), 4);
    }

    #[test]
    fn test_missing_stems_are_zero() {
        let temp = TempDir::new().unwrap();
        let assembler = StemAssembler::new(BandEnergyExtractor::new(), 5);
        let envelopes = assembler.assemble(temp.path(), 300, 50);

        assert_eq!(envelopes.wav, StemEnvelopeSet::zeros(300));
        assert_eq!(envelopes.nav, StemEnvelopeSet::zeros(50));
    }

    #[test]
    fn test_corrupt_stem_is_zero() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("drums.wav"), b"RIFF garbage").unwrap();

        let assembler = StemAssembler::new(BandEnergyExtractor::new(), 5);
        let envelopes = assembler.assemble(temp.path(), 64, 16);
        assert_eq!(envelopes.wav.drum, Envelope::zeros(64));
        assert_eq!(envelopes.nav.frame_count(), Some(16));
    }
}
