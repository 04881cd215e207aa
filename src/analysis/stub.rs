//! Stub analyzer
//!
//! Produces no beats or segments, only a tempo. The normalizer then
//! synthesizes the beat grid and a single placeholder segmentation.

use super::traits::StructureAnalyzer;
use crate::model::UpstreamAnalysis;
use anyhow::Result;
use std::path::Path;

/// Analyzer that reports a tempo only
pub struct StubAnalyzer {
    /// Fixed BPM; None reads the file's BPM tag, if any
    bpm: Option<f64>,
}

impl StubAnalyzer {
    pub fn new() -> Self {
        Self { bpm: None }
    }

    /// Report `bpm` for every file
    pub fn with_bpm(mut self, bpm: f64) -> Self {
        self.bpm = Some(bpm);
        self
    }
}

impl Default for StubAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureAnalyzer for StubAnalyzer {
    fn analyze(&self, audio_path: &Path) -> Result<UpstreamAnalysis> {
        log::debug!("Stub analysis (tempo only) for: {:?}", audio_path);

        let bpm = self.bpm.or_else(|| read_bpm_tag(audio_path));
        match bpm {
            Some(bpm) => log::info!("Using BPM {:.1} for {:?}", bpm, audio_path),
            None => log::info!("No BPM for {:?}, grid will use the default tempo", audio_path),
        }

        Ok(UpstreamAnalysis {
            file_path: Some(audio_path.display().to_string()),
            bpm,
            ..Default::default()
        })
    }
}

/// BPM from the file's primary tag
fn read_bpm_tag(audio_path: &Path) -> Option<f64> {
    use lofty::prelude::*;

    let tagged = match lofty::read_from_path(audio_path) {
        Ok(tagged) => tagged,
        Err(e) => {
            log::debug!("No tags read from {:?}: {}", audio_path, e);
            return None;
        }
    };

    let value = tagged.primary_tag()?.get_string(&ItemKey::Bpm)?;
    value.trim().parse::<f64>().ok().filter(|bpm| *bpm > 0.0)
}
