//! Structure analyzer capability

use crate::model::UpstreamAnalysis;
use anyhow::Result;
use std::path::Path;

/// Provides beats, downbeats, segments and BPM for an audio file
///
/// Implementations decide where the analysis comes from (a results
/// directory, tags, a live model). The pipeline only sees the upstream
/// shape and normalizes it like any analysis JSON read from disk.
pub trait StructureAnalyzer {
    /// Analyze `audio_path` and return the raw upstream analysis
    fn analyze(&self, audio_path: &Path) -> Result<UpstreamAnalysis>;
}
