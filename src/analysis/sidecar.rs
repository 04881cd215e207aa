//! Analyzer backed by JSON files the external analyzer already wrote

use super::traits::StructureAnalyzer;
use crate::model::UpstreamAnalysis;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Reads `<results>/<stem>/<stem>.json`, or `<stem>.json` beside the audio
pub struct SidecarAnalyzer {
    results_dir: Option<PathBuf>,
}

impl SidecarAnalyzer {
    /// Only look beside the audio file
    pub fn new() -> Self {
        Self { results_dir: None }
    }

    /// Look in the analyzer's results directory first
    pub fn with_results_dir(mut self, dir: PathBuf) -> Self {
        self.results_dir = Some(dir);
        self
    }

    /// Sidecar locations for `audio_path`, in lookup order
    pub fn candidate_paths(&self, audio_path: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        let Some(stem) = audio_path.file_stem() else {
            return candidates;
        };
        let file_name = format!("{}.json", stem.to_string_lossy());

        if let Some(results) = &self.results_dir {
            candidates.push(results.join(stem).join(&file_name));
        }
        candidates.push(audio_path.with_file_name(&file_name));
        candidates
    }
}

impl Default for SidecarAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureAnalyzer for SidecarAnalyzer {
    fn analyze(&self, audio_path: &Path) -> Result<UpstreamAnalysis> {
        let candidates = self.candidate_paths(audio_path);
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .with_context(|| format!("No analysis found for {:?} (looked in {:?})", audio_path, candidates))?;

        log::debug!("Reading analysis sidecar: {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis file: {:?}", path))?;
        let mut analysis: UpstreamAnalysis = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse analysis file: {:?}", path))?;

        // The audio we were asked about is authoritative for duration probing
        if analysis.file_path.is_none() {
            analysis.file_path = Some(audio_path.display().to_string());
        }
        Ok(analysis)
    }
}
