//! Conversion pipeline orchestration

use super::config::ConvertConfig;
use super::organizer::OutputOrganizer;
use crate::analysis::StructureAnalyzer;
use crate::model::{AnalysisRecord, UpstreamAnalysis};
use crate::normalize::{Normalizer, TrackContext};
use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One converted track
#[derive(Debug, Clone)]
pub struct ConvertOutput {
    pub track_name: String,
    pub record: AnalysisRecord,
    /// Record files written, gzip first
    pub written: Vec<PathBuf>,
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    /// Failed inputs with the error chain rendered as text
    pub failures: Vec<(PathBuf, String)>,
}

impl BatchSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Main conversion pipeline
pub struct ConvertPipeline<A: StructureAnalyzer> {
    config: ConvertConfig,
    organizer: OutputOrganizer,
    normalizer: Normalizer,
    analyzer: A,
}

impl<A: StructureAnalyzer> ConvertPipeline<A> {
    /// Create a new pipeline and its output directories
    pub fn new(config: ConvertConfig, analyzer: A) -> Result<Self> {
        let organizer = OutputOrganizer::new(config.output_dir.clone());
        organizer.init()?;
        let normalizer = Normalizer::new(&config);

        Ok(Self {
            config,
            organizer,
            normalizer,
            analyzer,
        })
    }

    /// Replace the normalizer (e.g. one with a pinned working directory)
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn organizer(&self) -> &OutputOrganizer {
        &self.organizer
    }

    /// Convert an analysis JSON written by the external analyzer
    pub fn convert_file(&self, json_path: &Path) -> Result<ConvertOutput> {
        let content = fs::read_to_string(json_path)
            .with_context(|| format!("Failed to read analysis file: {:?}", json_path))?;
        let analysis: UpstreamAnalysis = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse analysis file: {:?}", json_path))?;

        let track_name = track_name_of(json_path)?;
        self.convert_analysis(&analysis, json_path, &track_name)
    }

    /// Ask the analyzer about an audio file, then convert its answer
    pub fn convert_audio(&self, audio_path: &Path) -> Result<ConvertOutput> {
        let analysis = self
            .analyzer
            .analyze(audio_path)
            .with_context(|| format!("Failed to analyze track: {:?}", audio_path))?;

        let track_name = track_name_of(audio_path)?;
        self.convert_analysis(&analysis, audio_path, &track_name)
    }

    /// Normalize an already-parsed analysis and write the record
    pub fn convert_analysis(
        &self,
        analysis: &UpstreamAnalysis,
        metadata_path: &Path,
        track_name: &str,
    ) -> Result<ConvertOutput> {
        let record = self.build_record(analysis, metadata_path, track_name);
        let written = self.write_record(track_name, &record)?;

        Ok(ConvertOutput {
            track_name: track_name.to_string(),
            record,
            written,
        })
    }

    /// Build the canonical record without touching the output directory
    pub fn build_record(
        &self,
        analysis: &UpstreamAnalysis,
        metadata_path: &Path,
        track_name: &str,
    ) -> AnalysisRecord {
        let stems_dir = self.stems_dir_for(metadata_path);
        let ctx = TrackContext {
            metadata_path,
            track_name,
            stems_dir: &stems_dir,
        };
        self.normalizer.normalize(analysis, &ctx)
    }

    /// Write `data/<track>.json.gz` and/or `data/<track>.json`
    pub fn write_record(&self, track_name: &str, record: &AnalysisRecord) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        if self.config.write_gzip {
            let path = self.organizer.record_gz_path(track_name);
            write_gzip(&path, record)?;
            log::info!("Wrote {:?}", path);
            written.push(path);
        }

        if self.config.write_plain_json {
            let path = self.organizer.record_json_path(track_name);
            write_plain(&path, record)?;
            log::info!("Wrote {:?}", path);
            written.push(path);
        }

        if written.is_empty() {
            log::warn!("Both outputs disabled, nothing written for {}", track_name);
        }
        Ok(written)
    }

    /// Convert every input; `.json` files are analyses, anything else audio
    ///
    /// A failing input is logged and recorded; the rest still run.
    pub fn convert_batch(&self, inputs: &[PathBuf]) -> BatchSummary
    where
        A: Sync,
    {
        log::info!("Converting {} inputs", inputs.len());

        let results: Vec<(PathBuf, Result<ConvertOutput>)> = inputs
            .par_iter()
            .map(|input| (input.clone(), self.convert_input(input)))
            .collect();

        let mut summary = BatchSummary {
            attempted: results.len(),
            ..Default::default()
        };

        for (input, result) in results {
            match result {
                Ok(output) => {
                    log::debug!("Converted {:?} as {}", input, output.record.id);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    log::error!("Failed to convert {:?}: {:#}", input, e);
                    summary.failures.push((input, format!("{:#}", e)));
                }
            }
        }

        log::info!(
            "Batch complete: {}/{} converted",
            summary.succeeded,
            summary.attempted
        );
        summary
    }

    fn convert_input(&self, input: &Path) -> Result<ConvertOutput> {
        if is_json(input) {
            self.convert_file(input)
        } else {
            self.convert_audio(input)
        }
    }

    fn stems_dir_for(&self, metadata_path: &Path) -> PathBuf {
        match &self.config.stems_dir {
            Some(dir) => dir.clone(),
            None => metadata_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("stems"),
        }
    }
}

pub(crate) fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

fn track_name_of(path: &Path) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Cannot derive a track name from {:?}", path))?;
    Ok(stem.to_string())
}

fn write_gzip(path: &Path, record: &AnalysisRecord) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
    serde_json::to_writer(&mut encoder, record)
        .with_context(|| format!("Failed to serialize record to {:?}", path))?;
    encoder
        .finish()
        .and_then(|mut inner| inner.flush())
        .with_context(|| format!("Failed to finish gzip stream {:?}", path))?;
    Ok(())
}

fn write_plain(path: &Path, record: &AnalysisRecord) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, record)
        .with_context(|| format!("Failed to serialize record to {:?}", path))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
