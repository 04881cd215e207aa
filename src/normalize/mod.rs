//! Upstream analysis normalization
//!
//! Turns whatever the structure analyzer produced into a complete
//! [`AnalysisRecord`]. Nothing in here fails: every absent or malformed
//! field is backfilled with a deterministic placeholder.

mod duration;
mod events;
mod identity;
mod segments;
mod stems;

pub use duration::{DurationResolver, DurationSource, DurationSources, ResolvedDuration};
pub use events::{
    backfill_beats, backfill_downbeats, beat_grid, is_plausible_bpm, BEATS_PER_BAR, MAX_BPM, MIN_BPM,
};
pub use identity::{derive_track_id, is_valid_track_id, normalize_name};
pub use segments::{normalize_segments, Segmentation, PLACEHOLDER_LABEL};
pub use stems::{StemAssembler, StemEnvelopes};

use crate::audio::BandEnergyExtractor;
use crate::export::ConvertConfig;
use crate::model::{AnalysisRecord, EventSet, Scores, UpstreamAnalysis, UpstreamEvents, UpstreamScores};
use crate::scoring::Scorer;
use std::path::Path;

/// Longest track accepted from any duration source, in seconds
pub const MAX_DURATION: f64 = 24.0 * 60.0 * 60.0;

fn is_plausible_duration(seconds: f64) -> bool {
    seconds > 0.0 && seconds <= MAX_DURATION
}

/// Where one track's inputs live
#[derive(Debug, Clone, Copy)]
pub struct TrackContext<'a> {
    /// The analysis JSON (or audio file) the record is built from
    pub metadata_path: &'a Path,

    /// Name used for output files and earlier-run artifacts
    pub track_name: &'a str,

    /// Directory holding `bass.wav`, `drums.wav`, `other.wav`, `vocals.wav`
    pub stems_dir: &'a Path,
}

/// Builds canonical records from upstream analyses
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: ConvertConfig,
    resolver: DurationResolver,
    stems: StemAssembler,
    scorer: Scorer,
}

impl Normalizer {
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            config: config.clone(),
            resolver: DurationResolver::new(config),
            stems: StemAssembler::new(BandEnergyExtractor::new(), config.nav_stride),
            scorer: Scorer::new(config.beat_tolerance, config.segment_tolerance),
        }
    }

    /// Replace the duration resolver (e.g. to pin its working directory)
    pub fn with_resolver(mut self, resolver: DurationResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Build the canonical record for one track
    pub fn normalize(&self, analysis: &UpstreamAnalysis, ctx: &TrackContext) -> AnalysisRecord {
        let legacy = analysis.inferences.clone().unwrap_or_default();

        let beats = non_empty(analysis.beats.clone())
            .or_else(|| non_empty(legacy.beats.clone()))
            .unwrap_or_default();
        let downbeats = non_empty(analysis.downbeats.clone())
            .or_else(|| non_empty(legacy.downbeats.clone()))
            .unwrap_or_default();

        let segmentation = if analysis.segments.is_empty() {
            normalize_segments(&legacy.segments, legacy.labels.as_deref())
        } else {
            normalize_segments(&analysis.segments, analysis.labels.as_deref())
        };

        let bpm = analysis.bpm.or_else(|| {
            analysis
                .scores
                .as_ref()
                .and_then(|s| s.beat.as_ref())
                .and_then(|b| b.bpm)
        });

        let audio_ref = analysis
            .file_path
            .as_deref()
            .or(analysis.file_name.as_deref())
            .map(Path::new);

        let duration = self.resolve_duration(analysis, ctx, audio_ref, &beats, &segmentation);

        let beats = backfill_beats(beats, bpm, self.config.default_bpm, duration);
        let downbeats = backfill_downbeats(downbeats, &beats);

        let inferences = EventSet {
            beats,
            downbeats,
            segments: segmentation.boundaries,
            labels: segmentation.labels,
        };

        let truths = match analysis.truths.as_ref().filter(|t| !t.is_empty()) {
            Some(truths) => normalize_truths(truths),
            None => inferences.clone(),
        };

        let scores = if truths == inferences {
            supplied_scores(analysis.scores.as_ref())
        } else {
            log::info!("Truths differ from inferences for {}, scoring", ctx.track_name);
            self.scorer.score(&inferences, &truths)
        };

        let id = self.track_id(analysis, ctx, audio_ref);

        let wav_frames = self.config.wav_frames.resolve(duration);
        let nav_frames = self.config.nav_frames.resolve(duration);
        let envelopes = self.stems.assemble(ctx.stems_dir, wav_frames, nav_frames);

        log::info!(
            "Normalized {}: id={}, duration={:.2}s, {} beats, {} segments, wav={} nav={} frames",
            ctx.track_name,
            id,
            duration,
            inferences.beats.len(),
            inferences.labels.len(),
            wav_frames,
            nav_frames
        );

        AnalysisRecord {
            nav: envelopes.nav,
            wav: envelopes.wav,
            duration,
            scores,
            id,
            inferences,
            truths,
        }
    }

    /// Upstream value, else measured sources, else the last segment
    /// boundary, else the configured default
    fn resolve_duration(
        &self,
        analysis: &UpstreamAnalysis,
        ctx: &TrackContext,
        audio_ref: Option<&Path>,
        beats: &[f64],
        segmentation: &Segmentation,
    ) -> f64 {
        match analysis.duration {
            Some(duration) if is_plausible_duration(duration) => return duration,
            Some(duration) if duration > 0.0 => {
                log::warn!("Ignoring implausible duration {}s for {}", duration, ctx.track_name)
            }
            _ => {}
        }

        let sources = DurationSources {
            audio_ref,
            metadata_path: ctx.metadata_path,
            stems_dir: ctx.stems_dir,
            track_name: ctx.track_name,
            beats,
        };
        if let Some(resolved) = self
            .resolver
            .resolve_measured(&sources)
            .filter(|r| is_plausible_duration(r.seconds))
        {
            return resolved.seconds;
        }

        if let Some(last) = segmentation
            .last_boundary()
            .filter(|&b| is_plausible_duration(b))
        {
            log::warn!(
                "Estimating duration of {} from last segment boundary {:.2}s",
                ctx.track_name,
                last
            );
            return last;
        }

        log::warn!(
            "No duration source for {}, using default {:.1}s",
            ctx.track_name,
            self.config.default_duration
        );
        self.config.default_duration
    }

    fn track_id(&self, analysis: &UpstreamAnalysis, ctx: &TrackContext, audio_ref: Option<&Path>) -> String {
        if let Some(id) = analysis.id.as_deref() {
            if is_valid_track_id(id) && self.config.id_tag.is_none() {
                return id.to_string();
            }
            return derive_track_id(id, self.config.id_tag);
        }

        let stem = audio_ref
            .and_then(Path::file_stem)
            .and_then(|s| s.to_str())
            .unwrap_or(ctx.track_name);
        derive_track_id(stem, self.config.id_tag)
    }
}

fn non_empty(values: Option<Vec<f64>>) -> Option<Vec<f64>> {
    values.filter(|v| !v.is_empty())
}

fn normalize_truths(truths: &UpstreamEvents) -> EventSet {
    let segmentation = normalize_segments(&truths.segments, truths.labels.as_deref());
    EventSet {
        beats: truths.beats.clone().unwrap_or_default(),
        downbeats: truths.downbeats.clone().unwrap_or_default(),
        segments: segmentation.boundaries,
        labels: segmentation.labels,
    }
}

/// Scores carried by the input, any missing entry defaulted to 1.0
fn supplied_scores(scores: Option<&UpstreamScores>) -> Scores {
    let mut result = Scores::perfect();
    let Some(scores) = scores else {
        return result;
    };

    if let Some(f1) = scores.beat.as_ref().and_then(|b| b.f1) {
        result.beat.f1 = f1;
    }
    if let Some(f1) = scores.downbeat.as_ref().and_then(|b| b.f1) {
        result.downbeat.f1 = f1;
    }
    if let Some(segment) = scores.segment.as_ref() {
        if let Some(f) = segment.f_measure {
            result.segment.f_measure = f;
        }
        if let Some(f) = segment.pairwise_f_measure {
            result.segment.pairwise_f_measure = f;
        }
    }
    result
}
