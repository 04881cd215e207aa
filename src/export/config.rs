//! Conversion configuration

use crate::scoring::{BEAT_TOLERANCE, SEGMENT_TOLERANCE};
use std::path::PathBuf;

/// Upper bound on any envelope length
pub const MAX_FRAMES: usize = 1_000_000;

/// Envelope length for one resolution tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameCount {
    /// Same length for every track
    Fixed(usize),

    /// Proportional to the track duration (frames per second)
    PerSecond(f64),
}

impl FrameCount {
    /// Frame count for a track of `duration` seconds, within `1..=MAX_FRAMES`
    pub fn resolve(&self, duration: f64) -> usize {
        let frames = match *self {
            FrameCount::Fixed(n) => n,
            // float-to-int casts saturate; NaN becomes 0
            FrameCount::PerSecond(rate) => (duration * rate) as usize,
        };
        frames.clamp(1, MAX_FRAMES)
    }
}

/// Configuration for converting analyzer output into canonical records
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    /// Output root; records go to `data/`, prior artifacts live in
    /// `mixdown/` and `demixed/`
    pub output_dir: PathBuf,

    /// Stem directory override (None = `stems/` beside the analysis JSON)
    pub stems_dir: Option<PathBuf>,

    /// Length of the fine-grained `wav` envelopes
    pub wav_frames: FrameCount,

    /// Length of the coarse `nav` envelopes
    pub nav_frames: FrameCount,

    /// Keep every n-th sample before extracting `nav` envelopes
    pub nav_stride: usize,

    /// Matching window for beats and downbeats (seconds)
    pub beat_tolerance: f64,

    /// Matching window for segment boundaries (seconds)
    pub segment_tolerance: f64,

    /// Tempo assumed when neither beats nor BPM are available
    pub default_bpm: f64,

    /// Duration used when no other source is available (seconds)
    pub default_duration: f64,

    /// Ratio of track length to last detected beat
    pub trailing_margin: f64,

    /// Extra directories searched for the original audio, relative to the
    /// working directory and to the analysis file's grandparent
    pub sample_data_dirs: Vec<PathBuf>,

    /// Numeric id prefix (None = reuse an existing `NNNN_` prefix or hash)
    pub id_tag: Option<u16>,

    /// Write `data/<track>.json.gz`
    pub write_gzip: bool,

    /// Write `data/<track>.json`
    pub write_plain_json: bool,
}

impl ConvertConfig {
    /// Create a new configuration writing under `output_dir`
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            stems_dir: None,
            wav_frames: FrameCount::PerSecond(100.0),
            nav_frames: FrameCount::Fixed(1000),
            nav_stride: 5,
            beat_tolerance: BEAT_TOLERANCE,
            segment_tolerance: SEGMENT_TOLERANCE,
            default_bpm: 120.0,
            default_duration: 240.0,
            trailing_margin: 1.17,
            sample_data_dirs: vec![PathBuf::from("module").join("sample_data")],
            id_tag: None,
            write_gzip: true,
            write_plain_json: true,
        }
    }

    /// Read stems from a fixed directory
    pub fn with_stems_dir(mut self, stems_dir: PathBuf) -> Self {
        self.stems_dir = Some(stems_dir);
        self
    }

    /// Set the envelope lengths of both tiers
    pub fn with_resolution(mut self, wav_frames: FrameCount, nav_frames: FrameCount) -> Self {
        self.wav_frames = wav_frames;
        self.nav_frames = nav_frames;
        self
    }

    /// Set the numeric id prefix
    pub fn with_id_tag(mut self, tag: u16) -> Self {
        self.id_tag = Some(tag);
        self
    }

    /// Choose which record files are written
    pub fn with_outputs(mut self, gzip: bool, plain_json: bool) -> Self {
        self.write_gzip = gzip;
        self.write_plain_json = plain_json;
        self
    }
}
