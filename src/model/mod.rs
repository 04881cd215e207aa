//! Data model for the canonical analysis record
//!
//! `record` and `envelope` describe what the visualization front end reads;
//! `upstream` describes what the structure analyzer writes.

mod envelope;
mod record;
mod upstream;

pub use envelope::{Envelope, Stem, StemEnvelopeSet};
pub use record::{AnalysisRecord, EventScore, EventSet, Scores, SegmentScore};
pub use upstream::{
    SegmentObject, SegmentsInput, UpstreamAnalysis, UpstreamBeatScore, UpstreamEvents,
    UpstreamScores, UpstreamSegmentScore,
};
