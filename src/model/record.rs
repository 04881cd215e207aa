use super::envelope::StemEnvelopeSet;
use serde::{Deserialize, Serialize};

/// Canonical per-track record consumed by the visualization front end
///
/// Field order matches the layout the front end was built against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Coarse navigation envelopes
    pub nav: StemEnvelopeSet,

    /// Fine-grained envelopes
    pub wav: StemEnvelopeSet,

    /// Track duration in seconds (always > 0)
    pub duration: f64,

    /// Quality metrics comparing `inferences` against `truths`
    pub scores: Scores,

    /// Track identifier, `NNNN_name`
    pub id: String,

    /// Analyzer output
    pub inferences: EventSet,

    /// Reference annotations (a copy of `inferences` when none were supplied)
    pub truths: EventSet,
}

/// Timed musical events for one track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSet {
    /// Beat times in seconds
    pub beats: Vec<f64>,

    /// Downbeat times in seconds
    pub downbeats: Vec<f64>,

    /// Segment boundaries in seconds, ascending, closing boundary included
    pub segments: Vec<f64>,

    /// One label per interval between consecutive boundaries
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    pub beat: EventScore,
    pub downbeat: EventScore,
    pub segment: SegmentScore,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventScore {
    pub f1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    /// Boundary hit rate within a 0.5 s window
    #[serde(rename = "F-measure@0.5")]
    pub f_measure: f64,

    /// Frame-pair label agreement
    #[serde(rename = "Pairwise F-measure")]
    pub pairwise_f_measure: f64,
}

impl Scores {
    /// Scores for a track whose truths are a copy of its inferences
    pub fn perfect() -> Self {
        Self {
            beat: EventScore { f1: 1.0 },
            downbeat: EventScore { f1: 1.0 },
            segment: SegmentScore {
                f_measure: 1.0,
                pairwise_f_measure: 1.0,
            },
        }
    }
}

impl Default for Scores {
    fn default() -> Self {
        Self::perfect()
    }
}
