//! Tolerance-windowed scoring of predicted events against references
//!
//! Matching is lenient: a predicted event counts as a hit when any
//! reference event lies within the tolerance window, and one reference
//! event may justify several predicted hits. This is not a one-to-one
//! assignment. Recall caps the hit count at the reference length so the
//! score stays within `[0, 1]`.

use crate::model::{EventScore, EventSet, Scores, SegmentScore};
use std::collections::HashMap;

/// Default window for beat and downbeat matching, in seconds
pub const BEAT_TOLERANCE: f64 = 0.07;
/// Default window for segment boundary matching, in seconds
pub const SEGMENT_TOLERANCE: f64 = 0.5;
/// Frame size for pairwise label comparison, in seconds
pub const PAIRWISE_FRAME: f64 = 0.1;

// Absorbs representation error so that a difference of exactly the
// tolerance (e.g. 1.07 - 1.0) still counts as inside the window.
const WINDOW_EPSILON: f64 = 1e-9;

/// F1 of `predicted` against `reference` with a `±tolerance` window
pub fn f1(predicted: &[f64], reference: &[f64], tolerance: f64) -> f64 {
    if predicted.is_empty() || reference.is_empty() {
        return 0.0;
    }
    if predicted == reference {
        return 1.0;
    }

    let window = tolerance + WINDOW_EPSILON;
    let matched = predicted
        .iter()
        .filter(|&&p| reference.iter().any(|&r| (p - r).abs() <= window))
        .count();

    if matched == 0 {
        return 0.0;
    }

    let precision = matched as f64 / predicted.len() as f64;
    let recall = matched.min(reference.len()) as f64 / reference.len() as f64;
    harmonic_mean(precision, recall)
}

/// Pairwise label agreement between two labelled segmentations
///
/// Both segmentations are sampled on a shared grid of `frame` seconds. A
/// pair of frames "agrees" in a segmentation when both frames carry the
/// same label; precision and recall compare the agreeing pairs of the
/// estimate against those of the reference.
pub fn pairwise_f_measure(
    est_bounds: &[f64],
    est_labels: &[String],
    ref_bounds: &[f64],
    ref_labels: &[String],
    frame: f64,
) -> f64 {
    if est_bounds.len() < 2 || ref_bounds.len() < 2 || frame <= 0.0 {
        return 0.0;
    }
    if est_bounds == ref_bounds && est_labels == ref_labels {
        return 1.0;
    }

    let start = est_bounds[0].min(ref_bounds[0]);
    let end = est_bounds[est_bounds.len() - 1].max(ref_bounds[ref_bounds.len() - 1]);
    let frames = ((end - start) / frame).floor() as usize;
    if frames < 2 {
        return 0.0;
    }

    let mut ref_counts: HashMap<Option<&str>, u64> = HashMap::new();
    let mut est_counts: HashMap<Option<&str>, u64> = HashMap::new();
    let mut joint_counts: HashMap<(Option<&str>, Option<&str>), u64> = HashMap::new();

    for k in 0..frames {
        let t = start + (k as f64 + 0.5) * frame;
        let r = label_at(ref_bounds, ref_labels, t);
        let e = label_at(est_bounds, est_labels, t);
        *ref_counts.entry(r).or_default() += 1;
        *est_counts.entry(e).or_default() += 1;
        *joint_counts.entry((r, e)).or_default() += 1;
    }

    let pairs = |c: u64| c * c.saturating_sub(1) / 2;
    let ref_pairs: u64 = ref_counts.values().map(|&c| pairs(c)).sum();
    let est_pairs: u64 = est_counts.values().map(|&c| pairs(c)).sum();
    let agree: u64 = joint_counts.values().map(|&c| pairs(c)).sum();

    if ref_pairs == 0 || est_pairs == 0 || agree == 0 {
        return 0.0;
    }

    let precision = agree as f64 / est_pairs as f64;
    let recall = agree as f64 / ref_pairs as f64;
    harmonic_mean(precision, recall)
}

fn label_at<'a>(bounds: &[f64], labels: &'a [String], t: f64) -> Option<&'a str> {
    let idx = bounds.windows(2).position(|w| w[0] <= t && t < w[1])?;
    Some(labels.get(idx).map(String::as_str).unwrap_or(""))
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Computes the record's quality metrics
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    pub beat_tolerance: f64,
    pub segment_tolerance: f64,
}

impl Scorer {
    pub fn new(beat_tolerance: f64, segment_tolerance: f64) -> Self {
        Self {
            beat_tolerance,
            segment_tolerance,
        }
    }

    /// Score `inferences` against `truths`
    pub fn score(&self, inferences: &EventSet, truths: &EventSet) -> Scores {
        Scores {
            beat: EventScore {
                f1: f1(&inferences.beats, &truths.beats, self.beat_tolerance),
            },
            downbeat: EventScore {
                f1: f1(&inferences.downbeats, &truths.downbeats, self.beat_tolerance),
            },
            segment: SegmentScore {
                f_measure: f1(&inferences.segments, &truths.segments, self.segment_tolerance),
                pairwise_f_measure: pairwise_f_measure(
                    &inferences.segments,
                    &inferences.labels,
                    &truths.segments,
                    &truths.labels,
                    PAIRWISE_FRAME,
                ),
            },
        }
    }
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(BEAT_TOLERANCE, SEGMENT_TOLERANCE)
    }
}
