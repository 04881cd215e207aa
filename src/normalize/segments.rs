//! Segment boundary normalization

use crate::model::SegmentsInput;

/// Label given to intervals the analyzer left unlabelled
pub const PLACEHOLDER_LABEL: &str = "unknown";

/// Flat boundary list with one label per interval
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Segmentation {
    pub boundaries: Vec<f64>,
    pub labels: Vec<String>,
}

impl Segmentation {
    pub fn last_boundary(&self) -> Option<f64> {
        self.boundaries.last().copied()
    }
}

/// Convert any upstream segment encoding to boundaries plus labels
///
/// `external_labels` is the separate label list some shapes carry next to
/// pair or flat segments; object segments use their own labels first.
pub fn normalize_segments(input: &SegmentsInput, external_labels: Option<&[String]>) -> Segmentation {
    let external = external_labels.unwrap_or(&[]);

    let (mut boundaries, labels) = match input {
        SegmentsInput::Objects(segments) => {
            let spans = segments
                .iter()
                .enumerate()
                .filter_map(|(i, segment)| {
                    let Some(start) = segment.start else {
                        log::warn!("Skipping segment {} without a start time", i);
                        return None;
                    };
                    let label = segment.label.clone().or_else(|| external.get(i).cloned());
                    Some(Span {
                        start,
                        end: segment.end,
                        label,
                    })
                })
                .collect();
            spans_to_boundaries(spans)
        }
        SegmentsInput::Pairs(pairs) => {
            let spans = pairs
                .iter()
                .enumerate()
                .filter_map(|(i, pair)| {
                    Some(Span {
                        start: *pair.first()?,
                        end: pair.get(1).copied(),
                        label: external.get(i).cloned(),
                    })
                })
                .collect();
            spans_to_boundaries(spans)
        }
        SegmentsInput::Flat(times) => (times.clone(), external.to_vec()),
    };

    if !boundaries.windows(2).all(|w| w[0] <= w[1]) {
        log::warn!("Segment boundaries out of order, sorting {} boundaries", boundaries.len());
        boundaries.sort_by(f64::total_cmp);
    }

    let labels = fit_labels(labels, boundaries.len().saturating_sub(1));

    Segmentation { boundaries, labels }
}

/// One labelled segment before flattening
struct Span {
    start: f64,
    end: Option<f64>,
    label: Option<String>,
}

/// Order spans by start, keeping each label with its span, and close the
/// list with the end of the latest span
fn spans_to_boundaries(mut spans: Vec<Span>) -> (Vec<f64>, Vec<String>) {
    if !spans.windows(2).all(|w| w[0].start <= w[1].start) {
        log::warn!("Segments out of order, sorting {} segments by start", spans.len());
        spans.sort_by(|a, b| a.start.total_cmp(&b.start));
    }

    let mut boundaries: Vec<f64> = spans.iter().map(|s| s.start).collect();
    if let Some(end) = spans.last().and_then(|s| s.end) {
        boundaries.push(end);
    }
    let labels = spans
        .into_iter()
        .map(|s| s.label.unwrap_or_else(|| PLACEHOLDER_LABEL.to_string()))
        .collect();
    (boundaries, labels)
}

/// Truncate or pad `labels` to exactly `intervals` entries
fn fit_labels(mut labels: Vec<String>, intervals: usize) -> Vec<String> {
    if labels.len() != intervals {
        log::debug!(
            "Fitting {} segment labels to {} intervals",
            labels.len(),
            intervals
        );
    }
    labels.truncate(intervals);
    labels.resize(intervals, PLACEHOLDER_LABEL.to_string());
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SegmentObject;

    fn obj(start: f64, end: f64, label: &str) -> SegmentObject {
        SegmentObject {
            start: Some(start),
            end: Some(end),
            label: Some(label.to_string()),
        }
    }

    #[test]
    fn test_object_segments() {
        let input = SegmentsInput::Objects(vec![obj(0.0, 10.0, "intro"), obj(10.0, 20.0, "verse")]);
        let seg = normalize_segments(&input, None);
        assert_eq!(seg.boundaries, vec![0.0, 10.0, 20.0]);
        assert_eq!(seg.labels, vec!["intro", "verse"]);
    }

    #[test]
    fn test_pair_segments_take_first_element_and_close() {
        let input = SegmentsInput::Pairs(vec![vec![0.0, 12.5], vec![12.5, 30.0]]);
        let labels = vec!["intro".to_string(), "chorus".to_string()];
        let seg = normalize_segments(&input, Some(&labels));
        assert_eq!(seg.boundaries, vec![0.0, 12.5, 30.0]);
        assert_eq!(seg.labels, labels);
    }

    #[test]
    fn test_flat_segments_pass_through() {
        let input = SegmentsInput::Flat(vec![0.0, 5.0, 9.0]);
        let seg = normalize_segments(&input, None);
        assert_eq!(seg.boundaries, vec![0.0, 5.0, 9.0]);
        assert_eq!(seg.labels, vec![PLACEHOLDER_LABEL, PLACEHOLDER_LABEL]);
    }

    #[test]
    fn test_missing_labels_are_placeholders() {
        let input = SegmentsInput::Objects(vec![
            SegmentObject {
                start: Some(0.0),
                end: Some(4.0),
                label: None,
            },
            obj(4.0, 8.0, "verse"),
        ]);
        let seg = normalize_segments(&input, None);
        assert_eq!(seg.labels, vec![PLACEHOLDER_LABEL, "verse"]);
    }

    #[test]
    fn test_missing_closing_boundary_drops_trailing_label() {
        let input = SegmentsInput::Objects(vec![
            obj(0.0, 10.0, "intro"),
            SegmentObject {
                start: Some(10.0),
                end: None,
                label: Some("outro".to_string()),
            },
        ]);
        let seg = normalize_segments(&input, None);
        assert_eq!(seg.boundaries, vec![0.0, 10.0]);
        assert_eq!(seg.labels, vec!["intro"]);
    }

    #[test]
    fn test_unsorted_flat_boundaries_are_sorted() {
        let seg = normalize_segments(&SegmentsInput::Flat(vec![10.0, 0.0, 5.0]), None);
        assert_eq!(seg.boundaries, vec![0.0, 5.0, 10.0]);
    }

    #[test]
    fn test_unordered_objects_keep_labels_with_intervals() {
        let input = SegmentsInput::Objects(vec![obj(10.0, 20.0, "verse"), obj(0.0, 10.0, "intro")]);
        let seg = normalize_segments(&input, None);
        assert_eq!(seg.boundaries, vec![0.0, 10.0, 20.0]);
        assert_eq!(seg.labels, vec!["intro", "verse"]);
    }

    #[test]
    fn test_unordered_pairs_keep_external_labels_with_intervals() {
        let input = SegmentsInput::Pairs(vec![vec![30.0, 45.0], vec![0.0, 30.0]]);
        let labels = vec!["outro".to_string(), "intro".to_string()];
        let seg = normalize_segments(&input, Some(&labels));
        assert_eq!(seg.boundaries, vec![0.0, 30.0, 45.0]);
        assert_eq!(seg.labels, vec!["intro", "outro"]);
    }

    #[test]
    fn test_empty_input() {
        let seg = normalize_segments(&SegmentsInput::default(), None);
        assert!(seg.boundaries.is_empty());
        assert!(seg.labels.is_empty());
    }
}
