//! Round-trip validation of written records

use crate::model::{AnalysisRecord, EventSet, Scores, StemEnvelopeSet};
use crate::normalize::is_valid_track_id;
use anyhow::{ensure, Context, Result};
use flate2::read::GzDecoder;
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Top-level keys every record must carry
const REQUIRED_KEYS: [&str; 7] = ["nav", "wav", "duration", "scores", "id", "inferences", "truths"];

/// Re-read a `.json` or `.json.gz` record and check its invariants
pub fn validate_record(path: &Path) -> Result<AnalysisRecord> {
    log::info!("Validating record at: {:?}", path);

    let file = File::open(path).with_context(|| format!("Failed to open record: {:?}", path))?;
    let reader: Box<dyn Read> = if is_gzip(path) {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let value: Value = serde_json::from_reader(reader)
        .with_context(|| format!("Record is not valid JSON: {:?}", path))?;

    let object = value
        .as_object()
        .with_context(|| format!("Record is not a JSON object: {:?}", path))?;
    for key in REQUIRED_KEYS {
        ensure!(object.contains_key(key), "Record is missing `{}`", key);
    }

    let record: AnalysisRecord = serde_json::from_value(value)
        .with_context(|| format!("Record does not match the canonical schema: {:?}", path))?;
    check_record(&record).with_context(|| format!("Invalid record: {:?}", path))?;

    log::info!("Record {} is valid ({:.2}s)", record.id, record.duration);
    Ok(record)
}

/// Check the invariants of an in-memory record
pub fn check_record(record: &AnalysisRecord) -> Result<()> {
    ensure!(
        is_valid_track_id(&record.id),
        "id {:?} does not match NNNN_name",
        record.id
    );
    ensure!(
        record.duration.is_finite() && record.duration > 0.0,
        "duration must be positive, got {}",
        record.duration
    );

    check_tier("wav", &record.wav)?;
    check_tier("nav", &record.nav)?;
    check_events("inferences", &record.inferences)?;
    check_events("truths", &record.truths)?;
    check_scores(&record.scores)?;
    Ok(())
}

fn check_tier(name: &str, tier: &StemEnvelopeSet) -> Result<()> {
    let frames = tier
        .frame_count()
        .with_context(|| format!("{} envelopes differ in length across stems or bands", name))?;
    ensure!(frames > 0, "{} envelopes are empty", name);
    Ok(())
}

fn check_events(name: &str, events: &EventSet) -> Result<()> {
    ensure!(
        events.labels.len() == events.segments.len().saturating_sub(1),
        "{}: {} labels for {} segment boundaries",
        name,
        events.labels.len(),
        events.segments.len()
    );

    for (field, times) in [
        ("beats", &events.beats),
        ("downbeats", &events.downbeats),
        ("segments", &events.segments),
    ] {
        ensure!(
            times.windows(2).all(|w| w[0] <= w[1]),
            "{}.{} is not in ascending order",
            name,
            field
        );
    }
    Ok(())
}

fn check_scores(scores: &Scores) -> Result<()> {
    let values = [
        ("beat.f1", scores.beat.f1),
        ("downbeat.f1", scores.downbeat.f1),
        ("segment.F-measure@0.5", scores.segment.f_measure),
        ("segment.Pairwise F-measure", scores.segment.pairwise_f_measure),
    ];
    for (name, value) in values {
        ensure!(
            (0.0..=1.0).contains(&value),
            "score {} out of range: {}",
            name,
            value
        );
    }
    Ok(())
}

fn is_gzip(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Envelope;
    use tempfile::TempDir;

    fn record() -> AnalysisRecord {
        let events = EventSet {
            beats: vec![0.5, 1.0],
            downbeats: vec![0.5],
            segments: vec![0.0, 1.5],
            labels: vec!["intro".to_string()],
        };
        AnalysisRecord {
            nav: StemEnvelopeSet::zeros(4),
            wav: StemEnvelopeSet::zeros(8),
            duration: 1.5,
            scores: Scores::perfect(),
            id: "0001_song".to_string(),
            inferences: events.clone(),
            truths: events,
        }
    }

    #[test]
    fn test_valid_record() {
        assert!(check_record(&record()).is_ok());
    }

    #[test]
    fn test_rejects_broken_invariants() {
        let mut bad = record();
        bad.id = "song".to_string();
        assert!(check_record(&bad).is_err());

        let mut bad = record();
        bad.duration = 0.0;
        assert!(check_record(&bad).is_err());

        let mut bad = record();
        bad.wav.vocal = Envelope::zeros(7);
        assert!(check_record(&bad).is_err());

        let mut bad = record();
        bad.truths.labels.clear();
        assert!(check_record(&bad).is_err());

        let mut bad = record();
        bad.scores.beat.f1 = 1.5;
        assert!(check_record(&bad).is_err());
    }

    #[test]
    fn test_missing_key_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("song.json");
        let mut value = serde_json::to_value(record()).unwrap();
        value.as_object_mut().unwrap().remove("scores");
        std::fs::write(&path, value.to_string()).unwrap();

        let err = validate_record(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("scores"));
    }

    #[test]
    fn test_plain_json_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("song.json");
        std::fs::write(&path, serde_json::to_string_pretty(&record()).unwrap()).unwrap();

        assert_eq!(validate_record(&path).unwrap(), record());
    }
}
