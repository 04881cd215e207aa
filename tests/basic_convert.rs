use dissector_converter::analysis::{SidecarAnalyzer, StubAnalyzer};
use dissector_converter::export::FrameCount;
use dissector_converter::model::{Scores, Stem, StemEnvelopeSet, UpstreamAnalysis};
use dissector_converter::normalize::is_valid_track_id;
use dissector_converter::validation::validate_record;
use dissector_converter::{ConvertConfig, ConvertPipeline};
use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 8000;

/// Write a mono 16-bit sine (or silence when `freq` is 0)
fn write_wav(path: &Path, seconds: f32, freq: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create wav");
    let total = (seconds * SAMPLE_RATE as f32) as usize;
    for i in 0..total {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * PI * freq * t).sin() * 0.5;
        writer
            .write_sample((sample * i16::MAX as f32) as i16)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize wav");
}

/// Analyzer results laid out as `<root>/results/<name>/<name>.json`
fn write_analysis(root: &Path, name: &str, json: &str) -> PathBuf {
    let dir = root.join("results").join(name);
    fs::create_dir_all(&dir).expect("Failed to create results dir");
    let path = dir.join(format!("{}.json", name));
    fs::write(&path, json).expect("Failed to write analysis");
    path
}

fn pipeline(temp: &TempDir, wav_frames: FrameCount) -> ConvertPipeline<SidecarAnalyzer> {
    let config = ConvertConfig::new(temp.path().join("out"))
        .with_resolution(wav_frames, FrameCount::Fixed(50));
    ConvertPipeline::new(config, SidecarAnalyzer::new()).expect("Failed to create pipeline")
}

#[test]
fn test_convert_without_stems() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let json = write_analysis(
        temp.path(),
        "Benefits",
        r#"{
            "file_name": "Benefits.mp3",
            "bpm": 120,
            "beats": [0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
            "downbeats": [0.5, 2.5],
            "segments": [
                {"start": 0, "end": 2, "label": "intro"},
                {"start": 2, "end": 4.5, "label": "verse"}
            ]
        }"#,
    );

    let output = pipeline(&temp, FrameCount::Fixed(200))
        .convert_file(&json)
        .expect("Conversion failed");

    let record = &output.record;
    assert!(is_valid_track_id(&record.id), "{}", record.id);
    assert!(record.id.ends_with("_benefits"));
    assert!((record.duration - 4.0 * 1.17).abs() < 1e-9);
    assert_eq!(record.wav, StemEnvelopeSet::zeros(200));
    assert_eq!(record.nav, StemEnvelopeSet::zeros(50));
    assert_eq!(record.inferences.segments, vec![0.0, 2.0, 4.5]);
    assert_eq!(record.inferences.labels, vec!["intro", "verse"]);
    assert_eq!(record.truths, record.inferences);
    assert_eq!(record.scores, Scores::perfect());

    let out = temp.path().join("out/data");
    assert_eq!(
        output.written,
        vec![out.join("Benefits.json.gz"), out.join("Benefits.json")]
    );
    for path in &output.written {
        let reread = validate_record(path).expect("Record failed validation");
        assert_eq!(&reread, record);
    }
}

#[test]
fn test_convert_with_stems() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let json = write_analysis(temp.path(), "song", r#"{"beats": [0.5, 1.0, 1.5]}"#);

    let stems = json.parent().unwrap().join("stems");
    fs::create_dir_all(&stems).unwrap();
    write_wav(&stems.join("bass.wav"), 2.0, 80.0);
    write_wav(&stems.join("drums.wav"), 2.0, 3000.0);
    write_wav(&stems.join("vocals.wav"), 2.0, 0.0);

    let record = pipeline(&temp, FrameCount::PerSecond(100.0))
        .convert_file(&json)
        .expect("Conversion failed")
        .record;

    // First stem in name order decides the duration
    assert!((record.duration - 2.0).abs() < 1e-3, "{}", record.duration);
    assert_eq!(record.wav.frame_count(), Some(200));
    assert_eq!(record.nav.frame_count(), Some(50));

    assert!(!record.wav.get(Stem::Bass).is_silent());
    assert!(!record.wav.get(Stem::Drum).is_silent());
    assert!(!record.nav.get(Stem::Drum).is_silent());
    assert!(record.wav.get(Stem::Vocal).is_silent());
    assert!(record.wav.get(Stem::Other).is_silent());
}

#[test]
fn test_duration_from_audio_ignores_beats() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let audio = temp.path().join("track.wav");
    write_wav(&audio, 3.0, 440.0);

    let analysis = UpstreamAnalysis {
        file_path: Some(audio.display().to_string()),
        beats: Some(vec![10.0]),
        ..Default::default()
    };

    let record = pipeline(&temp, FrameCount::Fixed(100)).build_record(
        &analysis,
        &temp.path().join("track.json"),
        "track",
    );
    assert!((record.duration - 3.0).abs() < 1e-3, "{}", record.duration);
}

#[test]
fn test_convert_audio_with_stub_analyzer() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let audio = temp.path().join("Loop.wav");
    write_wav(&audio, 4.0, 220.0);

    let config = ConvertConfig::new(temp.path().join("out"))
        .with_resolution(FrameCount::Fixed(100), FrameCount::Fixed(20))
        .with_id_tag(42);
    let pipeline = ConvertPipeline::new(config, StubAnalyzer::new().with_bpm(120.0)).unwrap();

    let record = pipeline.convert_audio(&audio).expect("Conversion failed").record;
    assert_eq!(record.id, "0042_loop");
    assert!((record.duration - 4.0).abs() < 1e-3);
    assert_eq!(record.inferences.beats.len(), 8);
    assert_eq!(record.inferences.downbeats, vec![0.0, 2.0]);
}

#[test]
fn test_record_reconverts_unchanged() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let json = write_analysis(
        temp.path(),
        "song",
        r#"{"duration": 30, "bpm": 90, "segments": [[0, 12], [12, 30]], "labels": ["a", "b"]}"#,
    );

    let first = pipeline(&temp, FrameCount::Fixed(100))
        .convert_file(&json)
        .expect("Conversion failed");

    let second_out = TempDir::new().unwrap();
    let config = ConvertConfig::new(second_out.path().to_path_buf())
        .with_resolution(FrameCount::Fixed(100), FrameCount::Fixed(50));
    let second = ConvertPipeline::new(config, SidecarAnalyzer::new())
        .unwrap()
        .convert_file(&first.written[1])
        .expect("Reconversion failed");

    assert_eq!(second.record.id, first.record.id);
    assert_eq!(second.record.duration, 30.0);
    assert_eq!(second.record.inferences, first.record.inferences);
    assert_eq!(second.record.truths, first.record.truths);
    assert_eq!(second.record.scores, first.record.scores);
}

#[test]
fn test_batch_continues_past_failure() {
    let temp = TempDir::new().expect("Failed to create temp dir");
    let good = write_analysis(temp.path(), "good", r#"{"duration": 10}"#);
    let bad = write_analysis(temp.path(), "bad", "{not json");
    let missing_audio = temp.path().join("nowhere.wav");

    let summary = pipeline(&temp, FrameCount::Fixed(10)).convert_batch(&[
        bad.clone(),
        good,
        missing_audio.clone(),
    ]);

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.succeeded, 1);
    let failed: Vec<&PathBuf> = summary.failures.iter().map(|(p, _)| p).collect();
    assert_eq!(failed, vec![&bad, &missing_audio]);
    assert!(temp.path().join("out/data/good.json.gz").is_file());
}
