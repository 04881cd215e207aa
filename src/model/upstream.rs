//! Upstream analysis input model
//!
//! The structure analyzer has emitted several incompatible JSON shapes over
//! time. Everything here deserializes leniently: absent, `null` and
//! wrongly-typed fields become `None`/empty instead of failing the parse, so
//! the normalizer can decide what to backfill.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Analyzer output for one track, current or legacy shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamAnalysis {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub file_path: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub file_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub bpm: Option<f64>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub duration: Option<f64>,

    #[serde(default, deserialize_with = "lenient_times")]
    pub beats: Option<Vec<f64>>,

    #[serde(default, deserialize_with = "lenient_times")]
    pub downbeats: Option<Vec<f64>>,

    #[serde(default)]
    pub segments: SegmentsInput,

    #[serde(default, deserialize_with = "lenient_labels")]
    pub labels: Option<Vec<String>>,

    /// Legacy shape: events already nested under `inferences`
    #[serde(default, deserialize_with = "lenient_object")]
    pub inferences: Option<UpstreamEvents>,

    /// Legacy shape: reference annotations
    #[serde(default, deserialize_with = "lenient_object")]
    pub truths: Option<UpstreamEvents>,

    #[serde(default, deserialize_with = "lenient_object")]
    pub scores: Option<UpstreamScores>,
}

/// Nested event block of the legacy shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamEvents {
    #[serde(default, deserialize_with = "lenient_times")]
    pub beats: Option<Vec<f64>>,

    #[serde(default, deserialize_with = "lenient_times")]
    pub downbeats: Option<Vec<f64>>,

    #[serde(default)]
    pub segments: SegmentsInput,

    #[serde(default, deserialize_with = "lenient_labels")]
    pub labels: Option<Vec<String>>,
}

impl UpstreamEvents {
    pub fn is_empty(&self) -> bool {
        self.beats.as_ref().map_or(true, Vec::is_empty)
            && self.downbeats.as_ref().map_or(true, Vec::is_empty)
            && self.segments.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamScores {
    #[serde(default, deserialize_with = "lenient_object")]
    pub beat: Option<UpstreamBeatScore>,

    #[serde(default, deserialize_with = "lenient_object")]
    pub downbeat: Option<UpstreamBeatScore>,

    #[serde(default, deserialize_with = "lenient_object")]
    pub segment: Option<UpstreamSegmentScore>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamBeatScore {
    #[serde(default, deserialize_with = "lenient_number")]
    pub f1: Option<f64>,

    /// Some legacy records stored the tempo here
    #[serde(default, deserialize_with = "lenient_number")]
    pub bpm: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamSegmentScore {
    #[serde(default, rename = "F-measure@0.5", deserialize_with = "lenient_number")]
    pub f_measure: Option<f64>,

    #[serde(
        default,
        rename = "Pairwise F-measure",
        deserialize_with = "lenient_number"
    )]
    pub pairwise_f_measure: Option<f64>,
}

/// One segment in object form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentObject {
    /// `start`, or `time` in older outputs
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub label: Option<String>,
}

/// The three segment encodings seen upstream
///
/// The variant is chosen once, from the type of the first element.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentsInput {
    /// `[{"start": 0, "end": 10, "label": "intro"}, ...]`
    Objects(Vec<SegmentObject>),

    /// `[[0, 10], [10, 20], ...]`
    Pairs(Vec<Vec<f64>>),

    /// `[0, 10, 20, ...]`
    Flat(Vec<f64>),
}

impl Default for SegmentsInput {
    fn default() -> Self {
        SegmentsInput::Flat(Vec::new())
    }
}

impl SegmentsInput {
    /// Classify a raw JSON value by inspecting its first element
    pub fn from_value(value: &Value) -> Self {
        let items = match value {
            Value::Array(items) => items,
            _ => return Self::default(),
        };

        match items.first() {
            Some(Value::Object(_)) => SegmentsInput::Objects(
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(segment_object)
                    .collect(),
            ),
            Some(Value::Array(_)) => SegmentsInput::Pairs(
                items
                    .iter()
                    .filter_map(Value::as_array)
                    .map(|pair| pair.iter().filter_map(value_to_number).collect())
                    .collect(),
            ),
            _ => SegmentsInput::Flat(items.iter().filter_map(value_to_number).collect()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            SegmentsInput::Objects(v) => v.is_empty(),
            SegmentsInput::Pairs(v) => v.is_empty(),
            SegmentsInput::Flat(v) => v.is_empty(),
        }
    }
}

impl<'de> Deserialize<'de> for SegmentsInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

fn segment_object(obj: &Map<String, Value>) -> SegmentObject {
    let start = obj
        .get("start")
        .and_then(value_to_number)
        .or_else(|| obj.get("time").and_then(value_to_number));

    SegmentObject {
        start,
        end: obj.get("end").and_then(value_to_number),
        label: obj.get("label").and_then(value_to_label),
    }
}

fn value_to_label(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn value_to_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_number(&value))
}

/// Nested block that is dropped, not fatal, when it has the wrong shape
fn lenient_object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}

fn lenient_times<'de, D>(deserializer: D) -> Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(value_to_number)
                .collect(),
        ),
        _ => None,
    })
}

fn lenient_labels<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => Some(items.iter().filter_map(value_to_label).collect()),
        _ => None,
    })
}
