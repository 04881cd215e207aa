//! Dissector Converter - music structure analysis to visualization records
//!
//! This library turns the output of an external music structure analyzer
//! (beats, downbeats, labelled segments, tempo) plus optional separated
//! stems into the canonical record a visualization front end reads:
//! per-stem three-band energy envelopes at two resolutions, normalized
//! events and quality scores.

pub mod analysis;
pub mod audio;
pub mod export;
pub mod model;
pub mod normalize;
pub mod scoring;
pub mod validation;

pub use export::config::ConvertConfig;
pub use export::pipeline::ConvertPipeline;
