//! Audio decoding and signal features
//!
//! Decoding is powered by symphonia; the band split runs on rustfft.

pub mod bands;
pub mod decode;
pub mod resample;

pub use bands::BandEnergyExtractor;
pub use decode::{decode_to_mono, probe_duration, DecodeError, MonoSignal};
pub use resample::{resample_bytes, resample_linear};
