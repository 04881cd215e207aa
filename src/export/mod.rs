//! Conversion orchestration and output organization

pub mod config;
pub mod organizer;
pub mod pipeline;

pub use config::{ConvertConfig, FrameCount};
pub use organizer::OutputOrganizer;
pub use pipeline::{BatchSummary, ConvertOutput, ConvertPipeline};
