//! Structure analysis layer
//!
//! The converter never runs an analysis model itself. It is handed one
//! through the [`StructureAnalyzer`] trait: the sidecar analyzer picks up
//! results the external analyzer wrote, the stub reports a tempo only.

mod sidecar;
mod stub;
mod traits;

pub use sidecar::SidecarAnalyzer;
pub use stub::StubAnalyzer;
pub use traits::StructureAnalyzer;
