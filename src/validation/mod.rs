//! Validation utilities
//!
//! Reads written records back and checks the canonical schema invariants

mod roundtrip;

pub use roundtrip::{check_record, validate_record};
