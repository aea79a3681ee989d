//! Utils Module - Helper Functions & Shared Utilities
//!
//! Address checksums, calldata decoding, constants and run counters.

pub mod checksum;
pub mod constants;
pub mod decoder;
pub mod telemetry;

pub use checksum::*;
pub use constants::*;
pub use decoder::*;
pub use telemetry::*;
