/// Logging utilities
pub mod logging;

/// Host-facing error taxonomy
pub mod error;

/// Decibel conversions
pub mod math;

// Re-export commonly used types
pub use error::{HardwareError, HardwareResult, StatusCode};
