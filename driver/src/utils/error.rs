//! Host-facing error taxonomy
//!
//! Every operation the host can invoke reports failure as a 32-bit status
//! code. [`HardwareError`] carries enough context for the logs and maps to
//! that code through [`HardwareError::status`].
//!
//! # Example
//!
//! ```
//! use loopdev_lib::utils::error::{HardwareError, StatusCode};
//!
//! let err = HardwareError::BadObject(42);
//! assert_eq!(err.status(), StatusCode::BAD_OBJECT);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::{AudioObjectId, Selector, fourcc};

/// Status code reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u32);

impl StatusCode {
    pub const NO_ERROR: StatusCode = StatusCode(0);
    pub const UNSPECIFIED: StatusCode = StatusCode(fourcc(b"what"));
    pub const UNKNOWN_PROPERTY: StatusCode = StatusCode(fourcc(b"who?"));
    pub const BAD_PROPERTY_SIZE: StatusCode = StatusCode(fourcc(b"!siz"));
    pub const ILLEGAL_OPERATION: StatusCode = StatusCode(fourcc(b"nope"));
    pub const BAD_OBJECT: StatusCode = StatusCode(fourcc(b"!obj"));
    pub const UNSUPPORTED_OPERATION: StatusCode = StatusCode(fourcc(b"unop"));
    pub const UNSUPPORTED_FORMAT: StatusCode = StatusCode(fourcc(b"!dat"));
    /// COM-style `E_NOINTERFACE`
    pub const NO_INTERFACE: StatusCode = StatusCode(0x8000_0004);

    /// Collapse an operation result into the code handed back to the host
    pub fn from_result<T>(result: &HardwareResult<T>) -> StatusCode {
        match result {
            Ok(_) => StatusCode::NO_ERROR,
            Err(e) => e.status(),
        }
    }
}

/// Hardware error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HardwareError {
    /// Identifier does not name an object, or names the wrong kind of object
    #[error("Bad object: {0}")]
    BadObject(AudioObjectId),

    /// Selector is not recognized by the addressed object
    #[error("Unknown property {selector:#010x} on object {object}")]
    UnknownProperty {
        object: AudioObjectId,
        selector: Selector,
    },

    /// Buffer too small, or set data of the wrong fixed size
    #[error("Bad property size: expected {expected} bytes, got {actual}")]
    BadPropertySize { expected: usize, actual: usize },

    #[error("Illegal operation: {0}")]
    IllegalOperation(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Stream format does not match what the device can do
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unspecified error: {0}")]
    Unspecified(String),

    #[error("No such interface")]
    NoInterface,
}

impl HardwareError {
    /// Status code reported to the host
    pub fn status(&self) -> StatusCode {
        match self {
            HardwareError::BadObject(_) => StatusCode::BAD_OBJECT,
            HardwareError::UnknownProperty { .. } => StatusCode::UNKNOWN_PROPERTY,
            HardwareError::BadPropertySize { .. } => StatusCode::BAD_PROPERTY_SIZE,
            HardwareError::IllegalOperation(_) => StatusCode::ILLEGAL_OPERATION,
            HardwareError::UnsupportedOperation(_) => StatusCode::UNSUPPORTED_OPERATION,
            HardwareError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_FORMAT,
            HardwareError::Unspecified(_) => StatusCode::UNSPECIFIED,
            HardwareError::NoInterface => StatusCode::NO_INTERFACE,
        }
    }

    pub fn illegal(msg: impl Into<String>) -> Self {
        HardwareError::IllegalOperation(msg.into())
    }

    pub fn unknown_property(object: AudioObjectId, selector: Selector) -> Self {
        HardwareError::UnknownProperty { object, selector }
    }

    /// Check that set data is exactly `expected` bytes long
    pub fn require_size(data: &[u8], expected: usize) -> HardwareResult<()> {
        if data.len() != expected {
            return Err(HardwareError::BadPropertySize {
                expected,
                actual: data.len(),
            });
        }
        Ok(())
    }

    /// Check that a buffer holds at least `expected` bytes
    pub fn require_capacity(len: usize, expected: usize) -> HardwareResult<()> {
        if len < expected {
            return Err(HardwareError::BadPropertySize {
                expected,
                actual: len,
            });
        }
        Ok(())
    }
}

/// Hardware result type
pub type HardwareResult<T> = Result<T, HardwareError>;
