//! Loopdev: a virtual loopback audio device
//!
//! Audio written to the device's output stream comes back on its input
//! stream. The crate implements the driver side of an audio-server plug-in:
//! property dispatch over a fixed object topology, the real-time I/O
//! engine, and the two-phase sample-rate change handshake. A platform shim
//! links the library and forwards the host's calls to
//! [`interface::DriverInterface`].

/// Driver configuration
pub mod config;

/// Sample-rate change handshake
pub mod coordinator;

/// Property entry points
pub mod dispatch;

/// Driver context and lifetime
pub mod driver;

/// Real-time I/O engine
pub mod engine;

/// Host callbacks and the background notifier
pub mod host;

/// Host operation table and plug-in factory
pub mod interface;

/// Object topology and property model
pub mod object;

/// Utility modules
pub mod utils;

pub use driver::Driver;
pub use interface::{DriverInterface, create_plugin, shared};
