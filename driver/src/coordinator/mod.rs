//! Configuration-change coordinator
//!
//! Sample-rate changes are applied in two phases so that they never race
//! the I/O thread:
//!
//! - `change` - request bookkeeping and the perform/abort entry points
//! - `phase` - the handshake state machine

mod change;
mod phase;

pub use change::{ConfigChangeCoordinator, ConfigChangeRequest};
pub use phase::{ChangePhase, PhaseError, PhaseResult, PhaseTracker};
