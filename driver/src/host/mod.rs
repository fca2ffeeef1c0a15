//! Host bridge
//!
//! The audio server hands the driver a table of callbacks at initialization.
//! [`Host`] is that table. Apart from reading persisted settings during
//! initialization, the driver never calls it directly: every callback goes
//! through the [`HostNotifier`] queue so that no driver lock is held while
//! the host runs.

mod notifier;

pub use notifier::{HostMessage, HostNotifier, NOTIFIER_QUEUE_CAPACITY};

use serde_json::Value;

use crate::object::{AudioObjectId, PropertyAddress};
use crate::utils::error::HardwareResult;

/// Callbacks provided by the audio server
pub trait Host: Send + Sync {
    /// Tell the host that properties of `object` changed
    fn properties_changed(
        &self,
        object: AudioObjectId,
        addresses: &[PropertyAddress],
    ) -> HardwareResult<()>;

    /// Ask the host to stop I/O and call back with the same `change_action`
    fn request_device_configuration_change(
        &self,
        device: AudioObjectId,
        change_action: u64,
    ) -> HardwareResult<()>;

    /// Read a persisted value; `Ok(None)` when the key has never been written
    fn copy_from_storage(&self, key: &str) -> HardwareResult<Option<Value>>;

    fn write_to_storage(&self, key: &str, value: &Value) -> HardwareResult<()>;

    fn delete_from_storage(&self, key: &str) -> HardwareResult<()>;
}
