//! Property dispatch
//!
//! Every property entry point resolves the object identifier to its kind
//! and forwards to that kind's [`PropertyObject`] implementation. Sets that
//! change something are reported to the host through the notifier.

use crate::driver::Driver;
use crate::object::{AudioObject, AudioObjectId, ChangedProperties, PropertyAddress};
use crate::utils::error::HardwareResult;

impl Driver {
    /// Whether `object` has the property; unknown objects have none
    pub fn has_property(&self, object: AudioObjectId, address: &PropertyAddress) -> bool {
        AudioObject::resolve(object)
            .map(|resolved| resolved.as_property_object().has_property(address))
            .unwrap_or(false)
    }

    pub fn is_property_settable(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
    ) -> HardwareResult<bool> {
        AudioObject::resolve(object)?
            .as_property_object()
            .is_property_settable(address)
    }

    /// Exact number of bytes [`get_property_data`](Self::get_property_data)
    /// writes for the same address and qualifier
    pub fn get_property_data_size(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
    ) -> HardwareResult<usize> {
        AudioObject::resolve(object)?
            .as_property_object()
            .property_data_size(self, address, qualifier)
    }

    /// Encode the property into `out`, returning the bytes written
    ///
    /// List properties write as many whole items as fit.
    pub fn get_property_data(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        qualifier: &[u8],
        out: &mut [u8],
    ) -> HardwareResult<usize> {
        AudioObject::resolve(object)?
            .as_property_object()
            .property_data(self, address, qualifier, out)
    }

    /// Apply `data` and return the addresses that changed
    ///
    /// Setting a property to its current value changes nothing and sends
    /// no notification.
    pub fn set_property_data(
        &self,
        object: AudioObjectId,
        address: &PropertyAddress,
        _qualifier: &[u8],
        data: &[u8],
    ) -> HardwareResult<ChangedProperties> {
        let changed = AudioObject::resolve(object)?
            .as_property_object()
            .set_property_data(self, address, data)?;

        if !changed.is_empty() {
            tracing::debug!(object, selector = address.selector, count = changed.len(), "Properties changed");
            self.notify(object, changed.clone());
        }
        Ok(changed)
    }
}
