use super::registry::PLUGIN_PROPERTIES;
use super::{
    ObjectId, PropertyAddress, PropertyInfo, PropertyObject, PropertyReader, PropertyWriter,
    UNKNOWN_OBJECT, class, read_identity, selector as sel,
};
use crate::driver::Driver;
use crate::utils::error::HardwareResult;

const DEVICES: &[u32] = &[ObjectId::Device.id()];
const BOX_ONLY: &[u32] = &[ObjectId::Box.id()];
const BOX_AND_DEVICE: &[u32] = &[ObjectId::Box.id(), ObjectId::Device.id()];

/// Root object the host loads
///
/// Lists the box, and the device while the box is acquired. Nothing on the
/// plug-in is settable.
#[derive(Debug, Clone, Copy)]
pub struct Plugin;

impl Plugin {
    fn devices(driver: &Driver) -> &'static [u32] {
        if driver.is_box_acquired() { DEVICES } else { &[] }
    }

    fn owned_objects(driver: &Driver) -> &'static [u32] {
        if driver.is_box_acquired() {
            BOX_AND_DEVICE
        } else {
            BOX_ONLY
        }
    }

    fn translate_uid(qualifier: &[u8], uid: &str, object: ObjectId) -> HardwareResult<u32> {
        let requested = PropertyReader::new(qualifier).string()?;
        Ok(if requested.as_deref() == Some(uid) {
            object.id()
        } else {
            UNKNOWN_OBJECT
        })
    }
}

impl PropertyObject for Plugin {
    fn object_id(&self) -> ObjectId {
        ObjectId::Plugin
    }

    fn properties(&self) -> &'static [PropertyInfo] {
        PLUGIN_PROPERTIES
    }

    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()> {
        if let Some(result) = read_identity(ObjectId::Plugin, class::OBJECT, class::PLUGIN, address, out) {
            return result;
        }

        let config = driver.config();
        match address.selector {
            sel::MANUFACTURER => out.put_str(Some(&config.manufacturer)),
            sel::OWNED_OBJECTS => out.put_ids(Self::owned_objects(driver)).map(drop),
            sel::BOX_LIST => out.put_ids(BOX_ONLY).map(drop),
            sel::DEVICE_LIST => out.put_ids(Self::devices(driver)).map(drop),
            sel::TRANSLATE_UID_TO_BOX => {
                out.put_u32(Self::translate_uid(qualifier, &config.box_uid, ObjectId::Box)?)
            }
            sel::TRANSLATE_UID_TO_DEVICE => {
                out.put_u32(Self::translate_uid(qualifier, &config.device_uid, ObjectId::Device)?)
            }
            sel::RESOURCE_BUNDLE => out.put_str(Some("")),
            _ => Err(self.unknown(address)),
        }
    }
}
