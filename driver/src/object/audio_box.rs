use super::registry::BOX_PROPERTIES;
use super::wire::TRANSPORT_TYPE_VIRTUAL;
use super::{
    ChangedProperties, ObjectId, PropertyAddress, PropertyInfo, PropertyObject, PropertyReader,
    PropertyWriter, class, read_identity, selector as sel,
};
use crate::driver::Driver;
use crate::utils::error::{HardwareError, HardwareResult};

const DEVICES: &[u32] = &[ObjectId::Device.id()];

/// Enclosure that gates the device's visibility
///
/// Acquiring the box publishes the device in the plug-in's device list;
/// the device itself always exists.
#[derive(Debug, Clone, Copy)]
pub struct AudioBox;

impl PropertyObject for AudioBox {
    fn object_id(&self) -> ObjectId {
        ObjectId::Box
    }

    fn properties(&self) -> &'static [PropertyInfo] {
        BOX_PROPERTIES
    }

    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        _qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()> {
        if let Some(result) = read_identity(ObjectId::Box, class::OBJECT, class::BOX, address, out) {
            return result;
        }

        let config = driver.config();
        match address.selector {
            sel::NAME => out.put_str(driver.box_name().as_deref()),
            sel::MODEL_NAME => out.put_str(Some(&config.box_model)),
            sel::MANUFACTURER => out.put_str(Some(&config.manufacturer)),
            sel::OWNED_OBJECTS => out.put_ids(&[]).map(drop),
            sel::IDENTIFY => out.put_bool(false),
            sel::SERIAL_NUMBER => out.put_str(Some(&config.box_serial_number)),
            sel::FIRMWARE_VERSION => out.put_str(Some(&config.box_firmware_version)),
            sel::BOX_UID => out.put_str(Some(&config.box_uid)),
            sel::TRANSPORT_TYPE => out.put_u32(TRANSPORT_TYPE_VIRTUAL),
            sel::HAS_AUDIO => out.put_bool(true),
            sel::HAS_VIDEO | sel::HAS_MIDI | sel::IS_PROTECTED => out.put_bool(false),
            sel::ACQUIRED => out.put_bool(driver.is_box_acquired()),
            sel::ACQUISITION_FAILED => out.put_u32(0),
            sel::BOX_DEVICE_LIST => out.put_ids(DEVICES).map(drop),
            _ => Err(self.unknown(address)),
        }
    }

    fn write(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        data: &[u8],
    ) -> HardwareResult<ChangedProperties> {
        match address.selector {
            sel::NAME => {
                let name = PropertyReader::new(data).string()?;
                Ok(if driver.set_box_name(name) {
                    vec![PropertyAddress::global(sel::NAME)]
                } else {
                    Vec::new()
                })
            }
            sel::ACQUIRED => {
                HardwareError::require_size(data, 4)?;
                let acquired = PropertyReader::new(data).u32()? != 0;
                Ok(if driver.set_box_acquired(acquired) {
                    vec![
                        PropertyAddress::global(sel::ACQUIRED),
                        PropertyAddress::global(sel::BOX_DEVICE_LIST),
                    ]
                } else {
                    Vec::new()
                })
            }
            _ => Err(self.unknown(address)),
        }
    }
}
