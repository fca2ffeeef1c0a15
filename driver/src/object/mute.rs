use super::registry::MUTE_PROPERTIES;
use super::{
    ChangedProperties, Direction, ELEMENT_MAIN, ObjectId, PropertyAddress, PropertyInfo,
    PropertyObject, PropertyReader, PropertyWriter, class, read_identity, selector as sel,
};
use crate::driver::Driver;
use crate::utils::error::{HardwareError, HardwareResult};

/// Master mute for one direction; both directions share one flag
#[derive(Debug, Clone, Copy)]
pub struct MuteControl {
    direction: Direction,
}

impl MuteControl {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    fn id(&self) -> ObjectId {
        match self.direction {
            Direction::Input => ObjectId::InputMute,
            Direction::Output => ObjectId::OutputMute,
        }
    }
}

impl PropertyObject for MuteControl {
    fn object_id(&self) -> ObjectId {
        self.id()
    }

    fn properties(&self) -> &'static [PropertyInfo] {
        MUTE_PROPERTIES
    }

    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        _qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()> {
        if let Some(result) =
            read_identity(self.id(), class::BOOLEAN_CONTROL, class::MUTE_CONTROL, address, out)
        {
            return result;
        }

        match address.selector {
            sel::OWNED_OBJECTS => out.put_ids(&[]).map(drop),
            sel::CONTROL_SCOPE => out.put_u32(self.direction.scope().code()),
            sel::CONTROL_ELEMENT => out.put_u32(ELEMENT_MAIN),
            sel::BOOLEAN_VALUE => out.put_bool(driver.controls().is_muted()),
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
            sel::BOOLEAN_VALUE => {
                HardwareError::require_size(data, 4)?;
                let muted = PropertyReader::new(data).u32()? != 0;
                Ok(if driver.set_master_mute(muted) {
                    vec![PropertyAddress::global(sel::BOOLEAN_VALUE)]
                } else {
                    Vec::new()
                })
            }
            _ => Err(self.unknown(address)),
        }
    }
}
