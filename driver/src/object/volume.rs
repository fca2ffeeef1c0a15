use super::registry::VOLUME_PROPERTIES;
use super::{
    ChangedProperties, Direction, ELEMENT_MAIN, ObjectId, PropertyAddress, PropertyInfo,
    PropertyObject, PropertyReader, PropertyWriter, ValueRange, class, read_identity,
    selector as sel,
};
use crate::driver::Driver;
use crate::utils::error::{HardwareError, HardwareResult};

/// Master volume for one direction, backed by the shared linear gain
///
/// The scalar and decibel views are both derived from the stored amplitude,
/// so setting either reports both as changed.
#[derive(Debug, Clone, Copy)]
pub struct VolumeControl {
    direction: Direction,
}

impl VolumeControl {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    fn id(&self) -> ObjectId {
        match self.direction {
            Direction::Input => ObjectId::InputVolume,
            Direction::Output => ObjectId::OutputVolume,
        }
    }
}

impl PropertyObject for VolumeControl {
    fn object_id(&self) -> ObjectId {
        self.id()
    }

    fn properties(&self) -> &'static [PropertyInfo] {
        VOLUME_PROPERTIES
    }

    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        _qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()> {
        if let Some(result) =
            read_identity(self.id(), class::LEVEL_CONTROL, class::VOLUME_CONTROL, address, out)
        {
            return result;
        }

        let range = driver.config().decibel_range();
        let gain = driver.controls().gain();
        match address.selector {
            sel::OWNED_OBJECTS => out.put_ids(&[]).map(drop),
            sel::CONTROL_SCOPE => out.put_u32(self.direction.scope().code()),
            sel::CONTROL_ELEMENT => out.put_u32(ELEMENT_MAIN),
            sel::SCALAR_VALUE => out.put_f32(range.amplitude_to_scalar(gain)),
            sel::DECIBEL_VALUE => out.put_f32(range.amplitude_to_decibels(gain)),
            sel::DECIBEL_RANGE => out.put_range(ValueRange {
                min: f64::from(range.min),
                max: f64::from(range.max),
            }),
            sel::CONVERT_SCALAR_TO_DECIBELS => {
                let scalar = out.peek_f32()?;
                out.put_f32(range.tapered_scalar_to_decibels(scalar))
            }
            sel::CONVERT_DECIBELS_TO_SCALAR => {
                let decibels = out.peek_f32()?;
                out.put_f32(range.decibels_to_tapered_scalar(decibels))
            }
            _ => Err(self.unknown(address)),
        }
    }

    fn write(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        data: &[u8],
    ) -> HardwareResult<ChangedProperties> {
        let range = driver.config().decibel_range();
        let (selector, value) = match address.selector {
            selector @ (sel::SCALAR_VALUE | sel::DECIBEL_VALUE) => {
                HardwareError::require_size(data, 4)?;
                (selector, PropertyReader::new(data).f32()?)
            }
            _ => return Err(self.unknown(address)),
        };
        if !value.is_finite() {
            return Err(HardwareError::illegal(format!("volume value {value} is not finite")));
        }

        // Compare in the written property's own units so writing back a value
        // just read never counts as a change.
        let changed = if selector == sel::SCALAR_VALUE {
            let scalar = value.clamp(0.0, 1.0);
            driver.update_master_gain(|gain| {
                (range.amplitude_to_scalar(gain) != scalar).then(|| range.scalar_to_amplitude(scalar))
            })
        } else {
            let decibels = range.clamp(value);
            driver.update_master_gain(|gain| {
                (range.amplitude_to_decibels(gain) != decibels)
                    .then(|| range.decibels_to_clamped_amplitude(decibels))
            })
        };

        Ok(if changed {
            vec![
                PropertyAddress::global(sel::SCALAR_VALUE),
                PropertyAddress::global(sel::DECIBEL_VALUE),
            ]
        } else {
            Vec::new()
        })
    }
}
