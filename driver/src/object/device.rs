use super::registry::DEVICE_PROPERTIES;
use super::wire::{TRANSPORT_TYPE_VIRTUAL, VALUE_RANGE_SIZE};
use super::{
    ChangedProperties, ObjectId, PropertyAddress, PropertyInfo, PropertyObject, PropertyReader,
    PropertyWriter, Scope, ValueRange, class, read_identity, selector as sel,
};
use crate::driver::Driver;
use crate::utils::error::{HardwareError, HardwareResult};

const RELATED_DEVICES: &[u32] = &[ObjectId::Device.id()];

/// The loopback device
#[derive(Debug, Clone, Copy)]
pub struct Device;

impl Device {
    fn children(scope: Scope, keep: impl Fn(ObjectId) -> bool) -> Vec<u32> {
        ObjectId::device_children(scope)
            .filter(|child| keep(*child))
            .map(ObjectId::id)
            .collect()
    }
}

impl PropertyObject for Device {
    fn object_id(&self) -> ObjectId {
        ObjectId::Device
    }

    fn properties(&self) -> &'static [PropertyInfo] {
        DEVICE_PROPERTIES
    }

    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        _qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()> {
        if let Some(result) = read_identity(ObjectId::Device, class::OBJECT, class::DEVICE, address, out) {
            return result;
        }

        let config = driver.config();
        match address.selector {
            sel::NAME => out.put_str(Some(&config.device_name)),
            sel::MANUFACTURER => out.put_str(Some(&config.manufacturer)),
            sel::DEVICE_UID => out.put_str(Some(&config.device_uid)),
            sel::MODEL_UID => out.put_str(Some(&config.device_model_uid)),
            sel::TRANSPORT_TYPE => out.put_u32(TRANSPORT_TYPE_VIRTUAL),
            sel::RELATED_DEVICES => out.put_ids(RELATED_DEVICES).map(drop),
            sel::CLOCK_DOMAIN => out.put_u32(0),
            sel::DEVICE_IS_ALIVE => out.put_bool(true),
            sel::DEVICE_IS_RUNNING => out.put_bool(driver.is_io_running()),
            sel::CAN_BE_DEFAULT | sel::CAN_BE_DEFAULT_SYSTEM => out.put_bool(config.can_be_default),
            sel::LATENCY | sel::SAFETY_OFFSET => out.put_u32(0),
            sel::STREAMS => {
                let streams = Self::children(address.scope, ObjectId::is_stream);
                out.put_ids(&streams).map(drop)
            }
            // controls are listed regardless of scope
            sel::CONTROL_LIST => {
                let controls = Self::children(Scope::Global, ObjectId::is_control);
                out.put_ids(&controls).map(drop)
            }
            sel::OWNED_OBJECTS => {
                let owned = Self::children(address.scope, |_| true);
                out.put_ids(&owned).map(drop)
            }
            sel::NOMINAL_SAMPLE_RATE => out.put_f64(driver.sample_rate()),
            sel::AVAILABLE_NOMINAL_SAMPLE_RATES => out
                .put_list(&config.sample_rates, VALUE_RANGE_SIZE, |w, rate| {
                    w.put_range(ValueRange::point(*rate))
                })
                .map(drop),
            sel::IS_HIDDEN => out.put_bool(config.hidden),
            sel::PREFERRED_CHANNELS_FOR_STEREO => {
                out.put_u32(1)?;
                out.put_u32(2)
            }
            sel::PREFERRED_CHANNEL_LAYOUT => out.put_channel_layout(config.channels),
            sel::ZERO_TIME_STAMP_PERIOD => out.put_u32(config.zero_timestamp_period),
            sel::ICON => {
                if config.icon.is_empty() {
                    return Err(HardwareError::Unspecified("no icon resource configured".into()));
                }
                out.put_str(Some(&config.icon))
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
        match address.selector {
            sel::NOMINAL_SAMPLE_RATE => {
                HardwareError::require_size(data, 8)?;
                let rate = PropertyReader::new(data).f64()?;
                driver.request_sample_rate(rate)?;
                // applied later, when the host performs the change
                Ok(Vec::new())
            }
            _ => Err(self.unknown(address)),
        }
    }
}
