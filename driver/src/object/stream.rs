use super::registry::STREAM_PROPERTIES;
use super::wire::{
    RANGED_FORMAT_SIZE, STREAM_FORMAT_SIZE, TERMINAL_TYPE_MICROPHONE, TERMINAL_TYPE_SPEAKER,
};
use super::{
    ChangedProperties, Direction, ObjectId, PropertyAddress, PropertyInfo, PropertyObject,
    PropertyReader, PropertyWriter, StreamFormat, ValueRange, class, read_identity, selector as sel,
};
use crate::config::DriverConfig;
use crate::driver::Driver;
use crate::utils::error::{HardwareError, HardwareResult};

/// One direction of interleaved float audio
#[derive(Debug, Clone, Copy)]
pub struct Stream {
    direction: Direction,
}

impl Stream {
    pub fn new(direction: Direction) -> Self {
        Self { direction }
    }

    fn id(&self) -> ObjectId {
        match self.direction {
            Direction::Input => ObjectId::InputStream,
            Direction::Output => ObjectId::OutputStream,
        }
    }
}

/// Reject any format other than the device's own at a supported rate
///
/// The rate itself is checked by the configuration-change path.
pub fn check_format(config: &DriverConfig, format: &StreamFormat) -> HardwareResult<()> {
    let expected = config.stream_format(format.sample_rate);
    let mismatch = [
        ("format id", format.format_id, expected.format_id),
        ("format flags", format.format_flags, expected.format_flags),
        ("bytes per packet", format.bytes_per_packet, expected.bytes_per_packet),
        ("frames per packet", format.frames_per_packet, expected.frames_per_packet),
        ("bytes per frame", format.bytes_per_frame, expected.bytes_per_frame),
        ("channels per frame", format.channels_per_frame, expected.channels_per_frame),
        ("bits per channel", format.bits_per_channel, expected.bits_per_channel),
    ]
    .into_iter()
    .find(|(_, got, want)| got != want);

    match mismatch {
        Some((field, got, want)) => Err(HardwareError::UnsupportedFormat(format!(
            "{field} is {got}, expected {want}"
        ))),
        None => Ok(()),
    }
}

impl PropertyObject for Stream {
    fn object_id(&self) -> ObjectId {
        self.id()
    }

    fn properties(&self) -> &'static [PropertyInfo] {
        STREAM_PROPERTIES
    }

    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        _qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()> {
        if let Some(result) = read_identity(self.id(), class::OBJECT, class::STREAM, address, out) {
            return result;
        }

        let config = driver.config();
        match address.selector {
            sel::OWNED_OBJECTS => out.put_ids(&[]).map(drop),
            sel::IS_ACTIVE => out.put_bool(driver.is_stream_active(self.direction)),
            sel::DIRECTION => out.put_bool(self.direction == Direction::Input),
            sel::TERMINAL_TYPE => out.put_u32(match self.direction {
                Direction::Input => TERMINAL_TYPE_MICROPHONE,
                Direction::Output => TERMINAL_TYPE_SPEAKER,
            }),
            sel::STARTING_CHANNEL => out.put_u32(1),
            sel::LATENCY => out.put_u32(0),
            sel::VIRTUAL_FORMAT | sel::PHYSICAL_FORMAT => {
                out.put_format(&config.stream_format(driver.sample_rate()))
            }
            sel::AVAILABLE_VIRTUAL_FORMATS | sel::AVAILABLE_PHYSICAL_FORMATS => out
                .put_list(&config.sample_rates, RANGED_FORMAT_SIZE, |w, rate| {
                    w.put_format(&config.stream_format(*rate))?;
                    w.put_range(ValueRange::point(*rate))
                })
                .map(drop),
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
            sel::IS_ACTIVE => {
                HardwareError::require_capacity(data.len(), 4)?;
                let active = PropertyReader::new(data).u32()? != 0;
                Ok(if driver.set_stream_active(self.direction, active) {
                    vec![PropertyAddress::global(sel::IS_ACTIVE)]
                } else {
                    Vec::new()
                })
            }
            sel::VIRTUAL_FORMAT | sel::PHYSICAL_FORMAT => {
                HardwareError::require_size(data, STREAM_FORMAT_SIZE)?;
                let format = PropertyReader::new(data).format()?;
                check_format(driver.config(), &format)?;
                driver.request_sample_rate(format.sample_rate)?;
                Ok(Vec::new())
            }
            _ => Err(self.unknown(address)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_format() {
        let config = DriverConfig::default();
        let format = config.stream_format(44_100.0);
        assert!(check_format(&config, &format).is_ok());

        let mono = StreamFormat {
            channels_per_frame: 1,
            ..format
        };
        assert!(matches!(
            check_format(&config, &mono),
            Err(HardwareError::UnsupportedFormat(_))
        ));

        let int16 = StreamFormat {
            bits_per_channel: 16,
            ..format
        };
        assert_eq!(
            check_format(&config, &int16).unwrap_err().status(),
            crate::utils::error::StatusCode::UNSUPPORTED_FORMAT
        );
    }
}
