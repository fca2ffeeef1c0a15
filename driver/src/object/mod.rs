//! Object model
//!
//! The device exposes a fixed topology of nine objects. Each identifier maps
//! to exactly one kind, and each kind answers the same five property
//! operations through [`PropertyObject`]:
//!
//! ```text
//! Plugin (1)
//! └── Box (2)
//! └── Device (3)
//!     ├── input:  Stream (4), Volume (5), Mute (6)
//!     └── output: Stream (7), Volume (8), Mute (9)
//! ```
//!
//! Kind-specific behavior lives in one module per kind; the shared parts
//! (registry lookup, size checks, measuring) are provided methods on the
//! trait.

/// Property addresses, selectors and class codes
pub mod address;

/// Per-kind property tables
pub mod registry;

/// Byte encoding of property values
pub mod wire;

mod audio_box;
mod device;
mod mute;
mod plugin;
mod stream;
mod volume;

pub use address::{ClassId, ELEMENT_MAIN, PropertyAddress, Scope, Selector, class, fourcc, selector};
pub use audio_box::AudioBox;
pub use device::Device;
pub use mute::MuteControl;
pub use plugin::Plugin;
pub use registry::{DataSize, PropertyInfo};
pub use stream::Stream;
pub use volume::VolumeControl;
pub use wire::{PropertyReader, PropertyWriter, StreamFormat, ValueRange};

use crate::driver::Driver;
use crate::utils::error::{HardwareError, HardwareResult};

/// Raw object identifier as the host passes it
pub type AudioObjectId = u32;

/// "No object"
pub const UNKNOWN_OBJECT: AudioObjectId = 0;

/// Addresses reported as changed by a set
pub type ChangedProperties = Vec<PropertyAddress>;

/// The objects this device is made of
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectId {
    Plugin = 1,
    Box = 2,
    Device = 3,
    InputStream = 4,
    InputVolume = 5,
    InputMute = 6,
    OutputStream = 7,
    OutputVolume = 8,
    OutputMute = 9,
}

/// Children of the device, input side first
pub const DEVICE_CHILDREN: [ObjectId; 6] = [
    ObjectId::InputStream,
    ObjectId::InputVolume,
    ObjectId::InputMute,
    ObjectId::OutputStream,
    ObjectId::OutputVolume,
    ObjectId::OutputMute,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Plugin,
    Box,
    Device,
    Stream,
    MuteControl,
    VolumeControl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn scope(self) -> Scope {
        match self {
            Direction::Input => Scope::Input,
            Direction::Output => Scope::Output,
        }
    }
}

impl ObjectId {
    pub const ALL: [ObjectId; 9] = [
        ObjectId::Plugin,
        ObjectId::Box,
        ObjectId::Device,
        ObjectId::InputStream,
        ObjectId::InputVolume,
        ObjectId::InputMute,
        ObjectId::OutputStream,
        ObjectId::OutputVolume,
        ObjectId::OutputMute,
    ];

    pub const fn id(self) -> AudioObjectId {
        self as AudioObjectId
    }

    pub fn kind(self) -> ObjectKind {
        match self {
            ObjectId::Plugin => ObjectKind::Plugin,
            ObjectId::Box => ObjectKind::Box,
            ObjectId::Device => ObjectKind::Device,
            ObjectId::InputStream | ObjectId::OutputStream => ObjectKind::Stream,
            ObjectId::InputVolume | ObjectId::OutputVolume => ObjectKind::VolumeControl,
            ObjectId::InputMute | ObjectId::OutputMute => ObjectKind::MuteControl,
        }
    }

    /// Direction of a stream or control
    pub fn direction(self) -> Option<Direction> {
        match self {
            ObjectId::InputStream | ObjectId::InputVolume | ObjectId::InputMute => {
                Some(Direction::Input)
            }
            ObjectId::OutputStream | ObjectId::OutputVolume | ObjectId::OutputMute => {
                Some(Direction::Output)
            }
            _ => None,
        }
    }

    pub fn owner(self) -> AudioObjectId {
        match self.kind() {
            ObjectKind::Plugin => UNKNOWN_OBJECT,
            ObjectKind::Box | ObjectKind::Device => ObjectId::Plugin.id(),
            _ => ObjectId::Device.id(),
        }
    }

    pub fn is_stream(self) -> bool {
        self.kind() == ObjectKind::Stream
    }

    pub fn is_control(self) -> bool {
        matches!(
            self.kind(),
            ObjectKind::MuteControl | ObjectKind::VolumeControl
        )
    }

    /// Device children visible from `scope`
    pub fn device_children(scope: Scope) -> impl Iterator<Item = ObjectId> {
        DEVICE_CHILDREN.into_iter().filter(move |child| match scope {
            Scope::Global => true,
            Scope::Input | Scope::Output => child.direction().map(Direction::scope) == Some(scope),
            Scope::Other(_) => false,
        })
    }
}

impl TryFrom<AudioObjectId> for ObjectId {
    type Error = HardwareError;

    fn try_from(id: AudioObjectId) -> Result<Self, Self::Error> {
        ObjectId::ALL
            .into_iter()
            .find(|object| object.id() == id)
            .ok_or(HardwareError::BadObject(id))
    }
}

/// Check that `id` names the expected object
pub fn expect_object(id: AudioObjectId, expected: ObjectId) -> HardwareResult<()> {
    if id != expected.id() {
        return Err(HardwareError::BadObject(id));
    }
    Ok(())
}

/// The five property operations every object answers
///
/// Implementors supply their table and the value accessors; existence,
/// settability and size checks are derived from the table.
pub trait PropertyObject {
    fn object_id(&self) -> ObjectId;

    fn properties(&self) -> &'static [PropertyInfo];

    /// Encode the current value of `address` into `out`
    fn read(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        qualifier: &[u8],
        out: &mut PropertyWriter<'_>,
    ) -> HardwareResult<()>;

    /// Apply `data` to a settable property
    fn write(
        &self,
        _driver: &Driver,
        address: &PropertyAddress,
        _data: &[u8],
    ) -> HardwareResult<ChangedProperties> {
        Err(self.unknown(address))
    }

    fn unknown(&self, address: &PropertyAddress) -> HardwareError {
        HardwareError::unknown_property(self.object_id().id(), address.selector)
    }

    fn describe(&self, address: &PropertyAddress) -> HardwareResult<&'static PropertyInfo> {
        registry::lookup(self.properties(), address.selector).ok_or_else(|| self.unknown(address))
    }

    fn has_property(&self, address: &PropertyAddress) -> bool {
        registry::lookup(self.properties(), address.selector)
            .is_some_and(|info| info.applies_to(address.scope))
    }

    fn is_property_settable(&self, address: &PropertyAddress) -> HardwareResult<bool> {
        Ok(self.describe(address)?.settable)
    }

    fn property_data_size(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        qualifier: &[u8],
    ) -> HardwareResult<usize> {
        match self.describe(address)?.size {
            DataSize::Fixed(size) => Ok(size),
            DataSize::Computed => {
                let mut measure = PropertyWriter::measure();
                self.read(driver, address, qualifier, &mut measure)?;
                Ok(measure.written())
            }
        }
    }

    fn property_data(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        qualifier: &[u8],
        out: &mut [u8],
    ) -> HardwareResult<usize> {
        if let DataSize::Fixed(size) = self.describe(address)?.size {
            HardwareError::require_capacity(out.len(), size)?;
        }
        let mut writer = PropertyWriter::new(out);
        self.read(driver, address, qualifier, &mut writer)?;
        Ok(writer.written())
    }

    fn set_property_data(
        &self,
        driver: &Driver,
        address: &PropertyAddress,
        data: &[u8],
    ) -> HardwareResult<ChangedProperties> {
        if !self.describe(address)?.settable {
            return Err(self.unknown(address));
        }
        self.write(driver, address, data)
    }
}

/// A resolved object, one variant per kind
#[derive(Debug, Clone, Copy)]
pub enum AudioObject {
    Plugin(Plugin),
    Box(AudioBox),
    Device(Device),
    Stream(Stream),
    Mute(MuteControl),
    Volume(VolumeControl),
}

impl AudioObject {
    /// Resolve a raw identifier, failing with bad-object for anything else
    pub fn resolve(id: AudioObjectId) -> HardwareResult<Self> {
        use Direction::{Input, Output};

        Ok(match ObjectId::try_from(id)? {
            ObjectId::Plugin => AudioObject::Plugin(Plugin),
            ObjectId::Box => AudioObject::Box(AudioBox),
            ObjectId::Device => AudioObject::Device(Device),
            ObjectId::InputStream => AudioObject::Stream(Stream::new(Input)),
            ObjectId::OutputStream => AudioObject::Stream(Stream::new(Output)),
            ObjectId::InputMute => AudioObject::Mute(MuteControl::new(Input)),
            ObjectId::OutputMute => AudioObject::Mute(MuteControl::new(Output)),
            ObjectId::InputVolume => AudioObject::Volume(VolumeControl::new(Input)),
            ObjectId::OutputVolume => AudioObject::Volume(VolumeControl::new(Output)),
        })
    }

    pub fn as_property_object(&self) -> &dyn PropertyObject {
        match self {
            AudioObject::Plugin(o) => o,
            AudioObject::Box(o) => o,
            AudioObject::Device(o) => o,
            AudioObject::Stream(o) => o,
            AudioObject::Mute(o) => o,
            AudioObject::Volume(o) => o,
        }
    }
}

/// Base-class/class/owner values shared by every kind
pub(crate) fn read_identity(
    object: ObjectId,
    base_class: ClassId,
    class: ClassId,
    address: &PropertyAddress,
    out: &mut PropertyWriter<'_>,
) -> Option<HardwareResult<()>> {
    match address.selector {
        selector::BASE_CLASS => Some(out.put_u32(base_class)),
        selector::CLASS => Some(out.put_u32(class)),
        selector::OWNER => Some(out.put_u32(object.owner())),
        _ => None,
    }
}
