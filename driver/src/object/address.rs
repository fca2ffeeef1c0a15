//! Property addresses and the selector/class codes they carry

/// Integer property code
pub type Selector = u32;

/// Integer class code reported by the base-class and class properties
pub type ClassId = u32;

/// Pack a four-character code the way the host does (big-endian)
pub const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_be_bytes(*code)
}

/// Element addressing the whole object rather than a channel
pub const ELEMENT_MAIN: u32 = 0;

/// Partition of a property between directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Global,
    Input,
    Output,
    /// Any scope this device has no use for (play-through and friends)
    Other(u32),
}

impl Scope {
    pub const GLOBAL_CODE: u32 = fourcc(b"glob");
    pub const INPUT_CODE: u32 = fourcc(b"inpt");
    pub const OUTPUT_CODE: u32 = fourcc(b"outp");

    pub const fn code(self) -> u32 {
        match self {
            Scope::Global => Self::GLOBAL_CODE,
            Scope::Input => Self::INPUT_CODE,
            Scope::Output => Self::OUTPUT_CODE,
            Scope::Other(code) => code,
        }
    }

    pub const fn from_code(code: u32) -> Self {
        match code {
            Self::GLOBAL_CODE => Scope::Global,
            Self::INPUT_CODE => Scope::Input,
            Self::OUTPUT_CODE => Scope::Output,
            other => Scope::Other(other),
        }
    }

    pub fn is_directional(self) -> bool {
        matches!(self, Scope::Input | Scope::Output)
    }
}

impl From<u32> for Scope {
    fn from(code: u32) -> Self {
        Scope::from_code(code)
    }
}

/// Identifies one property on one object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyAddress {
    pub selector: Selector,
    pub scope: Scope,
    pub element: u32,
}

impl PropertyAddress {
    pub const fn new(selector: Selector, scope: Scope, element: u32) -> Self {
        Self {
            selector,
            scope,
            element,
        }
    }

    /// Global scope, main element
    pub const fn global(selector: Selector) -> Self {
        Self::new(selector, Scope::Global, ELEMENT_MAIN)
    }

    /// Given scope, main element
    pub const fn scoped(selector: Selector, scope: Scope) -> Self {
        Self::new(selector, scope, ELEMENT_MAIN)
    }
}

/// Property selectors understood by at least one object kind
pub mod selector {
    use super::{Selector, fourcc};

    // Every object
    pub const BASE_CLASS: Selector = fourcc(b"bcls");
    pub const CLASS: Selector = fourcc(b"clas");
    pub const OWNER: Selector = fourcc(b"stdv");
    pub const NAME: Selector = fourcc(b"lnam");
    pub const MODEL_NAME: Selector = fourcc(b"lmod");
    pub const MANUFACTURER: Selector = fourcc(b"lmak");
    pub const OWNED_OBJECTS: Selector = fourcc(b"ownd");
    pub const IDENTIFY: Selector = fourcc(b"iden");
    pub const SERIAL_NUMBER: Selector = fourcc(b"snum");
    pub const FIRMWARE_VERSION: Selector = fourcc(b"fwvn");

    // Plug-in
    pub const BOX_LIST: Selector = fourcc(b"box#");
    pub const TRANSLATE_UID_TO_BOX: Selector = fourcc(b"uidb");
    pub const DEVICE_LIST: Selector = fourcc(b"dev#");
    pub const TRANSLATE_UID_TO_DEVICE: Selector = fourcc(b"uidd");
    pub const RESOURCE_BUNDLE: Selector = fourcc(b"rsrc");

    // Box
    pub const BOX_UID: Selector = fourcc(b"buid");
    pub const TRANSPORT_TYPE: Selector = fourcc(b"tran");
    pub const HAS_AUDIO: Selector = fourcc(b"bhau");
    pub const HAS_VIDEO: Selector = fourcc(b"bhvi");
    pub const HAS_MIDI: Selector = fourcc(b"bhmi");
    pub const IS_PROTECTED: Selector = fourcc(b"bpro");
    pub const ACQUIRED: Selector = fourcc(b"bxon");
    pub const ACQUISITION_FAILED: Selector = fourcc(b"bxof");
    pub const BOX_DEVICE_LIST: Selector = fourcc(b"bdv#");

    // Device
    pub const DEVICE_UID: Selector = fourcc(b"uid ");
    pub const MODEL_UID: Selector = fourcc(b"muid");
    pub const RELATED_DEVICES: Selector = fourcc(b"akin");
    pub const CLOCK_DOMAIN: Selector = fourcc(b"clkd");
    pub const DEVICE_IS_ALIVE: Selector = fourcc(b"livn");
    pub const DEVICE_IS_RUNNING: Selector = fourcc(b"goin");
    pub const CAN_BE_DEFAULT: Selector = fourcc(b"dflt");
    pub const CAN_BE_DEFAULT_SYSTEM: Selector = fourcc(b"sflt");
    pub const LATENCY: Selector = fourcc(b"ltnc");
    pub const STREAMS: Selector = fourcc(b"stm#");
    pub const CONTROL_LIST: Selector = fourcc(b"ctrl");
    pub const SAFETY_OFFSET: Selector = fourcc(b"saft");
    pub const NOMINAL_SAMPLE_RATE: Selector = fourcc(b"nsrt");
    pub const AVAILABLE_NOMINAL_SAMPLE_RATES: Selector = fourcc(b"nsr#");
    pub const IS_HIDDEN: Selector = fourcc(b"hidn");
    pub const PREFERRED_CHANNELS_FOR_STEREO: Selector = fourcc(b"dch2");
    pub const PREFERRED_CHANNEL_LAYOUT: Selector = fourcc(b"srnd");
    pub const ZERO_TIME_STAMP_PERIOD: Selector = fourcc(b"ring");
    pub const ICON: Selector = fourcc(b"icon");

    // Stream
    pub const IS_ACTIVE: Selector = fourcc(b"sact");
    pub const DIRECTION: Selector = fourcc(b"sdir");
    pub const TERMINAL_TYPE: Selector = fourcc(b"term");
    pub const STARTING_CHANNEL: Selector = fourcc(b"schn");
    pub const VIRTUAL_FORMAT: Selector = fourcc(b"sfmt");
    pub const PHYSICAL_FORMAT: Selector = fourcc(b"pft ");
    pub const AVAILABLE_VIRTUAL_FORMATS: Selector = fourcc(b"sfma");
    pub const AVAILABLE_PHYSICAL_FORMATS: Selector = fourcc(b"pfta");

    // Controls
    pub const CONTROL_SCOPE: Selector = fourcc(b"cscp");
    pub const CONTROL_ELEMENT: Selector = fourcc(b"celm");
    pub const BOOLEAN_VALUE: Selector = fourcc(b"bcvl");
    pub const SCALAR_VALUE: Selector = fourcc(b"lcsv");
    pub const DECIBEL_VALUE: Selector = fourcc(b"lcdv");
    pub const DECIBEL_RANGE: Selector = fourcc(b"lcdr");
    pub const CONVERT_SCALAR_TO_DECIBELS: Selector = fourcc(b"lcsd");
    pub const CONVERT_DECIBELS_TO_SCALAR: Selector = fourcc(b"lcds");
}

/// Class codes
pub mod class {
    use super::{ClassId, fourcc};

    pub const OBJECT: ClassId = fourcc(b"aobj");
    pub const PLUGIN: ClassId = fourcc(b"aplg");
    pub const BOX: ClassId = fourcc(b"abox");
    pub const DEVICE: ClassId = fourcc(b"adev");
    pub const STREAM: ClassId = fourcc(b"astr");
    pub const BOOLEAN_CONTROL: ClassId = fourcc(b"togl");
    pub const MUTE_CONTROL: ClassId = fourcc(b"mute");
    pub const LEVEL_CONTROL: ClassId = fourcc(b"levl");
    pub const VOLUME_CONTROL: ClassId = fourcc(b"vlme");
}
