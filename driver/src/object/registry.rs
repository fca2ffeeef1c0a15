//! Property registry
//!
//! One static table per object kind lists the selectors the kind answers,
//! how large each value is, and whether it can be set. The dispatch layer
//! consults these tables; the capability objects only supply values.

use super::address::{Scope, Selector, selector as sel};
use super::wire::{F64_SIZE, STREAM_FORMAT_SIZE, U32_SIZE, VALUE_RANGE_SIZE};

/// Byte size of a property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSize {
    Fixed(usize),
    /// Lists and strings, measured from the current value
    Computed,
}

/// Scopes in which a property exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeRule {
    Any,
    InputOrOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    pub selector: Selector,
    pub size: DataSize,
    pub settable: bool,
    pub scope: ScopeRule,
}

impl PropertyInfo {
    const fn fixed(selector: Selector, size: usize) -> Self {
        Self {
            selector,
            size: DataSize::Fixed(size),
            settable: false,
            scope: ScopeRule::Any,
        }
    }

    const fn computed(selector: Selector) -> Self {
        Self {
            selector,
            size: DataSize::Computed,
            settable: false,
            scope: ScopeRule::Any,
        }
    }

    const fn settable(mut self) -> Self {
        self.settable = true;
        self
    }

    const fn directional(mut self) -> Self {
        self.scope = ScopeRule::InputOrOutput;
        self
    }

    /// Whether the property exists when addressed with `scope`
    pub fn applies_to(&self, scope: Scope) -> bool {
        match self.scope {
            ScopeRule::Any => true,
            ScopeRule::InputOrOutput => scope.is_directional(),
        }
    }
}

/// Find the entry for `selector`
pub fn lookup(table: &'static [PropertyInfo], selector: Selector) -> Option<&'static PropertyInfo> {
    table.iter().find(|info| info.selector == selector)
}

const fn u32_prop(selector: Selector) -> PropertyInfo {
    PropertyInfo::fixed(selector, U32_SIZE)
}

pub static PLUGIN_PROPERTIES: &[PropertyInfo] = &[
    u32_prop(sel::BASE_CLASS),
    u32_prop(sel::CLASS),
    u32_prop(sel::OWNER),
    PropertyInfo::computed(sel::MANUFACTURER),
    PropertyInfo::computed(sel::OWNED_OBJECTS),
    PropertyInfo::computed(sel::BOX_LIST),
    u32_prop(sel::TRANSLATE_UID_TO_BOX),
    PropertyInfo::computed(sel::DEVICE_LIST),
    u32_prop(sel::TRANSLATE_UID_TO_DEVICE),
    PropertyInfo::computed(sel::RESOURCE_BUNDLE),
];

pub static BOX_PROPERTIES: &[PropertyInfo] = &[
    u32_prop(sel::BASE_CLASS),
    u32_prop(sel::CLASS),
    u32_prop(sel::OWNER),
    PropertyInfo::computed(sel::NAME).settable(),
    PropertyInfo::computed(sel::MODEL_NAME),
    PropertyInfo::computed(sel::MANUFACTURER),
    PropertyInfo::computed(sel::OWNED_OBJECTS),
    u32_prop(sel::IDENTIFY),
    PropertyInfo::computed(sel::SERIAL_NUMBER),
    PropertyInfo::computed(sel::FIRMWARE_VERSION),
    PropertyInfo::computed(sel::BOX_UID),
    u32_prop(sel::TRANSPORT_TYPE),
    u32_prop(sel::HAS_AUDIO),
    u32_prop(sel::HAS_VIDEO),
    u32_prop(sel::HAS_MIDI),
    u32_prop(sel::IS_PROTECTED),
    u32_prop(sel::ACQUIRED).settable(),
    u32_prop(sel::ACQUISITION_FAILED),
    PropertyInfo::computed(sel::BOX_DEVICE_LIST),
];

pub static DEVICE_PROPERTIES: &[PropertyInfo] = &[
    u32_prop(sel::BASE_CLASS),
    u32_prop(sel::CLASS),
    u32_prop(sel::OWNER),
    PropertyInfo::computed(sel::NAME),
    PropertyInfo::computed(sel::MANUFACTURER),
    PropertyInfo::computed(sel::DEVICE_UID),
    PropertyInfo::computed(sel::MODEL_UID),
    u32_prop(sel::TRANSPORT_TYPE),
    PropertyInfo::computed(sel::RELATED_DEVICES),
    u32_prop(sel::CLOCK_DOMAIN),
    u32_prop(sel::DEVICE_IS_ALIVE),
    u32_prop(sel::DEVICE_IS_RUNNING),
    u32_prop(sel::CAN_BE_DEFAULT).directional(),
    u32_prop(sel::CAN_BE_DEFAULT_SYSTEM).directional(),
    u32_prop(sel::LATENCY).directional(),
    PropertyInfo::computed(sel::STREAMS),
    PropertyInfo::computed(sel::CONTROL_LIST),
    PropertyInfo::computed(sel::OWNED_OBJECTS),
    u32_prop(sel::SAFETY_OFFSET).directional(),
    PropertyInfo::fixed(sel::NOMINAL_SAMPLE_RATE, F64_SIZE).settable(),
    PropertyInfo::computed(sel::AVAILABLE_NOMINAL_SAMPLE_RATES),
    u32_prop(sel::IS_HIDDEN),
    PropertyInfo::fixed(sel::PREFERRED_CHANNELS_FOR_STEREO, 2 * U32_SIZE).directional(),
    PropertyInfo::computed(sel::PREFERRED_CHANNEL_LAYOUT).directional(),
    u32_prop(sel::ZERO_TIME_STAMP_PERIOD),
    PropertyInfo::computed(sel::ICON),
];

pub static STREAM_PROPERTIES: &[PropertyInfo] = &[
    u32_prop(sel::BASE_CLASS),
    u32_prop(sel::CLASS),
    u32_prop(sel::OWNER),
    PropertyInfo::computed(sel::OWNED_OBJECTS),
    u32_prop(sel::IS_ACTIVE).settable(),
    u32_prop(sel::DIRECTION),
    u32_prop(sel::TERMINAL_TYPE),
    u32_prop(sel::STARTING_CHANNEL),
    u32_prop(sel::LATENCY),
    PropertyInfo::fixed(sel::VIRTUAL_FORMAT, STREAM_FORMAT_SIZE).settable(),
    PropertyInfo::fixed(sel::PHYSICAL_FORMAT, STREAM_FORMAT_SIZE).settable(),
    PropertyInfo::computed(sel::AVAILABLE_VIRTUAL_FORMATS),
    PropertyInfo::computed(sel::AVAILABLE_PHYSICAL_FORMATS),
];

pub static MUTE_PROPERTIES: &[PropertyInfo] = &[
    u32_prop(sel::BASE_CLASS),
    u32_prop(sel::CLASS),
    u32_prop(sel::OWNER),
    PropertyInfo::computed(sel::OWNED_OBJECTS),
    u32_prop(sel::CONTROL_SCOPE),
    u32_prop(sel::CONTROL_ELEMENT),
    u32_prop(sel::BOOLEAN_VALUE).settable(),
];

pub static VOLUME_PROPERTIES: &[PropertyInfo] = &[
    u32_prop(sel::BASE_CLASS),
    u32_prop(sel::CLASS),
    u32_prop(sel::OWNER),
    PropertyInfo::computed(sel::OWNED_OBJECTS),
    u32_prop(sel::CONTROL_SCOPE),
    u32_prop(sel::CONTROL_ELEMENT),
    u32_prop(sel::SCALAR_VALUE).settable(),
    u32_prop(sel::DECIBEL_VALUE).settable(),
    PropertyInfo::fixed(sel::DECIBEL_RANGE, VALUE_RANGE_SIZE),
    u32_prop(sel::CONVERT_SCALAR_TO_DECIBELS),
    u32_prop(sel::CONVERT_DECIBELS_TO_SCALAR),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let info = lookup(DEVICE_PROPERTIES, sel::NOMINAL_SAMPLE_RATE).unwrap();
        assert_eq!(info.size, DataSize::Fixed(8));
        assert!(info.settable);
        assert!(lookup(PLUGIN_PROPERTIES, sel::NOMINAL_SAMPLE_RATE).is_none());
    }

    #[test]
    fn test_directional_scope() {
        let latency = lookup(DEVICE_PROPERTIES, sel::LATENCY).unwrap();
        assert!(!latency.applies_to(Scope::Global));
        assert!(latency.applies_to(Scope::Input));
        assert!(latency.applies_to(Scope::Output));

        let name = lookup(DEVICE_PROPERTIES, sel::NAME).unwrap();
        assert!(name.applies_to(Scope::Global));
    }

    #[test]
    fn test_tables_have_unique_selectors() {
        for table in [
            PLUGIN_PROPERTIES,
            BOX_PROPERTIES,
            DEVICE_PROPERTIES,
            STREAM_PROPERTIES,
            MUTE_PROPERTIES,
            VOLUME_PROPERTIES,
        ] {
            for (i, info) in table.iter().enumerate() {
                assert!(table[i + 1..].iter().all(|o| o.selector != info.selector));
            }
        }
    }
}
