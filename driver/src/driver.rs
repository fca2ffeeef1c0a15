//! Driver context
//!
//! One [`Driver`] holds everything the host's entry points act on: the
//! configuration, the state guarded by the state lock, the master controls,
//! the I/O engine and the configuration-change coordinator. Host callbacks
//! are only ever queued on the notifier, never made inline.
//!
//! Lock order is coordinator, then state, then the engine's I/O lock.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde_json::Value;

use crate::config::DriverConfig;
use crate::coordinator::ConfigChangeCoordinator;
use crate::engine::{
    HostClock, IoCapability, IoCycleInfo, IoEngine, IoOperation, MasterControls, TimeStamp,
};
use crate::host::{Host, HostMessage, HostNotifier, NOTIFIER_QUEUE_CAPACITY};
use crate::interface::InterfaceId;
use crate::object::{AudioObjectId, Direction, ObjectId, PropertyAddress, expect_object};
use crate::utils::error::{HardwareError, HardwareResult};

/// Mutable driver state, guarded by the state lock
#[derive(Debug, Clone, PartialEq)]
pub struct DriverState {
    pub sample_rate: f64,
    pub input_stream_active: bool,
    pub output_stream_active: bool,
    pub box_acquired: bool,
    pub box_name: Option<String>,
    /// Clients currently running I/O
    pub io_running: u64,
}

impl DriverState {
    fn new(config: &DriverConfig) -> Self {
        Self {
            sample_rate: config.default_sample_rate,
            input_stream_active: true,
            output_stream_active: true,
            box_acquired: true,
            box_name: Some(config.default_box_name.clone()),
            io_running: 0,
        }
    }

    fn stream_active(&mut self, direction: Direction) -> &mut bool {
        match direction {
            Direction::Input => &mut self.input_stream_active,
            Direction::Output => &mut self.output_stream_active,
        }
    }
}

/// A client the host registered with the device
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientInfo {
    pub client_id: u32,
    pub process_id: i32,
    pub is_native_endian: bool,
    pub bundle_id: Option<String>,
}

pub struct Driver {
    config: DriverConfig,
    state: Mutex<DriverState>,
    controls: MasterControls,
    engine: IoEngine,
    coordinator: ConfigChangeCoordinator,
    notifier: OnceLock<HostNotifier>,
    /// Advisory count of handed-out interface references
    ref_count: AtomicU32,
}

impl Driver {
    /// Build a driver from a configuration, rejecting one that fails
    /// [`DriverConfig::validate`]
    pub fn new(config: DriverConfig, clock: Arc<dyn HostClock>) -> HardwareResult<Self> {
        config.validate()?;
        let engine = IoEngine::new(&config, clock);
        Ok(Self {
            state: Mutex::new(DriverState::new(&config)),
            controls: MasterControls::default(),
            engine,
            coordinator: ConfigChangeCoordinator::new(),
            notifier: OnceLock::new(),
            ref_count: AtomicU32::new(0),
            config,
        })
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn controls(&self) -> &MasterControls {
        &self.controls
    }

    pub fn engine(&self) -> &IoEngine {
        &self.engine
    }

    pub fn coordinator(&self) -> &ConfigChangeCoordinator {
        &self.coordinator
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> DriverState {
        self.state.lock().clone()
    }

    pub fn sample_rate(&self) -> f64 {
        self.state.lock().sample_rate
    }

    pub fn is_box_acquired(&self) -> bool {
        self.state.lock().box_acquired
    }

    pub fn box_name(&self) -> Option<String> {
        self.state.lock().box_name.clone()
    }

    pub fn is_stream_active(&self, direction: Direction) -> bool {
        *self.state.lock().stream_active(direction)
    }

    pub fn is_io_running(&self) -> bool {
        self.state.lock().io_running > 0
    }

    pub fn is_initialized(&self) -> bool {
        self.notifier.get().is_some()
    }

    // Property-level mutations. Each returns whether the value changed.

    pub fn set_box_acquired(&self, acquired: bool) -> bool {
        {
            let mut state = self.state.lock();
            if state.box_acquired == acquired {
                return false;
            }
            state.box_acquired = acquired;
        }

        tracing::info!(acquired, "Box acquisition changed");
        self.persist(&self.config.storage.box_acquired, Value::Bool(acquired));
        self.notify(
            ObjectId::Plugin.id(),
            vec![PropertyAddress::global(crate::object::selector::DEVICE_LIST)],
        );
        true
    }

    /// Rename the box; names differing only in case count as equal
    pub fn set_box_name(&self, name: Option<String>) -> bool {
        {
            let mut state = self.state.lock();
            let same = match (&state.box_name, &name) {
                (Some(current), Some(new)) => current.to_lowercase() == new.to_lowercase(),
                (None, None) => true,
                _ => false,
            };
            if same {
                return false;
            }
            state.box_name = name.clone();
        }

        let key = &self.config.storage.box_name;
        match name {
            Some(name) => {
                tracing::info!(name = %name, "Box renamed");
                self.persist(key, Value::String(name));
            }
            None => {
                tracing::info!("Box name cleared");
                self.forget(key);
            }
        }
        true
    }

    pub fn set_stream_active(&self, direction: Direction, active: bool) -> bool {
        let mut state = self.state.lock();
        let current = state.stream_active(direction);
        if *current == active {
            return false;
        }
        *current = active;
        tracing::debug!(?direction, active, "Stream activity changed");
        true
    }

    pub fn set_master_mute(&self, muted: bool) -> bool {
        let _state = self.state.lock();
        if self.controls.is_muted() == muted {
            return false;
        }
        self.controls.store_muted(muted);
        tracing::debug!(muted, "Master mute changed");
        true
    }

    pub fn set_master_gain(&self, gain: f32) -> bool {
        self.update_master_gain(|_| Some(gain))
    }

    /// Replace the gain with whatever `next` derives from the current one
    ///
    /// `next` runs under the state lock and returns `None` when the caller
    /// sees no change. Non-finite gains are refused.
    pub fn update_master_gain(&self, next: impl FnOnce(f32) -> Option<f32>) -> bool {
        let _state = self.state.lock();
        let current = self.controls.gain();
        let Some(gain) = next(current) else {
            return false;
        };
        if !gain.is_finite() {
            tracing::warn!(gain, "Ignoring non-finite master gain");
            return false;
        }
        if current == gain {
            return false;
        }
        self.controls.store_gain(gain);
        tracing::debug!(gain, "Master gain changed");
        true
    }

    /// Start a deferred sample-rate change
    pub fn request_sample_rate(&self, sample_rate: f64) -> HardwareResult<()> {
        self.coordinator.request_sample_rate(self, sample_rate)
    }

    /// Commit a new nominal rate; the host has stopped I/O
    pub(crate) fn apply_sample_rate(&self, sample_rate: f64) {
        let mut state = self.state.lock();
        state.sample_rate = sample_rate;
        self.engine.set_sample_rate(sample_rate);
    }

    // Host bridge

    pub(crate) fn post(&self, message: HostMessage) -> HardwareResult<()> {
        self.notifier
            .get()
            .ok_or_else(|| HardwareError::illegal("driver is not initialized"))?
            .post(message)
    }

    /// Queue a change notification; a full queue drops it
    pub(crate) fn notify(&self, object: AudioObjectId, addresses: Vec<PropertyAddress>) {
        if let Err(e) = self.post(HostMessage::PropertiesChanged { object, addresses }) {
            tracing::warn!(error = %e, object, "Dropped property change notification");
        }
    }

    fn persist(&self, key: &str, value: Value) {
        let message = HostMessage::WriteStorage {
            key: key.to_string(),
            value,
        };
        if let Err(e) = self.post(message) {
            tracing::warn!(error = %e, key, "Failed to persist setting");
        }
    }

    fn forget(&self, key: &str) {
        if let Err(e) = self.post(HostMessage::DeleteStorage {
            key: key.to_string(),
        }) {
            tracing::warn!(error = %e, key, "Failed to delete setting");
        }
    }

    // Lifetime

    /// Hand out another reference if `id` names an interface this driver
    /// implements
    pub fn query_interface(&self, id: InterfaceId) -> HardwareResult<u32> {
        if id == InterfaceId::UNKNOWN || id == InterfaceId::DRIVER {
            Ok(self.add_ref())
        } else {
            tracing::debug!(interface = %id, "Interface not supported");
            Err(HardwareError::NoInterface)
        }
    }

    pub fn add_ref(&self) -> u32 {
        Self::bump(&self.ref_count, |count| count.checked_add(1))
    }

    /// Drop a reference; the driver itself lives as long as the process
    pub fn release(&self) -> u32 {
        Self::bump(&self.ref_count, |count| count.checked_sub(1))
    }

    fn bump(counter: &AtomicU32, step: impl Fn(u32) -> Option<u32>) -> u32 {
        match counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, &step) {
            Ok(previous) => step(previous).unwrap_or(previous),
            Err(saturated) => saturated,
        }
    }

    pub fn ref_count(&self) -> u32 {
        self.ref_count.load(Ordering::SeqCst)
    }

    /// Install the host, restore persisted box settings and start the
    /// notifier
    pub fn initialize(&self, host: Arc<dyn Host>) -> HardwareResult<()> {
        if self.is_initialized() {
            return Err(HardwareError::illegal("driver is already initialized"));
        }

        let keys = &self.config.storage;
        let acquired = load_setting(host.as_ref(), &keys.box_acquired)
            .and_then(|value| stored_flag(&value))
            .unwrap_or(true);
        let name = load_setting(host.as_ref(), &keys.box_name)
            .and_then(|value| value.as_str().map(str::to_owned))
            .unwrap_or_else(|| self.config.default_box_name.clone());

        let sample_rate = {
            let mut state = self.state.lock();
            state.box_acquired = acquired;
            state.box_name = Some(name);
            state.sample_rate
        };
        self.engine.set_sample_rate(sample_rate);

        let notifier = HostNotifier::start(host, NOTIFIER_QUEUE_CAPACITY)?;
        self.notifier
            .set(notifier)
            .map_err(|_| HardwareError::illegal("driver is already initialized"))?;

        tracing::info!(
            acquired,
            sample_rate,
            ticks_per_frame = self.engine.host_ticks_per_frame(),
            "Driver initialized"
        );
        Ok(())
    }

    pub fn create_device(&self, _description: &[u8], _client: &ClientInfo) -> HardwareResult<AudioObjectId> {
        Err(HardwareError::UnsupportedOperation("create_device"))
    }

    pub fn destroy_device(&self, _device: AudioObjectId) -> HardwareResult<()> {
        Err(HardwareError::UnsupportedOperation("destroy_device"))
    }

    pub fn add_device_client(&self, device: AudioObjectId, client: &ClientInfo) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;
        tracing::debug!(
            client_id = client.client_id,
            pid = client.process_id,
            bundle = client.bundle_id.as_deref().unwrap_or(""),
            "Device client added"
        );
        Ok(())
    }

    pub fn remove_device_client(&self, device: AudioObjectId, client: &ClientInfo) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;
        tracing::debug!(client_id = client.client_id, "Device client removed");
        Ok(())
    }

    pub fn perform_device_configuration_change(
        &self,
        device: AudioObjectId,
        change_action: u64,
    ) -> HardwareResult<()> {
        self.coordinator.perform(self, device, change_action)
    }

    pub fn abort_device_configuration_change(
        &self,
        device: AudioObjectId,
        change_action: u64,
    ) -> HardwareResult<()> {
        self.coordinator.abort(device, change_action)
    }

    // I/O

    pub fn start_io(&self, device: AudioObjectId, client_id: u32) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;
        let mut state = self.state.lock();
        self.engine.start(&mut state.io_running)?;
        tracing::debug!(client_id, "Client started I/O");
        Ok(())
    }

    pub fn stop_io(&self, device: AudioObjectId, client_id: u32) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;
        let mut state = self.state.lock();
        self.engine.stop(&mut state.io_running)?;
        tracing::debug!(client_id, "Client stopped I/O");
        Ok(())
    }

    pub fn get_zero_time_stamp(&self, device: AudioObjectId, _client_id: u32) -> HardwareResult<TimeStamp> {
        expect_object(device, ObjectId::Device)?;
        Ok(self.engine.zero_time_stamp())
    }

    pub fn will_do_io_operation(
        &self,
        device: AudioObjectId,
        _client_id: u32,
        operation: u32,
    ) -> HardwareResult<IoCapability> {
        expect_object(device, ObjectId::Device)?;
        Ok(self.engine.will_do(IoOperation::from(operation)))
    }

    pub fn begin_io_operation(
        &self,
        device: AudioObjectId,
        _client_id: u32,
        _operation: u32,
        _frames: u32,
        _cycle: &IoCycleInfo,
    ) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)
    }

    /// Run one operation of an I/O cycle
    ///
    /// Read-input only acts on the input stream and write-mix only on the
    /// output stream; any other pairing leaves `buffer` untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn do_io_operation(
        &self,
        device: AudioObjectId,
        stream: AudioObjectId,
        _client_id: u32,
        operation: u32,
        frames: u32,
        cycle: &IoCycleInfo,
        buffer: &mut [f32],
    ) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)?;
        let stream = ObjectId::try_from(stream)?;
        if !stream.is_stream() {
            return Err(HardwareError::BadObject(stream.id()));
        }

        let operation = IoOperation::from(operation);
        match (operation, stream.direction()) {
            (IoOperation::ReadInput, Some(Direction::Input))
            | (IoOperation::WriteMix, Some(Direction::Output)) => {
                self.engine
                    .transfer(operation, frames, cycle, buffer, &self.controls);
            }
            _ => {}
        }
        Ok(())
    }

    pub fn end_io_operation(
        &self,
        device: AudioObjectId,
        _client_id: u32,
        _operation: u32,
        _frames: u32,
        _cycle: &IoCycleInfo,
    ) -> HardwareResult<()> {
        expect_object(device, ObjectId::Device)
    }
}

/// Read one persisted value; read failures fall back to the default
fn load_setting(host: &dyn Host, key: &str) -> Option<Value> {
    match host.copy_from_storage(key) {
        Ok(value) => {
            tracing::debug!(key, found = value.is_some(), "Loaded persisted setting");
            value
        }
        Err(e) => {
            tracing::warn!(error = %e, key, "Failed to read persisted setting");
            None
        }
    }
}

/// Booleans may have been stored as numbers
fn stored_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0),
        _ => None,
    }
}
