#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use loopdev_lib::config::DriverConfig;
use loopdev_lib::driver::Driver;
use loopdev_lib::engine::ManualClock;
use loopdev_lib::host::{Host, HostMessage};
use loopdev_lib::object::{AudioObjectId, PropertyAddress};
use loopdev_lib::utils::HardwareResult;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

/// Ticks per second of the test clock: one tick per frame at 48 kHz
pub const CLOCK_RATE: f64 = 48_000.0;

/// In-memory host that records every callback and forwards it to the test
pub struct RecordingHost {
    events: mpsc::UnboundedSender<HostMessage>,
    storage: Mutex<HashMap<String, Value>>,
}

impl RecordingHost {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<HostMessage>) {
        Self::with_storage([])
    }

    pub fn with_storage<const N: usize>(
        entries: [(&str, Value); N],
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<HostMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let storage = entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        let host = Arc::new(Self {
            events: tx,
            storage: Mutex::new(storage),
        });
        (host, rx)
    }

    pub fn stored(&self, key: &str) -> Option<Value> {
        self.storage.lock().get(key).cloned()
    }

    fn record(&self, message: HostMessage) {
        let _ = self.events.send(message);
    }
}

impl Host for RecordingHost {
    fn properties_changed(
        &self,
        object: AudioObjectId,
        addresses: &[PropertyAddress],
    ) -> HardwareResult<()> {
        self.record(HostMessage::PropertiesChanged {
            object,
            addresses: addresses.to_vec(),
        });
        Ok(())
    }

    fn request_device_configuration_change(
        &self,
        device: AudioObjectId,
        change_action: u64,
    ) -> HardwareResult<()> {
        self.record(HostMessage::RequestConfigurationChange {
            device,
            change_action,
        });
        Ok(())
    }

    fn copy_from_storage(&self, key: &str) -> HardwareResult<Option<Value>> {
        Ok(self.stored(key))
    }

    fn write_to_storage(&self, key: &str, value: &Value) -> HardwareResult<()> {
        self.storage.lock().insert(key.to_string(), value.clone());
        self.record(HostMessage::WriteStorage {
            key: key.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn delete_from_storage(&self, key: &str) -> HardwareResult<()> {
        self.storage.lock().remove(key);
        self.record(HostMessage::DeleteStorage {
            key: key.to_string(),
        });
        Ok(())
    }
}

pub fn driver_with_clock() -> (Arc<Driver>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(CLOCK_RATE));
    let driver = Arc::new(Driver::new(DriverConfig::default(), clock.clone()).unwrap());
    (driver, clock)
}

pub fn driver() -> Arc<Driver> {
    driver_with_clock().0
}

/// A driver initialized against a fresh recording host
pub fn initialized() -> (Arc<Driver>, Arc<RecordingHost>, mpsc::UnboundedReceiver<HostMessage>) {
    let (host, rx) = RecordingHost::new();
    let driver = driver();
    driver.initialize(host.clone()).unwrap();
    (driver, host, rx)
}

/// Next host callback, failing the test if none arrives within a second
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<HostMessage>) -> HostMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a host callback")
        .expect("host channel closed")
}

/// Assert that no host callback arrives for a short while
pub async fn assert_quiet(rx: &mut mpsc::UnboundedReceiver<HostMessage>) {
    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "unexpected host callback: {result:?}");
}

/// Size a property, then read it with exactly that capacity
pub fn read_property(
    driver: &Driver,
    object: AudioObjectId,
    address: &PropertyAddress,
    qualifier: &[u8],
) -> Vec<u8> {
    let size = driver
        .get_property_data_size(object, address, qualifier)
        .unwrap();
    let mut buf = vec![0u8; size];
    let written = driver
        .get_property_data(object, address, qualifier, &mut buf)
        .unwrap();
    assert_eq!(written, size);
    buf
}

pub fn read_u32(driver: &Driver, object: AudioObjectId, address: &PropertyAddress) -> u32 {
    let bytes = read_property(driver, object, address, &[]);
    u32::from_ne_bytes(bytes[..4].try_into().unwrap())
}
