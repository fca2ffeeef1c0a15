//! Loopback walkthrough
//!
//! Drives the driver the way an audio server would: initialize, start I/O,
//! write a mix and read it back through the input stream.
//!
//! Run: cargo run --example loopback_demo

use std::sync::Arc;

use loopdev_lib::config::DriverConfig;
use loopdev_lib::driver::Driver;
use loopdev_lib::engine::{IoCycleInfo, IoOperation, ManualClock};
use loopdev_lib::host::Host;
use loopdev_lib::object::{AudioObjectId, ObjectId, PropertyAddress, selector};
use loopdev_lib::utils::HardwareResult;
use loopdev_lib::utils::logging::init_logging;
use serde_json::Value;

/// Host that prints every callback
struct PrintingHost;

impl Host for PrintingHost {
    fn properties_changed(&self, object: AudioObjectId, addresses: &[PropertyAddress]) -> HardwareResult<()> {
        println!("  host: {object} changed {} properties", addresses.len());
        Ok(())
    }

    fn request_device_configuration_change(&self, device: AudioObjectId, change_action: u64) -> HardwareResult<()> {
        println!("  host: device {device} asks for change {change_action}");
        Ok(())
    }

    fn copy_from_storage(&self, _key: &str) -> HardwareResult<Option<Value>> {
        Ok(None)
    }

    fn write_to_storage(&self, key: &str, value: &Value) -> HardwareResult<()> {
        println!("  host: store {key} = {value}");
        Ok(())
    }

    fn delete_from_storage(&self, key: &str) -> HardwareResult<()> {
        println!("  host: delete {key}");
        Ok(())
    }
}

fn main() -> HardwareResult<()> {
    init_logging();

    println!("=== Loopdev loopback ===\n");

    let config = DriverConfig::default();
    let frames = 512u32;
    let channels = config.channels as usize;
    let driver = Driver::new(config, Arc::new(ManualClock::new(48_000.0)))?;
    driver.initialize(Arc::new(PrintingHost))?;

    let device = ObjectId::Device.id();
    driver.start_io(device, 1)?;

    println!("1. Halve the master gain");
    let gain = PropertyAddress::global(selector::DECIBEL_VALUE);
    let changed = driver.set_property_data(
        ObjectId::OutputVolume.id(),
        &gain,
        &[],
        &(-6.0206f32).to_ne_bytes(),
    )?;
    println!("  {} properties changed\n", changed.len());

    println!("2. Write two cycles of mix, read the first back");
    let mut mix = vec![0.8f32; frames as usize * channels];
    for cycle in 0..2 {
        let output_time = f64::from(cycle * frames);
        driver.do_io_operation(
            device,
            ObjectId::OutputStream.id(),
            1,
            IoOperation::WRITE_MIX,
            frames,
            &IoCycleInfo::at(0.0, output_time),
            &mut mix,
        )?;
    }

    let mut input = vec![0.0f32; frames as usize * channels];
    driver.do_io_operation(
        device,
        ObjectId::InputStream.id(),
        1,
        IoOperation::READ_INPUT,
        frames,
        &IoCycleInfo::at(0.0, 0.0),
        &mut input,
    )?;
    println!("  wrote 0.8, read {:.4}\n", input[0]);

    println!("3. Ask for 44.1 kHz and perform it");
    let rate = PropertyAddress::global(selector::NOMINAL_SAMPLE_RATE);
    driver.set_property_data(device, &rate, &[], &44_100.0f64.to_ne_bytes())?;
    driver.stop_io(device, 1)?;
    driver.perform_device_configuration_change(device, 44_100)?;
    println!("  nominal rate is now {}", driver.sample_rate());

    // let the notifier print before exiting
    std::thread::sleep(std::time::Duration::from_millis(50));

    println!("\n=== Done ===");
    Ok(())
}
