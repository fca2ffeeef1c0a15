mod common;

use common::{assert_quiet, initialized, next_event, read_property};
use loopdev_lib::coordinator::ChangePhase;
use loopdev_lib::host::HostMessage;
use loopdev_lib::object::{ObjectId, PropertyAddress, selector};
use loopdev_lib::utils::{HardwareError, StatusCode};

const DEVICE: u32 = ObjectId::Device.id();

fn nominal_rate() -> PropertyAddress {
    PropertyAddress::global(selector::NOMINAL_SAMPLE_RATE)
}

#[tokio::test]
async fn test_rate_applied_only_on_perform() {
    let (driver, _host, mut rx) = initialized();

    let changed = driver
        .set_property_data(DEVICE, &nominal_rate(), &[], &44_100.0f64.to_ne_bytes())
        .unwrap();
    assert!(changed.is_empty());
    assert_eq!(driver.sample_rate(), 48_000.0);
    assert_eq!(driver.coordinator().phase(), ChangePhase::Requested);

    let event = next_event(&mut rx).await;
    assert_eq!(
        event,
        HostMessage::RequestConfigurationChange {
            device: DEVICE,
            change_action: 44_100,
        }
    );

    driver
        .perform_device_configuration_change(DEVICE, 44_100)
        .unwrap();
    assert_eq!(driver.sample_rate(), 44_100.0);
    assert_eq!(driver.coordinator().phase(), ChangePhase::Idle);

    let ticks = driver.engine().host_ticks_per_frame();
    assert!((ticks - 48_000.0 / 44_100.0).abs() < 1e-12);

    let bytes = read_property(&driver, DEVICE, &nominal_rate(), &[]);
    assert_eq!(f64::from_ne_bytes(bytes.try_into().unwrap()), 44_100.0);
}

#[tokio::test]
async fn test_abort_discards_request() {
    let (driver, _host, mut rx) = initialized();
    let before = driver.snapshot();

    driver
        .set_property_data(DEVICE, &nominal_rate(), &[], &96_000.0f64.to_ne_bytes())
        .unwrap();
    assert!(matches!(
        next_event(&mut rx).await,
        HostMessage::RequestConfigurationChange { change_action: 96_000, .. }
    ));

    driver
        .abort_device_configuration_change(DEVICE, 96_000)
        .unwrap();
    assert_eq!(driver.snapshot(), before);
    assert_eq!(driver.coordinator().phase(), ChangePhase::Idle);
    assert!(driver.coordinator().pending().is_empty());
}

#[tokio::test]
async fn test_unsupported_rate_is_rejected() {
    let (driver, _host, mut rx) = initialized();
    let before = driver.snapshot();

    let result = driver.set_property_data(DEVICE, &nominal_rate(), &[], &22_050.0f64.to_ne_bytes());
    assert!(matches!(result, Err(HardwareError::IllegalOperation(_))));
    assert_eq!(StatusCode::from_result(&result), StatusCode::ILLEGAL_OPERATION);

    assert_eq!(driver.snapshot(), before);
    assert_eq!(driver.coordinator().phase(), ChangePhase::Idle);
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_current_rate_requests_nothing() {
    let (driver, _host, mut rx) = initialized();

    driver
        .set_property_data(DEVICE, &nominal_rate(), &[], &48_000.0f64.to_ne_bytes())
        .unwrap();
    assert_quiet(&mut rx).await;
}

#[tokio::test]
async fn test_stream_format_routes_through_coordinator() {
    let (driver, _host, mut rx) = initialized();
    let address = PropertyAddress::global(selector::VIRTUAL_FORMAT);

    let mut format = read_property(&driver, ObjectId::OutputStream.id(), &address, &[]);
    format[..8].copy_from_slice(&88_200.0f64.to_ne_bytes());

    driver
        .set_property_data(ObjectId::OutputStream.id(), &address, &[], &format)
        .unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        HostMessage::RequestConfigurationChange {
            device: DEVICE,
            change_action: 88_200,
        }
    );
    assert_eq!(driver.sample_rate(), 48_000.0);

    driver
        .perform_device_configuration_change(DEVICE, 88_200)
        .unwrap();
    let current = read_property(&driver, ObjectId::InputStream.id(), &address, &[]);
    assert_eq!(current, format);
}

#[tokio::test]
async fn test_stream_format_mismatch() {
    let (driver, _host, _rx) = initialized();
    let address = PropertyAddress::global(selector::PHYSICAL_FORMAT);

    let mut format = read_property(&driver, ObjectId::InputStream.id(), &address, &[]);
    // channels per frame
    format[28..32].copy_from_slice(&1u32.to_ne_bytes());

    let err = driver
        .set_property_data(ObjectId::InputStream.id(), &address, &[], &format)
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::UNSUPPORTED_FORMAT);
}

#[tokio::test]
async fn test_perform_validates_target_and_rate() {
    let (driver, _host, _rx) = initialized();

    assert_eq!(
        driver.perform_device_configuration_change(ObjectId::Box.id(), 44_100),
        Err(HardwareError::BadObject(ObjectId::Box.id()))
    );
    assert!(matches!(
        driver.perform_device_configuration_change(DEVICE, 1_234),
        Err(HardwareError::IllegalOperation(_))
    ));
    assert_eq!(driver.sample_rate(), 48_000.0);
}

#[tokio::test]
async fn test_unsolicited_perform_is_applied() {
    let (driver, _host, _rx) = initialized();

    driver
        .perform_device_configuration_change(DEVICE, 192_000)
        .unwrap();
    assert_eq!(driver.sample_rate(), 192_000.0);
    assert_eq!(driver.coordinator().phase(), ChangePhase::Idle);
}

#[tokio::test]
async fn test_request_before_initialize() {
    let driver = common::driver();
    let result = driver.set_property_data(DEVICE, &nominal_rate(), &[], &44_100.0f64.to_ne_bytes());
    assert!(matches!(result, Err(HardwareError::IllegalOperation(_))));
    assert_eq!(driver.coordinator().phase(), ChangePhase::Idle);
}
