mod common;

use std::sync::Arc;

use common::{RecordingHost, next_event};
use loopdev_lib::driver::ClientInfo;
use loopdev_lib::engine::{IoCycleInfo, IoOperation};
use loopdev_lib::host::HostMessage;
use loopdev_lib::interface::{DriverInterface, InterfaceId, Request, Response};
use loopdev_lib::object::{ObjectId, PropertyAddress, selector};
use loopdev_lib::utils::{HardwareError, StatusCode};

const DEVICE: u32 = ObjectId::Device.id();

fn interface() -> DriverInterface {
    DriverInterface::new(common::driver())
}

#[tokio::test]
async fn test_host_session() {
    let interface = interface();
    let (host, mut rx) = RecordingHost::new();

    assert_eq!(
        interface.call(Request::QueryInterface { id: InterfaceId::DRIVER }),
        Ok(Response::RefCount(1))
    );
    assert_eq!(
        interface.call(Request::Initialize { host: Some(host) }),
        Ok(Response::Done)
    );

    let client = ClientInfo {
        client_id: 7,
        process_id: 1234,
        is_native_endian: true,
        bundle_id: Some("com.example.player".into()),
    };
    assert_eq!(
        interface.call(Request::AddDeviceClient {
            device: DEVICE,
            client: Some(&client),
        }),
        Ok(Response::Done)
    );

    let address = PropertyAddress::global(selector::NOMINAL_SAMPLE_RATE);
    assert_eq!(
        interface.call(Request::HasProperty {
            object: DEVICE,
            client_pid: 1234,
            address: Some(&address),
        }),
        Ok(Response::Exists(true))
    );
    assert_eq!(
        interface.call(Request::IsPropertySettable {
            object: DEVICE,
            client_pid: 1234,
            address: Some(&address),
        }),
        Ok(Response::Settable(true))
    );
    assert_eq!(
        interface.call(Request::GetPropertyDataSize {
            object: DEVICE,
            client_pid: 1234,
            address: Some(&address),
            qualifier: &[],
        }),
        Ok(Response::Size(8))
    );

    let mut out = [0u8; 8];
    assert_eq!(
        interface.call(Request::GetPropertyData {
            object: DEVICE,
            client_pid: 1234,
            address: Some(&address),
            qualifier: &[],
            out: Some(&mut out),
        }),
        Ok(Response::Written(8))
    );
    assert_eq!(f64::from_ne_bytes(out), 48_000.0);

    let rate = 96_000.0f64.to_ne_bytes();
    assert_eq!(
        interface.call(Request::SetPropertyData {
            object: DEVICE,
            client_pid: 1234,
            address: Some(&address),
            qualifier: &[],
            data: Some(&rate),
        }),
        Ok(Response::Changed(Vec::new()))
    );
    let HostMessage::RequestConfigurationChange { change_action, .. } = next_event(&mut rx).await
    else {
        panic!("expected a configuration change request");
    };
    assert_eq!(
        interface.call(Request::PerformDeviceConfigurationChange {
            device: DEVICE,
            change_action,
        }),
        Ok(Response::Done)
    );
    assert_eq!(interface.driver().sample_rate(), 96_000.0);

    assert_eq!(
        interface.call(Request::StartIo {
            device: DEVICE,
            client_id: 7,
        }),
        Ok(Response::Done)
    );
    let Ok(Response::ZeroTimeStamp(ts)) = interface.call(Request::GetZeroTimeStamp {
        device: DEVICE,
        client_id: 7,
    }) else {
        panic!("expected a time stamp");
    };
    assert_eq!(ts.sample_time, 0.0);

    // an earlier cycle's mix, which the read below picks up
    let mut first_mix = vec![0.5f32; 512];
    assert_eq!(
        interface.call(Request::DoIoOperation {
            device: DEVICE,
            stream: ObjectId::OutputStream.id(),
            client_id: 7,
            operation: IoOperation::WRITE_MIX,
            frames: 256,
            cycle: Some(&IoCycleInfo::at(0.0, 0.0)),
            buffer: Some(&mut first_mix),
        }),
        Ok(Response::Done)
    );

    let cycle = IoCycleInfo::at(0.0, 256.0);
    for operation in [IoOperation::WRITE_MIX, IoOperation::READ_INPUT] {
        let stream = if operation == IoOperation::WRITE_MIX {
            ObjectId::OutputStream.id()
        } else {
            ObjectId::InputStream.id()
        };
        let mut buffer = vec![0.5f32; 512];

        assert_eq!(
            interface.call(Request::WillDoIoOperation {
                device: DEVICE,
                client_id: 7,
                operation,
            }),
            Ok(Response::WillDo(loopdev_lib::engine::IoCapability {
                will_do: true,
                in_place: true,
            }))
        );
        assert_eq!(
            interface.call(Request::BeginIoOperation {
                device: DEVICE,
                client_id: 7,
                operation,
                frames: 256,
                cycle: Some(&cycle),
            }),
            Ok(Response::Done)
        );
        assert_eq!(
            interface.call(Request::DoIoOperation {
                device: DEVICE,
                stream,
                client_id: 7,
                operation,
                frames: 256,
                cycle: Some(&cycle),
                buffer: Some(&mut buffer),
            }),
            Ok(Response::Done)
        );
        assert_eq!(
            interface.call(Request::EndIoOperation {
                device: DEVICE,
                client_id: 7,
                operation,
                frames: 256,
                cycle: Some(&cycle),
            }),
            Ok(Response::Done)
        );
        assert!(buffer.iter().all(|s| *s == 0.5));
    }

    assert_eq!(
        interface.call(Request::StopIo {
            device: DEVICE,
            client_id: 7,
        }),
        Ok(Response::Done)
    );
    assert_eq!(
        interface.call(Request::RemoveDeviceClient {
            device: DEVICE,
            client: Some(&client),
        }),
        Ok(Response::Done)
    );
    assert_eq!(interface.call(Request::Release), Ok(Response::RefCount(0)));
}

#[test]
fn test_status_codes() {
    let interface = interface();

    let result = interface.call(Request::CreateDevice {
        description: Some(&[]),
        client: Some(&ClientInfo::default()),
    });
    assert_eq!(StatusCode::from_result(&result), StatusCode::UNSUPPORTED_OPERATION);

    let result = interface.call(Request::DestroyDevice { device: DEVICE });
    assert_eq!(StatusCode::from_result(&result), StatusCode::UNSUPPORTED_OPERATION);

    let result = interface.call(Request::QueryInterface {
        id: InterfaceId(0x1234),
    });
    assert_eq!(StatusCode::from_result(&result), StatusCode::NO_INTERFACE);

    let result = interface.call(Request::StopIo {
        device: DEVICE,
        client_id: 1,
    });
    assert_eq!(StatusCode::from_result(&result), StatusCode::ILLEGAL_OPERATION);

    let result = interface.call(Request::StartIo {
        device: ObjectId::Plugin.id(),
        client_id: 1,
    });
    assert_eq!(StatusCode::from_result(&result), StatusCode::BAD_OBJECT);

    let address = PropertyAddress::global(u32::from_be_bytes(*b"what"));
    let result = interface.call(Request::IsPropertySettable {
        object: DEVICE,
        client_pid: 0,
        address: Some(&address),
    });
    assert_eq!(StatusCode::from_result(&result), StatusCode::UNKNOWN_PROPERTY);

    assert_eq!(
        StatusCode::from_result(&interface.call(Request::AddRef)),
        StatusCode::NO_ERROR
    );
}

#[test]
fn test_null_out_arguments() {
    let interface = interface();
    let address = PropertyAddress::global(selector::NAME);

    let result = interface.call(Request::SetPropertyData {
        object: ObjectId::Box.id(),
        client_pid: 0,
        address: Some(&address),
        qualifier: &[],
        data: None,
    });
    assert!(matches!(result, Err(HardwareError::IllegalOperation(_))));

    let cycle = IoCycleInfo::default();
    let result = interface.call(Request::DoIoOperation {
        device: DEVICE,
        stream: ObjectId::InputStream.id(),
        client_id: 0,
        operation: IoOperation::READ_INPUT,
        frames: 16,
        cycle: Some(&cycle),
        buffer: None,
    });
    assert!(matches!(result, Err(HardwareError::IllegalOperation(_))));

    let result = interface.call(Request::AddDeviceClient {
        device: DEVICE,
        client: None,
    });
    assert!(matches!(result, Err(HardwareError::IllegalOperation(_))));
}

#[test]
fn test_shared_driver_is_a_singleton() {
    let a = loopdev_lib::shared().unwrap();
    let b = loopdev_lib::shared().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}
