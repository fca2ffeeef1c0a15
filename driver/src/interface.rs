//! Host operation table
//!
//! The audio server drives the plug-in through a flat table of entry
//! points. [`DriverInterface`] is that table: one handler per
//! [`OperationId`], each closing over the shared [`Driver`]. Arguments the
//! host may pass as null arrive as `None` and are rejected before they
//! reach the driver.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use loopdev_lib::config::DriverConfig;
//! use loopdev_lib::driver::Driver;
//! use loopdev_lib::engine::ManualClock;
//! use loopdev_lib::interface::{DriverInterface, Request, Response};
//!
//! let driver = Arc::new(Driver::new(DriverConfig::default(), Arc::new(ManualClock::new(1.0e9))).unwrap());
//! let interface = DriverInterface::new(driver);
//! assert_eq!(interface.call(Request::AddRef).unwrap(), Response::RefCount(1));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::config::DriverConfig;
use crate::driver::{ClientInfo, Driver};
use crate::engine::{IoCapability, IoCycleInfo, MonotonicClock, TimeStamp};
use crate::host::Host;
use crate::object::{AudioObjectId, ChangedProperties, PropertyAddress};
use crate::utils::error::{HardwareError, HardwareResult};

/// 128-bit interface or type identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(pub u128);

impl InterfaceId {
    /// The base interface every plug-in answers
    pub const UNKNOWN: InterfaceId = InterfaceId(0x00000000_0000_0000_C000_000000000046);

    /// Audio-server driver interface
    pub const DRIVER: InterfaceId = InterfaceId(0xEEA5773D_CC43_49F1_8E00_8F96E7D23B17);

    /// Audio-server plug-in type, requested from the factory
    pub const PLUGIN_TYPE: InterfaceId = InterfaceId(0x443ABAB8_E7B3_491A_B985_BEB9187030DB);

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            v >> 96,
            (v >> 80) & 0xFFFF,
            (v >> 64) & 0xFFFF,
            (v >> 48) & 0xFFFF,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl fmt::Debug for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InterfaceId({self})")
    }
}

/// Entry points of the driver interface, in table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    QueryInterface,
    AddRef,
    Release,
    Initialize,
    CreateDevice,
    DestroyDevice,
    AddDeviceClient,
    RemoveDeviceClient,
    PerformDeviceConfigurationChange,
    AbortDeviceConfigurationChange,
    HasProperty,
    IsPropertySettable,
    GetPropertyDataSize,
    GetPropertyData,
    SetPropertyData,
    StartIo,
    StopIo,
    GetZeroTimeStamp,
    WillDoIoOperation,
    BeginIoOperation,
    DoIoOperation,
    EndIoOperation,
}

impl OperationId {
    pub const ALL: [OperationId; 22] = [
        OperationId::QueryInterface,
        OperationId::AddRef,
        OperationId::Release,
        OperationId::Initialize,
        OperationId::CreateDevice,
        OperationId::DestroyDevice,
        OperationId::AddDeviceClient,
        OperationId::RemoveDeviceClient,
        OperationId::PerformDeviceConfigurationChange,
        OperationId::AbortDeviceConfigurationChange,
        OperationId::HasProperty,
        OperationId::IsPropertySettable,
        OperationId::GetPropertyDataSize,
        OperationId::GetPropertyData,
        OperationId::SetPropertyData,
        OperationId::StartIo,
        OperationId::StopIo,
        OperationId::GetZeroTimeStamp,
        OperationId::WillDoIoOperation,
        OperationId::BeginIoOperation,
        OperationId::DoIoOperation,
        OperationId::EndIoOperation,
    ];
}

/// Arguments of one host call
pub enum Request<'a> {
    QueryInterface {
        id: InterfaceId,
    },
    AddRef,
    Release,
    Initialize {
        host: Option<Arc<dyn Host>>,
    },
    CreateDevice {
        description: Option<&'a [u8]>,
        client: Option<&'a ClientInfo>,
    },
    DestroyDevice {
        device: AudioObjectId,
    },
    AddDeviceClient {
        device: AudioObjectId,
        client: Option<&'a ClientInfo>,
    },
    RemoveDeviceClient {
        device: AudioObjectId,
        client: Option<&'a ClientInfo>,
    },
    PerformDeviceConfigurationChange {
        device: AudioObjectId,
        change_action: u64,
    },
    AbortDeviceConfigurationChange {
        device: AudioObjectId,
        change_action: u64,
    },
    HasProperty {
        object: AudioObjectId,
        client_pid: i32,
        address: Option<&'a PropertyAddress>,
    },
    IsPropertySettable {
        object: AudioObjectId,
        client_pid: i32,
        address: Option<&'a PropertyAddress>,
    },
    GetPropertyDataSize {
        object: AudioObjectId,
        client_pid: i32,
        address: Option<&'a PropertyAddress>,
        qualifier: &'a [u8],
    },
    GetPropertyData {
        object: AudioObjectId,
        client_pid: i32,
        address: Option<&'a PropertyAddress>,
        qualifier: &'a [u8],
        out: Option<&'a mut [u8]>,
    },
    SetPropertyData {
        object: AudioObjectId,
        client_pid: i32,
        address: Option<&'a PropertyAddress>,
        qualifier: &'a [u8],
        data: Option<&'a [u8]>,
    },
    StartIo {
        device: AudioObjectId,
        client_id: u32,
    },
    StopIo {
        device: AudioObjectId,
        client_id: u32,
    },
    GetZeroTimeStamp {
        device: AudioObjectId,
        client_id: u32,
    },
    WillDoIoOperation {
        device: AudioObjectId,
        client_id: u32,
        operation: u32,
    },
    BeginIoOperation {
        device: AudioObjectId,
        client_id: u32,
        operation: u32,
        frames: u32,
        cycle: Option<&'a IoCycleInfo>,
    },
    DoIoOperation {
        device: AudioObjectId,
        stream: AudioObjectId,
        client_id: u32,
        operation: u32,
        frames: u32,
        cycle: Option<&'a IoCycleInfo>,
        buffer: Option<&'a mut [f32]>,
    },
    EndIoOperation {
        device: AudioObjectId,
        client_id: u32,
        operation: u32,
        frames: u32,
        cycle: Option<&'a IoCycleInfo>,
    },
}

impl Request<'_> {
    pub fn operation(&self) -> OperationId {
        match self {
            Request::QueryInterface { .. } => OperationId::QueryInterface,
            Request::AddRef => OperationId::AddRef,
            Request::Release => OperationId::Release,
            Request::Initialize { .. } => OperationId::Initialize,
            Request::CreateDevice { .. } => OperationId::CreateDevice,
            Request::DestroyDevice { .. } => OperationId::DestroyDevice,
            Request::AddDeviceClient { .. } => OperationId::AddDeviceClient,
            Request::RemoveDeviceClient { .. } => OperationId::RemoveDeviceClient,
            Request::PerformDeviceConfigurationChange { .. } => {
                OperationId::PerformDeviceConfigurationChange
            }
            Request::AbortDeviceConfigurationChange { .. } => {
                OperationId::AbortDeviceConfigurationChange
            }
            Request::HasProperty { .. } => OperationId::HasProperty,
            Request::IsPropertySettable { .. } => OperationId::IsPropertySettable,
            Request::GetPropertyDataSize { .. } => OperationId::GetPropertyDataSize,
            Request::GetPropertyData { .. } => OperationId::GetPropertyData,
            Request::SetPropertyData { .. } => OperationId::SetPropertyData,
            Request::StartIo { .. } => OperationId::StartIo,
            Request::StopIo { .. } => OperationId::StopIo,
            Request::GetZeroTimeStamp { .. } => OperationId::GetZeroTimeStamp,
            Request::WillDoIoOperation { .. } => OperationId::WillDoIoOperation,
            Request::BeginIoOperation { .. } => OperationId::BeginIoOperation,
            Request::DoIoOperation { .. } => OperationId::DoIoOperation,
            Request::EndIoOperation { .. } => OperationId::EndIoOperation,
        }
    }
}

/// Result of a successful host call
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Done,
    RefCount(u32),
    Device(AudioObjectId),
    Exists(bool),
    Settable(bool),
    Size(usize),
    Written(usize),
    Changed(ChangedProperties),
    ZeroTimeStamp(TimeStamp),
    WillDo(IoCapability),
}

type Handler = Box<dyn for<'a> Fn(Request<'a>) -> HardwareResult<Response> + Send + Sync>;

fn required<T>(arg: Option<T>, name: &'static str) -> HardwareResult<T> {
    arg.ok_or_else(|| HardwareError::illegal(format!("{name} is null")))
}

fn mismatched(operation: OperationId, request: &Request<'_>) -> HardwareError {
    HardwareError::illegal(format!(
        "{:?} handler received a {:?} request",
        operation,
        request.operation()
    ))
}

/// Boxed handler that serves requests matching `$pattern` and reports any
/// other request as misrouted
macro_rules! entry {
    ($operation:ident, $pattern:pat => $body:block) => {
        Box::new(move |request: Request<'_>| -> HardwareResult<Response> {
            match request {
                $pattern => $body,
                other => Err(mismatched(OperationId::$operation, &other)),
            }
        }) as Handler
    };
}

/// The driver's host-facing operation table
pub struct DriverInterface {
    driver: Arc<Driver>,
    handlers: HashMap<OperationId, Handler>,
}

impl DriverInterface {
    /// Build the table once, every entry sharing `driver`
    pub fn new(driver: Arc<Driver>) -> Self {
        let mut handlers: HashMap<OperationId, Handler> = HashMap::with_capacity(OperationId::ALL.len());
        for operation in OperationId::ALL {
            handlers.insert(operation, Self::handler(operation, driver.clone()));
        }
        Self { driver, handlers }
    }

    pub fn driver(&self) -> &Arc<Driver> {
        &self.driver
    }

    /// Route `request` to its entry
    pub fn call(&self, request: Request<'_>) -> HardwareResult<Response> {
        let operation = request.operation();
        let handler = self
            .handlers
            .get(&operation)
            .ok_or(HardwareError::UnsupportedOperation("operation not in table"))?;
        handler(request)
    }

    /// The entry for `operation`; it accepts only its own request shape
    fn handler(operation: OperationId, driver: Arc<Driver>) -> Handler {
        match operation {
            OperationId::QueryInterface => entry!(QueryInterface, Request::QueryInterface { id } => {
                driver.query_interface(id).map(Response::RefCount)
            }),
            OperationId::AddRef => entry!(AddRef, Request::AddRef => {
                Ok(Response::RefCount(driver.add_ref()))
            }),
            OperationId::Release => entry!(Release, Request::Release => {
                Ok(Response::RefCount(driver.release()))
            }),
            OperationId::Initialize => entry!(Initialize, Request::Initialize { host } => {
                driver.initialize(required(host, "host")?).map(|()| Response::Done)
            }),
            OperationId::CreateDevice => entry!(CreateDevice, Request::CreateDevice { description, client } => {
                driver
                    .create_device(required(description, "description")?, required(client, "client")?)
                    .map(Response::Device)
            }),
            OperationId::DestroyDevice => entry!(DestroyDevice, Request::DestroyDevice { device } => {
                driver.destroy_device(device).map(|()| Response::Done)
            }),
            OperationId::AddDeviceClient => entry!(AddDeviceClient, Request::AddDeviceClient { device, client } => {
                driver
                    .add_device_client(device, required(client, "client")?)
                    .map(|()| Response::Done)
            }),
            OperationId::RemoveDeviceClient => entry!(RemoveDeviceClient, Request::RemoveDeviceClient { device, client } => {
                driver
                    .remove_device_client(device, required(client, "client")?)
                    .map(|()| Response::Done)
            }),
            OperationId::PerformDeviceConfigurationChange => entry!(
                PerformDeviceConfigurationChange,
                Request::PerformDeviceConfigurationChange { device, change_action } => {
                    driver
                        .perform_device_configuration_change(device, change_action)
                        .map(|()| Response::Done)
                }
            ),
            OperationId::AbortDeviceConfigurationChange => entry!(
                AbortDeviceConfigurationChange,
                Request::AbortDeviceConfigurationChange { device, change_action } => {
                    driver
                        .abort_device_configuration_change(device, change_action)
                        .map(|()| Response::Done)
                }
            ),
            OperationId::HasProperty => entry!(HasProperty, Request::HasProperty { object, address, .. } => {
                Ok(Response::Exists(driver.has_property(object, required(address, "address")?)))
            }),
            OperationId::IsPropertySettable => entry!(IsPropertySettable, Request::IsPropertySettable { object, address, .. } => {
                driver
                    .is_property_settable(object, required(address, "address")?)
                    .map(Response::Settable)
            }),
            OperationId::GetPropertyDataSize => entry!(
                GetPropertyDataSize,
                Request::GetPropertyDataSize { object, address, qualifier, .. } => {
                    driver
                        .get_property_data_size(object, required(address, "address")?, qualifier)
                        .map(Response::Size)
                }
            ),
            OperationId::GetPropertyData => entry!(
                GetPropertyData,
                Request::GetPropertyData { object, address, qualifier, out, .. } => {
                    let address = required(address, "address")?;
                    let out = required(out, "out")?;
                    driver
                        .get_property_data(object, address, qualifier, out)
                        .map(Response::Written)
                }
            ),
            OperationId::SetPropertyData => entry!(
                SetPropertyData,
                Request::SetPropertyData { object, address, qualifier, data, .. } => {
                    let address = required(address, "address")?;
                    let data = required(data, "data")?;
                    driver
                        .set_property_data(object, address, qualifier, data)
                        .map(Response::Changed)
                }
            ),
            OperationId::StartIo => entry!(StartIo, Request::StartIo { device, client_id } => {
                driver.start_io(device, client_id).map(|()| Response::Done)
            }),
            OperationId::StopIo => entry!(StopIo, Request::StopIo { device, client_id } => {
                driver.stop_io(device, client_id).map(|()| Response::Done)
            }),
            OperationId::GetZeroTimeStamp => entry!(GetZeroTimeStamp, Request::GetZeroTimeStamp { device, client_id } => {
                driver
                    .get_zero_time_stamp(device, client_id)
                    .map(Response::ZeroTimeStamp)
            }),
            OperationId::WillDoIoOperation => entry!(
                WillDoIoOperation,
                Request::WillDoIoOperation { device, client_id, operation } => {
                    driver
                        .will_do_io_operation(device, client_id, operation)
                        .map(Response::WillDo)
                }
            ),
            OperationId::BeginIoOperation => entry!(
                BeginIoOperation,
                Request::BeginIoOperation { device, client_id, operation, frames, cycle } => {
                    driver
                        .begin_io_operation(device, client_id, operation, frames, required(cycle, "cycle")?)
                        .map(|()| Response::Done)
                }
            ),
            OperationId::DoIoOperation => entry!(
                DoIoOperation,
                Request::DoIoOperation { device, stream, client_id, operation, frames, cycle, buffer } => {
                    let cycle = required(cycle, "cycle")?;
                    let buffer = required(buffer, "buffer")?;
                    driver
                        .do_io_operation(device, stream, client_id, operation, frames, cycle, buffer)
                        .map(|()| Response::Done)
                }
            ),
            OperationId::EndIoOperation => entry!(
                EndIoOperation,
                Request::EndIoOperation { device, client_id, operation, frames, cycle } => {
                    driver
                        .end_io_operation(device, client_id, operation, frames, required(cycle, "cycle")?)
                        .map(|()| Response::Done)
                }
            ),
        }
    }
}

static SHARED_DRIVER: OnceLock<Arc<Driver>> = OnceLock::new();
static SHARED_INTERFACE: OnceLock<Arc<DriverInterface>> = OnceLock::new();

/// The process-wide driver, created on first use
pub fn shared() -> HardwareResult<Arc<Driver>> {
    if let Some(driver) = SHARED_DRIVER.get() {
        return Ok(driver.clone());
    }

    let config = DriverConfig::from_env();
    tracing::info!(device = %config.device_name, "Creating driver");
    let driver = Arc::new(Driver::new(config, Arc::new(MonotonicClock::new()))?);
    Ok(SHARED_DRIVER.get_or_init(|| driver).clone())
}

/// Plug-in factory: the shared interface, for the plug-in type only
pub fn create_plugin(requested_type: InterfaceId) -> Option<Arc<DriverInterface>> {
    if requested_type != InterfaceId::PLUGIN_TYPE {
        tracing::debug!(requested = %requested_type, "Factory asked for an unknown type");
        return None;
    }

    let driver = match shared() {
        Ok(driver) => driver,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create driver");
            return None;
        }
    };
    let interface = SHARED_INTERFACE
        .get_or_init(|| Arc::new(DriverInterface::new(driver)))
        .clone();
    interface.driver.add_ref();
    Some(interface)
}
