mod command;
mod delegate;
mod hardware;
mod registry;
mod session;
pub mod characteristic;
pub mod descriptor;
pub mod handle;
pub mod notification;
pub mod queue;
pub mod service;

use log::*;
use static_assertions::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::*;
use crate::error::Error;
use crate::sync;
use crate::uuid::*;

use command::Command;
use queue::Request;

pub use characteristic::{Characteristic, CharacteristicInfo, Properties, WriteKind};
pub use delegate::{EventSink, HardwareEvent};
pub use descriptor::{Descriptor, DescriptorInfo};
pub use hardware::Hardware;
pub use registry::{Registry, ScanState};
pub use service::{Service, ServiceInfo};
pub use session::{Attribute, Session};

/// Tunables of a [`Registry`](struct.Registry.html).
#[derive(Clone, Debug)]
pub struct Config {
    operation_timeout: Option<Duration>,
    handle_start: u32,
    scan_settle: Duration,
}

impl Config {
    /// How long an issued operation may wait for its completion. `None` waits forever.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// First handle allocated in each session.
    pub fn handle_start(&self) -> u32 {
        self.handle_start
    }

    /// How long a stopped scan may keep delivering results before it is considered idle.
    pub fn scan_settle(&self) -> Duration {
        self.scan_settle
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operation_timeout: Some(Duration::from_secs(10)),
            handle_start: 1,
            scan_settle: Duration::from_millis(500),
        }
    }
}

assert_impl_all!(Config: Send, Sync);

pub struct CentralBuilder {
    config: Config,
    thread_name: String,
}

impl CentralBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            thread_name: "ble-central".into(),
        }
    }

    pub fn operation_timeout(&mut self, v: Option<Duration>) -> &mut Self {
        self.config.operation_timeout = v;
        self
    }

    pub fn handle_start(&mut self, v: u32) -> &mut Self {
        self.config.handle_start = v;
        self
    }

    pub fn scan_settle(&mut self, v: Duration) -> &mut Self {
        self.config.scan_settle = v;
        self
    }

    pub fn thread_name(&mut self, v: impl Into<String>) -> &mut Self {
        self.thread_name = v.into();
        self
    }

    pub fn config(&self) -> Config {
        self.config.clone()
    }

    /// Spawns the worker thread. `hardware` is called on that thread with the sink the radio
    /// must post its events to.
    pub fn build<H, F, T>(&self, hardware: F, transport: T) -> Result<Central<H>, Error>
    where
        H: Hardware,
        F: FnOnce(EventSink<H>) -> H + Send + 'static,
        T: crate::transport::Transport + Send,
    {
        Central::build(self, hardware, transport)
    }
}

impl Default for CentralBuilder {
    fn default() -> Self {
        Self::new()
    }
}

assert_impl_all!(CentralBuilder: Send, Sync);

#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    allow_duplicates: bool,
    services: Vec<Uuid>,
}

impl ScanOptions {
    pub fn allow_duplicates(mut self, v: bool) -> Self {
        self.allow_duplicates = v;
        self
    }

    /// Only report peripherals advertising any of these services.
    pub fn services(mut self, uuids: &[Uuid]) -> Self {
        self.services.extend_from_slice(uuids);
        self
    }

    pub fn duplicates_allowed(&self) -> bool {
        self.allow_duplicates
    }

    pub fn service_uuids(&self) -> &[Uuid] {
        &self.services
    }
}

assert_impl_all!(ScanOptions: Send, Sync);

struct Inner<H: Hardware> {
    sender: Mutex<sync::Sender<Command<H>>>,
    worker: Option<JoinHandle<()>>,
}

impl<H: Hardware> Inner<H> {
    fn send(&self, cmd: Command<H>) {
        let sent = self.sender.lock()
            .map(|s| s.send(cmd).is_ok())
            .unwrap_or(false);
        if !sent {
            error!("central worker is gone");
        }
    }
}

impl<H: Hardware> Drop for Inner<H> {
    fn drop(&mut self) {
        self.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("central worker panicked");
            }
        }
    }
}

/// Client side handle of the worker thread that owns the radio and every session.
///
/// All methods return immediately. Results arrive at the transport, tagged with the
/// `caller` passed in. Dropping the last clone resolves everything still pending with a
/// `Disconnected` error and stops the worker.
pub struct Central<H: Hardware>(Arc<Inner<H>>);

impl<H: Hardware> Clone for Central<H> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<H: Hardware> Central<H> {
    pub fn start_scan(&self, caller: CallerId, options: ScanOptions) {
        self.0.send(Command::StartScan { caller, options });
    }

    pub fn stop_scan(&self, caller: CallerId) {
        self.0.send(Command::StopScan { caller });
    }

    /// The caller keeps receiving connection state updates until the device disconnects.
    pub fn connect(&self, caller: CallerId, device: DeviceId) {
        self.0.send(Command::Connect { caller, device });
    }

    pub fn close(&self, caller: CallerId, device: DeviceId) {
        self.0.send(Command::Close { caller, device });
    }

    /// Stops scanning and closes every connection.
    pub fn reset(&self, caller: CallerId) {
        self.0.send(Command::Reset { caller });
    }

    pub fn submit(&self, caller: CallerId, device: DeviceId, request: Request) {
        self.0.send(Command::Submit { caller, device, request });
    }

    pub fn rssi(&self, caller: CallerId, device: DeviceId) {
        self.submit(caller, device, Request::ReadRssi);
    }

    pub fn services(&self, caller: CallerId, device: DeviceId) {
        self.submit(caller, device, Request::DiscoverServices);
    }

    pub fn characteristics(&self, caller: CallerId, device: DeviceId, service: Handle) {
        self.submit(caller, device, Request::DiscoverCharacteristics { service });
    }

    pub fn descriptors(&self, caller: CallerId, device: DeviceId, characteristic: Handle) {
        self.submit(caller, device, Request::DiscoverDescriptors { characteristic });
    }

    pub fn read_characteristic(&self, caller: CallerId, device: DeviceId, characteristic: Handle) {
        self.submit(caller, device, Request::ReadCharacteristic { characteristic });
    }

    pub fn read_descriptor(&self, caller: CallerId, device: DeviceId, descriptor: Handle) {
        self.submit(caller, device, Request::ReadDescriptor { descriptor });
    }

    pub fn write_characteristic(&self, caller: CallerId, device: DeviceId, characteristic: Handle,
        value: &[u8], kind: WriteKind)
    {
        self.submit(caller, device, Request::WriteCharacteristic {
            characteristic,
            value: value.into(),
            kind,
        });
    }

    pub fn write_descriptor(&self, caller: CallerId, device: DeviceId, descriptor: Handle,
        value: &[u8])
    {
        self.submit(caller, device, Request::WriteDescriptor {
            descriptor,
            value: value.into(),
        });
    }

    /// The caller receives every value update of `characteristic` until notifications are
    /// disabled, another caller subscribes, or the device disconnects.
    pub fn enable_notification(&self, caller: CallerId, device: DeviceId, characteristic: Handle) {
        self.submit(caller, device, Request::EnableNotification { characteristic });
    }

    pub fn disable_notification(&self, caller: CallerId, device: DeviceId, characteristic: Handle) {
        self.submit(caller, device, Request::DisableNotification { characteristic });
    }

    /// Another sink for the radio to post events to.
    pub fn event_sink(&self) -> Result<EventSink<H>, Error> {
        self.0.sender.lock()
            .map(|s| EventSink::new(s.clone()))
            .map_err(|_| Error::internal("central worker is gone"))
    }

    fn build<F, T>(b: &CentralBuilder, hardware: F, transport: T) -> Result<Self, Error>
    where
        F: FnOnce(EventSink<H>) -> H + Send + 'static,
        T: crate::transport::Transport + Send,
    {
        let (sender, receiver) = sync::channel();
        let sink = EventSink::new(sender.clone());
        let config = b.config();
        let worker = thread::Builder::new()
            .name(b.thread_name.clone())
            .spawn(move || {
                let registry = Registry::new(config, hardware(sink), transport);
                command::run(registry, receiver);
            })
            .map_err(|e| Error::internal(format!("can't spawn central worker: {}", e)))?;
        Ok(Self(Arc::new(Inner {
            sender: Mutex::new(sender),
            worker: Some(worker),
        })))
    }
}

/// What a peripheral advertises, as filled in by the radio.
#[derive(Clone, Debug, Default)]
pub struct AdvertisementData {
    connectable: Option<bool>,
    local_name: Option<String>,
    manufacturer_data: Option<Vec<u8>>,
    service_data: ServiceData,
    service_uuids: Vec<Uuid>,
    tx_power_level: Option<i32>,
    scan_record: Option<Vec<u8>>,
}

assert_impl_all!(AdvertisementData: Send, Sync);

impl AdvertisementData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connectable(mut self, v: bool) -> Self {
        self.connectable = Some(v);
        self
    }

    pub fn with_local_name(mut self, v: impl Into<String>) -> Self {
        self.local_name = Some(v.into());
        self
    }

    pub fn with_manufacturer_data(mut self, v: &[u8]) -> Self {
        self.manufacturer_data = Some(v.into());
        self
    }

    pub fn with_service_data(mut self, uuid: Uuid, data: &[u8]) -> Self {
        self.service_data.0.insert(uuid, data.into());
        self
    }

    pub fn with_service_uuids(mut self, v: &[Uuid]) -> Self {
        self.service_uuids.extend_from_slice(v);
        self
    }

    pub fn with_tx_power_level(mut self, v: i32) -> Self {
        self.tx_power_level = Some(v);
        self
    }

    /// Raw advertisement bytes for radios that expose them.
    pub fn with_scan_record(mut self, v: &[u8]) -> Self {
        self.scan_record = Some(v.into());
        self
    }

    /// Indicates whether the advertising event type is connectable.
    pub fn is_connectable(&self) -> Option<bool> {
        self.connectable
    }

    /// The local name of a peripheral.
    pub fn local_name(&self) -> Option<&str> {
        self.local_name.as_ref().map(|v| v.as_str())
    }

    /// The manufacturer data of a peripheral.
    pub fn manufacturer_data(&self) -> Option<&[u8]> {
        self.manufacturer_data.as_ref().map(|v| v.as_slice())
    }

    /// Service-specific advertisement data.
    pub fn service_data(&self) -> &ServiceData {
        &self.service_data
    }

    pub fn service_uuids(&self) -> &[Uuid] {
        &self.service_uuids
    }

    /// The transmit power of a peripheral.
    /// You can calculate the path loss by comparing the RSSI value with the transmitting power level.
    pub fn tx_power_level(&self) -> Option<i32> {
        self.tx_power_level
    }

    pub fn scan_record(&self) -> Option<&[u8]> {
        self.scan_record.as_ref().map(|v| v.as_slice())
    }
}

/// Service-specific advertisement data. The keys represent Service UUIDs.
#[derive(Clone, Debug, Default)]
pub struct ServiceData(HashMap<Uuid, Vec<u8>>);

assert_impl_all!(ServiceData: Send, Sync);

impl ServiceData {
    pub fn get(&self, uuid: Uuid) -> Option<&[u8]> {
        self.0.get(&uuid).map(|v| v.as_slice())
    }

    pub fn keys<'a>(&'a self) -> impl Iterator<Item=Uuid> + 'a {
        self.0.keys().copied()
    }

    pub fn values<'a>(&'a self) -> impl Iterator<Item=&[u8]> + 'a {
        self.0.values().map(|v| v.as_slice())
    }

    pub fn iter<'a>(&'a self) -> impl Iterator<Item=(Uuid, &[u8])> + 'a {
        self.0.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
