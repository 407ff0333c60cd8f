#![allow(dead_code)]

use std::mem;

use ble_bridge::*;
use ble_bridge::central::*;
use ble_bridge::error::Error;
use ble_bridge::transport::*;
use ble_bridge::uuid::Uuid;

pub const SERVICE: u32 = 100;
pub const CHR_A: u32 = 101;
pub const CHR_B: u32 = 102;
pub const CCCD: u32 = 103;

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Scan(bool),
    StopScan,
    Connect(DeviceId),
    CancelConnect(DeviceId),
    Disconnect(u32),
    ReadRssi(u32),
    DiscoverServices(u32),
    DiscoverCharacteristics(u32, u32),
    DiscoverDescriptors(u32, u32),
    ReadCharacteristic(u32, u32),
    ReadDescriptor(u32, u32),
    WriteCharacteristic(u32, u32, Vec<u8>),
    WriteDescriptor(u32, u32, Vec<u8>),
    SetNotify(u32, u32, bool),
}

/// Records every call. Objects and connections are plain numbers.
#[derive(Debug, Default)]
pub struct MockRadio {
    pub calls: Vec<Call>,
    pub fail_next: Option<Error>,
}

impl MockRadio {
    fn record(&mut self, call: Call) -> Result<(), Error> {
        self.calls.push(call);
        match self.fail_next.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Hardware for MockRadio {
    type Object = u32;
    type Connection = u32;

    fn scan(&mut self, options: &ScanOptions) -> Result<(), Error> {
        self.record(Call::Scan(options.duplicates_allowed()))
    }

    fn stop_scan(&mut self) {
        self.calls.push(Call::StopScan);
    }

    fn connect(&mut self, device: &DeviceId) -> Result<(), Error> {
        self.record(Call::Connect(device.clone()))
    }

    fn cancel_connect(&mut self, device: &DeviceId) {
        self.calls.push(Call::CancelConnect(device.clone()));
    }

    fn disconnect(&mut self, connection: &u32) {
        self.calls.push(Call::Disconnect(*connection));
    }

    fn read_rssi(&mut self, connection: &u32) -> Result<(), Error> {
        self.record(Call::ReadRssi(*connection))
    }

    fn discover_services(&mut self, connection: &u32) -> Result<(), Error> {
        self.record(Call::DiscoverServices(*connection))
    }

    fn discover_characteristics(&mut self, connection: &u32, service: &u32) -> Result<(), Error> {
        self.record(Call::DiscoverCharacteristics(*connection, *service))
    }

    fn discover_descriptors(&mut self, connection: &u32, characteristic: &u32) -> Result<(), Error> {
        self.record(Call::DiscoverDescriptors(*connection, *characteristic))
    }

    fn read_characteristic(&mut self, connection: &u32, characteristic: &u32) -> Result<(), Error> {
        self.record(Call::ReadCharacteristic(*connection, *characteristic))
    }

    fn read_descriptor(&mut self, connection: &u32, descriptor: &u32) -> Result<(), Error> {
        self.record(Call::ReadDescriptor(*connection, *descriptor))
    }

    fn write_characteristic(&mut self, connection: &u32, characteristic: &u32, value: &[u8],
        _kind: WriteKind) -> Result<(), Error>
    {
        self.record(Call::WriteCharacteristic(*connection, *characteristic, value.into()))
    }

    fn write_descriptor(&mut self, connection: &u32, descriptor: &u32, value: &[u8])
        -> Result<(), Error>
    {
        self.record(Call::WriteDescriptor(*connection, *descriptor, value.into()))
    }

    fn set_notify(&mut self, connection: &u32, characteristic: &u32, enabled: bool)
        -> Result<(), Error>
    {
        self.record(Call::SetNotify(*connection, *characteristic, enabled))
    }
}

pub type Event = HardwareEvent<u32, u32>;

/// Handles of the attributes `Harness::discover` finds.
#[derive(Clone, Copy, Debug)]
pub struct Attrs {
    pub device: Handle,
    pub service: Handle,
    pub chr_a: Handle,
    pub chr_b: Handle,
    pub cccd: Handle,
}

pub struct Harness {
    pub registry: Registry<MockRadio, ChannelTransport>,
    pub responses: Receiver<Response>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CentralBuilder::new().config())
    }

    pub fn with_config(config: Config) -> Self {
        init_logger();
        let (transport, responses) = ChannelTransport::new();
        Self {
            registry: Registry::new(config, MockRadio::default(), transport),
            responses,
        }
    }

    pub fn responses(&self) -> Vec<Response> {
        self.responses.try_iter().collect()
    }

    pub fn calls(&mut self) -> Vec<Call> {
        mem::replace(&mut self.registry.hardware_mut().calls, Vec::new())
    }

    pub fn session(&self, device: &str) -> Option<&Session<MockRadio>> {
        self.registry.session(&DeviceId::from(device))
    }

    pub fn event(&mut self, event: Event) {
        self.registry.handle_event(event);
    }

    pub fn submit(&mut self, caller: &str, device: &str, request: queue::Request) {
        self.registry.submit(caller.into(), device.into(), request).unwrap();
    }

    /// Connects `device` over connection number `conn`, returns the device handle.
    pub fn connect(&mut self, device: &str, conn: u32) -> Handle {
        self.registry.connect(format!("connect-{}", device).into(), device.into()).unwrap();
        self.event(HardwareEvent::PeripheralConnected {
            device: device.into(),
            connection: conn,
        });
        let handle = match self.responses().pop().map(Response::into_reply) {
            Some(Ok(Reply::Connection { device_handle, state: ConnectionState::Connected, .. })) => {
                device_handle
            }
            other => panic!("unexpected {:?}", other),
        };
        self.calls();
        handle
    }

    /// Runs service, characteristic and descriptor discovery of `device` against the
    /// canned attribute tree.
    pub fn discover(&mut self, device: &str) -> Attrs {
        let device_handle = self.session(device).unwrap().handle();

        self.submit("discover", device, queue::Request::DiscoverServices);
        self.event(HardwareEvent::ServicesDiscovered {
            device: device.into(),
            services: Ok(vec![Service::new(SERVICE, Uuid::from_u16(0x180d), true)]),
        });
        let service = match single_final(&self.responses()) {
            Reply::Services(s) => s[0].handle(),
            other => panic!("unexpected {:?}", other),
        };

        self.submit("discover", device, queue::Request::DiscoverCharacteristics { service });
        self.event(HardwareEvent::CharacteristicsDiscovered {
            device: device.into(),
            service: SERVICE,
            characteristics: Ok(vec![
                Characteristic::new(CHR_A, Uuid::from_u16(0x2a37), Properties::from_bits_truncate(0x12)),
                Characteristic::new(CHR_B, Uuid::from_u16(0x2a39), Properties::from_bits_truncate(0x0a)),
            ]),
        });
        let (chr_a, chr_b) = match single_final(&self.responses()) {
            Reply::Characteristics(c) => (c[0].handle(), c[1].handle()),
            other => panic!("unexpected {:?}", other),
        };

        self.submit("discover", device, queue::Request::DiscoverDescriptors { characteristic: chr_a });
        self.event(HardwareEvent::DescriptorsDiscovered {
            device: device.into(),
            characteristic: CHR_A,
            descriptors: Ok(vec![Descriptor::new(CCCD, Uuid::from_u16(0x2902))]),
        });
        let cccd = match single_final(&self.responses()) {
            Reply::Descriptors(d) => d[0].handle(),
            other => panic!("unexpected {:?}", other),
        };

        self.calls();
        Attrs {
            device: device_handle,
            service,
            chr_a,
            chr_b,
            cccd,
        }
    }

    pub fn value(&mut self, device: &str, characteristic: u32, value: &[u8]) {
        self.event(HardwareEvent::CharacteristicValue {
            device: device.into(),
            characteristic,
            value: Ok(value.into()),
        });
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn single_final(responses: &[Response]) -> Reply {
    assert_eq!(responses.len(), 1, "{:?}", responses);
    assert!(responses[0].is_final());
    responses[0].reply().unwrap().clone()
}

/// `(caller, kind of error or "ok", final)` of each response, for compact assertions.
pub fn outline(responses: &[Response]) -> Vec<(String, String, bool)> {
    responses.iter()
        .map(|r| (
            r.caller().as_str().to_owned(),
            match r.reply() {
                Ok(_) => "ok".to_owned(),
                Err(e) => format!("{:?}", e.kind()),
            },
            r.is_final(),
        ))
        .collect()
}

pub fn value_of(r: &Response) -> Vec<u8> {
    match r.reply() {
        Ok(Reply::Value(v)) => v.clone(),
        other => panic!("unexpected {:?}", other),
    }
}
