use log::*;
use std::fmt;

use super::*;
use super::command::Command;

/// Completion and push events the radio posts to its [`EventSink`](struct.EventSink.html).
///
/// `O` is the radio's attribute reference, `C` its connection reference.
#[derive(Debug)]
#[non_exhaustive]
pub enum HardwareEvent<O, C> {
    PeripheralDiscovered {
        device: DeviceId,
        rssi: i32,
        advertisement_data: AdvertisementData,
    },

    ScanFailed {
        error: Error,
    },

    /// The radio confirms a `stop_scan`.
    ScanStopped,

    PeripheralConnected {
        device: DeviceId,
        connection: C,
    },

    PeripheralConnectFailed {
        device: DeviceId,
        error: Error,
    },

    PeripheralDisconnected {
        device: DeviceId,
        error: Option<Error>,
    },

    ReadRssiResult {
        device: DeviceId,
        rssi: Result<i32, Error>,
    },

    ServicesDiscovered {
        device: DeviceId,
        services: Result<Vec<Service<O>>, Error>,
    },

    CharacteristicsDiscovered {
        device: DeviceId,
        service: O,
        characteristics: Result<Vec<Characteristic<O>>, Error>,
    },

    DescriptorsDiscovered {
        device: DeviceId,
        characteristic: O,
        descriptors: Result<Vec<Descriptor<O>>, Error>,
    },

    /// Result of a read, or a notification. Both arrive through the same event.
    CharacteristicValue {
        device: DeviceId,
        characteristic: O,
        value: Result<Vec<u8>, Error>,
    },

    DescriptorValue {
        device: DeviceId,
        descriptor: O,
        value: Result<Vec<u8>, Error>,
    },

    WriteCharacteristicResult {
        device: DeviceId,
        characteristic: O,
        result: Result<(), Error>,
    },

    WriteDescriptorResult {
        device: DeviceId,
        descriptor: O,
        result: Result<(), Error>,
    },

    SubscriptionChanged {
        device: DeviceId,
        characteristic: O,
        result: Result<(), Error>,
    },
}

assert_impl_all!(HardwareEvent<u32, u32>: Send);

impl<O, C> HardwareEvent<O, C> {
    /// The peripheral the event concerns, `None` for scanner-wide events.
    pub fn device(&self) -> Option<&DeviceId> {
        use HardwareEvent::*;
        match self {
            ScanFailed { .. } | ScanStopped => None,
            PeripheralDiscovered { device, .. }
            | PeripheralConnected { device, .. }
            | PeripheralConnectFailed { device, .. }
            | PeripheralDisconnected { device, .. }
            | ReadRssiResult { device, .. }
            | ServicesDiscovered { device, .. }
            | CharacteristicsDiscovered { device, .. }
            | DescriptorsDiscovered { device, .. }
            | CharacteristicValue { device, .. }
            | DescriptorValue { device, .. }
            | WriteCharacteristicResult { device, .. }
            | WriteDescriptorResult { device, .. }
            | SubscriptionChanged { device, .. } => Some(device),
        }
    }
}

/// Where the radio posts [`HardwareEvent`](enum.HardwareEvent.html)s. Cheap to clone and
/// usable from any thread, e.g. the radio's own callback thread.
pub struct EventSink<H: Hardware> {
    sender: crate::sync::Sender<Command<H>>,
}

impl<H: Hardware> EventSink<H> {
    pub(in crate) fn new(sender: crate::sync::Sender<Command<H>>) -> Self {
        Self {
            sender,
        }
    }

    pub fn send(&self, event: HardwareEvent<H::Object, H::Connection>) {
        if self.sender.send(Command::Event(event)).is_err() {
            debug!("central is gone, dropping hardware event");
        }
    }
}

impl<H: Hardware> Clone for EventSink<H> {
    fn clone(&self) -> Self {
        Self::new(self.sender.clone())
    }
}

impl<H: Hardware> fmt::Debug for EventSink<H> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("EventSink")
    }
}
