use std::fmt;

use super::*;

/// The radio a [`Central`](struct.Central.html) drives.
///
/// Every method only starts an operation and returns immediately. An `Err` means the
/// operation could not be started at all. Otherwise exactly one matching
/// [`HardwareEvent`](enum.HardwareEvent.html) must eventually be posted to the
/// [`EventSink`](struct.EventSink.html) handed to the radio's factory, and completions of one
/// connection must be posted in the order the operations were started.
///
/// Value notifications are posted as `CharacteristicValue` events at any time.
pub trait Hardware: 'static {
    /// The radio's reference to a discovered service, characteristic or descriptor.
    /// Equality must mean "same attribute".
    type Object: Clone + fmt::Debug + PartialEq + Send + 'static;

    /// The radio's reference to an established connection.
    type Connection: Clone + fmt::Debug + Send + 'static;

    fn scan(&mut self, options: &ScanOptions) -> Result<(), Error>;

    /// Stopping may settle asynchronously; the radio may confirm with `ScanStopped`.
    fn stop_scan(&mut self);

    fn connect(&mut self, device: &DeviceId) -> Result<(), Error>;

    fn cancel_connect(&mut self, device: &DeviceId);

    fn disconnect(&mut self, connection: &Self::Connection);

    fn read_rssi(&mut self, connection: &Self::Connection) -> Result<(), Error>;

    fn discover_services(&mut self, connection: &Self::Connection) -> Result<(), Error>;

    fn discover_characteristics(&mut self, connection: &Self::Connection, service: &Self::Object)
        -> Result<(), Error>;

    fn discover_descriptors(&mut self, connection: &Self::Connection, characteristic: &Self::Object)
        -> Result<(), Error>;

    fn read_characteristic(&mut self, connection: &Self::Connection, characteristic: &Self::Object)
        -> Result<(), Error>;

    fn read_descriptor(&mut self, connection: &Self::Connection, descriptor: &Self::Object)
        -> Result<(), Error>;

    /// Both write kinds are acknowledged with `WriteCharacteristicResult`.
    fn write_characteristic(&mut self, connection: &Self::Connection, characteristic: &Self::Object,
        value: &[u8], kind: WriteKind) -> Result<(), Error>;

    fn write_descriptor(&mut self, connection: &Self::Connection, descriptor: &Self::Object,
        value: &[u8]) -> Result<(), Error>;

    fn set_notify(&mut self, connection: &Self::Connection, characteristic: &Self::Object,
        enabled: bool) -> Result<(), Error>;
}
