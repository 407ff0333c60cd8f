//! Bridges a Bluetooth low energy central radio to a request/response client.
//!
//! A client (for example a WebView bridge) issues requests tagged with an opaque
//! [`CallerId`](struct.CallerId.html). The radio, on the other hand, reports completion of
//! every operation through global events that only name the peripheral and the attribute
//! involved. This crate sits in between and makes sure that every request resolves exactly
//! once, to the right caller, in submission order:
//!
//! * each connected peripheral gets a session with its own handle table mapping integer
//!   handles to discovered services, characteristics and descriptors;
//! * operations against one peripheral are queued and issued to the radio one at a time;
//! * value notifications are routed to the caller that subscribed to them;
//! * scanning follows an explicit idle / scanning / stop-pending lifecycle.
//!
//! The radio is supplied by implementing [`Hardware`](central/trait.Hardware.html), the client
//! side by implementing [`Transport`](transport/trait.Transport.html) or by using the
//! channel-backed [`ChannelTransport`](transport/struct.ChannelTransport.html).
//!
//! ## Example
//!
//! ```no_run
//! use ble_bridge::*;
//! use ble_bridge::central::*;
//! use ble_bridge::transport::*;
//! # struct Radio;
//! # impl Hardware for Radio {
//! #     type Object = u32;
//! #     type Connection = u32;
//! #     fn scan(&mut self, _: &ScanOptions) -> Result<(), error::Error> { Ok(()) }
//! #     fn stop_scan(&mut self) {}
//! #     fn connect(&mut self, _: &DeviceId) -> Result<(), error::Error> { Ok(()) }
//! #     fn cancel_connect(&mut self, _: &DeviceId) {}
//! #     fn disconnect(&mut self, _: &u32) {}
//! #     fn read_rssi(&mut self, _: &u32) -> Result<(), error::Error> { Ok(()) }
//! #     fn discover_services(&mut self, _: &u32) -> Result<(), error::Error> { Ok(()) }
//! #     fn discover_characteristics(&mut self, _: &u32, _: &u32) -> Result<(), error::Error> { Ok(()) }
//! #     fn discover_descriptors(&mut self, _: &u32, _: &u32) -> Result<(), error::Error> { Ok(()) }
//! #     fn read_characteristic(&mut self, _: &u32, _: &u32) -> Result<(), error::Error> { Ok(()) }
//! #     fn read_descriptor(&mut self, _: &u32, _: &u32) -> Result<(), error::Error> { Ok(()) }
//! #     fn write_characteristic(&mut self, _: &u32, _: &u32, _: &[u8], _: WriteKind) -> Result<(), error::Error> { Ok(()) }
//! #     fn write_descriptor(&mut self, _: &u32, _: &u32, _: &[u8]) -> Result<(), error::Error> { Ok(()) }
//! #     fn set_notify(&mut self, _: &u32, _: &u32, _: bool) -> Result<(), error::Error> { Ok(()) }
//! # }
//! # impl Radio { fn new(_: EventSink<Radio>) -> Self { Radio } }
//!
//! let (transport, responses) = ChannelTransport::new();
//! let central = CentralBuilder::new().build(Radio::new, transport).unwrap();
//!
//! central.connect("scan-1".into(), "AA:BB:CC:DD:EE:FF".into());
//! while let Ok(response) = responses.recv() {
//!     match response.reply() {
//!         Ok(Reply::Connection { state: ConnectionState::Connected, .. }) => {
//!             central.services("services-1".into(), "AA:BB:CC:DD:EE:FF".into());
//!         }
//!         Ok(Reply::Services(services)) => {
//!             for service in services {
//!                 println!("{} {}", service.handle(), service.id());
//!             }
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//! ```
#![deny(dead_code)]
#![deny(non_snake_case)]
#![deny(unused_imports)]
#![deny(unused_must_use)]

#[macro_use]
mod macros;

pub mod central;
pub mod error;
mod sync;
pub mod transport;
pub mod uuid;
mod util;

use static_assertions::*;

pub use central::handle::Handle;
pub use sync::Receiver;

string_id_wrapper!(
    /// Address or platform identifier of a peripheral, supplied by the client.
    DeviceId
);

impl From<uuid::Uuid> for DeviceId {
    fn from(v: uuid::Uuid) -> Self {
        Self(v.to_string())
    }
}

string_id_wrapper!(
    /// Opaque token identifying the client request a response belongs to.
    CallerId
);

assert_impl_all!(Handle: Send, Sync);
