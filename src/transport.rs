//! The client side: how results get back to whoever issued a request.

use static_assertions::assert_impl_all;

use crate::{CallerId, DeviceId, Handle};
use crate::central::{AdvertisementData, CharacteristicInfo, DescriptorInfo, ServiceInfo};
use crate::error::Error;
use crate::sync;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

/// Payload of a successful response.
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Reply {
    /// The operation completed and has no result value.
    Done,

    Value(Vec<u8>),

    Rssi(i32),

    /// A scan result.
    Device {
        device: DeviceId,
        rssi: i32,
        advertisement_data: AdvertisementData,
    },

    /// Connection state update, sent to every caller that asked to connect to the device.
    Connection {
        device: DeviceId,
        device_handle: Handle,
        state: ConnectionState,
    },

    Services(Vec<ServiceInfo>),

    Characteristics(Vec<CharacteristicInfo>),

    Descriptors(Vec<DescriptorInfo>),
}

assert_impl_all!(Reply: Send, Sync);

/// Receives responses. For every request exactly one of `respond_once` and `respond_error`
/// is called eventually, possibly preceded by any number of `respond_and_keep_open`.
pub trait Transport: 'static {
    fn respond_once(&self, caller: &CallerId, reply: Reply);

    fn respond_error(&self, caller: &CallerId, error: Error);

    /// Sends `reply` and keeps `caller` open for further responses.
    fn respond_and_keep_open(&self, caller: &CallerId, reply: Reply);
}

#[derive(Clone, Debug)]
pub struct Response {
    caller: CallerId,
    reply: Result<Reply, Error>,
    keep_open: bool,
}

assert_impl_all!(Response: Send);

impl Response {
    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn reply(&self) -> Result<&Reply, &Error> {
        self.reply.as_ref()
    }

    pub fn into_reply(self) -> Result<Reply, Error> {
        self.reply
    }

    /// `false` if more responses will follow for the same caller.
    pub fn is_final(&self) -> bool {
        !self.keep_open
    }
}

/// Transport that forwards every response into a channel.
pub struct ChannelTransport {
    sender: sync::Sender<Response>,
}

assert_impl_all!(ChannelTransport: Send);

impl ChannelTransport {
    pub fn new() -> (Self, sync::Receiver<Response>) {
        let (sender, receiver) = sync::channel();
        (Self { sender }, receiver)
    }

    fn send(&self, caller: &CallerId, reply: Result<Reply, Error>, keep_open: bool) {
        // The receiving side went away; nobody is left to answer.
        let _ = self.sender.send(Response {
            caller: caller.clone(),
            reply,
            keep_open,
        });
    }
}

impl Transport for ChannelTransport {
    fn respond_once(&self, caller: &CallerId, reply: Reply) {
        self.send(caller, Ok(reply), false);
    }

    fn respond_error(&self, caller: &CallerId, error: Error) {
        self.send(caller, Err(error), false);
    }

    fn respond_and_keep_open(&self, caller: &CallerId, reply: Reply) {
        self.send(caller, Ok(reply), true);
    }
}
