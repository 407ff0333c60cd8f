use log::*;
use std::collections::HashMap;

use crate::CallerId;
use crate::error::Error;
use crate::transport::{Reply, Transport};
use super::handle::Handle;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Answered once, then forgotten.
    OneShotRead,

    /// Answered on every value update until unregistered.
    Standing,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Registration {
    caller: CallerId,
    mode: Mode,
}

impl Registration {
    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}

/// Who receives value updates of each characteristic. At most one caller per characteristic.
#[derive(Debug, Default)]
pub struct NotificationRegistry {
    entries: HashMap<Handle, Registration>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites any registration of `characteristic`, returning the displaced one.
    pub fn register(&mut self, characteristic: Handle, caller: CallerId, mode: Mode)
        -> Option<Registration>
    {
        self.entries.insert(characteristic, Registration { caller, mode })
    }

    /// Sends `value` to the caller registered for `characteristic`.
    ///
    /// A one-shot registration is removed after delivery. A standing one is kept, unless the
    /// value is an error: error responses close the caller on the transport side.
    /// Values for unregistered characteristics are dropped, which happens when a
    /// notification races an unsubscribe.
    pub fn deliver(
        &mut self,
        characteristic: Handle,
        value: Result<Vec<u8>, Error>,
        transport: &dyn Transport,
    ) -> Option<Mode> {
        let reg = match self.entries.get(&characteristic) {
            Some(reg) => reg,
            None => {
                debug!("dropping value of unregistered characteristic {}", characteristic);
                return None;
            }
        };
        let mode = reg.mode;
        match (mode, value) {
            (Mode::Standing, Ok(value)) => {
                trace!("notifying {} of {}: {}", reg.caller, characteristic, hex::encode(&value));
                transport.respond_and_keep_open(&reg.caller, Reply::Value(value));
            }
            (_, value) => {
                if let Some(reg) = self.entries.remove(&characteristic) {
                    match value {
                        Ok(value) => transport.respond_once(&reg.caller, Reply::Value(value)),
                        Err(e) => transport.respond_error(&reg.caller, e),
                    }
                }
            }
        }
        Some(mode)
    }

    /// Removing an absent registration is a no-op.
    pub fn unregister(&mut self, characteristic: Handle) -> Option<Registration> {
        self.entries.remove(&characteristic)
    }

    pub fn get(&self, characteristic: Handle) -> Option<&Registration> {
        self.entries.get(&characteristic)
    }

    pub fn drain(&mut self) -> impl Iterator<Item=(Handle, Registration)> + '_ {
        self.entries.drain()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
