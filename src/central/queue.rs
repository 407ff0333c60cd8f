use std::collections::VecDeque;
use std::time::Instant;

use crate::CallerId;
use crate::error::Error;
use super::characteristic::WriteKind;
use super::handle::Handle;

/// Kind of a completion the radio reports. Enabling and disabling notifications complete
/// with the same event, so both map to `SetNotify`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperationKind {
    ReadRssi,
    DiscoverServices,
    DiscoverCharacteristics,
    DiscoverDescriptors,
    ReadCharacteristic,
    ReadDescriptor,
    WriteCharacteristic,
    WriteDescriptor,
    SetNotify,
}

/// An operation against one connected peripheral.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    ReadRssi,
    DiscoverServices,
    DiscoverCharacteristics {
        service: Handle,
    },
    DiscoverDescriptors {
        characteristic: Handle,
    },
    ReadCharacteristic {
        characteristic: Handle,
    },
    ReadDescriptor {
        descriptor: Handle,
    },
    WriteCharacteristic {
        characteristic: Handle,
        value: Vec<u8>,
        kind: WriteKind,
    },
    WriteDescriptor {
        descriptor: Handle,
        value: Vec<u8>,
    },
    EnableNotification {
        characteristic: Handle,
    },
    DisableNotification {
        characteristic: Handle,
    },
}

impl Request {
    pub fn kind(&self) -> OperationKind {
        use Request::*;
        match self {
            ReadRssi => OperationKind::ReadRssi,
            DiscoverServices => OperationKind::DiscoverServices,
            DiscoverCharacteristics { .. } => OperationKind::DiscoverCharacteristics,
            DiscoverDescriptors { .. } => OperationKind::DiscoverDescriptors,
            ReadCharacteristic { .. } => OperationKind::ReadCharacteristic,
            ReadDescriptor { .. } => OperationKind::ReadDescriptor,
            WriteCharacteristic { .. } => OperationKind::WriteCharacteristic,
            WriteDescriptor { .. } => OperationKind::WriteDescriptor,
            EnableNotification { .. } | DisableNotification { .. } => OperationKind::SetNotify,
        }
    }

    pub fn target(&self) -> Option<Handle> {
        use Request::*;
        match *self {
            ReadRssi | DiscoverServices => None,
            DiscoverCharacteristics { service } => Some(service),
            DiscoverDescriptors { characteristic }
            | ReadCharacteristic { characteristic }
            | WriteCharacteristic { characteristic, .. }
            | EnableNotification { characteristic }
            | DisableNotification { characteristic } => Some(characteristic),
            ReadDescriptor { descriptor }
            | WriteDescriptor { descriptor, .. } => Some(descriptor),
        }
    }
}

#[derive(Debug)]
pub struct PendingOperation {
    caller: CallerId,
    request: Request,
    deadline: Option<Instant>,
    issued: bool,
}

impl PendingOperation {
    pub fn new(caller: CallerId, request: Request) -> Self {
        Self {
            caller,
            request,
            deadline: None,
            issued: false,
        }
    }

    pub fn caller(&self) -> &CallerId {
        &self.caller
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_issued(&self) -> bool {
        self.issued
    }

    pub(in crate) fn mark_issued(&mut self, deadline: Option<Instant>) {
        self.issued = true;
        self.deadline = deadline;
    }
}

/// FIFO of operations for one peripheral. Only the head is ever in flight.
#[derive(Debug, Default)]
pub struct OperationQueue {
    ops: VecDeque<PendingOperation>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `op`. Returns `true` if it became the head and must be issued now.
    pub fn push(&mut self, op: PendingOperation) -> bool {
        self.ops.push_back(op);
        self.ops.len() == 1
    }

    pub fn head(&self) -> Option<&PendingOperation> {
        self.ops.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut PendingOperation> {
        self.ops.front_mut()
    }

    pub fn pop(&mut self) -> Option<PendingOperation> {
        self.ops.pop_front()
    }

    /// Checks that a completion of `kind` on `target` belongs to the in-flight head.
    pub fn check_head(&self, kind: OperationKind, target: Option<Handle>)
        -> Result<&PendingOperation, Error>
    {
        let head = self.head()
            .filter(|op| op.is_issued())
            .ok_or_else(|| Error::protocol_mismatch(format!(
                "{:?} completion for {:?} with no operation in flight", kind, target)))?;
        let request = head.request();
        if request.kind() != kind || request.target() != target {
            return Err(Error::protocol_mismatch(format!(
                "{:?} completion for {:?} while {:?} on {:?} is in flight",
                kind, target, request.kind(), request.target())));
        }
        Ok(head)
    }

    /// Whether the in-flight head has reached its deadline.
    pub fn is_head_expired(&self, now: Instant) -> bool {
        self.head()
            .filter(|op| op.is_issued())
            .and_then(|op| op.deadline())
            .map(|d| d <= now)
            .unwrap_or(false)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.head()
            .filter(|op| op.is_issued())
            .and_then(|op| op.deadline())
    }

    pub fn drain(&mut self) -> impl Iterator<Item=PendingOperation> + '_ {
        self.ops.drain(..)
    }

    pub fn iter(&self) -> impl Iterator<Item=&PendingOperation> {
        self.ops.iter()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
