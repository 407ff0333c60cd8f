use log::*;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use super::*;
use super::handle::HandleTable;
use super::notification::{Mode, NotificationRegistry, Registration};
use super::queue::{OperationKind, OperationQueue, PendingOperation, Request};
use crate::transport::{ConnectionState, Reply, Transport};

// Late completions remembered after a timeout. Older ones are reported as mismatches.
const MAX_STALE: usize = 16;

/// Discovered attribute stored in a session's handle table.
#[derive(Clone, Debug)]
pub enum Attribute<O> {
    Service(Service<O>),
    Characteristic {
        service: Handle,
        characteristic: Characteristic<O>,
    },
    Descriptor {
        characteristic: Handle,
        descriptor: Descriptor<O>,
    },
}

impl<O> Attribute<O> {
    pub fn object(&self) -> &O {
        match self {
            Self::Service(s) => s.object(),
            Self::Characteristic { characteristic, .. } => characteristic.object(),
            Self::Descriptor { descriptor, .. } => descriptor.object(),
        }
    }
}

/// All state of one connected peripheral.
pub struct Session<H: Hardware> {
    device: DeviceId,
    handle: Handle,
    connection: H::Connection,
    attributes: HandleTable<Attribute<H::Object>>,
    queue: OperationQueue,
    notifications: NotificationRegistry,
    // Standing registrations shadowed by an in-flight read of the same characteristic.
    displaced: HashMap<Handle, Registration>,
    listeners: Vec<CallerId>,
    stale: VecDeque<(OperationKind, Option<Handle>)>,
    operation_timeout: Option<Duration>,
}

impl<H: Hardware> Session<H> {
    pub(in crate) fn new(device: DeviceId, connection: H::Connection, config: &Config)
        -> Result<Self, Error>
    {
        let mut attributes = HandleTable::new(config.handle_start);
        let handle = attributes.allocate()?;
        Ok(Self {
            device,
            handle,
            connection,
            attributes,
            queue: OperationQueue::new(),
            notifications: NotificationRegistry::new(),
            displaced: HashMap::new(),
            listeners: Vec::new(),
            stale: VecDeque::new(),
            operation_timeout: config.operation_timeout,
        })
    }

    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Handle of the device itself, the first one allocated in this session.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn connection(&self) -> &H::Connection {
        &self.connection
    }

    pub fn attributes(&self) -> &HandleTable<Attribute<H::Object>> {
        &self.attributes
    }

    pub fn queue(&self) -> &OperationQueue {
        &self.queue
    }

    pub fn notifications(&self) -> &NotificationRegistry {
        &self.notifications
    }

    pub fn listeners(&self) -> &[CallerId] {
        &self.listeners
    }

    pub fn service(&self, handle: Handle) -> Result<&Service<H::Object>, Error> {
        match self.attributes.lookup(handle)? {
            Attribute::Service(s) => Ok(s),
            _ => Err(Error::not_found(format!("handle {} is not a service", handle))),
        }
    }

    pub fn characteristic(&self, handle: Handle) -> Result<&Characteristic<H::Object>, Error> {
        match self.attributes.lookup(handle)? {
            Attribute::Characteristic { characteristic, .. } => Ok(characteristic),
            _ => Err(Error::not_found(format!("handle {} is not a characteristic", handle))),
        }
    }

    pub fn descriptor(&self, handle: Handle) -> Result<&Descriptor<H::Object>, Error> {
        match self.attributes.lookup(handle)? {
            Attribute::Descriptor { descriptor, .. } => Ok(descriptor),
            _ => Err(Error::not_found(format!("handle {} is not a descriptor", handle))),
        }
    }

    /// Adds a connection state listener and tells it the device is connected.
    pub(in crate) fn add_listener(&mut self, caller: CallerId, transport: &dyn Transport) {
        transport.respond_and_keep_open(&caller, self.connection_reply(ConnectionState::Connected));
        self.listeners.push(caller);
    }

    pub(in crate) fn submit(
        &mut self,
        caller: CallerId,
        request: Request,
        hardware: &mut H,
        transport: &dyn Transport,
    ) -> Result<(), Error> {
        self.validate(&request)?;
        trace!("{}: queueing {:?} for {} ({} ahead)",
            self.device, request.kind(), caller, self.queue.len());
        if self.queue.push(PendingOperation::new(caller, request)) {
            self.issue_next(hardware, transport);
        }
        Ok(())
    }

    /// Feeds a per-device radio event. An `Err` is a protocol mismatch: the event does not
    /// belong to the operation in flight and the session can no longer be trusted.
    pub(in crate) fn handle_event(
        &mut self,
        event: HardwareEvent<H::Object, H::Connection>,
        hardware: &mut H,
        transport: &dyn Transport,
    ) -> Result<(), Error> {
        use HardwareEvent::*;
        match event {
            ReadRssiResult { rssi, .. } => {
                if let Some(op) = self.complete(OperationKind::ReadRssi, None)? {
                    respond(transport, op.caller(), rssi.map(Reply::Rssi));
                }
            }
            ServicesDiscovered { services, .. } => {
                if let Some(op) = self.complete(OperationKind::DiscoverServices, None)? {
                    let reply = services.and_then(|s| self.add_services(s));
                    respond(transport, op.caller(), reply);
                }
            }
            CharacteristicsDiscovered { service, characteristics, .. } => {
                let target = self.find(&service);
                if let Some(op) = self.complete(OperationKind::DiscoverCharacteristics, target)? {
                    let reply = match target {
                        Some(service) => characteristics
                            .and_then(|c| self.add_characteristics(service, c)),
                        None => Err(Error::internal("service vanished")),
                    };
                    respond(transport, op.caller(), reply);
                }
            }
            DescriptorsDiscovered { characteristic, descriptors, .. } => {
                let target = self.find(&characteristic);
                if let Some(op) = self.complete(OperationKind::DiscoverDescriptors, target)? {
                    let reply = match target {
                        Some(characteristic) => descriptors
                            .and_then(|d| self.add_descriptors(characteristic, d)),
                        None => Err(Error::internal("characteristic vanished")),
                    };
                    respond(transport, op.caller(), reply);
                }
            }
            CharacteristicValue { characteristic, value, .. } => {
                self.on_characteristic_value(&characteristic, value, transport);
            }
            DescriptorValue { descriptor, value, .. } => {
                let target = self.find(&descriptor);
                if let Some(op) = self.complete(OperationKind::ReadDescriptor, target)? {
                    respond(transport, op.caller(), value.map(Reply::Value));
                }
            }
            WriteCharacteristicResult { characteristic, result, .. } => {
                let target = self.find(&characteristic);
                if let Some(op) = self.complete(OperationKind::WriteCharacteristic, target)? {
                    respond(transport, op.caller(), result.map(|()| Reply::Done));
                }
            }
            WriteDescriptorResult { descriptor, result, .. } => {
                let target = self.find(&descriptor);
                if let Some(op) = self.complete(OperationKind::WriteDescriptor, target)? {
                    respond(transport, op.caller(), result.map(|()| Reply::Done));
                }
            }
            SubscriptionChanged { characteristic, result, .. } => {
                let target = self.find(&characteristic);
                if let Some(op) = self.complete(OperationKind::SetNotify, target)? {
                    self.on_subscription_changed(op, result, transport);
                }
            }
            other => {
                debug!("{}: ignoring {:?}", self.device, other);
            }
        }
        self.issue_next(hardware, transport);
        Ok(())
    }

    /// Fails the in-flight operation if it is overdue and moves on to the next one.
    pub(in crate) fn expire(&mut self, now: Instant, hardware: &mut H, transport: &dyn Transport) {
        if self.queue.is_head_expired(now) {
            if let Some(op) = self.queue.pop() {
                let kind = op.request().kind();
                let target = op.request().target();
                warn!("{}: {:?} on {:?} for {} timed out", self.device, kind, target, op.caller());
                // A late read answer is indistinguishable from a notification and is
                // routed as one.
                if kind != OperationKind::ReadCharacteristic {
                    if self.stale.len() == MAX_STALE {
                        self.stale.pop_front();
                    }
                    self.stale.push_back((kind, target));
                }
                self.release(&op);
                transport.respond_error(op.caller(), Error::timeout(format!(
                    "{:?} did not complete in time", kind)));
            }
            self.issue_next(hardware, transport);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }

    /// Resolves everything still waiting on this session with `reason` and forgets all
    /// discovered attributes.
    pub(in crate) fn teardown(&mut self, reason: &Error, transport: &dyn Transport) {
        debug!("{}: tearing down with {} pending: {}", self.device, self.queue.len(), reason);
        let ops: Vec<_> = self.queue.drain().collect();
        for op in ops {
            // The in-flight head is answered here, not through what it registered.
            if op.is_issued() {
                self.release(&op);
            }
            transport.respond_error(op.caller(), reason.clone());
        }
        for (_, reg) in self.notifications.drain().chain(self.displaced.drain()) {
            transport.respond_error(reg.caller(), reason.clone());
        }
        let reply = self.connection_reply(ConnectionState::Disconnected);
        for listener in self.listeners.drain(..) {
            transport.respond_once(&listener, reply.clone());
        }
        self.attributes.clear();
        self.stale.clear();
    }

    fn connection_reply(&self, state: ConnectionState) -> Reply {
        Reply::Connection {
            device: self.device.clone(),
            device_handle: self.handle,
            state,
        }
    }

    fn validate(&self, request: &Request) -> Result<(), Error> {
        use Request::*;
        match *request {
            ReadRssi | DiscoverServices => Ok(()),
            DiscoverCharacteristics { service } => self.service(service).map(drop),
            DiscoverDescriptors { characteristic }
            | ReadCharacteristic { characteristic }
            | WriteCharacteristic { characteristic, .. }
            | EnableNotification { characteristic }
            | DisableNotification { characteristic } => self.characteristic(characteristic).map(drop),
            ReadDescriptor { descriptor }
            | WriteDescriptor { descriptor, .. } => self.descriptor(descriptor).map(drop),
        }
    }

    fn find(&self, object: &H::Object) -> Option<Handle> {
        self.attributes.find(|a| a.object() == object)
    }

    /// Starts the head operation. Operations the radio refuses to start fail right away and
    /// the next one is tried.
    fn issue_next(&mut self, hardware: &mut H, transport: &dyn Transport) {
        while let Some(head) = self.queue.head() {
            if head.is_issued() {
                return;
            }
            let caller = head.caller().clone();
            let request = head.request().clone();
            match self.start(&caller, &request, hardware, transport) {
                Ok(()) => {
                    trace!("{}: issued {:?} for {}", self.device, request.kind(), caller);
                    let deadline = self.operation_timeout.map(|t| Instant::now() + t);
                    if let Some(head) = self.queue.head_mut() {
                        head.mark_issued(deadline);
                    }
                    return;
                }
                Err(e) => {
                    debug!("{}: {:?} for {} could not be started: {}",
                        self.device, request.kind(), caller, e);
                    self.queue.pop();
                    transport.respond_error(&caller, e);
                }
            }
        }
    }

    fn start(
        &mut self,
        caller: &CallerId,
        request: &Request,
        hardware: &mut H,
        transport: &dyn Transport,
    ) -> Result<(), Error> {
        use Request::*;
        let conn = &self.connection;
        match request {
            ReadRssi => hardware.read_rssi(conn),
            DiscoverServices => hardware.discover_services(conn),
            DiscoverCharacteristics { service } => {
                hardware.discover_characteristics(conn, self.service(*service)?.object())
            }
            DiscoverDescriptors { characteristic } => {
                hardware.discover_descriptors(conn, self.characteristic(*characteristic)?.object())
            }
            ReadCharacteristic { characteristic } => {
                hardware.read_characteristic(conn, self.characteristic(*characteristic)?.object())?;
                let prev = self.notifications.register(
                    *characteristic, caller.clone(), Mode::OneShotRead);
                if let Some(prev) = prev.filter(|r| r.mode() == Mode::Standing) {
                    self.displaced.insert(*characteristic, prev);
                }
                Ok(())
            }
            ReadDescriptor { descriptor } => {
                hardware.read_descriptor(conn, self.descriptor(*descriptor)?.object())
            }
            WriteCharacteristic { characteristic, value, kind } => {
                trace!("{}: writing {} to {}", self.device, hex::encode(value), characteristic);
                hardware.write_characteristic(
                    conn, self.characteristic(*characteristic)?.object(), value, *kind)
            }
            WriteDescriptor { descriptor, value } => {
                trace!("{}: writing {} to {}", self.device, hex::encode(value), descriptor);
                hardware.write_descriptor(conn, self.descriptor(*descriptor)?.object(), value)
            }
            EnableNotification { characteristic } => {
                hardware.set_notify(conn, self.characteristic(*characteristic)?.object(), true)?;
                let prev = self.notifications.register(
                    *characteristic, caller.clone(), Mode::Standing);
                if let Some(prev) = prev.filter(|r| r.caller() != caller) {
                    transport.respond_error(prev.caller(), Error::state_conflict(format!(
                        "notifications of {} were taken over by {}", characteristic, caller)));
                }
                Ok(())
            }
            DisableNotification { characteristic } => {
                hardware.set_notify(conn, self.characteristic(*characteristic)?.object(), false)?;
                if let Some(prev) = self.notifications.unregister(*characteristic) {
                    transport.respond_once(prev.caller(), Reply::Done);
                }
                Ok(())
            }
        }
    }

    /// Pops the head if it is the operation completed by a `kind` event on `target`.
    /// `Ok(None)` means the event belongs to an operation that already timed out.
    fn complete(&mut self, kind: OperationKind, target: Option<Handle>)
        -> Result<Option<PendingOperation>, Error>
    {
        let mismatch = match self.queue.check_head(kind, target) {
            Ok(_) => return Ok(self.queue.pop()),
            Err(e) => e,
        };
        match self.stale.iter().position(|&s| s == (kind, target)) {
            Some(i) => {
                warn!("{}: dropping late {:?} completion for {:?}", self.device, kind, target);
                self.stale.remove(i);
                Ok(None)
            }
            None => Err(mismatch),
        }
    }

    /// Undoes the registrations an operation made when it was started.
    fn release(&mut self, op: &PendingOperation) {
        match *op.request() {
            Request::ReadCharacteristic { characteristic } => {
                if self.notifications.get(characteristic)
                    .map(|r| r.mode() == Mode::OneShotRead)
                    .unwrap_or(false)
                {
                    self.notifications.unregister(characteristic);
                }
                self.restore_displaced(characteristic);
            }
            Request::EnableNotification { characteristic } => {
                if self.notifications.get(characteristic)
                    .map(|r| r.caller() == op.caller())
                    .unwrap_or(false)
                {
                    self.notifications.unregister(characteristic);
                }
            }
            _ => {}
        }
    }

    fn restore_displaced(&mut self, characteristic: Handle) {
        if let Some(reg) = self.displaced.remove(&characteristic) {
            trace!("{}: restoring notifications of {} for {}",
                self.device, characteristic, reg.caller());
            self.notifications.register(characteristic, reg.caller().clone(), reg.mode());
        }
    }

    /// A value is either the answer to the read in flight or an unsolicited notification.
    fn on_characteristic_value(
        &mut self,
        characteristic: &H::Object,
        value: Result<Vec<u8>, Error>,
        transport: &dyn Transport,
    ) {
        let handle = match self.find(characteristic) {
            Some(h) => h,
            None => {
                debug!("{}: value of unknown characteristic {:?}", self.device, characteristic);
                return;
            }
        };
        if self.queue.check_head(OperationKind::ReadCharacteristic, Some(handle)).is_err() {
            self.notifications.deliver(handle, value, transport);
            return;
        }
        if let Some(op) = self.queue.pop() {
            let registered = self.notifications.get(handle)
                .map(|r| r.mode() == Mode::OneShotRead && r.caller() == op.caller())
                .unwrap_or(false);
            if registered {
                self.notifications.deliver(handle, value, transport);
            } else {
                respond(transport, op.caller(), value.map(Reply::Value));
            }
            self.restore_displaced(handle);
        }
    }

    fn on_subscription_changed(
        &mut self,
        op: PendingOperation,
        result: Result<(), Error>,
        transport: &dyn Transport,
    ) {
        match (op.request(), result) {
            (Request::EnableNotification { characteristic }, Ok(())) => {
                // The caller stays open and hears nothing until the first value.
                debug!("{}: {} subscribed to {}", self.device, op.caller(), characteristic);
            }
            (Request::EnableNotification { .. }, Err(e)) => {
                self.release(&op);
                transport.respond_error(op.caller(), e);
            }
            (_, result) => respond(transport, op.caller(), result.map(|()| Reply::Done)),
        }
    }

    fn add_services(&mut self, services: Vec<Service<H::Object>>) -> Result<Reply, Error> {
        let mut r = Vec::with_capacity(services.len());
        for service in services {
            let handle = self.insert(service.object(), |_| Attribute::Service(service.clone()))?;
            r.push(ServiceInfo::new(handle, &service));
        }
        Ok(Reply::Services(r))
    }

    fn add_characteristics(&mut self, service: Handle, characteristics: Vec<Characteristic<H::Object>>)
        -> Result<Reply, Error>
    {
        let mut r = Vec::with_capacity(characteristics.len());
        for c in characteristics {
            let handle = self.insert(c.object(), |_| Attribute::Characteristic {
                service,
                characteristic: c.clone(),
            })?;
            r.push(CharacteristicInfo::new(handle, service, &c));
        }
        Ok(Reply::Characteristics(r))
    }

    fn add_descriptors(&mut self, characteristic: Handle, descriptors: Vec<Descriptor<H::Object>>)
        -> Result<Reply, Error>
    {
        let mut r = Vec::with_capacity(descriptors.len());
        for d in descriptors {
            let handle = self.insert(d.object(), |_| Attribute::Descriptor {
                characteristic,
                descriptor: d.clone(),
            })?;
            r.push(DescriptorInfo::new(handle, characteristic, &d));
        }
        Ok(Reply::Descriptors(r))
    }

    /// Returns the existing handle of `object`, or allocates one for the new attribute.
    fn insert(&mut self, object: &H::Object, attr: impl FnOnce(Handle) -> Attribute<H::Object>)
        -> Result<Handle, Error>
    {
        if let Some(handle) = self.find(object) {
            return Ok(handle);
        }
        let handle = self.attributes.allocate()?;
        self.attributes.insert(handle, attr(handle))?;
        Ok(handle)
    }
}

fn respond(transport: &dyn Transport, caller: &CallerId, reply: Result<Reply, Error>) {
    match reply {
        Ok(reply) => transport.respond_once(caller, reply),
        Err(e) => transport.respond_error(caller, e),
    }
}
