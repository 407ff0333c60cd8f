use log::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::mem;
use std::time::Instant;

use super::*;
use crate::error::ErrorKind;
use crate::transport::{Reply, Transport};
use crate::util::earliest;

/// Scanner lifecycle.
#[derive(Clone, Debug)]
pub enum ScanState {
    Idle,

    Scanning {
        caller: CallerId,
    },

    /// The radio was told to stop and may still deliver results until `until`.
    /// A start that arrives meanwhile is kept in `next`.
    StopPending {
        until: Instant,
        next: Option<(CallerId, ScanOptions)>,
    },
}

impl ScanState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_scanning(&self) -> bool {
        matches!(self, Self::Scanning { .. })
    }
}

/// Every session plus the scanner and the radio itself. All state is owned by one thread.
pub struct Registry<H: Hardware, T: Transport> {
    config: Config,
    hardware: H,
    transport: T,
    sessions: HashMap<DeviceId, Session<H>>,
    connecting: HashMap<DeviceId, Vec<CallerId>>,
    scan: ScanState,
}

impl<H: Hardware, T: Transport> Registry<H, T> {
    pub fn new(config: Config, hardware: H, transport: T) -> Self {
        Self {
            config,
            hardware,
            transport,
            sessions: HashMap::new(),
            connecting: HashMap::new(),
            scan: ScanState::Idle,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self, device: &DeviceId) -> Option<&Session<H>> {
        self.sessions.get(device)
    }

    pub fn sessions(&self) -> impl Iterator<Item=&Session<H>> {
        self.sessions.values()
    }

    pub fn is_connecting(&self, device: &DeviceId) -> bool {
        self.connecting.contains_key(device)
    }

    pub fn scan_state(&self) -> &ScanState {
        &self.scan
    }

    /// Returns the session of `device`, creating one for `connection` if there is none.
    pub fn get_or_create_session(&mut self, device: DeviceId, connection: H::Connection)
        -> Result<&mut Session<H>, Error>
    {
        match self.sessions.entry(device) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let session = Session::new(e.key().clone(), connection, &self.config)?;
                debug!("{}: session created with handle {}", e.key(), session.handle());
                Ok(e.insert(session))
            }
        }
    }

    /// Disconnects and tears down the session of `device`, resolving everything pending on
    /// it with `reason`. Returns `false` if there was no session.
    pub fn remove_session(&mut self, device: &DeviceId, reason: &Error) -> bool {
        match self.sessions.remove(device) {
            Some(mut session) => {
                self.hardware.disconnect(session.connection());
                session.teardown(reason, &self.transport);
                true
            }
            None => false,
        }
    }

    pub fn start_scan(&mut self, caller: CallerId, options: ScanOptions) -> Result<(), Error> {
        match &mut self.scan {
            ScanState::Scanning { .. } | ScanState::StopPending { next: Some(_), .. } => {
                return Err(Error::state_conflict("a scan is already in progress"));
            }
            ScanState::StopPending { next, .. } => {
                debug!("postponing scan for {} until the previous one stops", caller);
                *next = Some((caller, options));
                return Ok(());
            }
            ScanState::Idle => {}
        }
        trace!("scan({:?})", options);
        self.hardware.scan(&options)?;
        self.scan = ScanState::Scanning { caller };
        Ok(())
    }

    /// Always succeeds. The scan caller, if any, gets its final response.
    pub fn stop_scan(&mut self, caller: CallerId) {
        self.stop_scan0();
        self.transport.respond_once(&caller, Reply::Done);
    }

    pub fn connect(&mut self, caller: CallerId, device: DeviceId) -> Result<(), Error> {
        if let Some(session) = self.sessions.get_mut(&device) {
            session.add_listener(caller, &self.transport);
            return Ok(());
        }
        if let Some(callers) = self.connecting.get_mut(&device) {
            callers.push(caller);
            return Ok(());
        }
        trace!("connect({})", device);
        self.hardware.connect(&device)?;
        self.connecting.insert(device, vec![caller]);
        Ok(())
    }

    pub fn close(&mut self, caller: CallerId, device: DeviceId) -> Result<(), Error> {
        if self.remove_session(&device, &Error::disconnected()) {
            debug!("{}: closed by {}", device, caller);
        } else if let Some(callers) = self.connecting.remove(&device) {
            debug!("{}: connect cancelled by {}", device, caller);
            self.hardware.cancel_connect(&device);
            for c in callers {
                self.transport.respond_error(&c, Error::disconnected());
            }
        } else {
            return Err(Error::not_found(format!("device {} is not connected", device)));
        }
        self.transport.respond_once(&caller, Reply::Done);
        Ok(())
    }

    pub fn reset(&mut self, caller: CallerId) {
        self.reset0();
        self.transport.respond_once(&caller, Reply::Done);
    }

    pub fn submit(&mut self, caller: CallerId, device: DeviceId, request: Request)
        -> Result<(), Error>
    {
        let session = self.sessions.get_mut(&device)
            .ok_or_else(|| Error::not_found(format!("device {} is not connected", device)))?;
        session.submit(caller, request, &mut self.hardware, &self.transport)
    }

    pub fn handle_event(&mut self, event: HardwareEvent<H::Object, H::Connection>) {
        use HardwareEvent::*;
        trace!("{:?}", event);
        match event {
            PeripheralDiscovered { device, rssi, advertisement_data } => {
                match &self.scan {
                    ScanState::Scanning { caller } => {
                        self.transport.respond_and_keep_open(caller, Reply::Device {
                            device,
                            rssi,
                            advertisement_data,
                        });
                    }
                    _ => debug!("dropping scan result for {} while not scanning", device),
                }
            }
            ScanFailed { error } => {
                match mem::replace(&mut self.scan, ScanState::Idle) {
                    ScanState::Scanning { caller } => self.transport.respond_error(&caller, error),
                    ScanState::StopPending { next: Some((caller, options)), .. } => {
                        warn!("scan failed while stopping: {}", error);
                        self.start_postponed(caller, options);
                    }
                    _ => warn!("scan failed while not scanning: {}", error),
                }
            }
            ScanStopped => {
                if let ScanState::StopPending { .. } = self.scan {
                    self.settle_scan();
                }
            }
            PeripheralConnected { device, connection } => self.on_connected(device, connection),
            PeripheralConnectFailed { device, error } => {
                match self.connecting.remove(&device) {
                    Some(callers) => {
                        for c in callers {
                            self.transport.respond_error(&c, error.clone());
                        }
                    }
                    None => debug!("{}: connect failed but nobody was connecting", device),
                }
            }
            PeripheralDisconnected { device, error } => {
                let reason = match error {
                    Some(e) => Error::new(ErrorKind::Disconnected, e.description()),
                    None => Error::disconnected(),
                };
                if let Some(mut session) = self.sessions.remove(&device) {
                    debug!("{}: disconnected", device);
                    session.teardown(&reason, &self.transport);
                } else if let Some(callers) = self.connecting.remove(&device) {
                    for c in callers {
                        self.transport.respond_error(&c, reason.clone());
                    }
                }
            }
            event => {
                let device = match event.device() {
                    Some(d) => d.clone(),
                    None => return,
                };
                let session = match self.sessions.get_mut(&device) {
                    Some(s) => s,
                    None => {
                        debug!("{}: dropping event of unknown device", device);
                        return;
                    }
                };
                if let Err(e) = session.handle_event(event, &mut self.hardware, &self.transport) {
                    error!("{}: {}", device, e);
                    self.remove_session(&device, &e);
                }
            }
        }
    }

    /// Times out overdue operations and settles a stopped scan.
    pub fn expire(&mut self, now: Instant) {
        for session in self.sessions.values_mut() {
            session.expire(now, &mut self.hardware, &self.transport);
        }
        if let ScanState::StopPending { until, .. } = self.scan {
            if until <= now {
                self.settle_scan();
            }
        }
    }

    /// When `expire` has something to do next.
    pub fn next_deadline(&self) -> Option<Instant> {
        let scan = match self.scan {
            ScanState::StopPending { until, .. } => Some(until),
            _ => None,
        };
        self.sessions.values()
            .map(|s| s.next_deadline())
            .fold(scan, earliest)
    }

    fn on_connected(&mut self, device: DeviceId, connection: H::Connection) {
        let callers = match self.connecting.remove(&device) {
            Some(callers) => callers,
            None => {
                if !self.sessions.contains_key(&device) {
                    warn!("{}: connected without being asked to, disconnecting", device);
                    self.hardware.disconnect(&connection);
                } else {
                    warn!("{}: connected twice", device);
                }
                return;
            }
        };
        if let Err(e) = self.get_or_create_session(device.clone(), connection.clone()).map(drop) {
            self.hardware.disconnect(&connection);
            for c in callers {
                self.transport.respond_error(&c, e.clone());
            }
            return;
        }
        if let Some(session) = self.sessions.get_mut(&device) {
            for c in callers {
                session.add_listener(c, &self.transport);
            }
        }
    }

    fn stop_scan0(&mut self) {
        match mem::replace(&mut self.scan, ScanState::Idle) {
            ScanState::Scanning { caller } => {
                trace!("stop_scan()");
                self.hardware.stop_scan();
                self.transport.respond_once(&caller, Reply::Done);
                self.scan = ScanState::StopPending {
                    until: Instant::now() + self.config.scan_settle,
                    next: None,
                };
            }
            ScanState::StopPending { until, next } => {
                if let Some((caller, _)) = next {
                    debug!("dropping postponed scan for {}", caller);
                    self.transport.respond_once(&caller, Reply::Done);
                }
                self.scan = ScanState::StopPending { until, next: None };
            }
            ScanState::Idle => {}
        }
    }

    fn settle_scan(&mut self) {
        if let ScanState::StopPending { next, .. } = mem::replace(&mut self.scan, ScanState::Idle) {
            debug!("scan stopped");
            if let Some((caller, options)) = next {
                self.start_postponed(caller, options);
            }
        }
    }

    fn start_postponed(&mut self, caller: CallerId, options: ScanOptions) {
        if let Err(e) = self.start_scan(caller.clone(), options) {
            self.transport.respond_error(&caller, e);
        }
    }

    fn reset0(&mut self) {
        self.stop_scan0();
        let devices: Vec<_> = self.sessions.keys().cloned().collect();
        for device in devices {
            self.remove_session(&device, &Error::disconnected());
        }
        for (device, callers) in self.connecting.drain() {
            self.hardware.cancel_connect(&device);
            for c in callers {
                self.transport.respond_error(&c, Error::disconnected());
            }
        }
    }

    pub(in crate) fn shutdown(&mut self) {
        debug!("shutting down");
        self.reset0();
    }
}
