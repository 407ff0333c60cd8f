use log::*;
use std::sync::mpsc::RecvTimeoutError;
use std::time::Instant;

use super::*;
use crate::sync;
use crate::transport::Transport;

/// Messages processed by the worker thread, from the client side and from the radio.
pub(in crate) enum Command<H: Hardware> {
    StartScan {
        caller: CallerId,
        options: ScanOptions,
    },
    StopScan {
        caller: CallerId,
    },
    Connect {
        caller: CallerId,
        device: DeviceId,
    },
    Close {
        caller: CallerId,
        device: DeviceId,
    },
    Reset {
        caller: CallerId,
    },
    Submit {
        caller: CallerId,
        device: DeviceId,
        request: Request,
    },
    Event(HardwareEvent<H::Object, H::Connection>),
    Shutdown,
}

impl<H: Hardware, T: Transport> Registry<H, T> {
    /// Applies `cmd`. Returns `false` once the worker should exit.
    pub(in crate) fn dispatch(&mut self, cmd: Command<H>) -> bool {
        let (caller, result) = match cmd {
            Command::StartScan { caller, options } => {
                let r = self.start_scan(caller.clone(), options);
                (caller, r)
            }
            Command::StopScan { caller } => {
                self.stop_scan(caller);
                return true;
            }
            Command::Connect { caller, device } => {
                let r = self.connect(caller.clone(), device);
                (caller, r)
            }
            Command::Close { caller, device } => {
                let r = self.close(caller.clone(), device);
                (caller, r)
            }
            Command::Reset { caller } => {
                self.reset(caller);
                return true;
            }
            Command::Submit { caller, device, request } => {
                let r = self.submit(caller.clone(), device, request);
                (caller, r)
            }
            Command::Event(event) => {
                self.handle_event(event);
                return true;
            }
            Command::Shutdown => {
                self.shutdown();
                return false;
            }
        };
        if let Err(e) = result {
            debug!("rejecting request of {}: {}", caller, e);
            self.transport().respond_error(&caller, e);
        }
        true
    }
}

/// Worker thread body. Waits for commands up to the nearest deadline and expires overdue
/// work in between.
pub(in crate) fn run<H: Hardware, T: Transport>(
    mut registry: Registry<H, T>,
    receiver: sync::Receiver<Command<H>>,
) {
    loop {
        let cmd = match registry.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match receiver.recv_timeout(timeout) {
                    Ok(cmd) => Some(cmd),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match receiver.recv() {
                Ok(cmd) => Some(cmd),
                Err(_) => break,
            },
        };
        if let Some(cmd) = cmd {
            if !registry.dispatch(cmd) {
                return;
            }
        }
        registry.expire(Instant::now());
    }
    registry.shutdown();
}
