use std::fmt;

#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
    description: String,
}

impl Error {
    pub fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    /// Wraps a failure reported by the radio. `code` is the platform's central error code
    /// (`CBError` numbering); see [`HardwareErrorKind::from_code`].
    pub fn hardware(code: isize, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Hardware(HardwareErrorKind::from_code(code)), description)
    }

    /// Wraps an ATT status returned by the remote GATT server.
    pub fn att(code: isize, description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Hardware(HardwareErrorKind::Att(AttErrorKind::from_code(code))),
            description)
    }

    pub(in crate) fn not_found(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, description)
    }

    pub(in crate) fn protocol_mismatch(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::ProtocolMismatch, description)
    }

    pub(in crate) fn disconnected() -> Self {
        Self::new(ErrorKind::Disconnected, "device disconnected")
    }

    pub(in crate) fn state_conflict(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::StateConflict, description)
    }

    pub(in crate) fn timeout(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, description)
    }

    pub(in crate) fn internal(description: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, description)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for Error {}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Unknown handle or unknown device. Returned synchronously, never queued.
    NotFound,

    /// A hardware event did not match the head of the device's operation queue.
    /// The offending session is torn down.
    ProtocolMismatch,

    /// Failure reported by the radio, passed through to the caller.
    Hardware(HardwareErrorKind),

    /// The session was torn down while the operation was pending.
    Disconnected,

    /// The request conflicts with the current state, e.g. a second scan.
    StateConflict,

    /// The radio did not complete the operation within the configured timeout.
    Timeout,

    /// Broken internal invariant.
    Internal,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum HardwareErrorKind {
    /// Error code the radio backend could not classify.
    Other,
    Unknown,
    InvalidParameters,
    InvalidHandle,
    NotConnected,
    OutOfSpace,
    OperationCancelled,
    ConnectionTimeout,
    PeripheralDisconnected,
    UuidNotAllowed,
    ConnectionFailed,
    ConnectionLimitReached,
    UnknownDevice,
    OperationNotSupported,
    Att(AttErrorKind),
}

impl HardwareErrorKind {
    pub fn from_code(code: isize) -> Self {
        use HardwareErrorKind::*;
        match code {
            0 => Unknown,
            1 => InvalidParameters,
            2 => InvalidHandle,
            3 => NotConnected,
            4 => OutOfSpace,
            5 => OperationCancelled,
            6 => ConnectionTimeout,
            7 => PeripheralDisconnected,
            8 => UuidNotAllowed,
            10 => ConnectionFailed,
            11 => ConnectionLimitReached,
            12 => UnknownDevice,
            13 => OperationNotSupported,
            _ => Other,
        }
    }
}

/// ATT status codes (Bluetooth Core Spec Vol 3, Part F, 3.4.1.1).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum AttErrorKind {
    Other,
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,
    InsufficientAuthentication,
    RequestNotSupported,
    InvalidOffset,
    InsufficientAuthorization,
    PrepareQueueFull,
    AttributeNotFound,
    AttributeNotLong,
    InsufficientEncryptionKeySize,
    InvalidAttributeValueLength,
    UnlikelyError,
    InsufficientEncryption,
    UnsupportedGroupType,
    InsufficientResources,
}

impl AttErrorKind {
    pub fn from_code(code: isize) -> Self {
        use AttErrorKind::*;
        match code {
            0x01 => InvalidHandle,
            0x02 => ReadNotPermitted,
            0x03 => WriteNotPermitted,
            0x04 => InvalidPdu,
            0x05 => InsufficientAuthentication,
            0x06 => RequestNotSupported,
            0x07 => InvalidOffset,
            0x08 => InsufficientAuthorization,
            0x09 => PrepareQueueFull,
            0x0a => AttributeNotFound,
            0x0b => AttributeNotLong,
            0x0c => InsufficientEncryptionKeySize,
            0x0d => InvalidAttributeValueLength,
            0x0e => UnlikelyError,
            0x0f => InsufficientEncryption,
            0x10 => UnsupportedGroupType,
            0x11 => InsufficientResources,
            _ => Other,
        }
    }
}
