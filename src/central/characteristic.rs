use enumflags2::BitFlags;
use std::fmt;

use super::*;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum WriteKind {
    WithResponse = 0,
    WithoutResponse = 1,
}

#[derive(BitFlags, Copy, Clone, Debug, Eq, Hash, PartialEq)]
#[repr(u32)]
enum Property {
    Broadcast                       = 0x01,
    Read                            = 0x02,
    WriteWithoutResponse            = 0x04,
    Write                           = 0x08,
    Notify                          = 0x10,
    Indicate                        = 0x20,
    AuthenticatedSignedWrites       = 0x40,
    ExtendedProperties              = 0x80,
}

/// GATT characteristic properties (the first byte of the characteristic declaration).
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct Properties(BitFlags<Property>);

impl Properties {
    pub fn from_bits_truncate(bits: u32) -> Self {
        Self(BitFlags::from_bits_truncate(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0.bits()
    }

    /// Whether the characteristic can be subscribed to, by notification or indication.
    pub fn can_subscribe(&self) -> bool {
        self.is_notify() || self.is_indicate()
    }
}

macro_rules! properties {
    ($($(#[$attr:meta])* $f:ident => $e:ident,)*) => {
        impl Properties {
            $(
                $(#[$attr])*
                pub fn $f(&self) -> bool {
                    self.0.contains(Property::$e)
                }
            )*
        }
    };
}

properties!(
    is_broadcast => Broadcast,
    is_read => Read,
    is_write_without_response => WriteWithoutResponse,
    is_write => Write,
    is_notify => Notify,
    is_indicate => Indicate,
    is_authenticated_signed_writes => AuthenticatedSignedWrites,

    #[doc="Additional properties live in the extended properties descriptor."]
    is_extended_properties => ExtendedProperties,
);

assert_impl_all!(Properties: Send, Sync);

impl Default for Properties {
    fn default() -> Self {
        Self(BitFlags::empty())
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&crate::util::FlagsDebug("Properties", self.0), f)
    }
}

/// A characteristic as reported by the radio. `O` is the radio's own reference to it.
#[derive(Clone, Debug)]
pub struct Characteristic<O> {
    id: Uuid,
    properties: Properties,
    object: O,
}

assert_impl_all!(Characteristic<u32>: Send, Sync);

impl<O> Characteristic<O> {
    pub fn new(object: O, id: Uuid, properties: Properties) -> Self {
        Self {
            id,
            properties,
            object,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }

    pub fn object(&self) -> &O {
        &self.object
    }
}

/// A discovered characteristic as seen by the client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CharacteristicInfo {
    handle: Handle,
    service: Handle,
    id: Uuid,
    properties: Properties,
}

impl CharacteristicInfo {
    pub(in crate) fn new<O>(handle: Handle, service: Handle, c: &Characteristic<O>) -> Self {
        Self {
            handle,
            service,
            id: c.id,
            properties: c.properties,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Handle of the owning service.
    pub fn service(&self) -> Handle {
        self.service
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn properties(&self) -> Properties {
        self.properties
    }
}
