use super::*;

/// A service as reported by the radio. `O` is the radio's own reference to it.
#[derive(Clone, Debug)]
pub struct Service<O> {
    id: Uuid,
    primary: bool,
    object: O,
}

assert_impl_all!(Service<u32>: Send, Sync);

impl<O> Service<O> {
    pub fn new(object: O, id: Uuid, primary: bool) -> Self {
        Self {
            id,
            primary,
            object,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Indicates whether the type of service is primary or secondary.
    ///
    /// A primary service describes the primary function of a device. A secondary service is
    /// only relevant in the context of another service that references it.
    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn object(&self) -> &O {
        &self.object
    }
}

/// A discovered service as seen by the client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceInfo {
    handle: Handle,
    id: Uuid,
    primary: bool,
}

impl ServiceInfo {
    pub(in crate) fn new<O>(handle: Handle, s: &Service<O>) -> Self {
        Self {
            handle,
            id: s.id,
            primary: s.primary,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }
}
