use super::*;

/// A descriptor as reported by the radio.
///
/// Descriptors provide further information about a characteristic's value, e.g. a
/// human-readable description or whether the characteristic notifies or indicates.
#[derive(Clone, Debug)]
pub struct Descriptor<O> {
    id: Uuid,
    object: O,
}

assert_impl_all!(Descriptor<u32>: Send, Sync);

impl<O> Descriptor<O> {
    pub fn new(object: O, id: Uuid) -> Self {
        Self {
            id,
            object,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn object(&self) -> &O {
        &self.object
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DescriptorInfo {
    handle: Handle,
    characteristic: Handle,
    id: Uuid,
}

impl DescriptorInfo {
    pub(in crate) fn new<O>(handle: Handle, characteristic: Handle, d: &Descriptor<O>) -> Self {
        Self {
            handle,
            characteristic,
            id: d.id,
        }
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Handle of the owning characteristic.
    pub fn characteristic(&self) -> Handle {
        self.characteristic
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}
