use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;

/// Opaque integer identifying the device itself or one of its discovered attributes within a
/// session.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Handle(u32);

impl Handle {
    pub const fn new(v: u32) -> Self {
        Self(v)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

/// Maps handles to objects. Handles come from a single counter that starts at `start` and only
/// grows, so a number is never handed out twice, even after its entry is removed.
#[derive(Debug)]
pub struct HandleTable<T> {
    next: Option<u32>,
    entries: BTreeMap<Handle, T>,
}

impl<T> HandleTable<T> {
    pub fn new(start: u32) -> Self {
        Self {
            next: Some(start),
            entries: BTreeMap::new(),
        }
    }

    pub fn allocate(&mut self) -> Result<Handle, Error> {
        let v = self.next.ok_or_else(|| Error::internal("handle space exhausted"))?;
        self.next = v.checked_add(1);
        Ok(Handle(v))
    }

    pub fn insert(&mut self, handle: Handle, object: T) -> Result<(), Error> {
        if self.next.map(|next| handle.0 >= next).unwrap_or(false) {
            return Err(Error::internal(format!("handle {} was never allocated", handle)));
        }
        if self.entries.contains_key(&handle) {
            return Err(Error::internal(format!("handle {} is already in use", handle)));
        }
        self.entries.insert(handle, object);
        Ok(())
    }

    pub fn lookup(&self, handle: Handle) -> Result<&T, Error> {
        self.entries.get(&handle)
            .ok_or_else(|| Error::not_found(format!("unknown handle {}", handle)))
    }

    /// Removing an absent handle is a no-op.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.entries.remove(&handle)
    }

    /// Reverse lookup, used to map an object named by a radio event back to its handle.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<Handle> {
        self.entries.iter()
            .find(|(_, v)| pred(v))
            .map(|(&h, _)| h)
    }

    /// Iterates in allocation (discovery) order.
    pub fn iter(&self) -> impl Iterator<Item=(Handle, &T)> {
        self.entries.iter().map(|(&h, v)| (h, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry. The counter is left untouched.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
