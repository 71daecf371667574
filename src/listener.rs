//! Listener registries
//!
//! Callbacks are registered as shared references and delivered in registration order.
//! Unregistering compares by identity (the address of the registered object), so the
//! same listener value can be registered and removed without any handle bookkeeping.

use crate::constants::MAX_LISTENERS;
use crate::discovery::DiscoveryResult;
use crate::{BluetoothAddress, BluetoothError, Connection, SecurityLevel};
use heapless::Vec;

/// Receives discovery notifications
pub trait DiscoveryListener {
    /// A device was sighted, or its name was resolved
    fn discovered(&self, _result: &DiscoveryResult) {}

    /// The session finished; `results` holds every device found
    fn discovery_complete(&self, _results: &[DiscoveryResult]) {}
}

/// Receives connection lifecycle notifications
pub trait ConnectionListener {
    /// A connection attempt finished: `status` is zero on success
    fn connected(&self, _conn: &Connection, _status: u8) {}

    /// A connection was torn down
    fn disconnected(&self, _conn: &Connection, _reason: u8) {}

    /// A role switch finished: `status` is zero on success
    fn role_changed(&self, _conn: &Connection, _status: u8) {}

    /// The security level of a connection was re-evaluated after an encryption change
    fn security_changed(&self, _conn: &Connection, _level: SecurityLevel) {}

    /// The bond with `addr` was removed
    fn bond_deleted(&self, _addr: &BluetoothAddress) {}
}

/// Ordered set of registered listeners
pub struct Listeners<'l, L: ?Sized, const N: usize = MAX_LISTENERS> {
    entries: Vec<&'l L, N>,
}

impl<'l, L: ?Sized, const N: usize> Listeners<'l, L, N> {
    /// Create an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append `listener` to the delivery order
    ///
    /// # Errors
    /// Returns `BluetoothError::InsufficientResources` when the registry is full and
    /// `BluetoothError::AlreadyInState` when `listener` is already registered.
    pub fn register(&mut self, listener: &'l L) -> Result<(), BluetoothError> {
        if self.position(listener).is_some() {
            return Err(BluetoothError::AlreadyInState);
        }
        self.entries
            .push(listener)
            .map_err(|_| BluetoothError::InsufficientResources)
    }

    /// Remove `listener`, keeping the order of the others
    ///
    /// Returns whether it was registered.
    pub fn unregister(&mut self, listener: &L) -> bool {
        match self.position(listener) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Iterate in registration order
    pub fn iter(&self) -> impl Iterator<Item = &'l L> + '_ {
        self.entries.iter().copied()
    }

    /// Number of registered listeners
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no listener is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, listener: &L) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| core::ptr::addr_eq(*entry as *const L, listener as *const L))
    }
}

impl<L: ?Sized, const N: usize> Default for Listeners<'_, L, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of discovery listeners
pub type DiscoveryListeners<'l> = Listeners<'l, dyn DiscoveryListener + 'l>;

/// Registry of connection listeners
pub type ConnectionListeners<'l> = Listeners<'l, dyn ConnectionListener + 'l>;
