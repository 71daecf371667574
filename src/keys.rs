//! Link key storage
//!
//! The host only needs to know whether a bond exists and whether its key is
//! authenticated. Persisting keys across power cycles is left to the [`LinkKeyStore`]
//! implementation; [`LinkKeyTable`] keeps them in RAM.

use crate::constants::MAX_LINK_KEYS;
use crate::{BluetoothAddress, BluetoothError};
use heapless::FnvIndexMap;

/// Link key types that were produced with MITM protection
const AUTHENTICATED_KEY_TYPES: [u8; 2] = [
    0x05, // Authenticated Combination Key generated from P-192
    0x08, // Authenticated Combination Key generated from P-256
];

/// A stored BR/EDR link key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkKey {
    /// Key value
    pub key: [u8; 16],
    /// Key type from the Link Key Notification event
    pub key_type: u8,
}

impl LinkKey {
    /// Whether the key was generated with MITM protection
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        AUTHENTICATED_KEY_TYPES.contains(&self.key_type)
    }
}

/// Bond storage consulted by the security evaluator
pub trait LinkKeyStore {
    /// Key stored for `addr`
    fn find(&self, addr: &BluetoothAddress) -> Option<LinkKey>;

    /// Store or replace the key for `addr`
    ///
    /// # Errors
    /// Returns `BluetoothError::InsufficientResources` when the store is full.
    fn store(&mut self, addr: BluetoothAddress, key: LinkKey) -> Result<(), BluetoothError>;

    /// Forget the key for `addr`, returning whether one was stored
    fn clear(&mut self, addr: &BluetoothAddress) -> bool;

    /// Addresses of every stored bond
    fn bonds(&self) -> impl Iterator<Item = BluetoothAddress> + '_;
}

/// In-memory [`LinkKeyStore`] holding up to `N` bonds (`N` must be a power of two)
#[derive(Debug, Default)]
pub struct LinkKeyTable<const N: usize = MAX_LINK_KEYS> {
    keys: FnvIndexMap<BluetoothAddress, LinkKey, N>,
}

impl<const N: usize> LinkKeyTable<N> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: FnvIndexMap::new(),
        }
    }

    /// Number of stored bonds
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no bond is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<const N: usize> LinkKeyStore for LinkKeyTable<N> {
    fn find(&self, addr: &BluetoothAddress) -> Option<LinkKey> {
        self.keys.get(addr).copied()
    }

    fn store(&mut self, addr: BluetoothAddress, key: LinkKey) -> Result<(), BluetoothError> {
        self.keys
            .insert(addr, key)
            .map(|_| ())
            .map_err(|_| BluetoothError::InsufficientResources)
    }

    fn clear(&mut self, addr: &BluetoothAddress) -> bool {
        self.keys.remove(addr).is_some()
    }

    fn bonds(&self) -> impl Iterator<Item = BluetoothAddress> + '_ {
        self.keys.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> BluetoothAddress {
        BluetoothAddress::new([n; 6])
    }

    #[test]
    fn test_authenticated_key_types() {
        let key = |key_type| LinkKey {
            key: [0; 16],
            key_type,
        };
        assert!(key(0x05).is_authenticated());
        assert!(key(0x08).is_authenticated());
        assert!(!key(0x04).is_authenticated());
        assert!(!key(0x07).is_authenticated());
        assert!(!key(0x00).is_authenticated());
    }

    #[test]
    fn test_store_replace_clear() {
        let mut table: LinkKeyTable<2> = LinkKeyTable::new();
        let first = LinkKey {
            key: [1; 16],
            key_type: 0x04,
        };
        let second = LinkKey {
            key: [2; 16],
            key_type: 0x05,
        };
        table.store(addr(1), first).unwrap();
        table.store(addr(1), second).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.find(&addr(1)), Some(second));

        table.store(addr(2), first).unwrap();
        assert_eq!(
            table.store(addr(3), first),
            Err(BluetoothError::InsufficientResources)
        );

        assert!(table.clear(&addr(1)));
        assert!(!table.clear(&addr(1)));
        assert_eq!(table.bonds().collect::<heapless::Vec<_, 2>>().as_slice(), &[addr(2)]);
    }
}
