//! Bounded discovery result cache
//!
//! Results are keyed by address: a device seen twice occupies one slot. When every slot
//! the session may use is taken, a new device may only displace the weakest entry whose
//! RSSI does not exceed its own.

use super::DiscoveryResult;
use crate::BluetoothAddress;
use crate::constants::RSSI_INVALID;
use heapless::Vec;

/// Address-keyed, fixed-capacity set of discovery results
#[derive(Debug)]
pub struct DiscoveryCache<const N: usize> {
    slots: Vec<DiscoveryResult, N>,
    limit: usize,
}

impl<const N: usize> Default for DiscoveryCache<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> DiscoveryCache<N> {
    /// Create an empty cache using all `N` slots
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            limit: N,
        }
    }

    /// Drop every result and use at most `limit` slots from now on
    pub fn reset(&mut self, limit: usize) {
        self.slots.clear();
        self.limit = limit.min(N);
    }

    /// Number of slots in use by the current session
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.limit
    }

    /// Number of slots in use
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether no slot is in use
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Results in slot order
    #[must_use]
    pub fn results(&self) -> &[DiscoveryResult] {
        &self.slots
    }

    /// Mutable results in slot order
    pub fn results_mut(&mut self) -> &mut [DiscoveryResult] {
        &mut self.slots
    }

    /// Find the slot for `addr`, claiming or recycling one if the device is new
    ///
    /// An existing slot is returned untouched. A claimed or recycled slot only gets
    /// its address set; the caller owns every other field. Returns `None` when the
    /// cache is full and no slot may be recycled for a sighting of strength `rssi`.
    pub fn find_or_allocate(
        &mut self,
        addr: &BluetoothAddress,
        rssi: i8,
    ) -> Option<&mut DiscoveryResult> {
        let index = self.slot_index(addr, rssi)?;
        self.slots.get_mut(index)
    }

    fn slot_index(&mut self, addr: &BluetoothAddress, rssi: i8) -> Option<usize> {
        if let Some(index) = self.slots.iter().position(|r| r.addr == *addr) {
            return Some(index);
        }

        if self.slots.len() < self.limit {
            let index = self.slots.len();
            let mut slot = DiscoveryResult::EMPTY;
            slot.addr = *addr;
            self.slots.push(slot).ok()?;
            return Some(index);
        }

        if rssi == RSSI_INVALID {
            return None;
        }

        let index = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.rssi <= rssi)
            .min_by_key(|(_, slot)| slot.rssi)
            .map(|(index, _)| index)?;

        let slot = &mut self.slots[index];
        debug!(
            "[DISCOVERY] reusing slot (old {} rssi {} dBm)",
            slot.addr, slot.rssi
        );
        *slot = DiscoveryResult::EMPTY;
        slot.addr = *addr;
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> BluetoothAddress {
        BluetoothAddress::new([n, 0, 0, 0, 0, 0xAA])
    }

    fn sight<const N: usize>(cache: &mut DiscoveryCache<N>, n: u8, rssi: i8) -> bool {
        match cache.find_or_allocate(&addr(n), rssi) {
            Some(slot) => {
                slot.rssi = rssi;
                true
            }
            None => false,
        }
    }

    #[test]
    fn test_resighting_updates_in_place() {
        let mut cache: DiscoveryCache<2> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -40));
        assert!(sight(&mut cache, 1, -60));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.results()[0].addr, addr(1));
        assert_eq!(cache.results()[0].rssi, -60);
    }

    #[test]
    fn test_full_cache_drops_weaker_newcomer() {
        let mut cache: DiscoveryCache<1> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -80));
        assert!(!sight(&mut cache, 2, -90));
        assert_eq!(cache.results()[0].addr, addr(1));
        assert_eq!(cache.results()[0].rssi, -80);
    }

    #[test]
    fn test_full_cache_evicts_for_stronger_newcomer() {
        let mut cache: DiscoveryCache<1> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -80));
        assert!(sight(&mut cache, 2, -70));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.results()[0].addr, addr(2));
        assert_eq!(cache.results()[0].rssi, -70);
    }

    #[test]
    fn test_equal_rssi_is_covered() {
        let mut cache: DiscoveryCache<1> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -70));
        assert!(sight(&mut cache, 2, -70));
        assert_eq!(cache.results()[0].addr, addr(2));
    }

    #[test]
    fn test_eviction_picks_weakest_covered_slot() {
        let mut cache: DiscoveryCache<3> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -50));
        assert!(sight(&mut cache, 2, -85));
        assert!(sight(&mut cache, 3, -65));

        assert!(sight(&mut cache, 4, -60));
        let addrs: [BluetoothAddress; 3] = core::array::from_fn(|i| cache.results()[i].addr);
        assert_eq!(addrs, [addr(1), addr(4), addr(3)]);

        assert!(sight(&mut cache, 5, -60));
        let addrs: [BluetoothAddress; 3] = core::array::from_fn(|i| cache.results()[i].addr);
        assert_eq!(addrs, [addr(1), addr(5), addr(3)]);
    }

    #[test]
    fn test_invalid_rssi_never_evicts() {
        let mut cache: DiscoveryCache<1> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -100));
        assert!(cache.find_or_allocate(&addr(2), RSSI_INVALID).is_none());
        assert_eq!(cache.results()[0].addr, addr(1));

        // Known devices are still found with the sentinel.
        assert!(cache.find_or_allocate(&addr(1), RSSI_INVALID).is_some());
    }

    #[test]
    fn test_count_bounded_and_addresses_unique() {
        let mut cache: DiscoveryCache<4> = DiscoveryCache::new();
        let mut rssi: i8 = -100;
        for round in 0..40u8 {
            let n = round % 9;
            sight(&mut cache, n, rssi);
            rssi = if rssi >= -20 { -100 } else { rssi + 7 };

            assert!(cache.len() <= cache.capacity());
            let results = cache.results();
            for (i, a) in results.iter().enumerate() {
                assert!(results[i + 1..].iter().all(|b| b.addr != a.addr));
            }
        }
    }

    #[test]
    fn test_reset_clears_and_limits() {
        let mut cache: DiscoveryCache<4> = DiscoveryCache::new();
        assert!(sight(&mut cache, 1, -40));
        cache.results_mut()[0].eir[0] = 9;

        cache.reset(2);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 2);
        assert!(sight(&mut cache, 1, -40));
        assert_eq!(cache.results()[0].eir[0], 0);
        assert!(sight(&mut cache, 2, -50));
        assert!(!sight(&mut cache, 3, -90));
        assert_eq!(cache.len(), 2);

        cache.reset(10);
        assert_eq!(cache.capacity(), 4);
    }
}
