//! Bond management

use crate::connection::{self, ConnectionRegistry};
use crate::constants::{MAX_LINK_KEYS, link_type};
use crate::hci::BrEdrController;
use crate::keys::{LinkKey, LinkKeyStore};
use crate::scan::LimitedDiscoverableTimer;
use crate::{BluetoothAddress, BluetoothHost};
use bt_hci::param::DisconnectReason;
use heapless::Vec;

impl<T, S, C, K, const D: usize> BluetoothHost<'_, T, S, C, K, D>
where
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    /// Whether a link key is stored for `addr`
    #[must_use]
    pub fn bond_exists(&self, addr: &BluetoothAddress) -> bool {
        self.keys.find(addr).is_some()
    }

    /// Remove the bond with `addr`, or every bond when `addr` is [`BluetoothAddress::ANY`]
    ///
    /// A live ACL link to an unpaired device is disconnected first. Connection listeners
    /// are told about every deleted bond.
    pub async fn unpair(&mut self, addr: &BluetoothAddress) {
        if !addr.is_any() {
            self.unpair_one(addr).await;
            return;
        }

        // Stores larger than MAX_LINK_KEYS keep the bonds past that count.
        let bonds: Vec<BluetoothAddress, MAX_LINK_KEYS> =
            self.keys.bonds().take(MAX_LINK_KEYS).collect();
        for bond in &bonds {
            self.unpair_one(bond).await;
        }
    }

    async fn unpair_one(&mut self, addr: &BluetoothAddress) {
        info!("[BOND] unpairing {}", addr);
        if let Some(conn) = self.connections.lookup_addr(addr, link_type::ACL) {
            if connection::disconnect(
                conn,
                self.controller,
                DisconnectReason::RemoteUserTerminatedConn,
            )
            .await
            .is_err()
            {
                warn!("[BOND] link to {} left up", addr);
            }
        }

        if !self.keys.clear(addr) {
            warn!("[BOND] no bond removed for {}", addr);
        }
        for listener in self.connection_listeners.iter() {
            listener.bond_deleted(addr);
        }
    }

    pub(super) fn handle_link_key_notification(
        &mut self,
        addr: &BluetoothAddress,
        link_key: &[u8; 16],
        key_type: u8,
    ) {
        debug!("[BOND] link key for {}, type 0x{:02x}", addr, key_type);
        let key = LinkKey {
            key: *link_key,
            key_type,
        };
        if let Err(e) = self.keys.store(*addr, key) {
            warn!("[BOND] failed to store link key for {}: {:?}", addr, e);
        }
    }
}
