//! Connection admission - incoming requests, completion and link maintenance events

use crate::connection::{Connection, ConnectionRegistry, ConnectionState, Role, is_sco};
use crate::constants::{link_type, status};
use crate::hci::cmd::{
    AcceptConnectionRequest, ReadRemoteExtendedFeatures, ReadRemoteSupportedFeatures,
    RejectConnectionRequest,
};
use crate::hci::{BrEdrController, command};
use crate::keys::LinkKeyStore;
use crate::scan::LimitedDiscoverableTimer;
use crate::security::{self, EncryptionMode, SecurityVerdict};
use crate::{BluetoothAddress, BluetoothHost, ClassOfDevice};
use bt_hci::param::ConnHandle;

impl<T, S, C, K, const D: usize> BluetoothHost<'_, T, S, C, K, D>
where
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    async fn reject_connection(&mut self, addr: &BluetoothAddress, reason: u8) {
        if let Err(e) = command(
            self.controller,
            &RejectConnectionRequest::new((*addr).into(), reason),
        )
        .await
        {
            warn!("[CONN] reject of {} failed: {:?}", addr, e);
        }
    }

    pub(super) async fn handle_connection_request(
        &mut self,
        addr: &BluetoothAddress,
        class_of_device: ClassOfDevice,
        link_type: u8,
    ) {
        debug!("[CONN] request from {}, type 0x{:02x}", addr, link_type);

        if link_type != link_type::ACL {
            let verdict = match self.sco_policy {
                Some(policy) => policy.connection_request(addr, class_of_device, link_type),
                None => Err(status::INSUFFICIENT_RESOURCES),
            };
            if let Err(reason) = verdict {
                self.reject_connection(addr, reason).await;
                return;
            }

            // The policy has already answered the controller.
            match self.connections.add(*addr, link_type) {
                Some(conn) => conn.state = ConnectionState::Initiating,
                None => warn!("[CONN] no room to track accepted sync link from {}", addr),
            }
            return;
        }

        let Some(conn) = self.connections.add(*addr, link_type) else {
            self.reject_connection(addr, status::INSUFFICIENT_RESOURCES)
                .await;
            return;
        };
        conn.role = Role::Peripheral;
        conn.state = ConnectionState::Initiating;

        if let Err(e) = command(
            self.controller,
            &AcceptConnectionRequest::new((*addr).into(), Role::Peripheral.raw()),
        )
        .await
        {
            warn!("[CONN] accept of {} failed: {:?}", addr, e);
        }
    }

    pub(super) async fn handle_connection_complete(
        &mut self,
        status: u8,
        handle: ConnHandle,
        addr: &BluetoothAddress,
        link_type: u8,
        encryption_enabled: u8,
    ) {
        debug!(
            "[CONN] complete: status 0x{:02x}, handle {}, type 0x{:02x}",
            status,
            handle.raw(),
            link_type
        );

        let Some(conn) = self.connections.lookup_addr(addr, link_type::ACL) else {
            error!("[CONN] no connection for {}", addr);
            return;
        };

        if status != 0 {
            conn.err = status;
            conn.state = ConnectionState::Disconnected;
            let conn = *conn;
            self.connections.release(addr, link_type::ACL);
            for listener in self.connection_listeners.iter() {
                listener.connected(&conn, status);
            }
            return;
        }

        conn.handle = Some(handle);
        conn.err = 0;
        conn.encryption = EncryptionMode::from_raw(encryption_enabled);

        let link_key = self.keys.find(addr);
        match security::update_security_level(
            conn,
            link_key.as_ref(),
            self.controller,
            self.options.min_encryption_key_size,
        )
        .await
        {
            SecurityVerdict::Sufficient => {}
            SecurityVerdict::Disconnecting => return,
            SecurityVerdict::DisconnectFailed => {
                error!("[CONN] releasing {}, disconnect refused", addr);
                self.connections.release(addr, link_type::ACL);
                return;
            }
        }

        conn.state = ConnectionState::Connected;
        conn.bondable = self.options.bondable;
        info!("[CONN] connected to {} at {:?}", addr, conn.sec_level);
        for listener in self.connection_listeners.iter() {
            listener.connected(conn, 0);
        }

        if let Err(e) = command(self.controller, &ReadRemoteSupportedFeatures::new(handle)).await {
            warn!("[CONN] read remote features failed: {:?}", e);
        }
    }

    pub(super) fn handle_sync_connection_complete(
        &mut self,
        status: u8,
        handle: ConnHandle,
        addr: &BluetoothAddress,
        link_type: u8,
    ) {
        debug!(
            "[CONN] sync complete: status 0x{:02x}, handle {}, type 0x{:02x}",
            status,
            handle.raw(),
            link_type
        );

        let kind = if is_sco(link_type) {
            link_type
        } else {
            link_type::SCO
        };
        let Some(conn) = self.connections.lookup_addr(addr, kind) else {
            error!("[CONN] no sync connection for {}", addr);
            return;
        };

        if status != 0 {
            conn.err = status;
            conn.state = ConnectionState::Disconnected;
            let conn = *conn;
            self.connections.release(addr, kind);
            for listener in self.connection_listeners.iter() {
                listener.connected(&conn, status);
            }
            return;
        }

        conn.handle = Some(handle);
        conn.link_type = link_type;
        conn.state = ConnectionState::Connected;
        for listener in self.connection_listeners.iter() {
            listener.connected(conn, 0);
        }
    }

    pub(super) fn handle_disconnection_complete(
        &mut self,
        status: u8,
        handle: ConnHandle,
        reason: u8,
    ) {
        debug!(
            "[CONN] disconnection complete: status 0x{:02x}, handle {}, reason 0x{:02x}",
            status,
            handle.raw(),
            reason
        );

        let Some(conn) = self.connections.lookup_handle(handle) else {
            error!("[CONN] no connection for handle {}", handle.raw());
            return;
        };
        if status != 0 {
            warn!("[CONN] disconnection failed: 0x{:02x}", status);
            return;
        }

        conn.state = ConnectionState::Disconnected;
        conn.err = reason;
        let conn: Connection = *conn;
        self.connections.release(&conn.addr, conn.link_type);
        for listener in self.connection_listeners.iter() {
            listener.disconnected(&conn, reason);
        }
    }

    pub(super) async fn handle_encryption_change(
        &mut self,
        status: u8,
        handle: ConnHandle,
        encryption_enabled: u8,
    ) {
        debug!(
            "[CONN] encryption change: status 0x{:02x}, handle {}, enabled 0x{:02x}",
            status,
            handle.raw(),
            encryption_enabled
        );

        let Some(conn) = self.connections.lookup_handle(handle) else {
            error!("[CONN] no connection for handle {}", handle.raw());
            return;
        };
        if status != 0 {
            warn!("[CONN] encryption change failed: 0x{:02x}", status);
            return;
        }

        conn.encryption = EncryptionMode::from_raw(encryption_enabled);
        let link_key = self.keys.find(&conn.addr);
        match security::update_security_level(
            conn,
            link_key.as_ref(),
            self.controller,
            self.options.min_encryption_key_size,
        )
        .await
        {
            SecurityVerdict::Sufficient => {}
            SecurityVerdict::Disconnecting => return,
            SecurityVerdict::DisconnectFailed => {
                error!("[CONN] releasing {}, disconnect refused", conn.addr);
                conn.state = ConnectionState::Disconnected;
                conn.err = status::AUTHENTICATION_FAILURE;
                let conn = *conn;
                self.connections.release(&conn.addr, conn.link_type);
                for listener in self.connection_listeners.iter() {
                    listener.disconnected(&conn, status::AUTHENTICATION_FAILURE);
                }
                return;
            }
        }

        for listener in self.connection_listeners.iter() {
            listener.security_changed(conn, conn.sec_level);
        }
    }

    pub(super) async fn handle_remote_features(
        &mut self,
        status: u8,
        handle: ConnHandle,
        features: &[u8; 8],
    ) {
        debug!(
            "[CONN] remote features: status 0x{:02x}, handle {}",
            status,
            handle.raw()
        );

        let Some(conn) = self.connections.lookup_handle(handle) else {
            error!("[CONN] no connection for handle {}", handle.raw());
            return;
        };
        if status != 0 {
            return;
        }

        conn.features[0] = *features;
        if !conn.supports_extended_features() {
            return;
        }

        if let Err(e) = command(
            self.controller,
            &ReadRemoteExtendedFeatures::new(handle, 0x01),
        )
        .await
        {
            warn!("[CONN] read remote extended features failed: {:?}", e);
        }
    }

    pub(super) fn handle_remote_extended_features(
        &mut self,
        status: u8,
        handle: ConnHandle,
        page: u8,
        features: &[u8; 8],
    ) {
        debug!(
            "[CONN] remote extended features: status 0x{:02x}, handle {}, page {}",
            status,
            handle.raw(),
            page
        );

        let Some(conn) = self.connections.lookup_handle(handle) else {
            error!("[CONN] no connection for handle {}", handle.raw());
            return;
        };
        if status == 0 && page == 0x01 {
            conn.features[1] = *features;
        }
    }

    pub(super) fn handle_role_change(&mut self, status: u8, addr: &BluetoothAddress, role: u8) {
        debug!(
            "[CONN] role change: status 0x{:02x}, role {}, {}",
            status, role, addr
        );

        let Some(conn) = self.connections.lookup_addr(addr, link_type::ACL) else {
            error!("[CONN] no connection for {}", addr);
            return;
        };
        if status == 0 {
            conn.role = Role::from_raw(role);
        }
        for listener in self.connection_listeners.iter() {
            listener.role_changed(conn, status);
        }
    }
}
