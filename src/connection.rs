//! Connections and the connection registry

use crate::constants::{FEATURE_PAGE_LENGTH, MAX_CONNECTIONS, link_type};
use crate::hci::{BrEdrController, command};
use crate::security::{EncryptionMode, SecurityLevel};
use crate::{BluetoothAddress, BluetoothError, ClassOfDevice};
use bt_hci::cmd::link_control::Disconnect;
use bt_hci::param::{ConnHandle, DisconnectReason};
use heapless::Vec;

/// Local role on a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// Central (master)
    #[default]
    Central,
    /// Peripheral (slave)
    Peripheral,
}

impl Role {
    /// HCI role value
    #[must_use]
    pub fn raw(&self) -> u8 {
        match self {
            Self::Central => 0x00,
            Self::Peripheral => 0x01,
        }
    }

    /// Decode an HCI role value
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        if raw == 0x01 {
            Self::Peripheral
        } else {
            Self::Central
        }
    }
}

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No link
    #[default]
    Disconnected,
    /// Accepted, waiting for Connection Complete
    Initiating,
    /// Link up and admitted
    Connected,
    /// Disconnect issued, waiting for Disconnection Complete
    Disconnecting,
}

/// One BR/EDR connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Connection {
    /// Peer address
    pub addr: BluetoothAddress,
    /// HCI link type (see [`crate::constants::link_type`])
    pub link_type: u8,
    /// Handle, bound by the completion event
    pub handle: Option<ConnHandle>,
    /// Local role
    pub role: Role,
    /// Lifecycle state
    pub state: ConnectionState,
    /// Encryption in use
    pub encryption: EncryptionMode,
    /// Security level last computed for the link
    pub sec_level: SecurityLevel,
    /// Level the link must reach to stay up
    pub required_sec_level: SecurityLevel,
    /// Remote LMP feature pages 0 and 1
    pub features: [[u8; FEATURE_PAGE_LENGTH]; 2],
    /// Whether bonding is allowed on this link
    pub bondable: bool,
    /// Status of the last failure
    pub err: u8,
}

impl Connection {
    /// A new, disconnected connection to `addr`
    #[must_use]
    pub fn new(addr: BluetoothAddress, link_type: u8) -> Self {
        Self {
            addr,
            link_type,
            handle: None,
            role: Role::default(),
            state: ConnectionState::Disconnected,
            encryption: EncryptionMode::Off,
            sec_level: SecurityLevel::L1,
            required_sec_level: SecurityLevel::L1,
            features: [[0; FEATURE_PAGE_LENGTH]; 2],
            bondable: false,
            err: 0,
        }
    }

    /// Whether this is a SCO or eSCO link
    #[must_use]
    pub fn is_sco(&self) -> bool {
        is_sco(self.link_type)
    }

    /// Whether the peer supports extended feature pages
    #[must_use]
    pub fn supports_extended_features(&self) -> bool {
        self.features[0][7] & 0x80 != 0
    }
}

pub(crate) fn is_sco(link_type: u8) -> bool {
    link_type == link_type::SCO || link_type == link_type::ESCO
}

/// Issue a Disconnect for `conn` and mark it disconnecting
pub(crate) async fn disconnect<T: BrEdrController>(
    conn: &mut Connection,
    controller: &T,
    reason: DisconnectReason,
) -> Result<(), BluetoothError> {
    let handle = conn.handle.ok_or(BluetoothError::DeviceNotFound)?;
    command(controller, &Disconnect::new(handle, reason))
        .await
        .inspect_err(|e| error!("[CONN] disconnect of {} failed: {:?}", conn.addr, e))?;
    conn.state = ConnectionState::Disconnecting;
    Ok(())
}

/// Table of live connections
///
/// SCO and eSCO links share a peer address with their ACL link, so address lookups
/// distinguish the two kinds.
pub trait ConnectionRegistry {
    /// Add a connection to `addr`, or `None` when no entry can be allocated
    fn add(&mut self, addr: BluetoothAddress, link_type: u8) -> Option<&mut Connection>;

    /// Connection to `addr` of the same kind (ACL, or SCO/eSCO) as `link_type`
    fn lookup_addr(&mut self, addr: &BluetoothAddress, link_type: u8) -> Option<&mut Connection>;

    /// Connection bound to `handle`
    fn lookup_handle(&mut self, handle: ConnHandle) -> Option<&mut Connection>;

    /// Drop the connection to `addr` of the kind of `link_type`
    fn release(&mut self, addr: &BluetoothAddress, link_type: u8);
}

/// Fixed-capacity [`ConnectionRegistry`]
#[derive(Debug, Default)]
pub struct ConnectionTable<const N: usize = MAX_CONNECTIONS> {
    entries: Vec<Connection, N>,
}

impl<const N: usize> ConnectionTable<N> {
    /// Create an empty table
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Iterate over every connection
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.entries.iter()
    }

    /// Number of connections
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, addr: &BluetoothAddress, link_type: u8) -> Option<usize> {
        self.entries
            .iter()
            .position(|c| c.addr == *addr && c.is_sco() == is_sco(link_type))
    }
}

impl<const N: usize> ConnectionRegistry for ConnectionTable<N> {
    fn add(&mut self, addr: BluetoothAddress, link_type: u8) -> Option<&mut Connection> {
        if self.position(&addr, link_type).is_some() {
            return None;
        }
        self.entries.push(Connection::new(addr, link_type)).ok()?;
        self.entries.last_mut()
    }

    fn lookup_addr(&mut self, addr: &BluetoothAddress, link_type: u8) -> Option<&mut Connection> {
        let index = self.position(addr, link_type)?;
        self.entries.get_mut(index)
    }

    fn lookup_handle(&mut self, handle: ConnHandle) -> Option<&mut Connection> {
        self.entries.iter_mut().find(|c| c.handle == Some(handle))
    }

    fn release(&mut self, addr: &BluetoothAddress, link_type: u8) {
        if let Some(index) = self.position(addr, link_type) {
            self.entries.swap_remove(index);
        }
    }
}

/// Decides on incoming SCO and eSCO connection requests
///
/// Audio link setup lives outside the host. A policy that accepts a request is
/// responsible for answering it at the controller.
pub trait ScoAcceptPolicy {
    /// Accept the request, or reject it with the returned HCI reason
    ///
    /// # Errors
    /// Returns the reject reason when the request must be refused.
    fn connection_request(
        &self,
        addr: &BluetoothAddress,
        class_of_device: ClassOfDevice,
        link_type: u8,
    ) -> Result<(), u8>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockController, MockFailure};
    use embassy_futures::block_on;

    fn addr(n: u8) -> BluetoothAddress {
        BluetoothAddress::new([n, 0, 0, 0, 0, 0x10])
    }

    #[test]
    fn test_add_and_lookup_by_kind() {
        let mut table: ConnectionTable<3> = ConnectionTable::new();
        table.add(addr(1), link_type::ACL).unwrap();
        table.add(addr(1), link_type::ESCO).unwrap();
        assert!(table.add(addr(1), link_type::ACL).is_none());
        assert!(table.add(addr(1), link_type::SCO).is_none());

        assert_eq!(
            table.lookup_addr(&addr(1), link_type::SCO).unwrap().link_type,
            link_type::ESCO
        );
        assert_eq!(
            table.lookup_addr(&addr(1), link_type::ACL).unwrap().link_type,
            link_type::ACL
        );
        assert!(table.lookup_addr(&addr(2), link_type::ACL).is_none());
    }

    #[test]
    fn test_capacity_and_release() {
        let mut table: ConnectionTable<1> = ConnectionTable::new();
        table.add(addr(1), link_type::ACL).unwrap().handle = Some(ConnHandle::new(7));
        assert!(table.add(addr(2), link_type::ACL).is_none());
        assert_eq!(
            table.lookup_handle(ConnHandle::new(7)).unwrap().addr,
            addr(1)
        );

        table.release(&addr(1), link_type::ACL);
        assert!(table.is_empty());
        assert!(table.add(addr(2), link_type::ACL).is_some());
    }

    #[test]
    fn test_role_and_features() {
        assert_eq!(Role::from_raw(0x01), Role::Peripheral);
        assert_eq!(Role::from_raw(0x00), Role::Central);
        assert_eq!(Role::Peripheral.raw(), 0x01);

        let mut conn = Connection::new(addr(1), link_type::ACL);
        assert!(!conn.supports_extended_features());
        conn.features[0][7] = 0x80;
        assert!(conn.supports_extended_features());
    }

    #[test]
    fn test_disconnect_marks_disconnecting() {
        let controller = MockController::new();
        let mut conn = Connection::new(addr(1), link_type::ACL);
        assert_eq!(
            block_on(disconnect(
                &mut conn,
                &controller,
                DisconnectReason::RemoteUserTerminatedConn
            )),
            Err(BluetoothError::DeviceNotFound)
        );

        conn.handle = Some(ConnHandle::new(0x002A));
        block_on(disconnect(
            &mut conn,
            &controller,
            DisconnectReason::RemoteUserTerminatedConn,
        ))
        .unwrap();
        assert_eq!(conn.state, ConnectionState::Disconnecting);
        assert_eq!(
            controller.last_sent::<Disconnect>().unwrap().as_slice(),
            &[0x2A, 0x00, 0x13]
        );
    }

    #[test]
    fn test_failed_disconnect_leaves_state() {
        let controller = MockController::new();
        controller.fail_next::<Disconnect>(MockFailure::Status(0x0C));
        let mut conn = Connection::new(addr(1), link_type::ACL);
        conn.handle = Some(ConnHandle::new(1));
        conn.state = ConnectionState::Connected;
        assert_eq!(
            block_on(disconnect(
                &mut conn,
                &controller,
                DisconnectReason::RemoteUserTerminatedConn
            )),
            Err(BluetoothError::HciCommandFailed(0x0C))
        );
        assert_eq!(conn.state, ConnectionState::Connected);
    }
}
