//! Bluetooth Host - BR/EDR discovery, admission and scan mode management
//!
//! `BluetoothHost` turns HCI events into discovery results and admitted connections, and
//! exposes the operations an application drives: discovery, connectable/discoverable
//! modes and bond removal.
//!
//! ## Event Flow
//!
//! 1. A `bt_hci` event is flattened into one or more [`HostEvent`]s
//! 2. [`BluetoothHost::process_event`] dispatches each to the discovery session,
//!    the admission handlers or the bond store
//! 3. Handlers issue follow-up commands through the [`BrEdrController`] and notify
//!    registered listeners
//!
//! Each event is handled to completion before the next one is accepted, so no state
//! in the host needs locking. Commands issued from a handler are awaited in place.
//!
//! ## Collaborators
//!
//! - [`BrEdrController`] runs commands and delivers events
//! - [`ConnectionRegistry`] owns connection objects ([`ConnectionTable`] by default)
//! - [`LinkKeyStore`] owns bonds ([`LinkKeyTable`] by default)
//! - [`LimitedDiscoverableTimer`] arms the limited discoverable deadline

mod admission;
mod api_processor;
mod bonds;

use crate::connection::{ConnectionRegistry, ConnectionTable, ScoAcceptPolicy};
use crate::constants::{MAX_DISCOVERY_RESULTS, link_type};
use crate::discovery::{DiscoveryParams, DiscoveryResult, DiscoverySession};
use crate::hci::BrEdrController;
use crate::hci::event::HostEvent;
use crate::keys::{LinkKeyStore, LinkKeyTable};
use crate::listener::{ConnectionListener, ConnectionListeners, DiscoveryListener, DiscoveryListeners};
use crate::scan::{LimitedDiscoverableTimer, ScanState};
use crate::security::SecurityLevel;
use crate::{BluetoothAddress, BluetoothError, BluetoothHostOptions};
use bt_hci::FromHciBytes;
use bt_hci::event::Event;

/// BR/EDR host state and its collaborators
///
/// `'a` bounds everything the host borrows from the application: the controller,
/// listeners and the SCO accept policy. `D` is the number of discovery result slots.
pub struct BluetoothHost<
    'a,
    T,
    S,
    C = ConnectionTable,
    K = LinkKeyTable,
    const D: usize = MAX_DISCOVERY_RESULTS,
> {
    controller: &'a T,
    timer: S,
    connections: C,
    keys: K,
    options: BluetoothHostOptions,
    scan: ScanState,
    discovery: DiscoverySession<D>,
    discovery_listeners: DiscoveryListeners<'a>,
    connection_listeners: ConnectionListeners<'a>,
    sco_policy: Option<&'a dyn ScoAcceptPolicy>,
}

impl<'a, T, S, C, K, const D: usize> BluetoothHost<'a, T, S, C, K, D>
where
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry + Default,
    K: LinkKeyStore + Default,
{
    /// Create a host with empty connection and bond tables
    #[must_use]
    pub fn new(controller: &'a T, timer: S, options: BluetoothHostOptions) -> Self {
        Self::with_stores(controller, timer, C::default(), K::default(), options)
    }
}

impl<'a, T, S, C, K, const D: usize> BluetoothHost<'a, T, S, C, K, D>
where
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    /// Create a host around existing connection and bond stores
    #[must_use]
    pub fn with_stores(
        controller: &'a T,
        timer: S,
        connections: C,
        keys: K,
        options: BluetoothHostOptions,
    ) -> Self {
        Self {
            controller,
            timer,
            connections,
            keys,
            options,
            scan: ScanState::default(),
            discovery: DiscoverySession::new(),
            discovery_listeners: DiscoveryListeners::new(),
            connection_listeners: ConnectionListeners::new(),
            sco_policy: None,
        }
    }

    /// Host configuration
    #[must_use]
    pub fn options(&self) -> &BluetoothHostOptions {
        &self.options
    }

    /// Current scan modes
    #[must_use]
    pub fn scan_state(&self) -> ScanState {
        self.scan
    }

    /// The controller commands are issued to
    #[must_use]
    pub fn controller(&self) -> &'a T {
        self.controller
    }

    /// Limited discoverable deadline
    pub fn timer(&mut self) -> &mut S {
        &mut self.timer
    }

    /// Connection registry
    pub fn connections(&mut self) -> &mut C {
        &mut self.connections
    }

    /// Bond store
    pub fn keys(&mut self) -> &mut K {
        &mut self.keys
    }

    /// Register a listener for discovery results
    ///
    /// # Errors
    /// See [`crate::listener::Listeners::register`].
    pub fn register_discovery_listener(
        &mut self,
        listener: &'a dyn DiscoveryListener,
    ) -> Result<(), BluetoothError> {
        self.discovery_listeners.register(listener)
    }

    /// Unregister a discovery listener, returning whether it was registered
    pub fn unregister_discovery_listener(&mut self, listener: &'a dyn DiscoveryListener) -> bool {
        self.discovery_listeners.unregister(listener)
    }

    /// Register a listener for connection events
    ///
    /// # Errors
    /// See [`crate::listener::Listeners::register`].
    pub fn register_connection_listener(
        &mut self,
        listener: &'a dyn ConnectionListener,
    ) -> Result<(), BluetoothError> {
        self.connection_listeners.register(listener)
    }

    /// Unregister a connection listener, returning whether it was registered
    pub fn unregister_connection_listener(&mut self, listener: &'a dyn ConnectionListener) -> bool {
        self.connection_listeners.unregister(listener)
    }

    /// Install the policy deciding on incoming SCO and eSCO requests
    ///
    /// Without a policy every such request is rejected.
    pub fn set_sco_accept_policy(&mut self, policy: Option<&'a dyn ScoAcceptPolicy>) {
        self.sco_policy = policy;
    }

    /// Start device discovery
    ///
    /// Results are reported to the discovery listeners as devices are found; the full
    /// set is reported once every name is resolved. The results of the previous session
    /// are dropped.
    ///
    /// # Errors
    /// See [`DiscoverySession::start`].
    pub async fn start_discovery(&mut self, params: &DiscoveryParams) -> Result<(), BluetoothError> {
        self.discovery
            .start(self.controller, params, self.options.inquiry_max_responses)
            .await
    }

    /// Stop discovery without reporting results
    ///
    /// # Errors
    /// See [`DiscoverySession::stop`].
    pub async fn stop_discovery(&mut self) -> Result<(), BluetoothError> {
        self.discovery.stop(self.controller).await
    }

    /// Whether a discovery session is active
    #[must_use]
    pub fn is_discovering(&self) -> bool {
        self.discovery.is_active()
    }

    /// Results of the active discovery session, or of the last one
    #[must_use]
    pub fn discovery_results(&self) -> &[DiscoveryResult] {
        self.discovery.results()
    }

    /// Enable or disable page scan
    ///
    /// # Errors
    /// See [`ScanState::set_connectable`].
    pub async fn set_connectable(&mut self, enable: bool) -> Result<(), BluetoothError> {
        self.scan.set_connectable(self.controller, enable).await
    }

    /// Enable or disable inquiry scan, optionally in limited discoverable mode
    ///
    /// # Errors
    /// See [`ScanState::set_discoverable`].
    pub async fn set_discoverable(
        &mut self,
        enable: bool,
        limited: bool,
    ) -> Result<(), BluetoothError> {
        self.scan
            .set_discoverable(
                self.controller,
                &mut self.timer,
                enable,
                limited,
                self.options.limited_discoverable_duration,
            )
            .await
    }

    /// Leave limited discoverable mode; call when the timer deadline passes
    pub async fn limited_discoverable_timeout(&mut self) {
        self.scan
            .limited_discoverable_timeout(self.controller, &mut self.timer)
            .await;
    }

    /// Require `level` on the ACL link to `addr`
    ///
    /// The requirement is enforced on the next security evaluation of the link.
    ///
    /// # Errors
    /// Returns `BluetoothError::DeviceNotFound` if there is no ACL link to `addr`.
    pub fn set_required_security(
        &mut self,
        addr: &BluetoothAddress,
        level: SecurityLevel,
    ) -> Result<(), BluetoothError> {
        let conn = self
            .connections
            .lookup_addr(addr, link_type::ACL)
            .ok_or(BluetoothError::DeviceNotFound)?;
        conn.required_sec_level = level;
        Ok(())
    }

    /// Process one host event
    pub async fn process_event(&mut self, event: &HostEvent) {
        match event {
            HostEvent::InquiryResult(report) => {
                debug!("[HOST] inquiry result");
                self.discovery
                    .handle_inquiry_result(report, &self.discovery_listeners);
            }
            HostEvent::InquiryComplete { status } => {
                debug!("[HOST] inquiry complete");
                self.discovery
                    .handle_inquiry_complete(*status, self.controller, &self.discovery_listeners)
                    .await;
            }
            HostEvent::RemoteNameRequestComplete { status, addr, name } => {
                debug!("[HOST] remote name request complete: {}", addr);
                self.discovery
                    .handle_remote_name(
                        *status,
                        addr,
                        name,
                        self.controller,
                        &self.discovery_listeners,
                    )
                    .await;
            }
            HostEvent::ConnectionRequest {
                addr,
                class_of_device,
                link_type,
            } => {
                self.handle_connection_request(addr, *class_of_device, *link_type)
                    .await;
            }
            HostEvent::ConnectionComplete {
                status,
                handle,
                addr,
                link_type,
                encryption_enabled,
            } => {
                self.handle_connection_complete(
                    *status,
                    *handle,
                    addr,
                    *link_type,
                    *encryption_enabled,
                )
                .await;
            }
            HostEvent::SynchronousConnectionComplete {
                status,
                handle,
                addr,
                link_type,
            } => {
                self.handle_sync_connection_complete(*status, *handle, addr, *link_type);
            }
            HostEvent::DisconnectionComplete {
                status,
                handle,
                reason,
            } => {
                self.handle_disconnection_complete(*status, *handle, *reason);
            }
            HostEvent::EncryptionChange {
                status,
                handle,
                encryption_enabled,
            } => {
                self.handle_encryption_change(*status, *handle, *encryption_enabled)
                    .await;
            }
            HostEvent::RemoteFeatures {
                status,
                handle,
                features,
            } => {
                self.handle_remote_features(*status, *handle, features).await;
            }
            HostEvent::RemoteExtendedFeatures {
                status,
                handle,
                page,
                features,
            } => {
                self.handle_remote_extended_features(*status, *handle, *page, features);
            }
            HostEvent::RoleChange { status, addr, role } => {
                self.handle_role_change(*status, addr, *role);
            }
            HostEvent::LinkKeyNotification {
                addr,
                link_key,
                key_type,
            } => {
                self.handle_link_key_notification(addr, link_key, *key_type);
            }
        }
    }

    /// Process a `bt_hci` event
    pub async fn process_hci_event(&mut self, event: &Event<'_>) {
        for host_event in HostEvent::collect(event) {
            self.process_event(&host_event).await;
        }
    }

    /// Decode and process a raw HCI event packet (event code, length, parameters)
    pub async fn process_hci_packet(&mut self, packet: &[u8]) {
        match Event::from_hci_bytes(packet) {
            Ok((event, _)) => self.process_hci_event(&event).await,
            Err(e) => warn!(
                "[HOST] malformed event packet ({} bytes): {:?}",
                packet.len(),
                e
            ),
        }
    }
}
