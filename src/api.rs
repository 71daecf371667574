//! Request/response API to a running host
//!
//! [`crate::processor::run`] takes the host by `&mut` for as long as it runs, so
//! application code drives it through a [`HostApi`]: each call sends a [`Request`] over a
//! channel and waits for the matching [`Response`]. Calls from several tasks are
//! serialized, so every caller receives its own response.
//!
//! # Usage
//!
//! ```rust,ignore
//! use bredr_host::api::HostApi;
//! use bredr_host::DiscoveryParams;
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//!
//! static API: HostApi<CriticalSectionRawMutex> = HostApi::new();
//!
//! // Host task: processor::run(&mut host, &API, &EXPIRY).await
//!
//! API.set_connectable(true).await?;
//! API.start_discovery(DiscoveryParams::default()).await?;
//! ```

use crate::constants::MAX_CHANNELS;
use crate::discovery::DiscoveryParams;
use crate::security::SecurityLevel;
use crate::{BluetoothAddress, BluetoothError};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;

/// Operation requested from the host task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Start device discovery
    StartDiscovery(DiscoveryParams),
    /// Stop ongoing discovery
    StopDiscovery,
    /// Enable or disable page scan
    SetConnectable(bool),
    /// Enable or disable inquiry scan
    SetDiscoverable {
        /// Inquiry scan on or off
        enable: bool,
        /// Limited discoverable mode
        limited: bool,
    },
    /// Require a security level on an ACL link
    SetRequiredSecurity(BluetoothAddress, SecurityLevel),
    /// Remove one bond, or all of them for [`BluetoothAddress::ANY`]
    Unpair(BluetoothAddress),
    /// Check for a stored bond
    BondExists(BluetoothAddress),
}

/// Answer of the host task to a [`Request`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    /// Inquiry started
    DiscoveryStarted,
    /// Discovery stopped
    DiscoveryStopped,
    /// Page scan updated
    ConnectableSet,
    /// Inquiry scan updated
    DiscoverableSet,
    /// Security requirement recorded
    RequiredSecuritySet,
    /// Bonds removed
    Unpaired,
    /// Whether the bond exists
    BondExists(bool),
    /// The request failed
    Error(BluetoothError),
}

/// Channels between application tasks and the host task
pub struct HostApi<M: RawMutex> {
    requests: Channel<M, Request, MAX_CHANNELS>,
    responses: Channel<M, Response, MAX_CHANNELS>,
    call: Mutex<M, ()>,
}

impl<M: RawMutex> Default for HostApi<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> HostApi<M> {
    /// Create an idle API
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requests: Channel::new(),
            responses: Channel::new(),
            call: Mutex::new(()),
        }
    }

    async fn call(&self, request: Request) -> Response {
        let _call = self.call.lock().await;
        self.requests.send(request).await;
        self.responses.receive().await
    }

    async fn expect(&self, request: Request, expected: Response) -> Result<(), BluetoothError> {
        match self.call(request).await {
            Response::Error(e) => Err(e),
            response if response == expected => Ok(()),
            _ => Err(BluetoothError::InvalidResponse),
        }
    }

    /// Start device discovery
    ///
    /// # Errors
    /// See [`crate::BluetoothHost::start_discovery`].
    pub async fn start_discovery(&self, params: DiscoveryParams) -> Result<(), BluetoothError> {
        self.expect(Request::StartDiscovery(params), Response::DiscoveryStarted)
            .await
    }

    /// Stop discovery without reporting results
    ///
    /// # Errors
    /// See [`crate::BluetoothHost::stop_discovery`].
    pub async fn stop_discovery(&self) -> Result<(), BluetoothError> {
        self.expect(Request::StopDiscovery, Response::DiscoveryStopped)
            .await
    }

    /// Enable or disable page scan
    ///
    /// # Errors
    /// See [`crate::BluetoothHost::set_connectable`].
    pub async fn set_connectable(&self, enable: bool) -> Result<(), BluetoothError> {
        self.expect(Request::SetConnectable(enable), Response::ConnectableSet)
            .await
    }

    /// Enable or disable inquiry scan
    ///
    /// # Errors
    /// See [`crate::BluetoothHost::set_discoverable`].
    pub async fn set_discoverable(&self, enable: bool, limited: bool) -> Result<(), BluetoothError> {
        self.expect(
            Request::SetDiscoverable { enable, limited },
            Response::DiscoverableSet,
        )
        .await
    }

    /// Require `level` on the ACL link to `addr`
    ///
    /// # Errors
    /// See [`crate::BluetoothHost::set_required_security`].
    pub async fn set_required_security(
        &self,
        addr: BluetoothAddress,
        level: SecurityLevel,
    ) -> Result<(), BluetoothError> {
        self.expect(
            Request::SetRequiredSecurity(addr, level),
            Response::RequiredSecuritySet,
        )
        .await
    }

    /// Remove the bond with `addr`, or every bond for [`BluetoothAddress::ANY`]
    ///
    /// # Errors
    /// Returns an error if the response is unexpected.
    pub async fn unpair(&self, addr: BluetoothAddress) -> Result<(), BluetoothError> {
        self.expect(Request::Unpair(addr), Response::Unpaired).await
    }

    /// Whether a link key is stored for `addr`
    ///
    /// # Errors
    /// Returns an error if the response is unexpected.
    pub async fn bond_exists(&self, addr: BluetoothAddress) -> Result<bool, BluetoothError> {
        match self.call(Request::BondExists(addr)).await {
            Response::BondExists(exists) => Ok(exists),
            Response::Error(e) => Err(e),
            _ => Err(BluetoothError::InvalidResponse),
        }
    }

    pub(crate) async fn next_request(&self) -> Request {
        self.requests.receive().await
    }

    pub(crate) async fn respond(&self, response: Response) {
        self.responses.send(response).await;
    }
}
