//! Device discovery
//!
//! A discovery session runs one inquiry, collects every responding device into a bounded
//! result cache, then resolves the names of devices that did not advertise one. Once the
//! last name is resolved the session reports its results and ends itself. The results
//! stay readable until the next session starts.
//!
//! ## Session lifecycle
//!
//! 1. [`DiscoverySession::start`] issues the inquiry and clears the cache
//! 2. Inquiry results are merged into the [`DiscoveryCache`] and reported one by one
//! 3. Inquiry complete starts a name resolution round
//! 4. Each remote name complete writes a short name into the device's EIR and requests
//!    the next name
//! 5. When no name is left to request, listeners receive the full result set and the
//!    session ends
//!
//! [`DiscoverySession::stop`] ends a session early without a completion report.

mod cache;
mod resolver;

pub use cache::DiscoveryCache;

use crate::class_of_device::ClassOfDevice;
use crate::constants::{
    CLASS_OF_DEVICE_LENGTH, EIR_SIZE, GIAC, LIAC, MAX_DISCOVERY_RESULTS, MAX_INQUIRY_LENGTH,
    RSSI_INVALID,
};
use crate::hci::cmd::InquiryCancel;
use crate::hci::event::InquiryReport;
use crate::hci::{BrEdrController, command};
use crate::listener::DiscoveryListeners;
use crate::{BluetoothAddress, BluetoothError, eir};
use bt_hci::cmd::link_control::Inquiry;

/// Progress of the remote name request for one discovered device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResolveState {
    /// A name request is still to be issued
    #[default]
    Pending,
    /// A name request is outstanding
    Resolving,
    /// The name was received, or will not be requested again this round
    Resolved,
}

/// Private paging and resolution data kept with each result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct ResolveInfo {
    pub(crate) page_scan_repetition_mode: u8,
    pub(crate) clock_offset: u16,
    pub(crate) state: ResolveState,
}

impl ResolveInfo {
    const EMPTY: Self = Self {
        page_scan_repetition_mode: 0,
        clock_offset: 0,
        state: ResolveState::Pending,
    };
}

/// One device seen during a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveryResult {
    /// Device address
    pub addr: BluetoothAddress,
    /// Signal strength of the last sighting in dBm, [`RSSI_INVALID`] if unknown
    pub rssi: i8,
    /// Class of Device, little-endian
    pub cod: [u8; CLASS_OF_DEVICE_LENGTH],
    /// Extended Inquiry Response data
    pub eir: [u8; EIR_SIZE],
    pub(crate) resolve: ResolveInfo,
}

impl DiscoveryResult {
    /// An unused slot
    pub const EMPTY: Self = Self {
        addr: BluetoothAddress::ANY,
        rssi: 0,
        cod: [0; CLASS_OF_DEVICE_LENGTH],
        eir: [0; EIR_SIZE],
        resolve: ResolveInfo::EMPTY,
    };

    /// Decoded Class of Device
    #[must_use]
    pub fn class_of_device(&self) -> ClassOfDevice {
        ClassOfDevice::from_le_bytes(self.cod)
    }

    /// Advertised or resolved name bytes, complete name preferred
    #[must_use]
    pub fn name(&self) -> Option<&[u8]> {
        eir::name(&self.eir)
    }

    /// Name resolution progress
    #[must_use]
    pub fn resolve_state(&self) -> ResolveState {
        self.resolve.state
    }
}

impl Default for DiscoveryResult {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Parameters of a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveryParams {
    /// Inquiry length in 1.28s units (1 to 0x30)
    pub length: u8,
    /// Only find devices in limited discoverable mode
    pub limited: bool,
    /// Most devices to keep, at most the host's result capacity; `None` uses all of it
    pub max_results: Option<u8>,
}

impl Default for DiscoveryParams {
    fn default() -> Self {
        Self {
            length: 8,
            limited: false,
            max_results: None,
        }
    }
}

impl DiscoveryParams {
    /// Result slots this session may use, or `None` if the parameters are invalid
    fn slots(&self, capacity: usize) -> Option<usize> {
        if !(1..=MAX_INQUIRY_LENGTH).contains(&self.length) {
            return None;
        }
        let slots = self.max_results.map_or(capacity, usize::from);
        (1..=capacity).contains(&slots).then_some(slots)
    }
}

/// Discovery session state and the results of the current or last session
#[derive(Debug, Default)]
pub struct DiscoverySession<const N: usize = MAX_DISCOVERY_RESULTS> {
    cache: DiscoveryCache<N>,
    active: bool,
}

impl<const N: usize> DiscoverySession<N> {
    /// Create an inactive session
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cache: DiscoveryCache::new(),
            active: false,
        }
    }

    /// Whether an inquiry or its name resolution is in progress
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Results of the active session, or of the last one until a new session starts
    #[must_use]
    pub fn results(&self) -> &[DiscoveryResult] {
        self.cache.results()
    }

    /// Start an inquiry
    ///
    /// The previous session's results are dropped once the controller accepted the
    /// inquiry.
    ///
    /// # Errors
    /// - `BluetoothError::InvalidParameter` if `params.length` is outside 1..=0x30, or
    ///   `params.max_results` is zero or above the result capacity
    /// - `BluetoothError::AlreadyInProgress` if a session is active
    /// - the command error if the inquiry could not be started
    pub async fn start<T: BrEdrController>(
        &mut self,
        controller: &T,
        params: &DiscoveryParams,
        num_responses: u8,
    ) -> Result<(), BluetoothError> {
        let slots = params.slots(N).ok_or(BluetoothError::InvalidParameter)?;
        if self.is_active() {
            return Err(BluetoothError::AlreadyInProgress);
        }

        let lap = if params.limited { LIAC } else { GIAC };
        command(controller, &Inquiry::new(lap, params.length, num_responses)).await?;

        info!(
            "[DISCOVERY] inquiry started (length {}, limited {}, {} slots)",
            params.length, params.limited, slots
        );
        self.cache.reset(slots);
        self.active = true;
        Ok(())
    }

    /// Cancel the inquiry and any outstanding name request, then reset
    ///
    /// No completion is reported for a stopped session.
    ///
    /// # Errors
    /// - `BluetoothError::AlreadyStopped` if no session is active
    /// - the command error if the inquiry could not be cancelled; the session stays active
    pub async fn stop<T: BrEdrController>(&mut self, controller: &T) -> Result<(), BluetoothError> {
        if !self.active {
            return Err(BluetoothError::AlreadyStopped);
        }

        command(controller, &InquiryCancel::new()).await?;
        resolver::cancel_all(self.cache.results(), controller).await;

        info!("[DISCOVERY] stopped");
        self.active = false;
        Ok(())
    }

    /// Merge one inquiry report into the cache
    pub fn handle_inquiry_result(
        &mut self,
        report: &InquiryReport,
        listeners: &DiscoveryListeners<'_>,
    ) {
        if !self.active {
            return;
        }
        debug!("[DISCOVERY] {} rssi {} dBm", report.addr, report.rssi);

        let Some(result) = self.cache.find_or_allocate(&report.addr, report.rssi) else {
            debug!("[DISCOVERY] no slot for {}", report.addr);
            return;
        };

        result.resolve.page_scan_repetition_mode = report.page_scan_repetition_mode;
        result.resolve.clock_offset = report.clock_offset;
        result.cod = report.class_of_device.to_le_bytes();
        result.rssi = report.rssi;
        result.eir = report.eir.unwrap_or([0; EIR_SIZE]);

        for listener in listeners.iter() {
            listener.discovered(result);
        }
    }

    /// Start the name resolution round once the inquiry finished
    pub async fn handle_inquiry_complete<T: BrEdrController>(
        &mut self,
        status: u8,
        controller: &T,
        listeners: &DiscoveryListeners<'_>,
    ) {
        if status != 0 {
            error!("[DISCOVERY] inquiry failed: 0x{:02x}", status);
        }
        if !self.active {
            return;
        }

        resolver::begin_round(self.cache.results_mut());
        self.continue_round(controller, listeners).await;
    }

    /// Record a resolved name and request the next one
    pub async fn handle_remote_name<T: BrEdrController>(
        &mut self,
        status: u8,
        addr: &BluetoothAddress,
        name: &[u8],
        controller: &T,
        listeners: &DiscoveryListeners<'_>,
    ) {
        if !self.active {
            return;
        }
        let Some(result) = self.cache.find_or_allocate(addr, RSSI_INVALID) else {
            return;
        };

        result.resolve.state = ResolveState::Resolved;
        if status == 0 {
            eir::synthesize_short_name(&mut result.eir, name);
            for listener in listeners.iter() {
                listener.discovered(result);
            }
        } else {
            debug!("[DISCOVERY] name of {} not resolved: 0x{:02x}", addr, status);
        }

        self.continue_round(controller, listeners).await;
    }

    async fn continue_round<T: BrEdrController>(
        &mut self,
        controller: &T,
        listeners: &DiscoveryListeners<'_>,
    ) {
        if resolver::request_next(self.cache.results_mut(), controller).await {
            return;
        }

        info!("[DISCOVERY] complete, {} devices", self.cache.len());
        for listener in listeners.iter() {
            listener.discovery_complete(self.cache.results());
        }
        self.active = false;
    }
}
