//! `bredr-host` Constants
//!
//! This module contains the constants used throughout the crate: table capacities,
//! default configuration values and the Bluetooth-assigned numbers the discovery and
//! connection logic depends on.

/// Maximum number of simultaneous connections tracked by [`crate::ConnectionTable`]
pub const MAX_CONNECTIONS: usize = 4;

/// Maximum number of stored link keys (must be a power of two)
pub const MAX_LINK_KEYS: usize = 8;

/// Maximum number of registered listeners per listener kind
pub const MAX_LISTENERS: usize = 4;

/// Default number of discovery result slots held by a host
pub const MAX_DISCOVERY_RESULTS: usize = 16;

/// Depth of the application request and response channels
pub const MAX_CHANNELS: usize = 4;

/// Maximum inquiry length in 1.28s units (0x30 = ~61 seconds)
pub const MAX_INQUIRY_LENGTH: u8 = 0x30;

/// Number of inquiry responses requested; discovery is bounded by time only
pub const INQUIRY_MAX_RESPONSES: u8 = 0xFF;

/// General Inquiry Access Code (GIAC) LAP, wire order
pub const GIAC: [u8; 3] = [0x33, 0x8B, 0x9E];

/// Limited Inquiry Access Code (LIAC) LAP, wire order
pub const LIAC: [u8; 3] = [0x00, 0x8B, 0x9E];

/// RSSI value reported when the signal strength is unknown
pub const RSSI_INVALID: i8 = 127;

/// Size of the Extended Inquiry Response data buffer
pub const EIR_SIZE: usize = 240;

/// Size of the remote name field of a Remote Name Request Complete event
pub const REMOTE_NAME_LENGTH: usize = 248;

/// Largest encryption key size a controller can negotiate
pub const ENCRYPTION_KEY_SIZE_MAX: u8 = 16;

/// Default minimum accepted encryption key size
pub const DEFAULT_MIN_ENCRYPTION_KEY_SIZE: u8 = 7;

/// Default limited discoverable mode duration in seconds
pub const DEFAULT_LIMITED_DISCOVERABLE_DURATION: u16 = 30;

/// `BD_ADDR` length in bytes
pub const BD_ADDR_LENGTH: usize = 6;

/// Class of Device length in bytes
pub const CLASS_OF_DEVICE_LENGTH: usize = 3;

/// Size of an LMP feature page in bytes
pub const FEATURE_PAGE_LENGTH: usize = 8;

/// Size of the HCI read buffer used by the processor (packet indicator, header, 255 bytes)
pub const HCI_READ_BUFFER_SIZE: usize = 259;

/// Depth of the event channel between the HCI reader and the host
pub const MAX_PENDING_EVENTS: usize = 8;

/// Most host events a single HCI event can expand into
pub const MAX_EVENTS_PER_PACKET: usize = 8;

/// Page scan repetition mode assumed when an inquiry report does not carry one (R1)
pub const DEFAULT_PAGE_SCAN_REPETITION_MODE: u8 = 0x01;

/// Write Scan Enable values
pub mod scan {
    /// No scans enabled
    pub const DISABLED: u8 = 0x00;
    /// Inquiry scan enabled
    pub const INQUIRY: u8 = 0x01;
    /// Page scan enabled
    pub const PAGE: u8 = 0x02;
}

/// HCI link types
pub mod link_type {
    /// Synchronous connection-oriented link
    pub const SCO: u8 = 0x00;
    /// Asynchronous connection-less link
    pub const ACL: u8 = 0x01;
    /// Extended synchronous connection-oriented link
    pub const ESCO: u8 = 0x02;
}

/// HCI status and reason codes used by the host
pub mod status {
    /// Command succeeded
    pub const SUCCESS: u8 = 0x00;
    /// Unknown connection identifier
    pub const UNKNOWN_CONN_ID: u8 = 0x02;
    /// Authentication failure
    pub const AUTHENTICATION_FAILURE: u8 = 0x05;
    /// Connection rejected due to limited resources
    pub const INSUFFICIENT_RESOURCES: u8 = 0x0D;
    /// Remote user terminated connection
    pub const REMOTE_USER_TERMINATED: u8 = 0x13;
}

/// Major service class bit advertising limited discoverable mode
pub const COD_LIMITED_DISCOVERABLE: u32 = 1 << 13;
