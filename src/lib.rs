#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod fmt;

mod address;
pub mod api;
mod class_of_device;
pub mod connection;
pub mod constants;
pub mod discovery;
pub mod eir;
pub mod hci;
mod host;
pub mod keys;
pub mod listener;
pub mod processor;
pub mod scan;
pub mod security;

#[cfg(test)]
mod testing;

use crate::constants::{
    DEFAULT_LIMITED_DISCOVERABLE_DURATION, DEFAULT_MIN_ENCRYPTION_KEY_SIZE, INQUIRY_MAX_RESPONSES,
};

pub use address::BluetoothAddress;
pub use class_of_device::{ClassOfDevice, MajorDeviceClass, MajorServiceClasses};
pub use connection::{Connection, ConnectionRegistry, ConnectionTable, Role};
pub use discovery::{DiscoveryParams, DiscoveryResult};
pub use host::BluetoothHost;
pub use keys::{LinkKey, LinkKeyStore, LinkKeyTable};
pub use listener::{ConnectionListener, DiscoveryListener};
pub use security::SecurityLevel;

/// Bluetooth host errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BluetoothError {
    /// Invalid parameter provided (e.g., inquiry length out of range)
    InvalidParameter,
    /// Another operation of the same type is already in progress
    AlreadyInProgress,
    /// The operation being stopped is not running
    AlreadyStopped,
    /// The requested mode is already set
    AlreadyInState,
    /// Discoverability was requested while page scan is off
    NotConnectable,
    /// A fixed-capacity table or buffer is full
    InsufficientResources,
    /// The HCI transport failed to deliver a command
    TransportError,
    /// The controller completed a command with a non-zero status
    HciCommandFailed(u8),
    /// A response did not match its request
    InvalidResponse,
    /// The link does not meet its security requirements
    AuthenticationFailure,
    /// No connection or device matches the given address or handle
    DeviceNotFound,
}

impl core::fmt::Display for BluetoothError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidParameter => f.write_str("invalid parameter"),
            Self::AlreadyInProgress => f.write_str("operation already in progress"),
            Self::AlreadyStopped => f.write_str("operation already stopped"),
            Self::AlreadyInState => f.write_str("already in requested state"),
            Self::NotConnectable => f.write_str("not connectable"),
            Self::InsufficientResources => f.write_str("insufficient resources"),
            Self::TransportError => f.write_str("transport error"),
            Self::HciCommandFailed(status) => write!(f, "HCI command failed (0x{status:02x})"),
            Self::InvalidResponse => f.write_str("unexpected response"),
            Self::AuthenticationFailure => f.write_str("authentication failure"),
            Self::DeviceNotFound => f.write_str("device not found"),
        }
    }
}

/// Options for configuring a `BluetoothHost` instance
///
/// # Examples
///
/// ```rust
/// use bredr_host::BluetoothHostOptions;
///
/// let options = BluetoothHostOptions {
///     min_encryption_key_size: 16,
///     limited_discoverable_duration: 60,
///     ..BluetoothHostOptions::default()
/// };
/// assert!(options.bondable);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BluetoothHostOptions {
    /// Smallest encryption key size accepted below security level 4 (7-16)
    ///
    /// Level 4 always requires a 16-byte key.
    pub min_encryption_key_size: u8,
    /// Seconds before limited discoverable mode turns itself off
    pub limited_discoverable_duration: u16,
    /// Whether new ACL links are marked bondable
    pub bondable: bool,
    /// Whether the controller may switch roles on new links
    ///
    /// Not used by the host itself; carried for the code that initializes the controller.
    pub default_role_switch: bool,
    /// Num_Responses parameter of the Inquiry command
    ///
    /// `0xFF` (the default) bounds discovery by time only.
    pub inquiry_max_responses: u8,
}

impl Default for BluetoothHostOptions {
    fn default() -> Self {
        Self {
            min_encryption_key_size: DEFAULT_MIN_ENCRYPTION_KEY_SIZE,
            limited_discoverable_duration: DEFAULT_LIMITED_DISCOVERABLE_DURATION,
            bondable: true,
            default_role_switch: true,
            inquiry_max_responses: INQUIRY_MAX_RESPONSES,
        }
    }
}
