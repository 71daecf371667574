//! Link security evaluation
//!
//! The security level of a BR/EDR link follows from whether it is encrypted, which cipher
//! is in use and what kind of link key secured it. Before a link is surfaced, the
//! negotiated encryption key size must also meet the floor for that level.
//!
//! | Encryption | Link key              | Cipher  | Level |
//! |------------|-----------------------|---------|-------|
//! | off        | any                   | n/a     | L1    |
//! | on         | none                  | any     | L2    |
//! | on         | unauthenticated       | any     | L2    |
//! | on         | authenticated         | E0      | L3    |
//! | on         | authenticated         | AES-CCM | L4    |

use crate::connection::{self, Connection};
use crate::constants::ENCRYPTION_KEY_SIZE_MAX;
use crate::hci::cmd::ReadEncryptionKeySize;
use crate::hci::{BrEdrController, command};
use crate::keys::LinkKey;
use bt_hci::param::DisconnectReason;

/// Security level of a link, ordered from weakest to strongest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityLevel {
    /// No encryption
    #[default]
    L1 = 1,
    /// Encryption without an authenticated link key
    L2 = 2,
    /// Encryption with an authenticated link key
    L3 = 3,
    /// AES-CCM encryption with an authenticated link key and a full size key
    L4 = 4,
}

/// Encryption state reported by Connection Complete and Encryption Change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncryptionMode {
    /// Link not encrypted
    #[default]
    Off,
    /// Legacy E0 encryption
    E0,
    /// AES-CCM encryption
    AesCcm,
}

impl EncryptionMode {
    /// Decode the `Encryption_Enabled` event parameter
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Off,
            0x02 => Self::AesCcm,
            _ => Self::E0,
        }
    }

    /// Whether the link is encrypted at all
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        *self != Self::Off
    }
}

/// Security level reached by a link with the given encryption and link key
#[must_use]
pub fn derive_level(encryption: EncryptionMode, link_key: Option<&LinkKey>) -> SecurityLevel {
    match (encryption, link_key) {
        (EncryptionMode::Off, _) => SecurityLevel::L1,
        (_, None) => SecurityLevel::L2,
        (_, Some(key)) if !key.is_authenticated() => SecurityLevel::L2,
        (EncryptionMode::AesCcm, Some(_)) => SecurityLevel::L4,
        (_, Some(_)) => SecurityLevel::L3,
    }
}

/// Whether `key_size` is acceptable at `level`
///
/// L4 demands the maximum key size; every other level accepts `min_key_size` and above.
#[must_use]
pub fn key_size_sufficient(level: SecurityLevel, key_size: u8, min_key_size: u8) -> bool {
    if level == SecurityLevel::L4 {
        key_size == ENCRYPTION_KEY_SIZE_MAX
    } else {
        key_size >= min_key_size
    }
}

/// Outcome of a security evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum SecurityVerdict {
    /// The link meets its requirements
    Sufficient,
    /// The link falls short and a Disconnect was issued
    Disconnecting,
    /// The link falls short and the Disconnect was refused; the entry must be released
    DisconnectFailed,
}

async fn read_key_size<T: BrEdrController>(conn: &Connection, controller: &T) -> Option<u8> {
    let handle = conn.handle?;
    match command(controller, &ReadEncryptionKeySize::new(handle)).await {
        // Connection_Handle (2), Key_Size (1)
        Ok([_, _, key_size]) => {
            debug!("[SECURITY] encryption key size is {}", key_size);
            Some(key_size)
        }
        Err(e) => {
            error!("[SECURITY] failed to read encryption key size: {:?}", e);
            None
        }
    }
}

async fn reject<T: BrEdrController>(conn: &mut Connection, controller: &T) -> SecurityVerdict {
    match connection::disconnect(conn, controller, DisconnectReason::AuthenticationFailure).await
    {
        Ok(()) => SecurityVerdict::Disconnecting,
        Err(_) => SecurityVerdict::DisconnectFailed,
    }
}

/// Recompute the security level of `conn` and enforce it
///
/// An encrypted link whose key size falls short, or whose level stays below
/// `conn.required_sec_level`, is disconnected with Authentication Failure. Unencrypted
/// links always pass at L1.
pub(crate) async fn update_security_level<T: BrEdrController>(
    conn: &mut Connection,
    link_key: Option<&LinkKey>,
    controller: &T,
    min_key_size: u8,
) -> SecurityVerdict {
    if !conn.encryption.is_encrypted() {
        conn.sec_level = SecurityLevel::L1;
        return SecurityVerdict::Sufficient;
    }

    if link_key.is_none() {
        warn!("[SECURITY] no link key for {}", conn.addr);
    }
    conn.sec_level = derive_level(conn.encryption, link_key);

    let sufficient = read_key_size(conn, controller)
        .await
        .is_some_and(|size| key_size_sufficient(conn.sec_level, size, min_key_size));
    if !sufficient {
        error!("[SECURITY] encryption key size is not sufficient");
        return reject(conn, controller).await;
    }

    if conn.required_sec_level > conn.sec_level {
        error!(
            "[SECURITY] {} reached {:?}, {:?} required",
            conn.addr, conn.sec_level, conn.required_sec_level
        );
        return reject(conn, controller).await;
    }

    SecurityVerdict::Sufficient
}
