use crate::BluetoothError;
use crate::constants::BD_ADDR_LENGTH;

/// A Bluetooth Device Address (`BD_ADDR`)
///
/// Bytes are kept in HCI wire order (least significant byte first), so an address
/// decoded from an event can be written back into a command unchanged. Text forms
/// print the most significant byte first, the way addresses are usually shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BluetoothAddress(pub [u8; BD_ADDR_LENGTH]);

impl BluetoothAddress {
    /// The all-zero address, used as a wildcard ("any device")
    pub const ANY: Self = Self([0; BD_ADDR_LENGTH]);

    /// Create a new Bluetooth address from wire-order bytes
    #[must_use]
    pub const fn new(addr: [u8; BD_ADDR_LENGTH]) -> Self {
        Self(addr)
    }

    /// Get the raw wire-order address bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; BD_ADDR_LENGTH] {
        &self.0
    }

    /// Whether this is the wildcard address
    #[must_use]
    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }

    /// Format the address as a colon-separated hex string, most significant byte first
    #[must_use]
    pub fn format_hex(&self) -> heapless::String<17> {
        const HEX: &[u8; 16] = b"0123456789ABCDEF";
        let mut result = heapless::String::new();
        for (i, byte) in self.0.iter().rev().enumerate() {
            if i > 0 {
                result.push(':').ok();
            }
            result.push(HEX[usize::from(byte >> 4)] as char).ok();
            result.push(HEX[usize::from(byte & 0x0F)] as char).ok();
        }
        result
    }

    /// Parse a colon-separated hex string, most significant byte first
    ///
    /// # Errors
    /// Returns `BluetoothError::InvalidParameter` if the string is not six colon-separated
    /// two-digit hex octets.
    pub fn from_hex(hex: &str) -> Result<Self, BluetoothError> {
        if hex.len() != 17 {
            return Err(BluetoothError::InvalidParameter);
        }

        let mut bytes = [0u8; BD_ADDR_LENGTH];
        let mut parts = hex.split(':');
        for slot in bytes.iter_mut().rev() {
            let part = parts.next().ok_or(BluetoothError::InvalidParameter)?;
            if part.len() != 2 {
                return Err(BluetoothError::InvalidParameter);
            }
            *slot = u8::from_str_radix(part, 16).map_err(|_| BluetoothError::InvalidParameter)?;
        }
        if parts.next().is_some() {
            return Err(BluetoothError::InvalidParameter);
        }
        Ok(Self(bytes))
    }
}

impl core::fmt::Display for BluetoothAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.format_hex())
    }
}

impl From<[u8; BD_ADDR_LENGTH]> for BluetoothAddress {
    fn from(addr: [u8; BD_ADDR_LENGTH]) -> Self {
        Self(addr)
    }
}

impl From<BluetoothAddress> for [u8; BD_ADDR_LENGTH] {
    fn from(addr: BluetoothAddress) -> Self {
        addr.0
    }
}

impl From<BluetoothAddress> for bt_hci::param::BdAddr {
    fn from(addr: BluetoothAddress) -> Self {
        bt_hci::param::BdAddr::new(addr.0)
    }
}

impl TryFrom<&str> for BluetoothAddress {
    type Error = BluetoothError;

    fn try_from(hex: &str) -> Result<Self, Self::Error> {
        BluetoothAddress::from_hex(hex)
    }
}

impl TryFrom<&[u8]> for BluetoothAddress {
    type Error = BluetoothError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let addr: [u8; BD_ADDR_LENGTH] = bytes
            .try_into()
            .map_err(|_| BluetoothError::InvalidParameter)?;
        Ok(Self(addr))
    }
}

impl TryFrom<bt_hci::param::BdAddr> for BluetoothAddress {
    type Error = BluetoothError;

    fn try_from(bd_addr: bt_hci::param::BdAddr) -> Result<Self, Self::Error> {
        bd_addr.raw().try_into()
    }
}
