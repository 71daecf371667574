//! Class of Device (`CoD`)
//!
//! The Class of Device is a 24-bit field carried in inquiry results and connection
//! requests, and written to the local controller to describe this device:
//! - Major Service Classes (bits 23-13): 11 bits indicating supported services
//! - Major Device Class (bits 12-8): 5 bits identifying device category
//! - Minor Device Class (bits 7-2): 6 bits for device subcategory
//! - Format Type (bits 1-0): 2 bits (always 0b00)
//!
//! Bit 13, the lowest major service class bit, advertises limited discoverable mode and
//! is toggled by the discoverability controller.

use crate::constants::{CLASS_OF_DEVICE_LENGTH, COD_LIMITED_DISCOVERABLE};

/// Class of Device (`CoD`) indicating device type and capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassOfDevice {
    raw: u32,
}

impl ClassOfDevice {
    /// Create a `ClassOfDevice` from raw 24-bit value
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            raw: raw & 0xFF_FFFF,
        }
    }

    /// Decode the little-endian 3-byte wire form
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; CLASS_OF_DEVICE_LENGTH]) -> Self {
        Self::from_raw(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
    }

    /// Encode into the little-endian 3-byte wire form
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; CLASS_OF_DEVICE_LENGTH] {
        let [b0, b1, b2, _] = self.raw.to_le_bytes();
        [b0, b1, b2]
    }

    /// Get the raw 24-bit value
    #[must_use]
    pub const fn raw(&self) -> u32 {
        self.raw
    }

    /// Get the Major Device Class (bits 12-8)
    #[must_use]
    pub fn major_device_class(&self) -> MajorDeviceClass {
        MajorDeviceClass::from_raw(((self.raw >> 8) & 0x1F) as u8)
    }

    /// Get the Minor Device Class (bits 7-2)
    #[must_use]
    pub fn minor_device_class(&self) -> u8 {
        ((self.raw >> 2) & 0x3F) as u8
    }

    /// Get the Major Service Classes (bits 23-13)
    #[must_use]
    pub fn major_service_classes(&self) -> MajorServiceClasses {
        MajorServiceClasses::from_raw(((self.raw >> 13) & 0x7FF) as u16)
    }

    /// Whether the limited discoverable service bit is set
    #[must_use]
    pub fn is_limited_discoverable(&self) -> bool {
        self.raw & COD_LIMITED_DISCOVERABLE != 0
    }

    /// Return a copy with the limited discoverable service bit set or cleared
    #[must_use]
    pub const fn with_limited_discoverable(self, limited: bool) -> Self {
        if limited {
            Self::from_raw(self.raw | COD_LIMITED_DISCOVERABLE)
        } else {
            Self::from_raw(self.raw & !COD_LIMITED_DISCOVERABLE)
        }
    }
}

impl core::fmt::Display for ClassOfDevice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} (minor 0x{:02X}, services 0x{:03X})",
            self.major_device_class().description(),
            self.minor_device_class(),
            self.major_service_classes().raw()
        )
    }
}

/// Major Device Class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MajorDeviceClass {
    /// Miscellaneous devices
    Miscellaneous,
    /// Computer devices (desktop, server, laptop, etc.)
    Computer,
    /// Phone devices (cellular, cordless, smartphone, etc.)
    Phone,
    /// LAN/Network Access Point devices
    LanNetworkAccessPoint,
    /// Audio/Video devices (headphones, speakers, microphones, etc.)
    AudioVideo,
    /// Peripheral devices (keyboard, mouse, etc.)
    Peripheral,
    /// Imaging devices (display, camera, scanner, printer)
    Imaging,
    /// Wearable devices (watch, glasses, etc.)
    Wearable,
    /// Toy devices
    Toy,
    /// Health devices
    Health,
    /// Uncategorized devices
    Uncategorized,
    /// Reserved or unknown device class
    Reserved(u8),
}

impl MajorDeviceClass {
    /// Create `MajorDeviceClass` from raw 5-bit value
    #[must_use]
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Miscellaneous,
            0x01 => Self::Computer,
            0x02 => Self::Phone,
            0x03 => Self::LanNetworkAccessPoint,
            0x04 => Self::AudioVideo,
            0x05 => Self::Peripheral,
            0x06 => Self::Imaging,
            0x07 => Self::Wearable,
            0x08 => Self::Toy,
            0x09 => Self::Health,
            0x1F => Self::Uncategorized,
            other => Self::Reserved(other),
        }
    }

    /// Get human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Miscellaneous => "Miscellaneous",
            Self::Computer => "Computer",
            Self::Phone => "Phone",
            Self::LanNetworkAccessPoint => "LAN/Network Access Point",
            Self::AudioVideo => "Audio/Video",
            Self::Peripheral => "Peripheral",
            Self::Imaging => "Imaging",
            Self::Wearable => "Wearable",
            Self::Toy => "Toy",
            Self::Health => "Health",
            Self::Uncategorized => "Uncategorized",
            Self::Reserved(_) => "Reserved",
        }
    }
}

/// Major Service Classes bit field (bits 23-13 of the `CoD`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MajorServiceClasses {
    raw: u16,
}

impl MajorServiceClasses {
    /// Limited Discoverable Mode
    pub const LIMITED_DISCOVERABLE: u16 = 1 << 0;
    /// Positioning (location identification)
    pub const POSITIONING: u16 = 1 << 3;
    /// Networking (LAN, ad hoc, etc.)
    pub const NETWORKING: u16 = 1 << 4;
    /// Rendering (printing, speakers, etc.)
    pub const RENDERING: u16 = 1 << 5;
    /// Capturing (scanner, microphone, etc.)
    pub const CAPTURING: u16 = 1 << 6;
    /// Object Transfer
    pub const OBJECT_TRANSFER: u16 = 1 << 7;
    /// Audio (speaker, microphone, headset service, etc.)
    pub const AUDIO: u16 = 1 << 8;
    /// Telephony (cordless telephony, modem, headset service, etc.)
    pub const TELEPHONY: u16 = 1 << 9;
    /// Information (web server, WAP server, etc.)
    pub const INFORMATION: u16 = 1 << 10;

    /// Create from the raw 11-bit value
    #[must_use]
    pub fn from_raw(raw: u16) -> Self {
        Self { raw: raw & 0x7FF }
    }

    /// Get the raw 11-bit value
    #[must_use]
    pub fn raw(&self) -> u16 {
        self.raw
    }

    /// Check whether a service class bit is set
    #[must_use]
    pub fn contains(&self, service: u16) -> bool {
        self.raw & service == service
    }
}
