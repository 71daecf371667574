//! Host view of the HCI events it consumes
//!
//! `bt_hci::event::Event` borrows the HCI read buffer, so it cannot wait in a queue while
//! the reader moves on. [`HostEvent::collect`] copies the fields the host acts on into
//! owned values. Inquiry events that carry several reports expand into one
//! [`HostEvent::InquiryResult`] per device.

use crate::class_of_device::ClassOfDevice;
use crate::constants::{
    DEFAULT_PAGE_SCAN_REPETITION_MODE, EIR_SIZE, FEATURE_PAGE_LENGTH, MAX_EVENTS_PER_PACKET,
    REMOTE_NAME_LENGTH, RSSI_INVALID,
};
use crate::hci::status_code;
use crate::BluetoothAddress;
use bt_hci::event::Event;
use bt_hci::param::{BdAddr, ConnHandle};
use heapless::Vec;

/// One device reported by an inquiry result event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InquiryReport {
    /// Device address
    pub addr: BluetoothAddress,
    /// Page scan repetition mode, needed to page the device later
    pub page_scan_repetition_mode: u8,
    /// Class of device
    pub class_of_device: ClassOfDevice,
    /// Clock offset, needed to page the device later
    pub clock_offset: u16,
    /// RSSI in dBm, [`RSSI_INVALID`] when not reported
    pub rssi: i8,
    /// EIR data, only present in extended inquiry results
    pub eir: Option<[u8; EIR_SIZE]>,
}

impl InquiryReport {
    /// A report with default paging parameters and no EIR
    #[must_use]
    pub fn new(addr: BluetoothAddress, class_of_device: ClassOfDevice, rssi: i8) -> Self {
        Self {
            addr,
            page_scan_repetition_mode: DEFAULT_PAGE_SCAN_REPETITION_MODE,
            class_of_device,
            clock_offset: 0,
            rssi,
            eir: None,
        }
    }

    /// Attach EIR data, zero-padded to 240 bytes
    #[must_use]
    pub fn with_eir(mut self, data: &[u8]) -> Self {
        let mut eir = [0; EIR_SIZE];
        let len = data.len().min(EIR_SIZE);
        eir[..len].copy_from_slice(&data[..len]);
        self.eir = Some(eir);
        self
    }
}

/// An HCI event the host acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Inquiry Complete
    InquiryComplete {
        /// Status
        status: u8,
    },
    /// One report of an Inquiry Result, Inquiry Result with RSSI or Extended Inquiry Result
    InquiryResult(InquiryReport),
    /// Remote Name Request Complete
    RemoteNameRequestComplete {
        /// Status
        status: u8,
        /// Peer address
        addr: BluetoothAddress,
        /// Name bytes up to the first NUL
        name: Vec<u8, REMOTE_NAME_LENGTH>,
    },
    /// Connection Request
    ConnectionRequest {
        /// Peer address
        addr: BluetoothAddress,
        /// Peer class of device
        class_of_device: ClassOfDevice,
        /// Requested link type
        link_type: u8,
    },
    /// Connection Complete
    ConnectionComplete {
        /// Status
        status: u8,
        /// Connection handle
        handle: ConnHandle,
        /// Peer address
        addr: BluetoothAddress,
        /// Link type
        link_type: u8,
        /// Encryption enabled
        encryption_enabled: u8,
    },
    /// Synchronous Connection Complete
    SynchronousConnectionComplete {
        /// Status
        status: u8,
        /// Connection handle
        handle: ConnHandle,
        /// Peer address
        addr: BluetoothAddress,
        /// Link type (SCO or eSCO)
        link_type: u8,
    },
    /// Disconnection Complete
    DisconnectionComplete {
        /// Status
        status: u8,
        /// Connection handle
        handle: ConnHandle,
        /// Reason
        reason: u8,
    },
    /// Encryption Change
    EncryptionChange {
        /// Status
        status: u8,
        /// Connection handle
        handle: ConnHandle,
        /// Encryption enabled
        encryption_enabled: u8,
    },
    /// Read Remote Supported Features Complete
    RemoteFeatures {
        /// Status
        status: u8,
        /// Connection handle
        handle: ConnHandle,
        /// LMP feature page 0
        features: [u8; FEATURE_PAGE_LENGTH],
    },
    /// Read Remote Extended Features Complete
    RemoteExtendedFeatures {
        /// Status
        status: u8,
        /// Connection handle
        handle: ConnHandle,
        /// Page number
        page: u8,
        /// LMP feature page
        features: [u8; FEATURE_PAGE_LENGTH],
    },
    /// Role Change
    RoleChange {
        /// Status
        status: u8,
        /// Peer address
        addr: BluetoothAddress,
        /// New local role
        role: u8,
    },
    /// Link Key Notification
    LinkKeyNotification {
        /// Peer address
        addr: BluetoothAddress,
        /// Link key
        link_key: [u8; 16],
        /// Key type
        key_type: u8,
    },
}

/// Host events produced by one HCI event
pub type HostEvents = Vec<HostEvent, MAX_EVENTS_PER_PACKET>;

fn addr(bd_addr: BdAddr) -> Option<BluetoothAddress> {
    BluetoothAddress::try_from(bd_addr).ok()
}

fn feature_page(bytes: &[u8]) -> [u8; FEATURE_PAGE_LENGTH] {
    let mut page = [0; FEATURE_PAGE_LENGTH];
    let len = bytes.len().min(FEATURE_PAGE_LENGTH);
    page[..len].copy_from_slice(&bytes[..len]);
    page
}

fn name(raw: &[u8]) -> Vec<u8, REMOTE_NAME_LENGTH> {
    let raw = &raw[..raw.len().min(REMOTE_NAME_LENGTH)];
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let mut name = Vec::new();
    // `len` never exceeds the capacity.
    name.extend_from_slice(&raw[..len]).ok();
    name
}

impl HostEvent {
    /// Copy what the host needs out of `event`
    ///
    /// Events the host does not act on, and reports whose address cannot be read,
    /// produce nothing.
    #[must_use]
    pub fn collect(event: &Event<'_>) -> HostEvents {
        let mut events = HostEvents::new();
        let mut push = |event: HostEvent| {
            if events.push(event).is_err() {
                warn!("[EVENT] too many reports in one event, dropping");
            }
        };

        match *event {
            Event::InquiryComplete(ref e) => push(Self::InquiryComplete {
                status: status_code(e.status),
            }),
            Event::InquiryResult(ref e) => {
                for item in e.iter() {
                    if let Some(addr) = addr(item.bd_addr) {
                        let cod = item.class_of_device.unwrap_or_default();
                        push(Self::InquiryResult(InquiryReport::new(
                            addr,
                            ClassOfDevice::from_le_bytes(cod),
                            RSSI_INVALID,
                        )));
                    }
                }
            }
            Event::InquiryResultWithRssi(ref e) => {
                for item in e.iter() {
                    if let Some(addr) = addr(item.bd_addr) {
                        let cod = item.class_of_device.unwrap_or_default();
                        push(Self::InquiryResult(InquiryReport::new(
                            addr,
                            ClassOfDevice::from_le_bytes(cod),
                            item.rssi.unwrap_or(RSSI_INVALID),
                        )));
                    }
                }
            }
            Event::ExtendedInquiryResult(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    let report =
                        InquiryReport::new(addr, ClassOfDevice::from_le_bytes(e.class_of_device), e.rssi)
                            .with_eir(&e.eir_data[..]);
                    push(Self::InquiryResult(report));
                }
            }
            Event::RemoteNameRequestComplete(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    push(Self::RemoteNameRequestComplete {
                        status: status_code(e.status),
                        addr,
                        name: name(&e.remote_name[..]),
                    });
                }
            }
            Event::ConnectionRequest(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    push(Self::ConnectionRequest {
                        addr,
                        class_of_device: ClassOfDevice::from_le_bytes(e.class_of_device),
                        link_type: e.link_type as u8,
                    });
                }
            }
            Event::ConnectionComplete(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    push(Self::ConnectionComplete {
                        status: status_code(e.status),
                        handle: e.handle,
                        addr,
                        link_type: e.link_type as u8,
                        encryption_enabled: u8::from(e.encryption_enabled),
                    });
                }
            }
            Event::SynchronousConnectionComplete(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    push(Self::SynchronousConnectionComplete {
                        status: status_code(e.status),
                        handle: e.handle,
                        addr,
                        link_type: e.link_type as u8,
                    });
                }
            }
            Event::DisconnectionComplete(ref e) => push(Self::DisconnectionComplete {
                status: status_code(e.status),
                handle: e.handle,
                reason: status_code(e.reason),
            }),
            Event::EncryptionChangeV1(ref e) => push(Self::EncryptionChange {
                status: status_code(e.status),
                handle: e.handle,
                encryption_enabled: e.enabled as u8,
            }),
            Event::ReadRemoteSupportedFeaturesComplete(ref e) => push(Self::RemoteFeatures {
                status: status_code(e.status),
                handle: e.handle,
                features: feature_page(&e.lmp_features[..]),
            }),
            Event::ReadRemoteExtendedFeaturesComplete(ref e) => {
                push(Self::RemoteExtendedFeatures {
                    status: status_code(e.status),
                    handle: e.handle,
                    page: e.page_number,
                    features: feature_page(&e.extended_lmp_features[..]),
                });
            }
            Event::RoleChange(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    push(Self::RoleChange {
                        status: status_code(e.status),
                        addr,
                        role: e.new_role as u8,
                    });
                }
            }
            Event::LinkKeyNotification(ref e) => {
                if let Some(addr) = addr(e.bd_addr) {
                    push(Self::LinkKeyNotification {
                        addr,
                        link_key: e.link_key,
                        key_type: e.key_type as u8,
                    });
                }
            }
            _ => trace!("[EVENT] ignoring {:?}", event),
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_hci::FromHciBytes;

    #[test]
    fn test_name_stops_at_nul() {
        let mut raw = [0u8; REMOTE_NAME_LENGTH];
        raw[..3].copy_from_slice(b"Car");
        assert_eq!(name(&raw).as_slice(), b"Car");

        let full = [b'x'; REMOTE_NAME_LENGTH];
        assert_eq!(name(&full).len(), REMOTE_NAME_LENGTH);
        assert!(name(&[]).is_empty());
    }

    #[test]
    fn test_with_eir_pads_and_truncates() {
        let report = InquiryReport::new(BluetoothAddress::ANY, ClassOfDevice::from_raw(0), -40)
            .with_eir(&[2, 0x08, b'A']);
        let eir = report.eir.unwrap();
        assert_eq!(&eir[..3], &[2, 0x08, b'A']);
        assert!(eir[3..].iter().all(|&b| b == 0));
        assert_eq!(report.page_scan_repetition_mode, DEFAULT_PAGE_SCAN_REPETITION_MODE);

        let long = [0x55; EIR_SIZE + 10];
        let report = report.with_eir(&long);
        assert_eq!(report.eir.unwrap(), [0x55; EIR_SIZE]);
    }

    #[test]
    fn test_feature_page_copy() {
        assert_eq!(feature_page(&[1, 2, 3]), [1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(feature_page(&[9; 10]), [9; 8]);
    }

    #[test]
    fn test_collect_inquiry_complete() {
        let (event, _) = Event::from_hci_bytes(&[0x01, 0x01, 0x00]).unwrap();
        assert_eq!(
            HostEvent::collect(&event).as_slice(),
            &[HostEvent::InquiryComplete { status: 0 }]
        );
    }

    #[test]
    fn test_collect_disconnection_complete() {
        let (event, _) = Event::from_hci_bytes(&[0x05, 0x04, 0x00, 0x2A, 0x00, 0x13]).unwrap();
        assert_eq!(
            HostEvent::collect(&event).as_slice(),
            &[HostEvent::DisconnectionComplete {
                status: 0,
                handle: ConnHandle::new(0x2A),
                reason: 0x13,
            }]
        );
    }

    #[test]
    fn test_collect_link_key_notification() {
        let mut packet = [0u8; 25];
        packet[0] = 0x18;
        packet[1] = 23;
        packet[2..8].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        packet[8..24].copy_from_slice(&[0xA5; 16]);
        packet[24] = 0x05;
        let (event, _) = Event::from_hci_bytes(&packet).unwrap();
        assert_eq!(
            HostEvent::collect(&event).as_slice(),
            &[HostEvent::LinkKeyNotification {
                addr: BluetoothAddress::new([1, 2, 3, 4, 5, 6]),
                link_key: [0xA5; 16],
                key_type: 0x05,
            }]
        );
    }
}
