//! BR/EDR commands declared on top of `bt-hci`
//!
//! `Inquiry` and `Disconnect` come from `bt_hci::cmd::link_control`. The commands below
//! are missing from the pinned `bt-hci` fork, so they are declared here with its own
//! `cmd!` macro and run through the same `ControllerCmdSync` path.

use bt_hci::param::{BdAddr, ConnHandle};

bt_hci::cmd! {
    /// Inquiry Cancel
    InquiryCancel(LINK_CONTROL, 0x0002) {
        Params = ();
        Return = ();
    }
}

bt_hci::cmd! {
    /// Accept Connection Request
    AcceptConnectionRequest(LINK_CONTROL, 0x0009) {
        AcceptConnectionRequestParams {
            bd_addr: BdAddr,
            role: u8,
        }
        Return = ();
    }
}

bt_hci::cmd! {
    /// Reject Connection Request
    RejectConnectionRequest(LINK_CONTROL, 0x000a) {
        RejectConnectionRequestParams {
            bd_addr: BdAddr,
            reason: u8,
        }
        Return = ();
    }
}

bt_hci::cmd! {
    /// Remote Name Request
    RemoteNameRequest(LINK_CONTROL, 0x0019) {
        RemoteNameRequestParams {
            bd_addr: BdAddr,
            page_scan_repetition_mode: u8,
            reserved: u8,
            clock_offset: u16,
        }
        Return = ();
    }
}

bt_hci::cmd! {
    /// Remote Name Request Cancel
    RemoteNameRequestCancel(LINK_CONTROL, 0x001a) {
        Params = BdAddr;
        Return = ();
    }
}

bt_hci::cmd! {
    /// Read Remote Supported Features
    ReadRemoteSupportedFeatures(LINK_CONTROL, 0x001b) {
        Params = ConnHandle;
        Return = ();
    }
}

bt_hci::cmd! {
    /// Read Remote Extended Features
    ReadRemoteExtendedFeatures(LINK_CONTROL, 0x001c) {
        ReadRemoteExtendedFeaturesParams {
            handle: ConnHandle,
            page_number: u8,
        }
        Return = ();
    }
}

bt_hci::cmd! {
    /// Write Scan Enable
    WriteScanEnable(CONTROL_BASEBAND, 0x001a) {
        Params = u8;
        Return = ();
    }
}

bt_hci::cmd! {
    /// Read Class of Device, little-endian
    ReadClassOfDevice(CONTROL_BASEBAND, 0x0023) {
        Params = ();
        Return = [u8; 3];
    }
}

bt_hci::cmd! {
    /// Write Class of Device, little-endian
    WriteClassOfDevice(CONTROL_BASEBAND, 0x0024) {
        Params = [u8; 3];
        Return = ();
    }
}

bt_hci::cmd! {
    /// Write Current IAC LAP with a single access code
    WriteCurrentIacLap(CONTROL_BASEBAND, 0x003a) {
        WriteCurrentIacLapParams {
            num_current_iac: u8,
            iac_lap: [u8; 3],
        }
        Return = ();
    }
}

bt_hci::cmd! {
    /// Write Current IAC LAP with two access codes
    WriteCurrentIacLaps(CONTROL_BASEBAND, 0x003a) {
        WriteCurrentIacLapsParams {
            num_current_iac: u8,
            iac_laps: [u8; 6],
        }
        Return = ();
    }
}

bt_hci::cmd! {
    /// Read Encryption Key Size
    ///
    /// Returns `Connection_Handle` (2 bytes) followed by `Key_Size`.
    ReadEncryptionKeySize(STATUS_PARAMS, 0x0008) {
        Params = ConnHandle;
        Return = [u8; 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bt_hci::cmd::Cmd;
    use bt_hci::cmd::link_control::{Disconnect, Inquiry};

    #[test]
    fn test_opcodes() {
        assert_eq!(Inquiry::OPCODE.to_raw(), 0x0401);
        assert_eq!(InquiryCancel::OPCODE.to_raw(), 0x0402);
        assert_eq!(Disconnect::OPCODE.to_raw(), 0x0406);
        assert_eq!(AcceptConnectionRequest::OPCODE.to_raw(), 0x0409);
        assert_eq!(RejectConnectionRequest::OPCODE.to_raw(), 0x040A);
        assert_eq!(RemoteNameRequest::OPCODE.to_raw(), 0x0419);
        assert_eq!(RemoteNameRequestCancel::OPCODE.to_raw(), 0x041A);
        assert_eq!(ReadRemoteSupportedFeatures::OPCODE.to_raw(), 0x041B);
        assert_eq!(ReadRemoteExtendedFeatures::OPCODE.to_raw(), 0x041C);
        assert_eq!(WriteScanEnable::OPCODE.to_raw(), 0x0C1A);
        assert_eq!(ReadClassOfDevice::OPCODE.to_raw(), 0x0C23);
        assert_eq!(WriteClassOfDevice::OPCODE.to_raw(), 0x0C24);
        assert_eq!(WriteCurrentIacLap::OPCODE.to_raw(), 0x0C3A);
        assert_eq!(WriteCurrentIacLaps::OPCODE.to_raw(), 0x0C3A);
        assert_eq!(ReadEncryptionKeySize::OPCODE.to_raw(), 0x1408);
    }
}
