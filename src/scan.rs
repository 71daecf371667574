//! Connectable and discoverable modes
//!
//! Page scan makes the device connectable; inquiry scan makes it discoverable and is only
//! allowed on top of page scan. Limited discoverable mode additionally answers the LIAC,
//! sets the limited discoverable service class bit and reverts on its own after
//! [`crate::BluetoothHostOptions::limited_discoverable_duration`] seconds.

use crate::BluetoothError;
use crate::class_of_device::ClassOfDevice;
use crate::constants::{GIAC, LIAC, scan};
use crate::hci::cmd::{
    ReadClassOfDevice, WriteClassOfDevice, WriteCurrentIacLap, WriteCurrentIacLaps,
    WriteScanEnable,
};
use crate::hci::{BrEdrController, command};

/// Deadline used to leave limited discoverable mode
///
/// When a scheduled deadline passes, the owner calls
/// [`crate::BluetoothHost::limited_discoverable_timeout`]. Scheduling again replaces any
/// pending deadline.
pub trait LimitedDiscoverableTimer {
    /// Arm the deadline `seconds` from now
    fn schedule(&mut self, seconds: u16);

    /// Disarm the deadline
    fn cancel(&mut self);
}

/// Scan modes currently enabled at the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanState {
    /// Inquiry scan (discoverable)
    pub inquiry_scan: bool,
    /// Page scan (connectable)
    pub page_scan: bool,
    /// Limited discoverable mode, with a deadline pending
    pub limited: bool,
}

impl ScanState {
    async fn write_scan_enable<T: BrEdrController>(
        &mut self,
        controller: &T,
        scan: u8,
    ) -> Result<(), BluetoothError> {
        debug!("[SCAN] scan enable 0x{:02x}", scan);
        command(controller, &WriteScanEnable::new(scan)).await?;
        self.inquiry_scan = scan & scan::INQUIRY != 0;
        self.page_scan = scan & scan::PAGE != 0;
        Ok(())
    }

    /// Enable or disable page scan
    ///
    /// Disabling page scan also turns inquiry scan off.
    ///
    /// # Errors
    /// - `BluetoothError::AlreadyInState` if page scan is already in the requested state
    /// - the command error if Write Scan Enable failed
    pub async fn set_connectable<T: BrEdrController>(
        &mut self,
        controller: &T,
        enable: bool,
    ) -> Result<(), BluetoothError> {
        if self.page_scan == enable {
            return Err(BluetoothError::AlreadyInState);
        }
        let scan = if enable { scan::PAGE } else { scan::DISABLED };
        self.write_scan_enable(controller, scan).await
    }

    /// Enable or disable inquiry scan
    ///
    /// With `limited`, the device also answers the LIAC and `timer` is armed for
    /// `duration` seconds.
    ///
    /// # Errors
    /// - `BluetoothError::AlreadyInState` if inquiry scan is already in the requested state
    /// - `BluetoothError::NotConnectable` when enabling while page scan is off
    /// - the command error of the first command that failed
    pub async fn set_discoverable<T: BrEdrController, S: LimitedDiscoverableTimer>(
        &mut self,
        controller: &T,
        timer: &mut S,
        enable: bool,
        limited: bool,
        duration: u16,
    ) -> Result<(), BluetoothError> {
        if enable {
            if self.inquiry_scan {
                return Err(BluetoothError::AlreadyInState);
            }
            if !self.page_scan {
                return Err(BluetoothError::NotConnectable);
            }

            write_iac(controller, limited).await?;
            update_class_of_device(controller, limited).await?;
            self.write_scan_enable(controller, scan::INQUIRY | scan::PAGE)
                .await?;

            if limited {
                info!("[SCAN] limited discoverable for {}s", duration);
                self.limited = true;
                timer.schedule(duration);
            }
            return Ok(());
        }

        if !self.inquiry_scan {
            return Err(BluetoothError::AlreadyInState);
        }
        self.write_scan_enable(controller, scan::PAGE).await?;

        if self.limited {
            write_iac(controller, false).await?;
            update_class_of_device(controller, false).await?;
            self.limited = false;
            timer.cancel();
        }
        Ok(())
    }

    /// Leave limited discoverable mode once its deadline passed
    pub async fn limited_discoverable_timeout<T: BrEdrController, S: LimitedDiscoverableTimer>(
        &mut self,
        controller: &T,
        timer: &mut S,
    ) {
        if !self.limited {
            info!("[SCAN] limited discoverable mode already disabled");
            return;
        }
        if let Err(e) = self
            .set_discoverable(controller, timer, false, false, 0)
            .await
        {
            warn!("[SCAN] failed to leave limited discoverable mode: {:?}", e);
        }
    }
}

async fn write_iac<T: BrEdrController>(controller: &T, limited: bool) -> Result<(), BluetoothError> {
    if limited {
        let mut laps = [0; 6];
        laps[..3].copy_from_slice(&GIAC);
        laps[3..].copy_from_slice(&LIAC);
        command(controller, &WriteCurrentIacLaps::new(2, laps)).await
    } else {
        command(controller, &WriteCurrentIacLap::new(1, GIAC)).await
    }
}

async fn update_class_of_device<T: BrEdrController>(
    controller: &T,
    limited: bool,
) -> Result<(), BluetoothError> {
    let current = command(controller, &ReadClassOfDevice::new())
        .await
        .inspect_err(|e| warn!("[SCAN] failed to read class of device: {:?}", e))?;
    let cod = ClassOfDevice::from_le_bytes(current).with_limited_discoverable(limited);
    debug!("[SCAN] class of device {}", cod);
    command(controller, &WriteClassOfDevice::new(cod.to_le_bytes())).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockController, MockFailure, MockTimer};
    use embassy_futures::block_on;

    const COD: [u8; 3] = [0x04, 0x04, 0x24];

    fn connectable() -> (ScanState, MockController, MockTimer) {
        let controller = MockController::new();
        controller.respond::<ReadClassOfDevice>(&COD);
        let state = ScanState {
            page_scan: true,
            ..ScanState::default()
        };
        (state, controller, MockTimer::new())
    }

    #[test]
    fn test_set_connectable_is_idempotent() {
        let controller = MockController::new();
        let mut state = ScanState::default();
        assert_eq!(
            block_on(state.set_connectable(&controller, false)),
            Err(BluetoothError::AlreadyInState)
        );
        block_on(state.set_connectable(&controller, true)).unwrap();
        assert!(state.page_scan);
        assert_eq!(
            controller.last_sent::<WriteScanEnable>().unwrap().as_slice(),
            &[scan::PAGE]
        );
        assert_eq!(
            block_on(state.set_connectable(&controller, true)),
            Err(BluetoothError::AlreadyInState)
        );
        block_on(state.set_connectable(&controller, false)).unwrap();
        assert!(!state.page_scan);
        assert_eq!(
            controller.last_sent::<WriteScanEnable>().unwrap().as_slice(),
            &[scan::DISABLED]
        );
    }

    #[test]
    fn test_failed_scan_enable_keeps_state() {
        let controller = MockController::new();
        controller.fail_next::<WriteScanEnable>(MockFailure::Io);
        let mut state = ScanState::default();
        assert_eq!(
            block_on(state.set_connectable(&controller, true)),
            Err(BluetoothError::TransportError)
        );
        assert!(!state.page_scan);
    }

    #[test]
    fn test_discoverable_requires_connectable() {
        let controller = MockController::new();
        let mut timer = MockTimer::new();
        let mut state = ScanState::default();
        assert_eq!(
            block_on(state.set_discoverable(&controller, &mut timer, true, false, 30)),
            Err(BluetoothError::NotConnectable)
        );
        assert_eq!(
            block_on(state.set_discoverable(&controller, &mut timer, false, false, 30)),
            Err(BluetoothError::AlreadyInState)
        );
        assert_eq!(controller.command_count(), 0);
    }

    #[test]
    fn test_general_discoverable() {
        let (mut state, controller, mut timer) = connectable();
        block_on(state.set_discoverable(&controller, &mut timer, true, false, 30)).unwrap();
        assert!(state.inquiry_scan && state.page_scan && !state.limited);
        assert_eq!(timer.scheduled(), None);
        assert_eq!(
            controller.last_sent::<WriteCurrentIacLap>().unwrap().as_slice(),
            &[1, 0x33, 0x8B, 0x9E]
        );
        assert_eq!(
            controller.last_sent::<WriteClassOfDevice>().unwrap().as_slice(),
            &COD
        );
        assert_eq!(
            controller.last_sent::<WriteScanEnable>().unwrap().as_slice(),
            &[scan::INQUIRY | scan::PAGE]
        );
        assert_eq!(
            block_on(state.set_discoverable(&controller, &mut timer, true, true, 30)),
            Err(BluetoothError::AlreadyInState)
        );
    }

    #[test]
    fn test_limited_discoverable_and_revert() {
        let (mut state, controller, mut timer) = connectable();
        block_on(state.set_discoverable(&controller, &mut timer, true, true, 45)).unwrap();
        assert!(state.limited);
        assert_eq!(timer.scheduled(), Some(45));
        assert_eq!(
            controller.last_sent::<WriteCurrentIacLap>().unwrap().as_slice(),
            &[2, 0x33, 0x8B, 0x9E, 0x00, 0x8B, 0x9E]
        );
        assert_eq!(
            controller.last_sent::<WriteClassOfDevice>().unwrap().as_slice(),
            &[0x04, 0x24, 0x24]
        );

        block_on(state.limited_discoverable_timeout(&controller, &mut timer));
        assert!(!state.inquiry_scan && state.page_scan && !state.limited);
        assert_eq!(timer.scheduled(), None);
        assert_eq!(timer.cancel_count(), 1);
        assert_eq!(
            controller.last_sent::<WriteCurrentIacLap>().unwrap().as_slice(),
            &[1, 0x33, 0x8B, 0x9E]
        );
        assert_eq!(
            controller.last_sent::<WriteClassOfDevice>().unwrap().as_slice(),
            &COD
        );
        assert_eq!(
            controller.last_sent::<WriteScanEnable>().unwrap().as_slice(),
            &[scan::PAGE]
        );
    }

    #[test]
    fn test_timeout_after_manual_disable_does_nothing() {
        let (mut state, controller, mut timer) = connectable();
        block_on(state.set_discoverable(&controller, &mut timer, true, true, 30)).unwrap();
        block_on(state.set_discoverable(&controller, &mut timer, false, false, 30)).unwrap();
        assert!(!state.limited);

        let sent = controller.command_count();
        block_on(state.limited_discoverable_timeout(&controller, &mut timer));
        assert_eq!(controller.command_count(), sent);
    }

    #[test]
    fn test_failed_class_of_device_read() {
        let controller = MockController::new();
        controller.fail_next::<ReadClassOfDevice>(MockFailure::Status(0x0C));
        let mut timer = MockTimer::new();
        let mut state = ScanState {
            page_scan: true,
            ..ScanState::default()
        };
        assert_eq!(
            block_on(state.set_discoverable(&controller, &mut timer, true, true, 30)),
            Err(BluetoothError::HciCommandFailed(0x0C))
        );
        assert!(!state.inquiry_scan && !state.limited);
        assert_eq!(timer.scheduled(), None);
        assert_eq!(controller.sent_count::<WriteClassOfDevice>(), 0);
        assert_eq!(controller.sent_count::<WriteScanEnable>(), 0);
    }
}
