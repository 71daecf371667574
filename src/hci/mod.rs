//! HCI access through `bt-hci`
//!
//! The host runs every command through the controller's `ControllerCmdSync`
//! implementation and waits for its completion in place; no other event is processed
//! while a command is outstanding. [`BrEdrController`] bundles the command bounds so the
//! rest of the crate names a single trait.

pub mod cmd;
pub mod event;

use crate::BluetoothError;
use bt_hci::cmd::SyncCmd;
use bt_hci::cmd::link_control::{Disconnect, Inquiry};
use bt_hci::controller::{Controller, ControllerCmdSync};
use bt_hci::param::Status;

use cmd::{
    AcceptConnectionRequest, InquiryCancel, ReadClassOfDevice, ReadEncryptionKeySize,
    ReadRemoteExtendedFeatures, ReadRemoteSupportedFeatures, RejectConnectionRequest,
    RemoteNameRequest, RemoteNameRequestCancel, WriteClassOfDevice, WriteCurrentIacLap,
    WriteCurrentIacLaps, WriteScanEnable,
};

/// Controller sub-trait bundling every HCI command the host issues
pub trait BrEdrController:
    Controller
    + ControllerCmdSync<Inquiry>
    + ControllerCmdSync<InquiryCancel>
    + ControllerCmdSync<Disconnect>
    + ControllerCmdSync<AcceptConnectionRequest>
    + ControllerCmdSync<RejectConnectionRequest>
    + ControllerCmdSync<RemoteNameRequest>
    + ControllerCmdSync<RemoteNameRequestCancel>
    + ControllerCmdSync<ReadRemoteSupportedFeatures>
    + ControllerCmdSync<ReadRemoteExtendedFeatures>
    + ControllerCmdSync<WriteScanEnable>
    + ControllerCmdSync<ReadClassOfDevice>
    + ControllerCmdSync<WriteClassOfDevice>
    + ControllerCmdSync<WriteCurrentIacLap>
    + ControllerCmdSync<WriteCurrentIacLaps>
    + ControllerCmdSync<ReadEncryptionKeySize>
{
}

impl<T> BrEdrController for T where
    T: Controller
        + ControllerCmdSync<Inquiry>
        + ControllerCmdSync<InquiryCancel>
        + ControllerCmdSync<Disconnect>
        + ControllerCmdSync<AcceptConnectionRequest>
        + ControllerCmdSync<RejectConnectionRequest>
        + ControllerCmdSync<RemoteNameRequest>
        + ControllerCmdSync<RemoteNameRequestCancel>
        + ControllerCmdSync<ReadRemoteSupportedFeatures>
        + ControllerCmdSync<ReadRemoteExtendedFeatures>
        + ControllerCmdSync<WriteScanEnable>
        + ControllerCmdSync<ReadClassOfDevice>
        + ControllerCmdSync<WriteClassOfDevice>
        + ControllerCmdSync<WriteCurrentIacLap>
        + ControllerCmdSync<WriteCurrentIacLaps>
        + ControllerCmdSync<ReadEncryptionKeySize>
{
}

/// Raw value of an HCI status
pub(crate) fn status_code(status: Status) -> u8 {
    status.into_inner()
}

impl<E> From<bt_hci::cmd::Error<E>> for BluetoothError {
    fn from(err: bt_hci::cmd::Error<E>) -> Self {
        match err {
            bt_hci::cmd::Error::Hci(e) => BluetoothError::HciCommandFailed(status_code(e.to_status())),
            bt_hci::cmd::Error::Io(_) => BluetoothError::TransportError,
        }
    }
}

/// Execute `cmd` and wait for its completion
pub(crate) async fn command<T, C>(controller: &T, cmd: &C) -> Result<C::Return, BluetoothError>
where
    C: SyncCmd,
    T: ControllerCmdSync<C>,
{
    Ok(controller.exec(cmd).await?)
}
