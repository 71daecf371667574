//! Test doubles for the host's collaborators

use crate::class_of_device::ClassOfDevice;
use crate::connection::Role;
use crate::discovery::DiscoveryResult;
use crate::hci::event::{HostEvent, InquiryReport};
use crate::listener::{ConnectionListener, DiscoveryListener};
use crate::scan::LimitedDiscoverableTimer;
use crate::{BluetoothAddress, Connection, SecurityLevel};
use bt_hci::cmd::{Cmd, SyncCmd};
use bt_hci::controller::{Controller, ControllerCmdSync};
use bt_hci::data::{AclPacket, IsoPacket, SyncPacket};
use bt_hci::param::Status;
use bt_hci::{ControllerToHostPacket, FromHciBytes, WriteHci};
use core::cell::{Cell, RefCell};
use embedded_io::ErrorKind;
use heapless::Vec;

const MAX_SENT: usize = 64;
const MAX_PARAMS: usize = 16;
const RETURN_BUFFER: usize = 32;

/// Encoded parameters of a command the mock received
pub(crate) type SentParams = Vec<u8, MAX_PARAMS>;

/// How a scripted command fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MockFailure {
    /// The transport lost the command
    Io,
    /// The controller answered with a non-zero status
    Status(u8),
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    opcode: u16,
    failure: MockFailure,
    once: bool,
}

/// Controller that records every command and answers from a script
///
/// Commands complete immediately. Return parameters default to zeros; [`respond`]
/// overrides them per command. Reads never complete.
///
/// [`respond`]: MockController::respond
#[derive(Debug, Default)]
pub(crate) struct MockController {
    sent: RefCell<Vec<(u16, SentParams), MAX_SENT>>,
    failures: RefCell<Vec<Failure, 8>>,
    responses: RefCell<Vec<(u16, SentParams), 8>>,
}

impl MockController {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn fail(&self, opcode: u16, failure: MockFailure, once: bool) {
        self.failures
            .borrow_mut()
            .push(Failure {
                opcode,
                failure,
                once,
            })
            .unwrap();
    }

    /// Fail the next `C`
    pub(crate) fn fail_next<C: Cmd>(&self, failure: MockFailure) {
        self.fail(C::OPCODE.to_raw(), failure, true);
    }

    /// Fail every `C`
    pub(crate) fn fail_always<C: Cmd>(&self, failure: MockFailure) {
        self.fail(C::OPCODE.to_raw(), failure, false);
    }

    /// Answer every `C` with the return parameters `params`
    pub(crate) fn respond<C: Cmd>(&self, params: &[u8]) {
        let opcode = C::OPCODE.to_raw();
        let mut responses = self.responses.borrow_mut();
        responses.retain(|(op, _)| *op != opcode);
        responses
            .push((opcode, SentParams::from_slice(params).unwrap()))
            .unwrap();
    }

    /// Number of commands received
    pub(crate) fn command_count(&self) -> usize {
        self.sent.borrow().len()
    }

    pub(crate) fn sent_count<C: Cmd>(&self) -> usize {
        let opcode = C::OPCODE.to_raw();
        self.sent.borrow().iter().filter(|(op, _)| *op == opcode).count()
    }

    /// Parameters of the last `C` received
    pub(crate) fn last_sent<C: Cmd>(&self) -> Option<SentParams> {
        let opcode = C::OPCODE.to_raw();
        self.sent
            .borrow()
            .iter()
            .rev()
            .find(|(op, _)| *op == opcode)
            .map(|(_, params)| params.clone())
    }

    fn take_failure(&self, opcode: u16) -> Option<MockFailure> {
        let mut failures = self.failures.borrow_mut();
        let index = failures.iter().position(|f| f.opcode == opcode)?;
        let failure = failures[index];
        if failure.once {
            failures.remove(index);
        }
        Some(failure.failure)
    }

    fn response(&self, opcode: u16) -> [u8; RETURN_BUFFER] {
        let mut rp = [0u8; RETURN_BUFFER];
        if let Some((_, params)) = self.responses.borrow().iter().find(|(op, _)| *op == opcode) {
            rp[..params.len()].copy_from_slice(params);
        }
        rp
    }
}

impl embedded_io::ErrorType for MockController {
    type Error = ErrorKind;
}

impl Controller for MockController {
    async fn write_acl_data(&self, _packet: &AclPacket<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn write_sync_data(&self, _packet: &SyncPacket<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn write_iso_data(&self, _packet: &IsoPacket<'_>) -> Result<(), Self::Error> {
        Ok(())
    }

    async fn read<'a>(&self, _buf: &'a mut [u8]) -> Result<ControllerToHostPacket<'a>, Self::Error> {
        core::future::pending().await
    }
}

impl<C: SyncCmd> ControllerCmdSync<C> for MockController {
    async fn exec(&self, cmd: &C) -> Result<C::Return, bt_hci::cmd::Error<Self::Error>> {
        let opcode = C::OPCODE.to_raw();
        let params = cmd.params();
        let mut buf = [0u8; MAX_PARAMS];
        let len = params.size();
        params.write_hci(&mut buf[..len]).unwrap();
        self.sent
            .borrow_mut()
            .push((opcode, SentParams::from_slice(&buf[..len]).unwrap()))
            .unwrap();

        match self.take_failure(opcode) {
            Some(MockFailure::Io) => return Err(bt_hci::cmd::Error::Io(ErrorKind::Other)),
            Some(MockFailure::Status(code)) => {
                let (status, _) = Status::from_hci_bytes(&[code]).unwrap();
                return Err(bt_hci::cmd::Error::Hci(status.to_result().unwrap_err()));
            }
            None => {}
        }

        let rp = self.response(opcode);
        let (ret, _) = C::Return::from_hci_bytes(&rp).unwrap();
        Ok(ret)
    }
}

/// Timer that records the armed deadline
#[derive(Debug, Default)]
pub(crate) struct MockTimer {
    scheduled: Option<u16>,
    cancels: usize,
}

impl MockTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn scheduled(&self) -> Option<u16> {
        self.scheduled
    }

    pub(crate) fn cancel_count(&self) -> usize {
        self.cancels
    }
}

impl LimitedDiscoverableTimer for MockTimer {
    fn schedule(&mut self, seconds: u16) {
        self.scheduled = Some(seconds);
    }

    fn cancel(&mut self) {
        self.scheduled = None;
        self.cancels += 1;
    }
}

/// Counts discovery notifications
#[derive(Debug, Default)]
pub(crate) struct RecordingDiscoveryListener {
    discovered: Cell<usize>,
    last_discovered: Cell<Option<BluetoothAddress>>,
    complete: Cell<usize>,
    last_complete_len: Cell<usize>,
}

impl RecordingDiscoveryListener {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn discovered_count(&self) -> usize {
        self.discovered.get()
    }

    pub(crate) fn last_discovered(&self) -> Option<BluetoothAddress> {
        self.last_discovered.get()
    }

    pub(crate) fn complete_count(&self) -> usize {
        self.complete.get()
    }

    pub(crate) fn last_complete_len(&self) -> usize {
        self.last_complete_len.get()
    }
}

impl DiscoveryListener for RecordingDiscoveryListener {
    fn discovered(&self, result: &DiscoveryResult) {
        self.discovered.set(self.discovered.get() + 1);
        self.last_discovered.set(Some(result.addr));
    }

    fn discovery_complete(&self, results: &[DiscoveryResult]) {
        self.complete.set(self.complete.get() + 1);
        self.last_complete_len.set(results.len());
    }
}

/// A connection notification as seen by a listener
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notification {
    Connected(BluetoothAddress, u8),
    Disconnected(BluetoothAddress, u8),
    RoleChanged(BluetoothAddress, Role, u8),
    SecurityChanged(BluetoothAddress, SecurityLevel),
    BondDeleted(BluetoothAddress),
}

/// Logs connection notifications in delivery order
#[derive(Debug, Default)]
pub(crate) struct RecordingConnectionListener {
    log: RefCell<Vec<Notification, 16>>,
}

impl RecordingConnectionListener {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn notifications(&self) -> Vec<Notification, 16> {
        self.log.borrow().clone()
    }

    fn record(&self, notification: Notification) {
        self.log.borrow_mut().push(notification).unwrap();
    }
}

impl ConnectionListener for RecordingConnectionListener {
    fn connected(&self, conn: &Connection, status: u8) {
        self.record(Notification::Connected(conn.addr, status));
    }

    fn disconnected(&self, conn: &Connection, reason: u8) {
        self.record(Notification::Disconnected(conn.addr, reason));
    }

    fn role_changed(&self, conn: &Connection, status: u8) {
        self.record(Notification::RoleChanged(conn.addr, conn.role, status));
    }

    fn security_changed(&self, conn: &Connection, level: SecurityLevel) {
        self.record(Notification::SecurityChanged(conn.addr, level));
    }

    fn bond_deleted(&self, addr: &BluetoothAddress) {
        self.record(Notification::BondDeleted(*addr));
    }
}

/// One Inquiry Result with RSSI report
pub(crate) fn inquiry_report(addr: BluetoothAddress, rssi: i8) -> HostEvent {
    let mut report = InquiryReport::new(addr, ClassOfDevice::from_raw(0x5A_020C), rssi);
    report.clock_offset = 0x1234;
    HostEvent::InquiryResult(report)
}

/// Extended Inquiry Result for one device
pub(crate) fn extended_inquiry(addr: BluetoothAddress, rssi: i8, eir: &[u8]) -> HostEvent {
    let mut report =
        InquiryReport::new(addr, ClassOfDevice::from_raw(0x5A_020C), rssi).with_eir(eir);
    report.clock_offset = 0x1234;
    HostEvent::InquiryResult(report)
}

/// Remote Name Request Complete carrying `name`
pub(crate) fn remote_name(status: u8, addr: BluetoothAddress, name: &str) -> HostEvent {
    HostEvent::RemoteNameRequestComplete {
        status,
        addr,
        name: Vec::from_slice(name.as_bytes()).unwrap(),
    }
}
