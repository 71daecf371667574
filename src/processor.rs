//! Event loop driving a [`BluetoothHost`]
//!
//! [`run`] reads HCI packets from the controller and feeds the events to the host,
//! together with requests from the [`HostApi`] and the limited discoverable deadline.
//! The application's [`LimitedDiscoverableTimer`] raises the [`ExpirySignal`] once the
//! deadline passes.
//!
//! # Architecture
//!
//! * **HCI reader**: reads the controller and queues decoded [`HostEvent`]s. It keeps
//!   reading while the host awaits a command, which is what completes that command.
//! * **Host loop**: handles one event, request or expiry at a time
//!
//! # Example
//!
//! ```rust,ignore
//! use bredr_host::api::HostApi;
//! use bredr_host::processor::{self, ExpirySignal};
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//!
//! static API: HostApi<CriticalSectionRawMutex> = HostApi::new();
//! static EXPIRY: ExpirySignal<CriticalSectionRawMutex> = ExpirySignal::new();
//!
//! #[embassy_executor::task]
//! async fn bluetooth(controller: &'static Controller) -> ! {
//!     let mut host = BluetoothHost::new(controller, Timer::new(&EXPIRY), options);
//!     processor::run(&mut host, &API, &EXPIRY).await
//! }
//! ```

use crate::BluetoothHost;
use crate::api::HostApi;
use crate::connection::ConnectionRegistry;
use crate::constants::{HCI_READ_BUFFER_SIZE, MAX_PENDING_EVENTS};
use crate::hci::BrEdrController;
use crate::hci::event::HostEvent;
use crate::keys::LinkKeyStore;
use crate::scan::LimitedDiscoverableTimer;
use bt_hci::ControllerToHostPacket;
use embassy_futures::select::{Either, Either3, select, select3};
use embassy_sync::blocking_mutex::raw::{NoopRawMutex, RawMutex};
use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::signal::Signal;

/// Queue of decoded events between the HCI reader and the host loop
pub type EventChannel<M> = Channel<M, HostEvent, MAX_PENDING_EVENTS>;

/// Receiving end of an [`EventChannel`]
pub type EventReceiver<'c, M> = Receiver<'c, M, HostEvent, MAX_PENDING_EVENTS>;

/// Sending end of an [`EventChannel`]
pub type EventSender<'c, M> = Sender<'c, M, HostEvent, MAX_PENDING_EVENTS>;

/// Raised when the limited discoverable deadline passes
pub type ExpirySignal<M> = Signal<M, ()>;

/// Wait for the next event, API request or deadline expiry and process it
pub async fn process_next<E, M, T, S, C, K, const D: usize>(
    host: &mut BluetoothHost<'_, T, S, C, K, D>,
    events: &EventReceiver<'_, E>,
    api: &HostApi<M>,
    expiry: &ExpirySignal<M>,
) where
    E: RawMutex,
    M: RawMutex,
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    match select3(events.receive(), api.next_request(), expiry.wait()).await {
        Either3::First(event) => {
            trace!("[PROCESSOR] host event");
            host.process_event(&event).await;
        }
        Either3::Second(request) => {
            let response = host.process_api_request(request).await;
            api.respond(response).await;
        }
        Either3::Third(()) => {
            debug!("[PROCESSOR] limited discoverable deadline passed");
            host.limited_discoverable_timeout().await;
        }
    }
}

async fn hci_event_reader<T: BrEdrController>(
    controller: &T,
    events: EventSender<'_, NoopRawMutex>,
) -> ! {
    let mut read_buffer = [0u8; HCI_READ_BUFFER_SIZE];

    loop {
        match controller.read(&mut read_buffer).await {
            Ok(ControllerToHostPacket::Event(event)) => {
                for host_event in HostEvent::collect(&event) {
                    events.send(host_event).await;
                }
            }
            Ok(_) => trace!("[PROCESSOR] ignoring data packet"),
            Err(_) => error!("[PROCESSOR] HCI read error"),
        }
    }
}

async fn host_loop<M, T, S, C, K, const D: usize>(
    host: &mut BluetoothHost<'_, T, S, C, K, D>,
    events: EventReceiver<'_, NoopRawMutex>,
    api: &HostApi<M>,
    expiry: &ExpirySignal<M>,
) -> !
where
    M: RawMutex,
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    loop {
        process_next(host, &events, api, expiry).await;
    }
}

/// Run the host forever
pub async fn run<M, T, S, C, K, const D: usize>(
    host: &mut BluetoothHost<'_, T, S, C, K, D>,
    api: &HostApi<M>,
    expiry: &ExpirySignal<M>,
) -> !
where
    M: RawMutex,
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    let events: EventChannel<NoopRawMutex> = EventChannel::new();
    let controller = host.controller();

    info!("[PROCESSOR] started");
    match select(
        hci_event_reader(controller, events.sender()),
        host_loop(host, events.receiver(), api, expiry),
    )
    .await
    {
        Either::First(never) | Either::Second(never) => never,
    }
}
