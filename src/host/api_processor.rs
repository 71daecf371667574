use crate::api::{Request, Response};
use crate::connection::ConnectionRegistry;
use crate::hci::BrEdrController;
use crate::keys::LinkKeyStore;
use crate::scan::LimitedDiscoverableTimer;
use crate::{BluetoothError, BluetoothHost};

fn reply(result: Result<(), BluetoothError>, ok: Response) -> Response {
    match result {
        Ok(()) => ok,
        Err(e) => Response::Error(e),
    }
}

impl<T, S, C, K, const D: usize> BluetoothHost<'_, T, S, C, K, D>
where
    T: BrEdrController,
    S: LimitedDiscoverableTimer,
    C: ConnectionRegistry,
    K: LinkKeyStore,
{
    /// Process an API request
    pub async fn process_api_request(&mut self, request: Request) -> Response {
        debug!("[HOST] API request: {:?}", request);
        match request {
            Request::StartDiscovery(params) => reply(
                self.start_discovery(&params).await,
                Response::DiscoveryStarted,
            ),
            Request::StopDiscovery => {
                reply(self.stop_discovery().await, Response::DiscoveryStopped)
            }
            Request::SetConnectable(enable) => reply(
                self.set_connectable(enable).await,
                Response::ConnectableSet,
            ),
            Request::SetDiscoverable { enable, limited } => reply(
                self.set_discoverable(enable, limited).await,
                Response::DiscoverableSet,
            ),
            Request::SetRequiredSecurity(addr, level) => reply(
                self.set_required_security(&addr, level),
                Response::RequiredSecuritySet,
            ),
            Request::Unpair(addr) => {
                self.unpair(&addr).await;
                Response::Unpaired
            }
            Request::BondExists(addr) => Response::BondExists(self.bond_exists(&addr)),
        }
    }
}
