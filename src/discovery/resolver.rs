//! Remote name resolution
//!
//! Names are requested one device at a time, in slot order. Devices whose EIR already
//! carries a name are skipped. A request the controller refuses marks its entry resolved
//! and the scan moves on to the next device within the same pass.

use super::{DiscoveryResult, ResolveState};
use crate::eir;
use crate::hci::cmd::{RemoteNameRequest, RemoteNameRequestCancel};
use crate::hci::{BrEdrController, command};

fn needs_name(result: &DiscoveryResult) -> bool {
    result.resolve.state == ResolveState::Pending && !eir::has_name(&result.eir)
}

/// Mark every result pending at the start of a resolution round
pub(crate) fn begin_round(results: &mut [DiscoveryResult]) {
    for result in results {
        result.resolve.state = ResolveState::Pending;
    }
}

/// Issue the next remote name request of the round
///
/// Returns `true` while a request is outstanding, `false` once the round is done.
pub(crate) async fn request_next<T: BrEdrController>(
    results: &mut [DiscoveryResult],
    controller: &T,
) -> bool {
    for result in results.iter_mut().filter(|r| needs_name(r)) {
        let cmd = RemoteNameRequest::new(
            result.addr.into(),
            result.resolve.page_scan_repetition_mode,
            0,
            result.resolve.clock_offset,
        );
        match command(controller, &cmd).await {
            Ok(_) => {
                debug!("[DISCOVERY] resolving name of {}", result.addr);
                result.resolve.state = ResolveState::Resolving;
                return true;
            }
            Err(e) => {
                warn!(
                    "[DISCOVERY] name request for {} failed: {:?}",
                    result.addr, e
                );
                result.resolve.state = ResolveState::Resolved;
            }
        }
    }
    false
}

/// Best-effort cancel of every outstanding name request
pub(crate) async fn cancel_all<T: BrEdrController>(results: &[DiscoveryResult], controller: &T) {
    for result in results
        .iter()
        .filter(|r| r.resolve.state == ResolveState::Resolving)
    {
        if let Err(e) = command(controller, &RemoteNameRequestCancel::new(result.addr.into())).await {
            warn!(
                "[DISCOVERY] name request cancel for {} failed: {:?}",
                result.addr, e
            );
        }
    }
}
