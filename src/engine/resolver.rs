//! Resolver Loop (§4.F): maps peer identities observed on the overlay
//! (but absent from the live peer table) to discovery nodes, enriching the
//! table on success.

use crate::discovery::Discovery;
use crate::globals::LivePeerTable;
use crate::peer_info;
use crate::types::peer::{PeerIdentity, PeerRole};
use slog::{o, trace, warn, Logger};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Drains the ResolveQueue forever. Never terminates; resolution failures
/// are logged and swallowed (§4.F, §7 tier 2/3).
pub async fn run(
    mut queue: mpsc::Receiver<PeerIdentity>,
    discovery: Arc<Discovery>,
    table: LivePeerTable,
    log: Logger,
) {
    let log = log.new(o!("task" => "resolver"));
    while let Some(identity) = queue.recv().await {
        let node_id = match peer_info::to_node_id(&identity) {
            Some(id) => id,
            None => {
                trace!(log, "identity has no derivable node id"; "peer" => %identity);
                continue;
            }
        };

        match discovery.resolve(node_id.to_discv5()).await {
            Ok(Some(enr)) => match peer_info::from_enr(&enr, PeerRole::OverlayPeer) {
                Some(info) => {
                    table.write().insert(identity, info);
                }
                None => {
                    warn!(log, "record is invalid"; "peer" => %identity);
                }
            },
            Ok(None) => {
                trace!(log, "resolve returned no record"; "peer" => %identity);
            }
            Err(e) => {
                warn!(log, "resolve failed"; "peer" => %identity, "error" => format!("{}", e));
            }
        }
    }
}
