//! Discovery Loop (§4.E): periodically tops up the live peer count from
//! the discv5 routing table.

use crate::discovery::Discovery;
use crate::globals::LivePeerTable;
use crate::peer_info;
use crate::types::peer::PeerRole;
use slog::{debug, info, o, Logger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK: Duration = Duration::from_secs(1);

/// Runs until the process shuts down. Active only while the caller holds a
/// started `Discovery` handle — callers that disabled discovery (bootstrap
/// has no `DISCV5BN` entry, or `--noDiscovery`) never spawn this task.
pub async fn run(
    discovery: Arc<Discovery>,
    dial_tx: mpsc::UnboundedSender<crate::types::peer::PeerInfo>,
    table: LivePeerTable,
    max_peers: usize,
    log: Logger,
) {
    let log = log.new(o!("task" => "discovery"));
    let mut interval = tokio::time::interval(TICK);
    loop {
        interval.tick().await;

        let connected = table.read().len();
        let target = max_peers.saturating_sub(connected);
        if target == 0 {
            continue;
        }

        let nodes = match discovery.random_nodes(target).await {
            Ok(nodes) => nodes,
            Err(e) => {
                debug!(log, "discovery tick failed"; "error" => format!("{}", e));
                continue;
            }
        };

        for enr in nodes {
            let peer_info = match peer_info::from_enr(&enr, PeerRole::DiscoveryNode) {
                Some(info) => info,
                None => continue,
            };

            if peer_info.is_discovery_only() {
                info!(log, "discovery only peer"; "node_id" => %enr.node_id());
                continue;
            }

            if table.read().contains_key(&peer_info.identity) {
                continue;
            }

            let _ = dial_tx.send(peer_info);
        }
    }
}
