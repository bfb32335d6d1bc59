//! Dialer Loop (§4.D): drains the DialQueue in batches and races each
//! batch's dials against a shared deadline.

use crate::globals::{LivePeerTable, RunStats};
use crate::transport::{DialOutcome, Transport};
use crate::types::peer::PeerInfo;
use slog::{info, o, warn, Logger};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Default shared dial deadline (§4.D).
pub const DIAL_DEADLINE: Duration = Duration::from_secs(10);

#[derive(Debug, Default, Clone, Copy)]
struct BatchCounts {
    succeed: usize,
    failed: usize,
    timed: usize,
}

impl BatchCounts {
    fn total(&self) -> usize {
        self.succeed + self.failed + self.timed
    }
}

async fn dial_one(
    transport: &Transport,
    peer: &PeerInfo,
    log: &Logger,
    table: &LivePeerTable,
    stats: &RunStats,
    full_peer_id: bool,
) -> BatchCounts {
    let mut counts = BatchCounts::default();
    // First address is used for the dial attempt; PeerInfo guarantees at
    // least one address is present and, for the overlay-dial path, that it
    // advertises TCP.
    let addr = peer.addresses[0].0.clone();
    let peer_id = crate::transport::as_libp2p_peer_id(&peer.identity);
    let rendered = peer.identity.render(full_peer_id);
    let outcome_rx = transport.dial(peer_id, addr.clone());

    match tokio::time::timeout(DIAL_DEADLINE, outcome_rx).await {
        Ok(Ok(DialOutcome::Connected)) => {
            info!(log, "connected"; "peer" => rendered, "address" => %addr);
            table.write().insert(peer.identity.clone(), peer.clone());
            stats.record_dial_succeeded();
            counts.succeed += 1;
        }
        Ok(Ok(DialOutcome::Failed(reason))) => {
            warn!(log, "unable to connect"; "peer" => rendered, "address" => %addr, "error" => reason);
            stats.record_dial_failed();
            counts.failed += 1;
        }
        Ok(Err(_)) => {
            warn!(log, "unable to connect"; "peer" => rendered, "error" => "swarm task dropped the outcome channel");
            stats.record_dial_failed();
            counts.failed += 1;
        }
        Err(_) => {
            warn!(log, "timed out"; "peer" => rendered, "address" => %addr);
            stats.record_dial_timed_out();
            counts.timed += 1;
        }
    }
    counts
}

/// Drains the DialQueue forever, dialing in non-blocking-drained batches.
/// Never terminates on its own; a dial error is never fatal (§4.D).
pub async fn run(
    mut queue: mpsc::UnboundedReceiver<PeerInfo>,
    transport: Transport,
    table: LivePeerTable,
    stats: Arc<RunStats>,
    full_peer_id: bool,
    log: Logger,
) {
    let log = log.new(o!("task" => "dialer"));
    loop {
        let first = match queue.recv().await {
            Some(peer) => peer,
            None => return,
        };

        let mut batch = vec![first];
        while let Ok(peer) = queue.try_recv() {
            batch.push(peer);
        }

        let dials = batch
            .iter()
            .map(|peer| dial_one(&transport, peer, &log, &table, &stats, full_peer_id));
        let results: Vec<BatchCounts> = futures::future::join_all(dials).await;

        let totals = results.iter().fold(BatchCounts::default(), |mut acc, c| {
            acc.succeed += c.succeed;
            acc.failed += c.failed;
            acc.timed += c.timed;
            acc
        });
        info!(log, "dial batch complete";
            "succeed" => totals.succeed, "failed" => totals.failed,
            "timed" => totals.timed, "total" => totals.total());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_counts_total_sums_all_outcomes() {
        let counts = BatchCounts {
            succeed: 3,
            failed: 1,
            timed: 2,
        };
        assert_eq!(counts.total(), 6);
    }
}
