//! Process-lifetime shared state owned by `run` (§5, §9 "no global mutable
//! state" — everything here is constructed once inside `run` and handed to
//! each task by reference/clone, mirroring `eth2_libp2p::NetworkGlobals`).

use crate::types::peer::{PeerIdentity, PeerInfo};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Mapping from `PeerIdentity` to `PeerInfo`, mutated by the Dialer (on
/// connect) and Resolver (on enrichment), read by the Discovery Loop to
/// compute `target - |table|`. Entries are never evicted (§3).
pub type LivePeerTable = Arc<RwLock<HashMap<PeerIdentity, PeerInfo>>>;

pub fn new_live_peer_table() -> LivePeerTable {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Unbounded producer/consumer pair feeding the Dialer Loop (§3, §4.D).
pub fn new_dial_queue() -> (mpsc::UnboundedSender<PeerInfo>, mpsc::UnboundedReceiver<PeerInfo>) {
    mpsc::unbounded_channel()
}

/// Bounded-10, best-effort producer/consumer pair feeding the Resolver Loop
/// (§3, §4.F). Producers use `try_send` and drop silently when full.
pub const RESOLVE_QUEUE_CAPACITY: usize = 10;

pub fn new_resolve_queue() -> (
    mpsc::Sender<PeerIdentity>,
    mpsc::Receiver<PeerIdentity>,
) {
    mpsc::channel(RESOLVE_QUEUE_CAPACITY)
}

/// Process-lifetime counters surfaced only through periodic log lines (no
/// metrics HTTP endpoint — ambient addition, §3 of the expanded spec).
#[derive(Debug, Default)]
pub struct RunStats {
    pub dials_succeeded: AtomicU64,
    pub dials_failed: AtomicU64,
    pub dials_timed_out: AtomicU64,
    pub messages_received: AtomicU64,
    pub messages_decoded: AtomicU64,
    pub decode_failures: AtomicU64,
}

impl RunStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_dial_succeeded(&self) {
        self.dials_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dial_failed(&self) {
        self.dials_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dial_timed_out(&self) {
        self.dials_timed_out.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_message_decoded(&self) {
        self.messages_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::peer::{PeerIdentity, PeerRole, TransportAddress};
    use libp2p::PeerId;

    #[test]
    fn live_peer_table_is_monotone_under_concurrent_inserts() {
        let table = new_live_peer_table();
        for _ in 0..5 {
            let identity = PeerIdentity(PeerId::random());
            let addr = TransportAddress::tcp([127, 0, 0, 1].into(), 9000);
            let info = PeerInfo::new(identity.clone(), vec![addr], PeerRole::OverlayPeer).unwrap();
            table.write().insert(identity, info);
        }
        assert_eq!(table.read().len(), 5);
    }

    #[test]
    fn stats_counters_start_at_zero() {
        let stats = RunStats::new();
        assert_eq!(stats.dials_succeeded.load(Ordering::Relaxed), 0);
        stats.record_dial_succeeded();
        assert_eq!(stats.dials_succeeded.load(Ordering::Relaxed), 1);
    }
}
