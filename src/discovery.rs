//! Thin wrapper around the `discv5` service: owns the UDP discovery socket,
//! seeds it with bootstrap records, and exposes the two operations the
//! Discovery/Resolver loops need. Grounded on the old
//! `eth2-libp2p/src/discovery/mod.rs` `Discovery` wrapper (`find_peers`
//! picking a random `NodeId` and calling `find_node`), ported from a
//! libp2p `NetworkBehaviour` to a standalone `discv5` 0.3 service driven by
//! its own tokio task, per the modernized concurrency model in §5.

use crate::error::{ErrorKind, Result};
use crate::types::bootstrap::Enr;
use crate::types::peer::ENRFieldPair;
use discv5::enr::{CombinedKey, NodeId};
use discv5::{Discv5, Discv5Config, Discv5ConfigBuilder};
use slog::{debug, info, Logger};
use std::net::SocketAddr;
use std::time::Duration;

/// Handle to the running discv5 service.
pub struct Discovery {
    service: Discv5,
    log: Logger,
}

fn default_discv5_config() -> Discv5Config {
    Discv5ConfigBuilder::new()
        .request_timeout(Duration::from_secs(1))
        .query_timeout(Duration::from_secs(30))
        .query_peer_timeout(Duration::from_secs(2))
        .request_retries(1)
        .build()
}

impl Discovery {
    /// Starts the discv5 service bound to `listen_addr`, seeded with the
    /// local ENR (built from `key` and the advertised `udp_port`) and the
    /// `DISCV5BN` bootstrap records. `field_pair`, when present, is
    /// re-published on the local ENR's `eth2`/`attnets` fields (§3: "used
    /// when re-publishing the engine's own record during discovery"),
    /// mirroring `eth2-libp2p::Discovery::update_eth2_enr`.
    pub async fn start(
        key: CombinedKey,
        listen_addr: SocketAddr,
        bootstrap_enrs: Vec<Enr>,
        field_pair: Option<ENRFieldPair>,
        log: Logger,
    ) -> Result<Self> {
        let mut builder = discv5::enr::EnrBuilder::new("v4");
        builder.ip(listen_addr.ip());
        builder.udp(listen_addr.port());
        let local_enr = builder
            .build(&key)
            .map_err(|e| ErrorKind::Discovery(format!("failed to build local ENR: {:?}", e)))?;

        info!(log, "Local discovery record built"; "enr" => local_enr.to_base64(), "node_id" => %local_enr.node_id());

        let mut service = Discv5::new(local_enr, key, default_discv5_config())
            .map_err(|e| ErrorKind::Discovery(format!("failed to init discv5: {:?}", e)))?;

        service
            .start(listen_addr)
            .await
            .map_err(|e| ErrorKind::Discovery(format!("failed to bind discv5 socket: {:?}", e)))?;

        for enr in bootstrap_enrs {
            debug!(log, "Seeding discovery table"; "node_id" => %enr.node_id());
            let _ = service.add_enr(enr);
        }

        if let Some(pair) = field_pair {
            info!(log, "Updating the local ENR's eth2 field"; "eth2" => hex::encode(&pair.eth2));
            if let Err(e) = service.enr_insert("eth2", pair.eth2.clone()) {
                debug!(log, "Failed to insert eth2 field into local ENR"; "error" => format!("{:?}", e));
            }
            if !pair.attnets.is_empty() {
                if let Err(e) = service.enr_insert("attnets", pair.attnets.clone()) {
                    debug!(log, "Failed to insert attnets field into local ENR"; "error" => format!("{:?}", e));
                }
            }
        }

        Ok(Self { service, log })
    }

    /// Requests up to `count` random discovery nodes, mirroring the
    /// original `find_peers` (random-target `find_node` query). Errors are
    /// returned to the caller, which logs them at debug level per §4.E.
    pub async fn random_nodes(&self, count: usize) -> Result<Vec<Enr>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let target = NodeId::random();
        let mut found = self
            .service
            .find_node(target)
            .await
            .map_err(|e| ErrorKind::Discovery(format!("{:?}", e)))?;
        found.truncate(count);
        Ok(found)
    }

    /// Resolves a single known node id to its current ENR, consulting the
    /// local table first and falling back to a targeted lookup (§4.F).
    pub async fn resolve(&self, node_id: NodeId) -> Result<Option<Enr>> {
        if let Some(enr) = self.service.find_enr(&node_id) {
            return Ok(Some(enr));
        }
        let found = self
            .service
            .find_node(node_id)
            .await
            .map_err(|e| ErrorKind::Discovery(format!("{:?}", e)))?;
        Ok(found.into_iter().find(|enr| enr.node_id() == node_id))
    }

    pub fn local_enr(&self) -> Enr {
        self.service.local_enr()
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }
}
