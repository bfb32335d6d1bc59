//! Entry-point orchestration (§9 "global mutable state... the `run` entry
//! point owns all state"): constructs the key, transport, queues, tables
//! and discovery handle, wires the engine loops together, and blocks until
//! `SIGINT`.

use crate::config::Config;
use crate::discovery::Discovery;
use crate::engine::{decoder, dialer, discovery as discovery_loop, resolver};
use crate::error::{Error, ErrorKind, Result};
use crate::globals::{self, RunStats};
use crate::types::bootstrap::{BootstrapAddress, Enr};
use crate::types::peer::{ENRFieldPair, PeerIdentity, PeerRole};
use crate::types::topics::TopicFilter;
use crate::{bootstrap, enr, peer_info, transport};
use discv5::enr::CombinedKey;
use libp2p::identity::Keypair;
use slog::{error, info, o, warn, Logger};
use std::net::SocketAddr;
use std::sync::Arc;

fn bootstrap_enrs(addresses: &[BootstrapAddress]) -> Vec<Enr> {
    addresses
        .iter()
        .filter_map(|addr| match addr {
            BootstrapAddress::Record(enr) => Some(enr.clone()),
            BootstrapAddress::Multi(_) => None,
        })
        .collect()
}

fn resolve_fork_digest(addresses: &[BootstrapAddress], conf: &Config, log: &Logger) -> Option<[u8; 4]> {
    let mut resolved = None;
    for addr in addresses {
        if let BootstrapAddress::Record(record) = addr {
            if let Some(fd) = enr::fork_digest(record) {
                enr::merge_fork_digest(&mut resolved, fd, log);
            }
        }
    }

    if let Some(override_fd) = conf.fork_digest_override {
        if let Some(existing) = resolved {
            if existing != override_fd {
                warn!(log, "operator-supplied fork digest overrides bootstrap records";
                    "bootstrap" => hex::encode(existing), "operator" => hex::encode(override_fd));
            }
        }
        resolved = Some(override_fd);
    }
    resolved
}

/// Folds the `eth2`/`attnets` field pair across bootstrap records ("first
/// wins, warn on mismatch", §4.B/§3), so the local record built by
/// `Discovery::start` can re-publish the same fields a full peer would
/// advertise on the discovery overlay.
fn resolve_field_pair(addresses: &[BootstrapAddress], log: &Logger) -> Option<ENRFieldPair> {
    let mut resolved = None;
    for addr in addresses {
        if let BootstrapAddress::Record(record) = addr {
            if let Some(pair) = enr::field_pair(record) {
                enr::merge_field_pair(&mut resolved, pair, log);
            }
        }
    }
    resolved
}

fn initial_dial_targets(addresses: &[BootstrapAddress]) -> Vec<crate::types::peer::PeerInfo> {
    let mut out = Vec::new();
    for addr in addresses {
        let built = match addr {
            BootstrapAddress::Record(record) => peer_info::from_enr(record, PeerRole::OverlayPeer),
            BootstrapAddress::Multi(multiaddr) => peer_info::from_multiaddr(multiaddr),
        };
        if let Some(info) = built {
            out.push(info);
        }
    }
    out
}

fn has_discv5_bootstrap(addresses: &[BootstrapAddress]) -> bool {
    addresses.iter().any(|addr| match addr {
        BootstrapAddress::Record(record) => enr::transport_addresses(record)
            .iter()
            .any(|a| a.has_udp()),
        BootstrapAddress::Multi(_) => false,
    })
}

/// Runs the engine until `SIGINT`. Returns `Err` only for the §7 tier-1
/// fatal conditions; `main` logs and exits 1 on `Err`.
pub async fn run(conf: Config, log: Logger) -> Result<()> {
    let addresses = bootstrap::load(conf.bootfile.as_deref(), &conf.bootnodes, &log);
    if addresses.is_empty() {
        return Err(Error::from(ErrorKind::NoBootstraps));
    }

    let fork_digest = resolve_fork_digest(&addresses, &conf, &log)
        .ok_or_else(|| Error::from(ErrorKind::MissingForkDigest))?;
    info!(log, "resolved fork digest"; "fork_digest" => hex::encode(fork_digest));

    let dial_targets = initial_dial_targets(&addresses);
    if dial_targets.is_empty() {
        return Err(Error::from(ErrorKind::NoDialableBootstraps));
    }

    let keypair = Keypair::generate_secp256k1();
    let discv5_key = CombinedKey::generate_secp256k1();

    let table = globals::new_live_peer_table();
    let stats = RunStats::new();
    let (dial_tx, dial_rx) = globals::new_dial_queue();
    let (resolve_tx, resolve_rx) = globals::new_resolve_queue();

    let (handle, mut message_rx) = transport::build(&conf, keypair, log.new(o!("component" => "transport")))?;

    for peer in dial_targets {
        let _ = dial_tx.send(peer);
    }

    let discovery_enabled = !conf.no_discovery && has_discv5_bootstrap(&addresses);
    if discovery_enabled {
        let listen_addr = SocketAddr::new(conf.bind_address.into(), conf.discovery_port);
        let field_pair = resolve_field_pair(&addresses, &log);
        let discovery = Discovery::start(
            discv5_key,
            listen_addr,
            bootstrap_enrs(&addresses),
            field_pair,
            log.new(o!("component" => "discovery")),
        )
        .await?;
        let discovery = Arc::new(discovery);

        tokio::spawn(discovery_loop::run(
            discovery.clone(),
            dial_tx.clone(),
            table.clone(),
            conf.max_peers,
            log.clone(),
        ));
        tokio::spawn(resolver::run(
            resolve_rx,
            discovery,
            table.clone(),
            log.clone(),
        ));
    } else {
        info!(log, "discovery disabled"; "reason" => "no DISCV5BN bootstrap or --noDiscovery");
        drop(resolve_rx);
    }

    tokio::spawn(dialer::run(
        dial_rx,
        handle.clone(),
        table.clone(),
        stats.clone(),
        conf.full_peer_id,
        log.clone(),
    ));

    let topics = resolve_topics(&conf, fork_digest);
    handle.subscribe_all(&topics)?;
    for custom in &conf.custom_topics {
        handle.subscribe_all(std::slice::from_ref(custom))?;
    }

    let decode_enabled = conf.decode;
    let decoder_log = log.new(o!("component" => "decoder"));
    let decoder_table = table.clone();
    let decoder_stats = stats.clone();
    let decoder_resolve_tx = resolve_tx;
    tokio::spawn(async move {
        while let Some(message) = message_rx.recv().await {
            decoder::decode_message(
                &message.topic,
                &message.data,
                decode_enabled,
                &decoder_stats,
                &decoder_log,
            );

            if let Some(source) = message.source {
                let identity = PeerIdentity(source);
                if !decoder_table.read().contains_key(&identity) {
                    let _ = decoder_resolve_tx.try_send(identity);
                }
            }
        }
    });

    info!(log, "beacon sentinel is running";
        "topics" => topics.len(), "fork_digest" => hex::encode(fork_digest));

    tokio::signal::ctrl_c().await?;
    info!(log, "received SIGINT, shutting down");

    Ok(())
}

fn resolve_topics(conf: &Config, fork_digest: [u8; 4]) -> Vec<String> {
    let filters = if conf.topics.is_empty() {
        TopicFilter::all()
    } else {
        conf.topics
            .iter()
            .filter_map(|code| TopicFilter::parse_short_code(code))
            .flatten()
            .collect()
    };
    crate::types::topics::expand(&filters, fork_digest)
}
