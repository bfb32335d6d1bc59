//! The pub/sub transport wrapper (§4.D, §4.G, §9 "GossipSub always"): owns
//! the libp2p `Swarm`, exposes `dial`/`subscribe_all` to the engine loops,
//! and forwards received messages to the Message Decoder.
//!
//! Grounded on the old `eth2-libp2p`/mothra `Behaviour` (gossipsub +
//! identify + discovery composed via `#[derive(NetworkBehaviour)]`), ported
//! from its futures-0.1 `poll_method` shape to a `tokio::select!` event-pump
//! task, matching the concurrency model in §5.

use crate::config::Config;
use crate::error::{ErrorKind, Result};
use crate::types::peer::PeerIdentity;
use libp2p::gossipsub::{
    Gossipsub, GossipsubConfigBuilder, GossipsubEvent, IdentTopic, MessageAuthenticity,
    ValidationMode,
};
use libp2p::identify::{Identify, IdentifyConfig, IdentifyEvent};
use libp2p::core::muxing::StreamMuxerBox;
use libp2p::core::transport::Boxed;
use libp2p::core::upgrade;
use libp2p::futures::StreamExt;
use libp2p::swarm::{NetworkBehaviourEventProcess, SwarmBuilder, SwarmEvent};
use libp2p::tcp::TokioTcpConfig;
use libp2p::{identity::Keypair, noise, yamux, Multiaddr, NetworkBehaviour, PeerId, Swarm, Transport as Libp2pTransport};
use slog::{debug, o, warn, Logger};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex};

/// Matches `eth2_libp2p::config::GOSSIP_MAX_SIZE`.
pub const GOSSIP_MAX_SIZE: usize = 1_048_576;

/// A pub/sub message delivered on a subscribed topic, handed to the
/// Message Decoder (§4.H) together with the peer it arrived from, so the
/// message-reception hook (§4.F producer side) can enqueue unknown
/// identities onto the ResolveQueue.
#[derive(Debug, Clone)]
pub struct PubsubMessage {
    pub topic: String,
    pub data: Vec<u8>,
    pub source: Option<PeerId>,
}

/// Outcome of one dial attempt, resolved by the swarm-event task and
/// observed by the Dialer Loop (§4.D) through a `oneshot::Receiver`.
#[derive(Debug)]
pub enum DialOutcome {
    Connected,
    Failed(String),
}

#[derive(NetworkBehaviour)]
#[behaviour(event_process = true)]
struct Behaviour {
    gossipsub: Gossipsub,
    identify: Identify,
    #[behaviour(ignore)]
    #[allow(dead_code)]
    log: Logger,
    #[behaviour(ignore)]
    message_tx: mpsc::UnboundedSender<PubsubMessage>,
}

impl NetworkBehaviourEventProcess<GossipsubEvent> for Behaviour {
    fn inject_event(&mut self, event: GossipsubEvent) {
        if let GossipsubEvent::Message {
            propagation_source,
            message,
            ..
        } = event
        {
            let _ = self.message_tx.send(PubsubMessage {
                topic: message.topic.to_string(),
                data: message.data,
                source: Some(propagation_source),
            });
        }
    }
}

impl NetworkBehaviourEventProcess<IdentifyEvent> for Behaviour {
    fn inject_event(&mut self, event: IdentifyEvent) {
        if let IdentifyEvent::Received { peer_id, info, .. } = event {
            debug!(self.log, "Identified peer"; "peer" => %peer_id, "agent" => info.agent_version);
        }
    }
}

enum Command {
    Dial {
        addr: Multiaddr,
        peer_id: PeerId,
        outcome: oneshot::Sender<DialOutcome>,
    },
    Subscribe(String),
}

/// Handle used by the engine loops to drive the swarm task.
#[derive(Clone)]
pub struct Transport {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl Transport {
    /// Subscribes to every topic in `topics`. Subscription errors are fatal
    /// (§4.G): the process aborts rather than run with a partial topic set.
    pub fn subscribe_all(&self, topics: &[String]) -> Result<()> {
        for topic in topics {
            self.command_tx
                .send(Command::Subscribe(topic.clone()))
                .map_err(|_| ErrorKind::Transport("swarm task is gone".to_string()))?;
        }
        Ok(())
    }

    /// Issues a dial for `addr`/`peer_id` and returns a receiver that
    /// resolves once the connection succeeds or fails, per the Dialer
    /// Loop's shared-deadline race (§4.D).
    pub fn dial(&self, peer_id: PeerId, addr: Multiaddr) -> oneshot::Receiver<DialOutcome> {
        let (tx, rx) = oneshot::channel();
        let _ = self.command_tx.send(Command::Dial {
            addr,
            peer_id,
            outcome: tx,
        });
        rx
    }
}

/// TCP + noise + yamux transport stack, matching `eth2_libp2p`'s
/// `tcp-tokio`/`noise`/`yamux` dependency selection.
fn build_tcp_transport(keypair: &Keypair) -> Result<Boxed<(PeerId, StreamMuxerBox)>> {
    let noise_keys = noise::Keypair::<noise::X25519Spec>::new()
        .into_authentic(keypair)
        .map_err(|e| ErrorKind::Transport(format!("noise handshake keys: {}", e)))?;

    Ok(TokioTcpConfig::new()
        .nodelay(true)
        .upgrade(upgrade::Version::V1)
        .authenticate(noise::NoiseConfig::xx(noise_keys).into_authenticated())
        .multiplex(yamux::YamuxConfig::default())
        .timeout(Duration::from_secs(20))
        .boxed())
}

fn build_behaviour(
    keypair: &Keypair,
    sign: bool,
    message_tx: mpsc::UnboundedSender<PubsubMessage>,
    log: Logger,
) -> Result<Behaviour> {
    let validation_mode = if sign {
        ValidationMode::Strict
    } else {
        ValidationMode::Permissive
    };
    let gossipsub_config = GossipsubConfigBuilder::default()
        .max_transmit_size(GOSSIP_MAX_SIZE)
        .heartbeat_interval(Duration::from_millis(700))
        .validation_mode(validation_mode)
        .build()
        .map_err(|e| ErrorKind::Transport(format!("gossipsub config: {}", e)))?;

    let authenticity = if sign {
        MessageAuthenticity::Signed(keypair.clone())
    } else {
        MessageAuthenticity::Anonymous
    };
    let gossipsub = Gossipsub::new(authenticity, gossipsub_config)
        .map_err(|e| ErrorKind::Transport(format!("gossipsub init: {}", e)))?;

    let identify = Identify::new(IdentifyConfig::new(
        "beacon-sentinel/0.1.0".to_string(),
        keypair.public(),
    ));

    Ok(Behaviour {
        gossipsub,
        identify,
        log,
        message_tx,
    })
}

/// Builds the transport, spawning the swarm-event pump task described in
/// §5 (one independent task per long-lived loop). Always constructs the
/// GossipSub behaviour regardless of `-f/-g` (§9 "GossipSub always").
pub fn build(
    conf: &Config,
    keypair: Keypair,
    log: Logger,
) -> Result<(Transport, mpsc::UnboundedReceiver<PubsubMessage>)> {
    let local_peer_id = PeerId::from(keypair.public());
    let (message_tx, message_rx) = mpsc::unbounded_channel();
    let behaviour = build_behaviour(
        &keypair,
        conf.sign,
        message_tx,
        log.new(o!("task" => "transport")),
    )?;

    let transport = build_tcp_transport(&keypair)?;

    let mut swarm = SwarmBuilder::new(transport, behaviour, local_peer_id)
        .executor(Box::new(|fut| {
            tokio::spawn(fut);
        }))
        .build();

    let bind_addr: Multiaddr = format!("/ip4/{}/tcp/{}", conf.bind_address, conf.eth_port)
        .parse()
        .map_err(|_| ErrorKind::InvalidBindAddress(conf.bind_address.to_string()))?;
    Swarm::listen_on(&mut swarm, bind_addr)
        .map_err(|e| ErrorKind::Transport(format!("listen failed: {}", e)))?;

    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Command>();
    let pending_dials: Arc<AsyncMutex<HashMap<PeerId, oneshot::Sender<DialOutcome>>>> =
        Arc::new(AsyncMutex::new(HashMap::new()));

    let pump_log = log.new(o!("task" => "swarm_pump"));
    tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(command) = command_rx.recv() => {
                    match command {
                        Command::Subscribe(topic_name) => {
                            let topic = IdentTopic::new(topic_name.clone());
                            if let Err(e) = swarm.behaviour_mut().gossipsub.subscribe(&topic) {
                                warn!(pump_log, "Subscription failed"; "topic" => topic_name, "error" => format!("{:?}", e));
                            }
                        }
                        Command::Dial { addr, peer_id, outcome } => {
                            pending_dials.lock().await.insert(peer_id, outcome);
                            if let Err(e) = Swarm::dial(&mut swarm, addr) {
                                if let Some(tx) = pending_dials.lock().await.remove(&peer_id) {
                                    let _ = tx.send(DialOutcome::Failed(format!("{:?}", e)));
                                }
                            }
                        }
                    }
                }
                event = swarm.select_next_some() => {
                    match event {
                        SwarmEvent::ConnectionEstablished { peer_id, .. } => {
                            if let Some(tx) = pending_dials.lock().await.remove(&peer_id) {
                                let _ = tx.send(DialOutcome::Connected);
                            }
                        }
                        SwarmEvent::OutgoingConnectionError { peer_id: Some(peer_id), error, .. } => {
                            if let Some(tx) = pending_dials.lock().await.remove(&peer_id) {
                                let _ = tx.send(DialOutcome::Failed(format!("{}", error)));
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    });

    Ok((Transport { command_tx }, message_rx))
}

/// Converts a `PeerIdentity` reference into the `PeerId` libp2p expects;
/// trivial, kept as a named seam so callers don't reach into the newtype.
pub fn as_libp2p_peer_id(identity: &PeerIdentity) -> PeerId {
    identity.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gossip_max_size_matches_config_constant() {
        assert_eq!(GOSSIP_MAX_SIZE, 1_048_576);
    }
}
