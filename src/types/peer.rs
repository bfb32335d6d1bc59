//! Peer identity, node identity, transport addresses and the peer
//! descriptor used to drive dials and discovery lookups.
//!
//! Two identifiers exist for the same entity: `PeerIdentity` (the overlay's
//! own identifier, a libp2p `PeerId`) and `NodeId` (the discv5 routing-table
//! identifier, `keccak256` of the raw 64-byte secp256k1 public key). The
//! conversion between them is partial: only secp256k1-keyed identities carry
//! an extractable raw public key.

use libp2p::core::PublicKey;
use libp2p::{Multiaddr, PeerId};
use std::net::IpAddr;
use tiny_keccak::{Hasher, Keccak};

/// The overlay's own peer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerIdentity(pub PeerId);

impl From<PeerId> for PeerIdentity {
    fn from(id: PeerId) -> Self {
        PeerIdentity(id)
    }
}

impl std::fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PeerIdentity {
    /// Renders the identity for a log line: the full base58 string when
    /// `full` is set (`-p/--fullpeerid`), otherwise a short, human-sized
    /// prefix — enough to disambiguate peers in a terminal without the
    /// full ~50-character identifier.
    pub fn render(&self, full: bool) -> String {
        let rendered = self.0.to_string();
        if full {
            rendered
        } else {
            rendered.chars().take(12).collect()
        }
    }
}

/// The discv5 routing-table identifier: 256 bits, big-endian
/// `keccak256(raw_64byte_pubkey)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub [u8; 32]);

impl NodeId {
    /// Derives a `NodeId` from a raw, uncompressed 64-byte secp256k1 public
    /// key (no leading `0x04` prefix).
    pub fn from_raw_pubkey(raw_pubkey_64: &[u8; 64]) -> Self {
        let mut hasher = Keccak::v256();
        let mut out = [0u8; 32];
        hasher.update(raw_pubkey_64);
        hasher.finalize(&mut out);
        NodeId(out)
    }

    /// Converts to the `discv5` crate's own `NodeId` newtype.
    pub fn to_discv5(self) -> discv5::enr::NodeId {
        discv5::enr::NodeId::new(&self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Attempts to recover the raw 64-byte secp256k1 public key backing a
/// libp2p `PublicKey`, for peers identified via secp256k1. Returns `None`
/// for any other key type (e.g. Ed25519) — the conversion to `NodeId` is
/// partial by construction.
pub fn raw_secp256k1_pubkey(key: &PublicKey) -> Option<[u8; 64]> {
    match key {
        PublicKey::Secp256k1(pk) => {
            // Uncompressed SEC1 encoding is 65 bytes: a `0x04` prefix
            // followed by the 64-byte (x, y) coordinate pair.
            let encoded = pk.encode_uncompressed();
            let mut raw = [0u8; 64];
            raw.copy_from_slice(&encoded[1..65]);
            Some(raw)
        }
        _ => None,
    }
}

/// Converts an overlay `PeerIdentity` to its discovery-layer `NodeId`. Only
/// defined for peers whose libp2p identity was derived from a secp256k1
/// public key with an extractable raw form; returns `None` otherwise.
pub fn peer_identity_to_node_id(identity: &PeerIdentity) -> Option<NodeId> {
    // `PeerId` only exposes its preimage for `Identity`-hashed ids (<= 42
    // bytes multihash), which is how libp2p encodes secp256k1 keys. The
    // multihash itself carries a leading code/length varint pair ahead of
    // the digest; only the digest is the protobuf-encoded `PublicKey`.
    let multihash = identity.0.as_ref();
    if multihash.code() != 0 {
        return None;
    }
    let public_key = PublicKey::from_protobuf_encoding(multihash.digest()).ok()?;
    let raw = raw_secp256k1_pubkey(&public_key)?;
    Some(NodeId::from_raw_pubkey(&raw))
}

/// A composite network address: an IP-layer component plus a transport
/// component (TCP or UDP) over a given port, expressed as a libp2p
/// `Multiaddr` (e.g. `/ip4/1.2.3.4/tcp/9000`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportAddress(pub Multiaddr);

impl TransportAddress {
    pub fn tcp(ip: IpAddr, port: u16) -> Self {
        let mut addr = Multiaddr::from(ip);
        addr.push(libp2p::multiaddr::Protocol::Tcp(port));
        TransportAddress(addr)
    }

    pub fn udp(ip: IpAddr, port: u16) -> Self {
        let mut addr = Multiaddr::from(ip);
        addr.push(libp2p::multiaddr::Protocol::Udp(port));
        TransportAddress(addr)
    }

    pub fn has_tcp(&self) -> bool {
        self.0
            .iter()
            .any(|p| matches!(p, libp2p::multiaddr::Protocol::Tcp(_)))
    }

    pub fn has_udp(&self) -> bool {
        self.0
            .iter()
            .any(|p| matches!(p, libp2p::multiaddr::Protocol::Udp(_)))
    }
}

impl std::fmt::Display for TransportAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role a `PeerInfo` was built for, used only to express the invariant
/// that direct-dial peers carry a TCP address and discovery peers carry a
/// UDP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRole {
    OverlayPeer,
    DiscoveryNode,
}

/// A peer descriptor: identity plus an ordered, non-empty list of
/// transport addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerInfo {
    pub identity: PeerIdentity,
    pub addresses: Vec<TransportAddress>,
}

impl PeerInfo {
    /// Builds a `PeerInfo`, checking the role invariant from §3: overlay
    /// peers must carry a TCP address, discovery nodes must carry a UDP
    /// address. Returns `None` if `addresses` is empty or the invariant is
    /// violated.
    pub fn new(identity: PeerIdentity, addresses: Vec<TransportAddress>, role: PeerRole) -> Option<Self> {
        if addresses.is_empty() {
            return None;
        }
        let ok = match role {
            PeerRole::OverlayPeer => addresses.iter().any(TransportAddress::has_tcp),
            PeerRole::DiscoveryNode => addresses.iter().any(TransportAddress::has_udp),
        };
        if !ok {
            return None;
        }
        Some(PeerInfo {
            identity,
            addresses,
        })
    }

    /// `true` if none of this peer's addresses advertise a TCP component —
    /// i.e. it is reachable only via the discovery (UDP) transport.
    pub fn is_discovery_only(&self) -> bool {
        !self.addresses.iter().any(TransportAddress::has_tcp)
    }
}

/// The ENR application fields the engine tracks: the raw `eth2` bytes (fork
/// digest + next-fork info) and the raw `attnets` bitfield bytes.
///
/// Equality intentionally ignores `attnets` — only `eth2` participates, per
/// the "first bootstrap record wins" merge rule in §4.B.
#[derive(Debug, Clone)]
pub struct ENRFieldPair {
    pub eth2: Vec<u8>,
    pub attnets: Vec<u8>,
}

impl PartialEq for ENRFieldPair {
    fn eq(&self, other: &Self) -> bool {
        self.eth2 == other.eth2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_address_round_trips_kind() {
        let a = TransportAddress::tcp("127.0.0.1".parse().unwrap(), 9000);
        assert!(a.has_tcp());
        assert!(!a.has_udp());

        let b = TransportAddress::udp("::1".parse().unwrap(), 9001);
        assert!(b.has_udp());
        assert!(!b.has_tcp());
    }

    #[test]
    fn field_pair_equality_ignores_attnets() {
        let a = ENRFieldPair {
            eth2: vec![1, 2, 3, 4],
            attnets: vec![0xff],
        };
        let b = ENRFieldPair {
            eth2: vec![1, 2, 3, 4],
            attnets: vec![0x00],
        };
        assert_eq!(a, b);
    }

    #[test]
    fn peer_info_requires_matching_transport_for_role() {
        let id = PeerIdentity(PeerId::random());
        let udp_only = vec![TransportAddress::udp("1.2.3.4".parse().unwrap(), 9000)];
        assert!(PeerInfo::new(id, udp_only.clone(), PeerRole::OverlayPeer).is_none());
        assert!(PeerInfo::new(id, udp_only, PeerRole::DiscoveryNode).is_some());
    }

    #[test]
    fn peer_info_rejects_empty_address_list() {
        let id = PeerIdentity(PeerId::random());
        assert!(PeerInfo::new(id, vec![], PeerRole::OverlayPeer).is_none());
    }

    #[test]
    fn secp256k1_peer_identity_round_trips_to_node_id() {
        let keypair = libp2p::identity::Keypair::generate_secp256k1();
        let public_key = keypair.public();
        let expected_raw = raw_secp256k1_pubkey(&public_key).expect("secp256k1 key has a raw form");

        let identity = PeerIdentity(PeerId::from(public_key));
        let node_id = peer_identity_to_node_id(&identity).expect("secp256k1 identity must convert");
        assert_eq!(node_id, NodeId::from_raw_pubkey(&expected_raw));
    }

    #[test]
    fn ed25519_peer_identity_has_no_node_id() {
        let keypair = libp2p::identity::Keypair::generate_ed25519();
        let identity = PeerIdentity(PeerId::from(keypair.public()));
        assert!(peer_identity_to_node_id(&identity).is_none());
    }
}
