//! Peer Info Builder (§4.C): constructs a `PeerInfo` from either a
//! composite multiaddress with an embedded `/p2p/<id>` suffix, or a
//! discovery record.

use crate::enr;
use crate::types::bootstrap::Enr;
use crate::types::peer::{NodeId, PeerIdentity, PeerInfo, PeerRole, TransportAddress};
use libp2p::multiaddr::Protocol;
use libp2p::{Multiaddr, PeerId};

/// Builds a `PeerInfo` from a `/.../p2p/<id>` multiaddress, splitting it
/// into its transport prefix and identity suffix. Fails if the identity is
/// absent or malformed, or if the remaining prefix carries no address
/// components.
pub fn from_multiaddr(addr: &Multiaddr) -> Option<PeerInfo> {
    let mut prefix = Multiaddr::empty();
    let mut peer_id = None;

    for protocol in addr.iter() {
        match protocol {
            Protocol::P2p(multihash) => {
                peer_id = Some(PeerId::from_multihash(multihash).ok()?);
            }
            other => prefix.push(other),
        }
    }

    let peer_id = peer_id?;
    let identity = PeerIdentity(peer_id);
    PeerInfo::new(
        identity,
        vec![TransportAddress(prefix)],
        PeerRole::OverlayPeer,
    )
}

/// Builds a `PeerInfo` from a discovery record: the secp256k1 public key
/// determines the `PeerIdentity`, and every `(ip, transport)` pair present
/// in the record becomes a candidate address. Fails if the public key is
/// absent/malformed or no addresses could be assembled for the requested
/// role.
pub fn from_enr(enr: &Enr, role: PeerRole) -> Option<PeerInfo> {
    let identity = PeerIdentity(enr.peer_id());
    let addresses = enr::transport_addresses(enr);
    PeerInfo::new(identity, addresses, role)
}

/// Converts a peer identity observed on the overlay into the discovery-layer
/// `NodeId`, used by the Resolver Loop (§4.F) to look the peer up via
/// `discovery.resolve`.
pub fn to_node_id(identity: &PeerIdentity) -> Option<NodeId> {
    crate::types::peer::peer_identity_to_node_id(identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn rejects_multiaddr_without_p2p_suffix() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/9000".parse().unwrap();
        assert!(from_multiaddr(&addr).is_none());
    }

    #[test]
    fn builds_peer_info_from_p2p_multiaddr() {
        let peer_id = PeerId::random();
        let addr: Multiaddr = format!("/ip4/127.0.0.1/tcp/9000/p2p/{}", peer_id)
            .parse()
            .unwrap();
        let info = from_multiaddr(&addr).expect("should build");
        assert_eq!(info.identity.0, peer_id);
        assert_eq!(info.addresses.len(), 1);
        assert!(info.addresses[0].has_tcp());
    }

    #[test]
    fn enr_with_no_tcp_or_udp_yields_no_peer_info() {
        let enr = Enr::from_str("enr:-IS4QHCYrYZbAKWCBRlAy5zzaDZXJBGkcnh4MHcBFZntXNFrdvJjX04jRzjzCBOonrkTfj499SZuOh8R33Ls8RRcy5wBgmlkgnY0gmlwhH8AAAGJc2VjcDI1NmsxoQPKY0yuDUmstAHYpMa2_oxVtw0RW_QAdpzBQA8yWM0xOIN1ZHCCdl8").unwrap();
        // This example record does carry udp; request the overlay-peer role
        // (TCP required) to exercise the discard path.
        assert!(from_enr(&enr, PeerRole::OverlayPeer).is_none());
    }
}
