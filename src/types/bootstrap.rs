//! The `BootstrapAddress` sum type: either a signed discovery record or a
//! composite multiaddress with an embedded peer identity.

use libp2p::Multiaddr;

/// An ENR alias matching the one used throughout `eth2_libp2p`: a
/// `discv5`-flavoured ENR keyed by the `enr` crate's `CombinedKey`.
pub type Enr = discv5::enr::Enr<discv5::enr::CombinedKey>;

/// A single entry from the bootstrap list. Every instance originates from a
/// successfully parsed source — malformed inputs are rejected at parse time
/// in `bootstrap::load` and never constructed here.
#[derive(Debug, Clone)]
pub enum BootstrapAddress {
    /// A signed, self-describing discovery record (`enr:-...`).
    Record(Enr),
    /// A layered transport multiaddress with an embedded `/p2p/<id>`
    /// component.
    Multi(Multiaddr),
}

impl BootstrapAddress {
    /// Re-encodes the inner value to its canonical string form. Used by the
    /// round-trip property in §8: `parse(encode(x)) == x`.
    pub fn to_canonical_string(&self) -> String {
        match self {
            BootstrapAddress::Record(enr) => enr.to_base64(),
            BootstrapAddress::Multi(addr) => addr.to_string(),
        }
    }
}

impl PartialEq for BootstrapAddress {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BootstrapAddress::Record(a), BootstrapAddress::Record(b)) => {
                a.to_base64() == b.to_base64()
            }
            (BootstrapAddress::Multi(a), BootstrapAddress::Multi(b)) => a == b,
            _ => false,
        }
    }
}
