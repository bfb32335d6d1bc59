//! Canonical wire envelopes decoded by the Message Decoder (§4.H).
//!
//! These model the *envelope* fields a passive inspector logs (slot,
//! proposer/validator indices, roots, signatures) via `eth2_ssz_derive`,
//! the same derive macro `consensus/types` uses. Full per-fork block-body
//! internals (eth1 data, deposits, sync aggregates, execution payloads) are
//! out of scope for this tool — see `DESIGN.md` — and are not modeled;
//! decoding stops at the fields needed to produce a meaningful log line.
//! No cryptographic verification is performed on any field (Non-goal).

use ethereum_types::H256;
use ssz::{Decode, DecodeError, Encode};
use ssz_derive::{Decode as SszDecode, Encode as SszEncode};

pub type Hash256 = H256;

/// A raw, unverified BLS signature (96 bytes, G2 point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlsSignatureBytes(pub [u8; 96]);

impl Encode for BlsSignatureBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }
    fn ssz_fixed_len() -> usize {
        96
    }
    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
    fn ssz_bytes_len(&self) -> usize {
        96
    }
}

impl Decode for BlsSignatureBytes {
    fn is_ssz_fixed_len() -> bool {
        true
    }
    fn ssz_fixed_len() -> usize {
        96
    }
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() != 96 {
            return Err(DecodeError::InvalidByteLength {
                len: bytes.len(),
                expected: 96,
            });
        }
        let mut out = [0u8; 96];
        out.copy_from_slice(bytes);
        Ok(BlsSignatureBytes(out))
    }
}

/// An SSZ `List[byte, N]` bitlist, kept as its raw encoded bytes. The
/// overlay's canonical bound (`MAX_VALIDATORS_PER_COMMITTEE`) is not
/// enforced here; see the open question on `attnets`/bitlist bounds in
/// `DESIGN.md`. Decodes as a variable-length byte list, same wire shape as
/// `Vec<u8>` in `eth2_ssz`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBitlist(pub Vec<u8>);

impl Encode for RawBitlist {
    fn is_ssz_fixed_len() -> bool {
        false
    }
    fn ssz_append(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.0);
    }
    fn ssz_bytes_len(&self) -> usize {
        self.0.len()
    }
}

impl Decode for RawBitlist {
    fn is_ssz_fixed_len() -> bool {
        false
    }
    fn from_ssz_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Ok(RawBitlist(bytes.to_vec()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, SszEncode, SszDecode)]
pub struct Checkpoint {
    pub epoch: u64,
    pub root: Hash256,
}

#[derive(Debug, Clone, PartialEq, Eq, SszEncode, SszDecode)]
pub struct AttestationData {
    pub slot: u64,
    pub index: u64,
    pub beacon_block_root: Hash256,
    pub source: Checkpoint,
    pub target: Checkpoint,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct Attestation {
    pub aggregation_bits: RawBitlist,
    pub data: AttestationData,
    pub signature: BlsSignatureBytes,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct AggregateAndProof {
    pub aggregator_index: u64,
    pub aggregate: Attestation,
    pub selection_proof: BlsSignatureBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, SszEncode, SszDecode)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: Hash256,
    pub state_root: Hash256,
    pub body_root: Hash256,
}

/// A signed beacon block, modeled at the header level: the full body tree
/// is decoded as an opaque trailing byte blob (see module docs).
#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct SignedBeaconBlock {
    pub message: BeaconBlockHeader,
    pub body: RawBitlist,
    pub signature: BlsSignatureBytes,
}

#[derive(Debug, Clone, PartialEq, Eq, SszEncode, SszDecode)]
pub struct VoluntaryExit {
    pub epoch: u64,
    pub validator_index: u64,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct SignedVoluntaryExit {
    pub message: VoluntaryExit,
    pub signature: BlsSignatureBytes,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct SignedBeaconBlockHeader {
    pub message: BeaconBlockHeader,
    pub signature: BlsSignatureBytes,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct ProposerSlashing {
    pub signed_header_1: SignedBeaconBlockHeader,
    pub signed_header_2: SignedBeaconBlockHeader,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct IndexedAttestation {
    pub attesting_indices: RawBitlist,
    pub data: AttestationData,
    pub signature: BlsSignatureBytes,
}

#[derive(Debug, Clone, PartialEq, SszEncode, SszDecode)]
pub struct AttesterSlashing {
    pub attestation_1: IndexedAttestation,
    pub attestation_2: IndexedAttestation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voluntary_exit_round_trips() {
        let exit = SignedVoluntaryExit {
            message: VoluntaryExit {
                epoch: 42,
                validator_index: 7,
            },
            signature: BlsSignatureBytes([7u8; 96]),
        };
        let bytes = exit.as_ssz_bytes();
        let decoded = SignedVoluntaryExit::from_ssz_bytes(&bytes).unwrap();
        assert_eq!(exit, decoded);
    }

    #[test]
    fn signature_rejects_wrong_length() {
        assert!(BlsSignatureBytes::from_ssz_bytes(&[0u8; 10]).is_err());
    }

    #[test]
    fn beacon_block_header_round_trips() {
        let header = BeaconBlockHeader {
            slot: 100,
            proposer_index: 3,
            parent_root: Hash256::repeat_byte(1),
            state_root: Hash256::repeat_byte(2),
            body_root: Hash256::repeat_byte(3),
        };
        let bytes = header.as_ssz_bytes();
        assert_eq!(BeaconBlockHeader::from_ssz_bytes(&bytes).unwrap(), header);
    }
}
