//! Message Decoder (§4.H): snappy-decompresses and dispatches a received
//! `(topic, bytes)` pair to the matching canonical SSZ type, emitting a
//! structured log event. Never fatal; every failure is logged and
//! swallowed.

use crate::globals::RunStats;
use crate::transport::GOSSIP_MAX_SIZE;
use crate::types::messages::{
    Attestation, AttesterSlashing, ProposerSlashing, SignedBeaconBlock, SignedVoluntaryExit,
};
use slog::{info, warn, Logger};
use ssz::Decode;

/// Always emits the raw-message event; additionally attempts canonical
/// decoding when `decode_enabled`.
pub fn decode_message(topic: &str, data: &[u8], decode_enabled: bool, stats: &RunStats, log: &Logger) {
    stats.record_message_received();
    info!(log, "received pubsub message";
        "topic" => topic, "size" => data.len(), "data" => hex::encode(data));

    if !decode_enabled {
        return;
    }

    let payload = match topic.ends_with("_snappy") {
        true => match decompress(data, log) {
            Some(bytes) => bytes,
            None => return,
        },
        false => data.to_vec(),
    };

    let decoded = dispatch(topic, &payload);
    match decoded {
        Ok(description) => {
            stats.record_message_decoded();
            info!(log, "decoded pubsub message"; "topic" => topic, "type" => description);
        }
        Err(reason) => {
            stats.record_decode_failure();
            info!(log, "unable to decode message"; "topic" => topic, "reason" => reason);
        }
    }
}

fn decompress(data: &[u8], log: &Logger) -> Option<Vec<u8>> {
    match snap::raw::decompress_len(data) {
        Ok(len) if len > GOSSIP_MAX_SIZE => {
            warn!(log, "oversize snappy payload"; "decompressed_len" => len, "limit" => GOSSIP_MAX_SIZE);
            None
        }
        Ok(_) => match snap::raw::Decoder::new().decompress_vec(data) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(log, "failed to decompress snappy payload"; "error" => format!("{}", e));
                None
            }
        },
        Err(e) => {
            warn!(log, "failed to read snappy frame header"; "error" => format!("{}", e));
            None
        }
    }
}

/// Dispatches on the topic-name tail (§4.H table), returning a short
/// description of the decoded type on success.
fn dispatch(topic: &str, payload: &[u8]) -> Result<&'static str, String> {
    if topic.contains("/beacon_block") {
        SignedBeaconBlock::from_ssz_bytes(payload)
            .map(|_| "SignedBeaconBlock")
            .map_err(|e| format!("{:?}", e))
    } else if topic.contains("/beacon_attestation_") {
        Attestation::from_ssz_bytes(payload)
            .map(|_| "Attestation")
            .map_err(|e| format!("{:?}", e))
    } else if topic.contains("/voluntary_exit") {
        SignedVoluntaryExit::from_ssz_bytes(payload)
            .map(|_| "SignedVoluntaryExit")
            .map_err(|e| format!("{:?}", e))
    } else if topic.contains("/proposer_slashing") {
        ProposerSlashing::from_ssz_bytes(payload)
            .map(|_| "ProposerSlashing")
            .map_err(|e| format!("{:?}", e))
    } else if topic.contains("/attester_slashing") {
        AttesterSlashing::from_ssz_bytes(payload)
            .map(|_| "AttesterSlashing")
            .map_err(|e| format!("{:?}", e))
    } else if topic.contains("/beacon_aggregate_and_proof") {
        crate::types::messages::AggregateAndProof::from_ssz_bytes(payload)
            .map(|_| "AggregateAndProof")
            .map_err(|e| format!("{:?}", e))
    } else {
        Err(format!("no decoder registered for topic {}", topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::build_logger;
    use crate::types::messages::{BeaconBlockHeader, BlsSignatureBytes, Hash256, RawBitlist};
    use ssz::Encode;

    fn test_log() -> Logger {
        build_logger("error")
    }

    #[test]
    fn non_snappy_topic_decodes_raw_bytes() {
        let header = BeaconBlockHeader {
            slot: 1,
            proposer_index: 2,
            parent_root: Hash256::repeat_byte(1),
            state_root: Hash256::repeat_byte(2),
            body_root: Hash256::repeat_byte(3),
        };
        let block = SignedBeaconBlock {
            message: header,
            body: RawBitlist(vec![]),
            signature: BlsSignatureBytes([9u8; 96]),
        };
        let bytes = block.as_ssz_bytes();
        let stats = RunStats::default();
        let log = test_log();
        decode_message("/eth2/01020304/beacon_block/not_snappy", &bytes, true, &stats, &log);
        assert_eq!(
            stats.messages_decoded.load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[test]
    fn decode_disabled_never_touches_stats_decode_counters() {
        let stats = RunStats::default();
        let log = test_log();
        decode_message("/eth2/01020304/beacon_block/ssz_snappy", b"garbage", false, &stats, &log);
        assert_eq!(
            stats.messages_decoded.load(std::sync::atomic::Ordering::Relaxed),
            0
        );
        assert_eq!(
            stats.decode_failures.load(std::sync::atomic::Ordering::Relaxed),
            0
        );
    }

    #[test]
    fn garbage_snappy_payload_is_logged_and_swallowed() {
        let stats = RunStats::default();
        let log = test_log();
        decode_message(
            "/eth2/01020304/beacon_block/ssz_snappy",
            b"not a valid snappy frame",
            true,
            &stats,
            &log,
        );
        assert_eq!(
            stats.decode_failures.load(std::sync::atomic::Ordering::Relaxed),
            0
        );
        assert_eq!(
            stats.messages_decoded.load(std::sync::atomic::Ordering::Relaxed),
            0
        );
    }
}
