//! Record Decoder (§4.B): extracts peer identity, transport addresses,
//! fork digest and the ENR field pair from a discovery record, and folds
//! these across multiple bootstrap records with "first wins, warn on
//! mismatch" semantics.

use crate::types::bootstrap::Enr;
use crate::types::peer::{ENRFieldPair, TransportAddress};
use slog::{warn, Logger};
use std::net::{Ipv4Addr, Ipv6Addr};

/// The `eth2` ENR field: 4-byte fork digest + 4-byte next fork version +
/// 8-byte next fork epoch, SSZ-encoded (16 bytes total).
pub fn fork_digest(enr: &Enr) -> Option<[u8; 4]> {
    let raw = enr.get("eth2")?;
    if raw.len() < 4 {
        return None;
    }
    let mut fd = [0u8; 4];
    fd.copy_from_slice(&raw[0..4]);
    Some(fd)
}

/// Extracts the raw `eth2`/`attnets` byte pair, if both are present.
pub fn field_pair(enr: &Enr) -> Option<ENRFieldPair> {
    let eth2 = enr.get("eth2")?.to_vec();
    let attnets = enr.get("attnets").map(|b| b.to_vec()).unwrap_or_default();
    Some(ENRFieldPair { eth2, attnets })
}

/// Every valid `(ip, transport)` combination present in the record, each
/// emitted as an independent composite address. A record with neither a
/// usable TCP nor UDP coordinate yields an empty list.
pub fn transport_addresses(enr: &Enr) -> Vec<TransportAddress> {
    let mut out = Vec::with_capacity(4);

    let ip4: Option<Ipv4Addr> = enr.ip4();
    let ip6: Option<Ipv6Addr> = enr.ip6();
    let tcp4 = enr.tcp4();
    let udp4 = enr.udp4();
    let tcp6 = enr.tcp6();
    let udp6 = enr.udp6();

    if let Some(ip) = ip4 {
        if let Some(port) = tcp4 {
            out.push(TransportAddress::tcp(ip.into(), port));
        }
        if let Some(port) = udp4 {
            out.push(TransportAddress::udp(ip.into(), port));
        }
    }
    if let Some(ip) = ip6 {
        if let Some(port) = tcp6 {
            out.push(TransportAddress::tcp(ip.into(), port));
        }
        if let Some(port) = udp6 {
            out.push(TransportAddress::udp(ip.into(), port));
        }
    }
    out
}

/// Folds the fork digest across bootstrap records: first-seen wins,
/// differing subsequent values are logged and discarded.
pub fn merge_fork_digest(current: &mut Option<[u8; 4]>, candidate: [u8; 4], log: &Logger) {
    match current {
        None => *current = Some(candidate),
        Some(existing) if *existing != candidate => {
            warn!(log, "Bootstrap records disagree on fork digest";
                "kept" => hex::encode(existing), "ignored" => hex::encode(candidate));
        }
        Some(_) => {}
    }
}

/// Folds the ENR field pair across bootstrap records, same first-wins rule,
/// compared by `eth2` only (per `ENRFieldPair`'s `PartialEq`).
pub fn merge_field_pair(current: &mut Option<ENRFieldPair>, candidate: ENRFieldPair, log: &Logger) {
    match current {
        None => *current = Some(candidate),
        Some(existing) if *existing != candidate => {
            warn!(log, "Bootstrap records disagree on eth2 ENR field";
                "kept" => hex::encode(&existing.eth2), "ignored" => hex::encode(&candidate.eth2));
        }
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // A well-formed, publicly documented example ENR (mainnet bootnode style),
    // used purely to exercise field extraction.
    const EXAMPLE_ENR: &str = "enr:-IS4QHCYrYZbAKWCBRlAy5zzaDZXJBGkcnh4MHcBFZntXNFrdvJjX04jRzjzCBOonrkTfj499SZuOh8R33Ls8RRcy5wBgmlkgnY0gmlwhH8AAAGJc2VjcDI1NmsxoQPKY0yuDUmstAHYpMa2_oxVtw0RW_QAdpzBQA8yWM0xOIN1ZHCCdl8";

    #[test]
    fn decodes_example_enr_without_panicking() {
        let enr = Enr::from_str(EXAMPLE_ENR).expect("valid enr");
        let _ = transport_addresses(&enr);
        let _ = fork_digest(&enr);
        let _ = field_pair(&enr);
    }

    #[test]
    fn merge_keeps_first_fork_digest() {
        let log = crate::logging::build_logger("error");
        let mut current = None;
        merge_fork_digest(&mut current, [1, 2, 3, 4], &log);
        merge_fork_digest(&mut current, [9, 9, 9, 9], &log);
        assert_eq!(current, Some([1, 2, 3, 4]));
    }
}
