//! Bootstrap Loader (§4.A): reads the optional bootstrap file, appends the
//! CLI-supplied bootstrap list, and classifies each candidate into a
//! `BootstrapAddress`. Parse failures are logged and skipped; they never
//! abort the load.

use crate::types::bootstrap::{BootstrapAddress, Enr};
use libp2p::multiaddr::Protocol;
use libp2p::Multiaddr;
use slog::{warn, Logger};
use std::str::FromStr;

/// If `line` has the shape `- "INNER"` (a leading dash, then a
/// double-quoted token, and nothing else), returns `INNER` verbatim.
/// Otherwise returns `line` unchanged.
pub fn unwrap_yaml_list_item(line: &str) -> &str {
    let line = line.trim();
    if let Some(rest) = line.strip_prefix('-') {
        let rest = rest.trim_start();
        if let Some(quoted) = rest.strip_prefix('"') {
            if let Some(inner) = quoted.strip_suffix('"') {
                if !inner.contains('"') {
                    return inner;
                }
            }
        }
    }
    line
}

/// `true` if the multiaddr carries a `/p2p/<id>` component.
fn has_p2p_component(addr: &Multiaddr) -> bool {
    addr.iter().any(|p| matches!(p, Protocol::P2p(_)))
}

fn has_tcp_component(addr: &Multiaddr) -> bool {
    addr.iter().any(|p| matches!(p, Protocol::Tcp(_)))
}

fn has_udp_component(addr: &Multiaddr) -> bool {
    addr.iter().any(|p| matches!(p, Protocol::Udp(_)))
}

/// Classifies one trimmed, unwrapped candidate string into a
/// `BootstrapAddress`, applying the `enr:`/`ETH2BN`/`DISCV5BN` rules from
/// §4.A. Returns `Err(reason)` for anything that should be rejected with a
/// warning.
pub fn classify(candidate: &str) -> Result<BootstrapAddress, String> {
    if let Some(enr_str) = candidate.strip_prefix("enr:") {
        return Enr::from_str(&format!("enr:{}", enr_str))
            .map(BootstrapAddress::Record)
            .map_err(|e| format!("invalid discovery record: {}", e));
    }

    let addr: Multiaddr = candidate
        .parse()
        .map_err(|e| format!("not a discovery record or multiaddr: {:?}", e))?;

    if !has_p2p_component(&addr) {
        return Err("multiaddr missing /p2p/<id> component".to_string());
    }
    if has_tcp_component(&addr) || has_udp_component(&addr) {
        Ok(BootstrapAddress::Multi(addr))
    } else {
        Err("multiaddr carries neither tcp nor udp".to_string())
    }
}

/// Reads the optional bootstrap file and merges it with the CLI-supplied
/// `cli_bootnodes`, producing the uniform `BootstrapAddress` list. Never
/// fails outright — per-line failures are logged as warnings and skipped;
/// the caller treats an empty result as fatal.
pub fn load(
    bootfile: Option<&str>,
    cli_bootnodes: &[String],
    log: &Logger,
) -> Vec<BootstrapAddress> {
    let mut candidates: Vec<String> = Vec::new();

    if let Some(path) = bootfile {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                for raw_line in contents.split('\n') {
                    let line = raw_line.trim_end_matches('\r').trim();
                    if line.is_empty() {
                        continue;
                    }
                    candidates.push(unwrap_yaml_list_item(line).to_string());
                }
            }
            Err(e) => {
                warn!(log, "Failed to read bootstrap file"; "path" => path, "error" => format!("{}", e));
            }
        }
    }

    candidates.extend(cli_bootnodes.iter().cloned());

    let mut out = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match classify(&candidate) {
            Ok(parsed) => out.push(parsed),
            Err(reason) => {
                warn!(log, "Skipping unparseable bootstrap entry"; "entry" => candidate, "reason" => reason);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_log() -> Logger {
        crate::logging::build_logger("error")
    }

    #[test]
    fn unwraps_yaml_list_item() {
        assert_eq!(unwrap_yaml_list_item("- \"enr:-abc\""), "enr:-abc");
        assert_eq!(unwrap_yaml_list_item("enr:-abc"), "enr:-abc");
        assert_eq!(unwrap_yaml_list_item("  -  \"X\"  "), "X");
    }

    #[test]
    fn yaml_unwrap_round_trips_classification() {
        let peer_id = libp2p::PeerId::random();
        let raw = format!("/ip4/1.2.3.4/tcp/9000/p2p/{}", peer_id);
        let wrapped = format!("- \"{}\"", raw);
        let a = classify(unwrap_yaml_list_item(&wrapped));
        let b = classify(&raw);
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(
            a.unwrap().to_canonical_string(),
            b.unwrap().to_canonical_string()
        );
    }

    #[test]
    fn rejects_multiaddr_without_p2p() {
        assert!(classify("/ip4/1.2.3.4/tcp/9000").is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(classify("junk").is_err());
    }

    #[test]
    fn loader_file_with_mixed_validity_scenario() {
        let peer_id = libp2p::PeerId::random();
        let contents = format!(
            "- \"enr:-Iu4QAhO0f5d1KAQuH4jjSbW2GOBkVYbUbqwVoPDGaqPdkvNLgR7ZqHr1XCQVh4Y\"\n\n\
             junk\n\
             /ip4/1.2.3.4/tcp/9000/p2p/{}\n",
            peer_id
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boot.txt");
        std::fs::write(&path, contents).unwrap();

        let log = test_log();
        let result = load(Some(path.to_str().unwrap()), &[], &log);
        // The "enr:" line above is deliberately malformed (truncated), so
        // only the valid multiaddr line survives classification.
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn empty_lines_are_skipped_and_cli_entries_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("boot.txt");
        std::fs::write(&path, "\n\n\n").unwrap();

        let peer_id = libp2p::PeerId::random();
        let cli = vec![format!("/ip4/9.9.9.9/tcp/9000/p2p/{}", peer_id)];
        let log = test_log();
        let result = load(Some(path.to_str().unwrap()), &cli, &log);
        assert_eq!(result.len(), 1);
    }
}
