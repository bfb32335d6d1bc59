//! CLI surface (§6): a single invocation, no subcommands, parsed with the
//! `clap` builder API matching `boot_node`'s pinned `clap = "2.33.3"`.

use clap::{App, Arg, ArgMatches};
use libp2p::Multiaddr;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// The transport engine selected by `-f/--floodsub` and `-g/--gossipsub`.
/// Both flags are parsed and stored (§9 "GossipSub always" quirk): the
/// transport layer unconditionally builds GossipSub regardless of this
/// value, matching the original tool's observed behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubsubEngine {
    FloodSub,
    GossipSub,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub verbosity: String,
    pub full_peer_id: bool,
    pub pubsub_engine: PubsubEngine,
    pub fork_digest_override: Option<[u8; 4]>,
    pub sign: bool,
    pub topics: Vec<String>,
    pub custom_topics: Vec<String>,
    pub bootfile: Option<String>,
    pub bootnodes: Vec<String>,
    pub decode: bool,
    pub discovery_port: u16,
    pub eth_port: u16,
    pub bind_address: Ipv4Addr,
    pub max_peers: usize,
    pub no_discovery: bool,
}

fn parse_fork_digest(raw: &str) -> Result<[u8; 4], String> {
    let stripped = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = hex::decode(stripped).map_err(|e| format!("invalid hex: {}", e))?;
    if bytes.len() != 4 {
        return Err(format!("fork digest must be 4 bytes, got {}", bytes.len()));
    }
    let mut out = [0u8; 4];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn parse_bind_address(raw: &str) -> Result<Ipv4Addr, String> {
    if let Ok(addr) = Multiaddr::from_str(raw) {
        for protocol in addr.iter() {
            if let libp2p::multiaddr::Protocol::Ip4(ip) = protocol {
                return Ok(ip);
            }
        }
        return Err("bind address multiaddr has no /ip4/ component".to_string());
    }
    Ipv4Addr::from_str(raw).map_err(|e| format!("{}", e))
}

fn build_app<'a, 'b>() -> App<'a, 'b> {
    App::new("beacon-sentinel")
        .version("0.1.0")
        .author("Sigma Prime <contact@sigmaprime.io>")
        .about("Passive network inspector for an Ethereum2-style beacon-chain overlay")
        .arg(
            Arg::with_name("verbosity")
                .short("v")
                .long("verbosity")
                .value_name("LEVEL")
                .help("Log verbosity level")
                .takes_value(true)
                .default_value("trace"),
        )
        .arg(
            Arg::with_name("fullpeerid")
                .short("p")
                .long("fullpeerid")
                .help("Render full (rather than short) peer identities in logs"),
        )
        .arg(
            Arg::with_name("floodsub")
                .short("f")
                .long("floodsub")
                .help("Select the FloodSub pub/sub engine"),
        )
        .arg(
            Arg::with_name("gossipsub")
                .short("g")
                .long("gossipsub")
                .help("Select the GossipSub pub/sub engine"),
        )
        .arg(
            Arg::with_name("forkdigest")
                .long("forkdigest")
                .value_name("HEX")
                .help("4-byte hex fork digest override")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("sign")
                .short("s")
                .long("sign")
                .help("Sign and verify pub/sub envelopes"),
        )
        .arg(
            Arg::with_name("topics")
                .short("t")
                .long("topics")
                .value_name("CODE")
                .help("Repeatable short-code topic filter (*, a, b, e, ps, as)")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("custom")
                .short("c")
                .long("custom")
                .value_name("TOPIC")
                .help("Repeatable verbatim topic name to subscribe to")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("bootfile")
                .short("l")
                .long("bootfile")
                .value_name("PATH")
                .help("Path to a newline-delimited bootstrap list file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("bootnodes")
                .short("b")
                .long("bootnodes")
                .value_name("ENTRY")
                .help("Repeatable bootstrap entry (discovery record or multiaddr)")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1),
        )
        .arg(
            Arg::with_name("decode")
                .short("d")
                .long("decode")
                .help("Enable canonical message decoding"),
        )
        .arg(
            Arg::with_name("discoveryPort")
                .long("discoveryPort")
                .value_name("PORT")
                .help("UDP discovery port")
                .takes_value(true)
                .default_value("9000"),
        )
        .arg(
            Arg::with_name("ethPort")
                .long("ethPort")
                .value_name("PORT")
                .help("TCP overlay port")
                .takes_value(true)
                .default_value("9000"),
        )
        .arg(
            Arg::with_name("bindAddress")
                .long("bindAddress")
                .value_name("ADDR")
                .help("Bind address")
                .takes_value(true)
                .default_value("/ip4/0.0.0.0"),
        )
        .arg(
            Arg::with_name("maxPeers")
                .long("maxPeers")
                .value_name("N")
                .help("Discovery target peer population")
                .takes_value(true)
                .default_value("100"),
        )
        .arg(
            Arg::with_name("noDiscovery")
                .long("noDiscovery")
                .help("Disable the Discovery Loop"),
        )
}

fn from_matches(matches: &ArgMatches) -> Result<Config, String> {
    let pubsub_engine = if matches.is_present("gossipsub") {
        PubsubEngine::GossipSub
    } else {
        PubsubEngine::FloodSub
    };

    let fork_digest_override = matches
        .value_of("forkdigest")
        .map(parse_fork_digest)
        .transpose()?;

    let bind_address = parse_bind_address(matches.value_of("bindAddress").unwrap())?;

    let discovery_port = matches
        .value_of("discoveryPort")
        .unwrap()
        .parse::<u16>()
        .map_err(|e| format!("invalid discoveryPort: {}", e))?;
    let eth_port = matches
        .value_of("ethPort")
        .unwrap()
        .parse::<u16>()
        .map_err(|e| format!("invalid ethPort: {}", e))?;
    let max_peers = matches
        .value_of("maxPeers")
        .unwrap()
        .parse::<usize>()
        .map_err(|e| format!("invalid maxPeers: {}", e))?;

    Ok(Config {
        verbosity: matches.value_of("verbosity").unwrap().to_string(),
        full_peer_id: matches.is_present("fullpeerid"),
        pubsub_engine,
        fork_digest_override,
        sign: matches.is_present("sign"),
        topics: matches
            .values_of("topics")
            .map(|v| v.map(str::to_string).collect())
            .unwrap_or_default(),
        custom_topics: matches
            .values_of("custom")
            .map(|v| v.map(str::to_string).collect())
            .unwrap_or_default(),
        bootfile: matches.value_of("bootfile").map(str::to_string),
        bootnodes: matches
            .values_of("bootnodes")
            .map(|v| v.map(str::to_string).collect())
            .unwrap_or_default(),
        decode: matches.is_present("decode"),
        discovery_port,
        eth_port,
        bind_address,
        max_peers,
        no_discovery: matches.is_present("noDiscovery"),
    })
}

/// Parses `std::env::args()` into a `Config`.
pub fn parse() -> Result<Config, String> {
    let app = build_app();
    let matches = app.get_matches();
    from_matches(&matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_args(args: &[&str]) -> Config {
        let app = build_app();
        let matches = app.get_matches_from(args);
        from_matches(&matches).expect("should parse")
    }

    #[test]
    fn defaults_match_spec_table() {
        let conf = parse_args(&["beacon-sentinel"]);
        assert_eq!(conf.discovery_port, 9000);
        assert_eq!(conf.eth_port, 9000);
        assert_eq!(conf.max_peers, 100);
        assert!(!conf.decode);
        assert!(!conf.no_discovery);
        assert_eq!(conf.pubsub_engine, PubsubEngine::FloodSub);
        assert_eq!(conf.bind_address, Ipv4Addr::new(0, 0, 0, 0));
    }

    #[test]
    fn gossipsub_flag_is_recorded() {
        let conf = parse_args(&["beacon-sentinel", "-g"]);
        assert_eq!(conf.pubsub_engine, PubsubEngine::GossipSub);
    }

    #[test]
    fn repeatable_topics_accumulate_in_order() {
        let conf = parse_args(&["beacon-sentinel", "-t", "a", "-t", "b"]);
        assert_eq!(conf.topics, vec!["a", "b"]);
    }

    #[test]
    fn fork_digest_accepts_0x_prefix() {
        let conf = parse_args(&["beacon-sentinel", "--forkdigest", "0x01020304"]);
        assert_eq!(conf.fork_digest_override, Some([1, 2, 3, 4]));
    }

    #[test]
    fn fork_digest_rejects_wrong_length() {
        let app = build_app();
        let matches = app
            .get_matches_from_safe(vec!["beacon-sentinel", "--forkdigest", "0x0102"])
            .unwrap();
        assert!(from_matches(&matches).is_err());
    }

    #[test]
    fn bind_address_accepts_bare_ipv4() {
        let conf = parse_args(&["beacon-sentinel", "--bindAddress", "192.168.1.1"]);
        assert_eq!(conf.bind_address, Ipv4Addr::new(192, 168, 1, 1));
    }
}
