//! The topic-filter enumeration and the pure expansion from
//! `(fork_digest, filter set)` to concrete, `_snappy`-suffixed topic names.
//! Mirrors `eth2_libp2p::types::GossipKind` / `GossipTopic`, collapsed to
//! what a passive subscriber needs: topic-name construction, not publish
//! encoding.

/// Number of attestation subnets in the overlay's topic namespace.
pub const ATTESTATION_SUBNET_COUNT: u64 = 64;

/// The five subscribable message categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicFilter {
    Blocks,
    Attestations,
    VoluntaryExits,
    ProposerSlashings,
    AttesterSlashings,
}

impl TopicFilter {
    /// All five categories, in a fixed order (used when `--topics` is
    /// empty or `*`).
    pub fn all() -> Vec<TopicFilter> {
        vec![
            TopicFilter::Blocks,
            TopicFilter::Attestations,
            TopicFilter::VoluntaryExits,
            TopicFilter::ProposerSlashings,
            TopicFilter::AttesterSlashings,
        ]
    }

    /// Parses one operator-supplied short code. Case-insensitive. Returns
    /// `None` for unrecognised codes, which are silently ignored by the
    /// caller (§4.G boundary: "no error").
    pub fn parse_short_code(code: &str) -> Option<Vec<TopicFilter>> {
        match code.to_lowercase().as_str() {
            "*" => Some(TopicFilter::all()),
            "a" => Some(vec![TopicFilter::Attestations]),
            "b" => Some(vec![TopicFilter::Blocks]),
            "e" => Some(vec![TopicFilter::VoluntaryExits]),
            "ps" => Some(vec![TopicFilter::ProposerSlashings]),
            "as" => Some(vec![TopicFilter::AttesterSlashings]),
            _ => None,
        }
    }
}

/// A 4-byte fork digest.
pub type ForkDigest = [u8; 4];

fn fd_hex(fork_digest: ForkDigest) -> String {
    hex::encode(fork_digest)
}

fn beacon_blocks_topic(fork_digest: ForkDigest) -> String {
    format!("/eth2/{}/beacon_block/ssz_snappy", fd_hex(fork_digest))
}

fn voluntary_exits_topic(fork_digest: ForkDigest) -> String {
    format!(
        "/eth2/{}/voluntary_exit/ssz_snappy",
        fd_hex(fork_digest)
    )
}

fn proposer_slashings_topic(fork_digest: ForkDigest) -> String {
    format!(
        "/eth2/{}/proposer_slashing/ssz_snappy",
        fd_hex(fork_digest)
    )
}

fn attester_slashings_topic(fork_digest: ForkDigest) -> String {
    format!(
        "/eth2/{}/attester_slashing/ssz_snappy",
        fd_hex(fork_digest)
    )
}

fn attestation_topic(fork_digest: ForkDigest, subnet_id: u64) -> String {
    format!(
        "/eth2/{}/beacon_attestation_{}/ssz_snappy",
        fd_hex(fork_digest),
        subnet_id
    )
}

/// Expands a set of `TopicFilter`s and a fork digest into the concrete
/// topic-name list, per the table in §4.G. Pure in its two arguments.
pub fn expand(filters: &[TopicFilter], fork_digest: ForkDigest) -> Vec<String> {
    let mut out = Vec::new();
    for filter in filters {
        match filter {
            TopicFilter::Blocks => out.push(beacon_blocks_topic(fork_digest)),
            TopicFilter::VoluntaryExits => out.push(voluntary_exits_topic(fork_digest)),
            TopicFilter::ProposerSlashings => out.push(proposer_slashings_topic(fork_digest)),
            TopicFilter::AttesterSlashings => out.push(attester_slashings_topic(fork_digest)),
            TopicFilter::Attestations => {
                for subnet in 0..ATTESTATION_SUBNET_COUNT {
                    out.push(attestation_topic(fork_digest, subnet));
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_topics_means_all_five_categories() {
        let fd = [0x01, 0x02, 0x03, 0x04];
        let all = expand(&TopicFilter::all(), fd);
        // 4 singleton topics + ATTESTATION_SUBNET_COUNT subnet topics.
        assert_eq!(all.len(), 4 + ATTESTATION_SUBNET_COUNT as usize);
        assert!(all.iter().all(|t| t.ends_with("_snappy")));
    }

    #[test]
    fn short_code_star_equals_empty() {
        let fd = [0u8; 4];
        let star = TopicFilter::parse_short_code("*").unwrap();
        assert_eq!(expand(&star, fd), expand(&TopicFilter::all(), fd));
    }

    #[test]
    fn unrecognized_short_code_is_ignored() {
        assert!(TopicFilter::parse_short_code("zzz").is_none());
    }

    #[test]
    fn command_line_a_and_b_yields_subnet_count_plus_one() {
        let fd = [1, 2, 3, 4];
        let mut filters = TopicFilter::parse_short_code("a").unwrap();
        filters.extend(TopicFilter::parse_short_code("b").unwrap());
        let topics = expand(&filters, fd);
        assert_eq!(topics.len(), ATTESTATION_SUBNET_COUNT as usize + 1);
        assert!(topics.iter().all(|t| t.ends_with("_snappy")));
    }

    #[test]
    fn topic_construction_is_pure() {
        let fd = [9, 9, 9, 9];
        let once = expand(&[TopicFilter::Blocks], fd);
        let twice = expand(&[TopicFilter::Blocks], fd);
        assert_eq!(once, twice);
    }
}
