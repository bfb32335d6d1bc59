//! Error types for the inspector. Mirrors the `error-chain` convention used
//! throughout `eth2_libp2p`/`network`: a single `Error`/`Result` pair, with
//! foreign errors wrapped via `foreign_links`.

error_chain::error_chain! {
    foreign_links {
        Io(std::io::Error);
    }

    errors {
        /// No bootstrap addresses were supplied or all failed to parse.
        NoBootstraps {
            description("no usable bootstrap addresses")
            display("no usable bootstrap addresses were supplied")
        }
        /// Bootstraps were supplied but none are dialable as overlay peers.
        NoDialableBootstraps {
            description("no dialable overlay bootstraps")
            display("bootstrap list contained no direct-dial or ENR overlay peers")
        }
        /// Fork digest could not be determined from bootstraps or the CLI.
        MissingForkDigest {
            description("fork digest unresolved")
            display("no fork digest: not present in any bootstrap record and not supplied with --forkdigest")
        }
        /// The configured bind address could not be parsed.
        InvalidBindAddress(addr: String) {
            description("invalid bind address")
            display("invalid bind address: {}", addr)
        }
        /// A lower-level transport or discovery failure that should be fatal.
        Transport(msg: String) {
            description("transport error")
            display("transport error: {}", msg)
        }
        Discovery(msg: String) {
            description("discovery error")
            display("discovery error: {}", msg)
        }
    }
}
