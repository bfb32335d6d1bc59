//! Passive network inspector for an Ethereum2-style beacon-chain overlay.
//! See `SPEC_FULL.md` for the full component breakdown; this binary only
//! wires the CLI, logger, and `run::run` together.

mod bootstrap;
mod config;
mod discovery;
mod engine;
mod enr;
mod error;
mod globals;
mod logging;
mod peer_info;
mod run;
mod transport;
mod types;

use slog::crit;

#[tokio::main]
async fn main() {
    let conf = match config::parse() {
        Ok(conf) => conf,
        Err(e) => {
            eprintln!("invalid arguments: {}", e);
            std::process::exit(1);
        }
    };

    let log = logging::build_logger(&conf.verbosity);

    if let Err(e) = run::run(conf, log.clone()).await {
        crit!(log, "fatal error"; "error" => format!("{}", e));
        std::process::exit(1);
    }
}
