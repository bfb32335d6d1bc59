//! Terminal logger setup. Follows the lighthouse convention of building a
//! `slog` drain from `slog-term` + `slog-async` and selecting the severity
//! filter from the CLI's `-v/--verbosity` flag.

use slog::{o, Drain, Level, Logger};
use std::str::FromStr;

/// Builds the root logger for the process.
///
/// `verbosity` accepts the standard level names (`trace`, `debug`, `info`,
/// `warn`, `error`, `crit`), case-insensitively. Unrecognised values fall
/// back to `trace`, matching the CLI's stated default.
pub fn build_logger(verbosity: &str) -> Logger {
    let level = Level::from_str(&verbosity.to_lowercase()).unwrap_or(Level::Trace);

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).chan_size(2048).build().fuse();
    let drain = slog::LevelFilter::new(drain, level).fuse();

    Logger::root(drain, o!())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_verbosity_falls_back_to_trace() {
        // Doesn't panic and produces a usable logger.
        let log = build_logger("not-a-level");
        slog::info!(log, "smoke test");
    }
}
