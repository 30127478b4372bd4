#![forbid(unsafe_code)]

//! Opt-in `tracing-subscriber` setup.
//!
//! The library crates only emit `tracing` events. Binaries and test
//! harnesses that want them on stderr call [`init_tracing`] once.

use tracing_subscriber::EnvFilter;

use crate::error::{Error, Result};

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "XLATE_LOG";

/// Filter used when [`LOG_ENV`] is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Install a global fmt subscriber filtered by `XLATE_LOG`.
pub fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter)
}

/// Install a global fmt subscriber with an explicit filter directive.
pub fn init_tracing_with(filter: &str) -> Result<()> {
    install(EnvFilter::new(filter))
}

fn install(filter: EnvFilter) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| Error::Subscriber(err.to_string()))
}
