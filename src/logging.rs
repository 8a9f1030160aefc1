//! Diagnostic logging on stderr via `tracing`.
//!
//! Verbosity comes from `-v` flags unless `RUST_LOG` is set, in which case the
//! environment filter wins. Passphrase bytes and key material are never logged.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Map the number of `-v` flags to a default filter directive.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "keyphrase=warn",
        1 => "keyphrase=info",
        2 => "keyphrase=debug",
        _ => "keyphrase=trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls are ignored.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
