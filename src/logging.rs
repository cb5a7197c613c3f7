use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static INIT: Once = Once::new();

/// Environment variable holding the log filter, e.g.
/// `DOWNLOADS_INDEX_LOG=downloads_index=debug,tower_http=info`.
pub const LOG_ENV: &str = "DOWNLOADS_INDEX_LOG";

/// Installs the global subscriber. Later calls are no-ops.
///
/// Logs go to stderr so `render` and `rewrite` output on stdout stays clean.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("downloads_index=info"));

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(filter)
            .init();
    });
}
