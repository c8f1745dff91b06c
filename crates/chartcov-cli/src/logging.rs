//! Tracing subscriber setup

use crate::config::CliConfig;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset
#[must_use]
pub fn default_filter(config: &CliConfig) -> EnvFilter {
    EnvFilter::new(config.verbosity.filter_directive())
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over the verbosity flags. Events go to
/// stderr so reports on stdout stay machine-readable. A second call is a
/// no-op.
pub fn init_logging(config: &CliConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.use_color())
                .with_target(false),
        )
        .try_init();
}
