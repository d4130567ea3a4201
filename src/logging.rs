use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
///
/// Diagnostics go to stderr so command output on stdout stays parseable.
/// `RUST_LOG` overrides the default `land_registry=info` filter; `verbose`
/// raises the default to debug.
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "land_registry=debug"
    } else {
        "land_registry=info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();
}
