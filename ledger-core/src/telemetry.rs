//! Tracing subscriber setup for embedding layers
//!
//! The core only emits `tracing` events; whichever web or CLI layer embeds
//! it decides where they go. This hook installs a sensible default fmt
//! subscriber driven by `RUST_LOG`.

/// Install the default fmt subscriber (INFO unless `RUST_LOG` overrides).
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .try_init();
}
