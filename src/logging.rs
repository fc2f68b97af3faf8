use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the process-wide subscriber. Library code only emits events;
/// the binary decides where they go.
pub fn init() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
