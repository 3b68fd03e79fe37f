use tracing::Subscriber;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Build a JSON-formatting subscriber filtered by `RUST_LOG`
///
/// `default_filter` applies when `RUST_LOG` is unset or invalid.
pub fn get_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync + 'static {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json()
        .with_current_span(true);

    Registry::default().with(env_filter).with(formatting_layer)
}

/// Install the structured logger as the global default
///
/// Can only succeed once per process; later calls are ignored.
pub fn init_telemetry() {
    if get_subscriber("info").try_init().is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
