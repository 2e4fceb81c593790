use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset: quiet dependencies, run-level
/// progress from our own crates
pub const DEFAULT_FILTER: &str =
    "warn,aqs=info,aqs_cli=info,aqs_core=info,aqs_sampler=info,aqs_ingest=info,aqs_config=info";

/// Initialize logging.
/// - RUST_LOG respected; defaults to [`DEFAULT_FILTER`]
/// - human-readable or JSON lines, always on stderr so stdout stays the report
pub fn init(service_name: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!(service = %service_name, "Observability initialized");
}
