//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Install a formatted tracing subscriber.
///
/// Honors `RUST_LOG` when set; otherwise logs at `debug` when `verbose`
/// and `info` when not.
///
/// # Errors
///
/// Returns error if a global subscriber is already installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
}

#[cfg(feature = "otel")]
mod otel {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::{
        Resource,
        trace::{RandomIdGenerator, Sampler, TracerProvider},
    };
    use opentelemetry_stdout::SpanExporter;
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    /// Initialize OpenTelemetry with a stdout span exporter.
    ///
    /// Spans are exported alongside human-readable logs, both filtered by
    /// `RUST_LOG`.
    ///
    /// # Errors
    ///
    /// Returns error if subscriber initialization fails.
    pub fn init_telemetry() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let provider = TracerProvider::builder()
            .with_simple_exporter(SpanExporter::default())
            .with_id_generator(RandomIdGenerator::default())
            .with_sampler(Sampler::AlwaysOn)
            .with_resource(Resource::default())
            .build();

        let tracer = provider.tracer("fabula");
        opentelemetry::global::set_tracer_provider(provider);

        let telemetry_layer = tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(EnvFilter::from_default_env());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_filter(EnvFilter::from_default_env());

        tracing_subscriber::registry()
            .with(telemetry_layer)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }

    /// Flush pending spans before exit.
    pub fn shutdown_telemetry() {
        opentelemetry::global::shutdown_tracer_provider();
    }
}

#[cfg(feature = "otel")]
pub use otel::{init_telemetry, shutdown_telemetry};
