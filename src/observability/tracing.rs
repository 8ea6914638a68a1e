use anyhow::{Context, Error, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{KeyValue, global, trace::TracerProvider};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracer, SdkTracerProvider},
};
use tracing::{Subscriber, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::MakeWriter,
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

const SERVICE_NAME: &str = "headline-bias";

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Installs the global tracing subscriber once per process.
///
/// JSON logs go to stdout, filtered by `RUST_LOG` (default `info`). When
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set spans are also exported over OTLP; if the
/// exporter cannot be built the service keeps running with logs only.
///
/// # Errors
/// Returns an error if another global subscriber was already installed.
pub fn init() -> Result<()> {
    install(std::io::stdout)
}

/// Same as [`init`] but logs go to stderr, leaving stdout to command output.
///
/// # Errors
/// Returns an error if another global subscriber was already installed.
pub fn init_stderr() -> Result<()> {
    install(std::io::stderr)
}

fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_target(false)
        .json()
        .with_writer(writer)
}

fn install<W>(writer: W) -> Result<()>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    TRACING_INIT.get_or_try_init(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let registry = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer(writer));

        match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok() {
            Some(endpoint) => match init_tracer(&endpoint) {
                Ok(tracer) => {
                    registry
                        .with(tracing_opentelemetry::layer().with_tracer(tracer))
                        .try_init()
                        .map_err(|e| Error::msg(e.to_string()))?;
                    info!(otel_enabled = true, endpoint = %endpoint, "tracing initialized");
                }
                Err(e) => {
                    registry
                        .try_init()
                        .map_err(|e| Error::msg(e.to_string()))?;
                    info!(
                        otel_enabled = false,
                        error = %e,
                        "tracing initialized without OpenTelemetry (exporter init failed)"
                    );
                }
            },
            None => {
                registry
                    .try_init()
                    .map_err(|e| Error::msg(e.to_string()))?;
                info!(otel_enabled = false, "tracing initialized");
            }
        }

        Ok::<(), Error>(())
    })?;
    Ok(())
}

/// Builds the OTLP tracer. `OTEL_SAMPLING_RATIO` controls sampling (default 1.0).
fn init_tracer(endpoint: &str) -> Result<SdkTracer> {
    let sampling_ratio = std::env::var("OTEL_SAMPLING_RATIO")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(1.0);

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .context("failed to build OTLP span exporter")?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new("service.name", SERVICE_NAME),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ])
        .build();

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::TraceIdRatioBased(sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource)
        .build();

    let tracer = tracer_provider.tracer(SERVICE_NAME);
    global::set_tracer_provider(tracer_provider);

    Ok(tracer)
}
