use opentelemetry::{trace::TraceError, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{trace as sdktrace, Resource};
use opentelemetry_semantic_conventions::resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,herdbook=info,sqlx=warn,sea_orm=warn";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    /// One flattened JSON object per event, with the request span attached.
    Json,
}

impl LogFormat {
    /// Anything but `json` (case-insensitive) falls back to text.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

fn otlp_tracer(service_name: &str, endpoint: String) -> Result<sdktrace::Tracer, TraceError> {
    let resource = Resource::new(vec![KeyValue::new(
        resource::SERVICE_NAME,
        service_name.to_string(),
    )]);

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(
            opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(endpoint),
        )
        .with_trace_config(
            sdktrace::config()
                .with_resource(resource)
                .with_sampler(sdktrace::Sampler::AlwaysOn),
        )
        .install_batch(opentelemetry_sdk::runtime::Tokio)
}

/// Installs the global subscriber. Reads `RUST_LOG`, `RUST_LOG_FORMAT` and
/// `OTEL_EXPORTER_OTLP_ENDPOINT`.
pub fn init_telemetry(service_name: &str) {
    let format = LogFormat::parse(std::env::var("RUST_LOG_FORMAT").ok().as_deref());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let tracer = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => match otlp_tracer(service_name, endpoint) {
            Ok(tracer) => Some(tracer),
            Err(e) => {
                // No subscriber yet to report through.
                eprintln!("OpenTelemetry export disabled: {}", e);
                None
            }
        },
        Err(_) => None,
    };
    let otel_layer = tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t));

    let registry = tracing_subscriber::registry().with(filter).with(otel_layer);
    match format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true),
            )
            .init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
