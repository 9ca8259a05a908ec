//! Tracing subscriber setup with optional OTLP export

use anyhow::{Context, Result};
use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_semantic_conventions as semconv;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use crate::VERSION;
use crate::config::{LoggingConfig, TelemetryConfig};

/// Keeps the OpenTelemetry providers alive; call [`TelemetryGuard::shutdown`] before exit
#[derive(Default)]
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    /// Flush pending spans and log records
    pub fn shutdown(self) {
        if let Some(provider) = self.tracer_provider
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shut down tracer provider: {e}");
        }
        if let Some(provider) = self.logger_provider
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shut down logger provider: {e}");
        }
    }
}

fn resource(service_name: &str) -> Resource {
    Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attribute(KeyValue::new(semconv::resource::SERVICE_VERSION, VERSION))
        .build()
}

fn env_filter(level: &str) -> Result<EnvFilter> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("Invalid log level '{level}'"))?,
    };
    // Exporter internals would otherwise feed back into the log bridge
    Ok(filter
        .add_directive("opentelemetry=warn".parse()?)
        .add_directive("hyper=warn".parse()?))
}

/// Install the global subscriber: console output plus OTLP traces and logs when an endpoint is set
pub fn init(logging: &LoggingConfig, telemetry: &TelemetryConfig) -> Result<TelemetryGuard> {
    let mut guard = TelemetryGuard::default();

    let fmt_layer = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    let (trace_layer, log_layer) = match telemetry.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let endpoint = endpoint.trim_end_matches('/');
            let resource = resource(&telemetry.service_name);

            let span_exporter = SpanExporter::builder()
                .with_http()
                .with_endpoint(format!("{endpoint}/v1/traces"))
                .build()
                .context("Failed to build OTLP span exporter")?;
            let tracer_provider = SdkTracerProvider::builder()
                .with_batch_exporter(span_exporter)
                .with_resource(resource.clone())
                .build();
            let tracer = tracer_provider.tracer(telemetry.service_name.clone());

            let log_exporter = LogExporter::builder()
                .with_http()
                .with_endpoint(format!("{endpoint}/v1/logs"))
                .build()
                .context("Failed to build OTLP log exporter")?;
            let logger_provider = SdkLoggerProvider::builder()
                .with_batch_exporter(log_exporter)
                .with_resource(resource)
                .build();
            let bridge = OpenTelemetryTracingBridge::new(&logger_provider);

            guard.tracer_provider = Some(tracer_provider);
            guard.logger_provider = Some(logger_provider);
            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(bridge),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(trace_layer)
        .with(log_layer)
        .with(env_filter(&logging.level)?)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    if let Some(endpoint) = &telemetry.otlp_endpoint {
        tracing::info!("Exporting telemetry to {}", endpoint);
    }
    Ok(guard)
}
