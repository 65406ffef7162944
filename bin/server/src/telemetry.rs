//! Logging and trace export.
//!
//! Logs always go to stdout through the fmt layer. When an OTLP endpoint is
//! configured, spans are additionally exported over OTLP/HTTP. The tracer
//! provider is owned by [`Telemetry`] and is never installed as the global
//! OpenTelemetry provider.

use opentelemetry::Context;
use opentelemetry::KeyValue;
use opentelemetry::trace::{Span as _, TraceContextExt as _, Tracer as _, TracerProvider as _};
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Sampler, SdkTracer, SdkTracerProvider};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::TelemetryConfig;

const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Owner of the trace pipeline.
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
    service_name: String,
}

impl Telemetry {
    /// Installs the tracing subscriber and, when configured, the OTLP
    /// exporter.
    ///
    /// A failure to build the exporter is logged and tracing continues
    /// without export.
    pub fn init(config: &TelemetryConfig) -> Self {
        let exporter = config
            .otlp_endpoint
            .as_deref()
            .map(|endpoint| build_provider(endpoint, &config.service_name));

        let (provider, export_error) = match exporter {
            Some(Ok(provider)) => (Some(provider), None),
            Some(Err(reason)) => (None, Some(reason)),
            None => (None, None),
        };

        let otel_layer = provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(config.service_name.clone()))
        });

        let initialized = tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
            .with(tracing_subscriber::fmt::layer())
            .with(otel_layer)
            .try_init()
            .is_ok();
        if !initialized {
            tracing::debug!("Tracing already initialized, skipping");
        }

        if let Some(reason) = export_error {
            warn!(error = %reason, "Failed to create trace exporter; continuing without export");
        }
        info!(
            service = %config.service_name,
            otlp_enabled = provider.is_some(),
            "Tracing initialized"
        );

        Self::new(provider, config.service_name.clone())
    }

    fn new(provider: Option<SdkTracerProvider>, service_name: String) -> Self {
        Self {
            provider,
            service_name,
        }
    }

    /// Whether spans are exported.
    pub fn exporting(&self) -> bool {
        self.provider.is_some()
    }

    fn tracer(&self) -> Option<SdkTracer> {
        self.provider
            .as_ref()
            .map(|provider| provider.tracer(self.service_name.clone()))
    }

    /// Emits the startup demonstration spans.
    pub fn record_startup_spans(&self) {
        let Some(tracer) = self.tracer() else {
            return;
        };

        tracer.in_span("operation", |cx| {
            cx.span()
                .add_event("Nice operation!", vec![KeyValue::new("bogons", 100_i64)]);
            sub_operation(&tracer, &cx);
        });
    }

    /// Flushes and stops the exporter.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(e) = provider.shutdown() {
                warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
    }
}

fn sub_operation(tracer: &SdkTracer, cx: &Context) {
    let mut span = tracer.start_with_context("Sub operation...", cx);
    span.add_event("Sub span event", Vec::new());
    span.end();
}

fn build_provider(endpoint: &str, service_name: &str) -> Result<SdkTracerProvider, String> {
    let exporter = SpanExporter::builder()
        .with_http()
        .with_endpoint(format!("{}/v1/traces", endpoint.trim_end_matches('/')))
        .build()
        .map_err(|e| e.to_string())?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_sampler(Sampler::AlwaysOn)
        .with_resource(resource)
        .build())
}
