use crate::GIT_COMMIT_HASH;
use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::OnceCell;
use opentelemetry::{
    global, propagation::TextMapCompositePropagator, trace::TracerProvider as _, KeyValue,
};
use opentelemetry_otlp::{Compression, WithExportConfig, WithTonicConfig};
use opentelemetry_sdk::{
    propagation::{BaggagePropagator, TraceContextPropagator},
    trace::{SdkTracerProvider, Tracer},
    Resource,
};
use std::{env, time::Duration};
use tonic::{
    metadata::{Ascii, MetadataKey, MetadataMap, MetadataValue},
    transport::ClientTlsConfig,
};
use tracing::{debug, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use ulid::Ulid;
use url::Url;

static TRACER_PROVIDER: OnceCell<SdkTracerProvider> = OnceCell::new();

const EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

// Dependencies that are noisy at the levels this service logs at.
const QUIET_TARGETS: [&str; 6] = [
    "hyper=error",
    "h2=error",
    "tonic=error",
    "tokio=error",
    "sqlx=warn",
    "opentelemetry_sdk=warn",
];

/// OTLP span export settings, read from the `OTEL_EXPORTER_OTLP_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Exporter {
    endpoint: Url,
    headers: Vec<(String, String)>,
    instance_id: String,
}

impl Exporter {
    /// `Ok(None)` when `OTEL_EXPORTER_OTLP_ENDPOINT` is unset or blank.
    fn from_env() -> Result<Option<Self>> {
        let Some(endpoint) = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|endpoint| !endpoint.trim().is_empty())
        else {
            return Ok(None);
        };

        if let Ok(protocol) = env::var("OTEL_EXPORTER_OTLP_PROTOCOL") {
            if protocol != "grpc" {
                debug!(%protocol, "OTLP protocol ignored, spans are sent over grpc");
            }
        }

        Ok(Some(Self {
            endpoint: parse_endpoint(&endpoint)?,
            headers: env::var("OTEL_EXPORTER_OTLP_HEADERS")
                .map(|headers| parse_headers(&headers))
                .unwrap_or_default(),
            instance_id: env::var("OTEL_SERVICE_INSTANCE_ID")
                .unwrap_or_else(|_| Ulid::new().to_string()),
        }))
    }

    fn endpoint(&self) -> &str {
        self.endpoint.as_str().trim_end_matches('/')
    }

    fn tls(&self) -> Option<ClientTlsConfig> {
        if self.endpoint.scheme() != "https" {
            return None;
        }

        let host = self.endpoint.host_str()?;
        Some(ClientTlsConfig::new().domain_name(host).with_native_roots())
    }

    fn metadata(&self) -> Result<MetadataMap> {
        let mut metadata = MetadataMap::with_capacity(self.headers.len());

        for (name, value) in &self.headers {
            let key = MetadataKey::<Ascii>::from_bytes(name.as_bytes())
                .map_err(|e| anyhow!("invalid OTLP header name {name}: {e}"))?;
            let value: MetadataValue<Ascii> = value
                .parse()
                .map_err(|e| anyhow!("invalid OTLP header value for {name}: {e}"))?;
            metadata.insert(key, value);
        }

        Ok(metadata)
    }

    fn resource(&self) -> Resource {
        Resource::builder_empty()
            .with_attributes([
                KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                KeyValue::new("service.instance.id", self.instance_id.clone()),
                KeyValue::new("vcs.revision", GIT_COMMIT_HASH),
            ])
            .build()
    }

    /// Build the batch exporter, register the provider and propagators globally.
    fn install(&self) -> Result<Tracer> {
        let mut builder = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .with_endpoint(self.endpoint())
            .with_compression(Compression::Gzip)
            .with_timeout(EXPORT_TIMEOUT);

        if let Some(tls) = self.tls() {
            builder = builder.with_tls_config(tls);
        }

        if !self.headers.is_empty() {
            builder = builder.with_metadata(self.metadata()?);
        }

        let exporter = builder
            .build()
            .with_context(|| format!("failed to build OTLP exporter for {}", self.endpoint()))?;

        let provider = SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(self.resource())
            .build();

        let _ = TRACER_PROVIDER.set(provider.clone());

        global::set_tracer_provider(provider.clone());
        global::set_text_map_propagator(TextMapCompositePropagator::new(vec![
            Box::new(TraceContextPropagator::new()),
            Box::new(BaggagePropagator::new()),
        ]));

        Ok(provider.tracer(env!("CARGO_PKG_NAME")))
    }
}

// A bare `host:port` means https.
fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let endpoint = endpoint.trim();
    let absolute = if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("https://{endpoint}")
    };

    let url =
        Url::parse(&absolute).with_context(|| format!("invalid OTLP endpoint: {endpoint}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        bail!("unsupported OTLP endpoint scheme: {}", url.scheme());
    }
    if url.host_str().is_none() {
        bail!("OTLP endpoint has no host: {endpoint}");
    }

    Ok(url)
}

// "k1=v1,k2=v2", pairs without `=` are skipped.
fn parse_headers(headers: &str) -> Vec<(String, String)> {
    headers
        .split(',')
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim().to_ascii_lowercase();
            (!name.is_empty()).then(|| (name, value.trim().to_string()))
        })
        .collect()
}

fn env_filter(level: Level) -> Result<EnvFilter> {
    // RUST_LOG overrides the verbosity flag
    QUIET_TARGETS.iter().try_fold(
        EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy(),
        |filter, directive| Ok(filter.add_directive(directive.parse()?)),
    )
}

/// Install the global subscriber: pretty logs, plus span export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
///
/// # Errors
///
/// Returns an error if the exporter settings are invalid or a global
/// subscriber is already installed
pub fn init(verbosity_level: Option<Level>) -> Result<()> {
    let filter = env_filter(verbosity_level.unwrap_or(Level::ERROR))?;

    let otel_layer = match Exporter::from_env()? {
        Some(exporter) => Some(tracing_opentelemetry::layer().with_tracer(exporter.install()?)),
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_file(false)
                .with_line_number(false)
                .pretty(),
        )
        .with(otel_layer)
        .with(filter)
        .try_init()?;

    Ok(())
}

/// Flush pending spans, noop when export is off.
pub fn shutdown_tracer() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        debug!("shutting down tracer provider");
        if let Err(e) = provider.shutdown() {
            debug!("tracer provider shutdown failed: {e}");
        }
    }
}
