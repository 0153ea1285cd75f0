use tracing_subscriber::{
    EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

pub struct TracerOptions<'a> {
    /// Filter directive used when `RUST_LOG` is not set, e.g. `info` or `waveform_analysis=debug`.
    pub default_filter: &'a str,
    /// Emit span enter/exit timings alongside events.
    pub with_span_events: bool,
}

impl Default for TracerOptions<'_> {
    fn default() -> Self {
        Self {
            default_filter: "info",
            with_span_events: false,
        }
    }
}

/// Installs the global `tracing` subscriber for a component.
///
/// Log lines go to stderr so that reports written to stdout stay machine readable.
/// The filter is taken from `RUST_LOG` if present, otherwise from [TracerOptions::default_filter].
pub struct TracerEngine {
    service_name: String,
}

impl TracerEngine {
    pub fn new(options: TracerOptions, service_name: &str) -> Result<Self, TryInitError> {
        let log_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.default_filter));

        let span_events = if options.with_span_events {
            tracing_subscriber::fmt::format::FmtSpan::CLOSE
        } else {
            tracing_subscriber::fmt::format::FmtSpan::NONE
        };

        let stderr_tracer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(span_events);

        tracing_subscriber::Registry::default()
            .with(stderr_tracer.with_filter(log_filter))
            .try_init()?;

        tracing::debug!("Tracer initialised for {service_name}");
        Ok(Self {
            service_name: service_name.to_owned(),
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }
}
