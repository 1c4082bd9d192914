use crate::error::Result;
use tracing::Subscriber;
use tracing::subscriber::set_global_default;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Composes a tracing subscriber for the connector.
///
/// # Arguments
///
/// * `default_directives`: Filter directives used when `RUST_LOG` is not set,
///   e.g. `"info,vcloud=debug"`.
/// * `sink`: Destination where logs will be written to.
///
/// # Returns
///
/// `Subscriber` instance, compact in debug builds and JSON in release builds.
///
pub fn get_subscriber<Sink>(default_directives: &str, sink: Sink) -> impl Subscriber + Sync + Send
where
    Sink: for<'a> MakeWriter<'a> + Sync + Send + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_error| EnvFilter::new(default_directives));

    #[cfg(debug_assertions)]
    let subscriber_builder = tracing_subscriber::fmt().compact();
    #[cfg(not(debug_assertions))]
    let subscriber_builder = tracing_subscriber::fmt().json().with_current_span(true);

    subscriber_builder
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(sink)
        .finish()
}

/// Registers `subscriber` as the global default and routes `log` records into
/// it.
///
/// # Warning
///
/// Must be called **once** per process; a second call fails.
///
pub fn init_subscriber(subscriber: impl Subscriber + Sync + Send) -> Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;

    Ok(())
}
