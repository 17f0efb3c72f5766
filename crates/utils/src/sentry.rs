use sentry_tracing::{EventFilter, SentryLayer};
use tracing::Level;
use tracing_subscriber::registry::LookupSpan;

/// Initialise the Sentry client when a DSN is configured.
///
/// The returned guard must be held for the lifetime of the process so queued
/// events are flushed on shutdown.
pub fn init_once(dsn: Option<&str>) -> Option<sentry::ClientInitGuard> {
    let dsn = dsn.filter(|d| !d.trim().is_empty())?;
    let environment = if cfg!(debug_assertions) {
        "dev"
    } else {
        "production"
    };
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(environment.into()),
            ..Default::default()
        },
    )))
}

/// Tracing layer forwarding errors as Sentry events and warnings as breadcrumbs.
pub fn sentry_layer<S>() -> SentryLayer<S>
where
    S: tracing::Subscriber,
    S: for<'a> LookupSpan<'a>,
{
    sentry_tracing::layer().event_filter(|meta| match *meta.level() {
        Level::ERROR => EventFilter::Event,
        Level::WARN => EventFilter::Breadcrumb,
        _ => EventFilter::Ignore,
    })
}
