//! Prometheus metrics registry and instruments.
//!
//! Instruments are process-global; `/metrics` serves whatever has been
//! registered by [`init_metrics`].

use lazy_static::lazy_static;
use prometheus::{Counter, IntCounter, IntCounterVec, Opts, Registry, core::Collector};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("homefeed_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");

    // Domain Metrics
    pub static ref POSTING_VIEWS_TOTAL: IntCounter = IntCounter::new(
        "homefeed_posting_views_total",
        "Total number of posting detail views"
    ).expect("metric can be created");
    pub static ref LIKES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("homefeed_likes_total", "Total number of like writes"),
        &["action"]
    ).expect("metric can be created");
    pub static ref SIGNUPS_TOTAL: IntCounter = IntCounter::new(
        "homefeed_signups_total",
        "Total number of completed signups"
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref MEDIA_UPLOADS_TOTAL: IntCounter = IntCounter::new(
        "homefeed_media_uploads_total",
        "Total number of media uploads"
    ).expect("metric can be created");
    pub static ref MEDIA_BYTES_UPLOADED: Counter = Counter::new(
        "homefeed_media_bytes_uploaded_total",
        "Total bytes of media uploaded"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("homefeed_errors_total", "Total number of error responses"),
        &["code"]
    ).expect("metric can be created");
}

/// Register every instrument with [`REGISTRY`].
///
/// Fails if called twice against the same registry.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    let collectors: Vec<Box<dyn Collector>> = vec![
        Box::new(HTTP_REQUESTS_TOTAL.clone()),
        Box::new(POSTING_VIEWS_TOTAL.clone()),
        Box::new(LIKES_TOTAL.clone()),
        Box::new(SIGNUPS_TOTAL.clone()),
        Box::new(MEDIA_UPLOADS_TOTAL.clone()),
        Box::new(MEDIA_BYTES_UPLOADED.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];
    for collector in collectors {
        REGISTRY.register(collector)?;
    }

    tracing::info!("Metrics registry initialized");
    Ok(())
}
