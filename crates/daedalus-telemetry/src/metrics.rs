//! Request metrics.
//!
//! Metrics are recorded through the `metrics` facade; installing a recorder
//! (Prometheus or otherwise) is left to the application. Without a recorder
//! every call here is a no-op.
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `daedalus_requests_total` | Counter | `method`, `route`, `status` | Dispatched requests |
//! | `daedalus_request_duration_seconds` | Histogram | `method`, `route` | Dispatch latency |
//! | `daedalus_in_flight_requests` | Gauge | - | Requests being processed |
//! | `daedalus_validation_failures_total` | Counter | `kind`, `stage` | Validation failures |

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};

/// Route label used when no route matched.
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

/// Registers descriptions for all standard metrics.
///
/// Call once after installing a recorder.
pub fn describe_metrics() {
    describe_counter!(
        "daedalus_requests_total",
        "Total number of HTTP requests dispatched"
    );
    describe_histogram!(
        "daedalus_request_duration_seconds",
        "HTTP request dispatch duration in seconds"
    );
    describe_gauge!(
        "daedalus_in_flight_requests",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "daedalus_validation_failures_total",
        "Total request and response validation failures"
    );
}

/// Records a completed request.
pub fn record_request(method: &str, route: &str, status_code: u16, duration: Duration) {
    counter!(
        "daedalus_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status_code.to_string()
    )
    .increment(1);

    histogram!(
        "daedalus_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Records a validation failure.
///
/// `kind` is `"request"` or `"response"`; `stage` is the failure stage.
pub fn record_validation_failure(kind: &'static str, stage: &'static str) {
    counter!(
        "daedalus_validation_failures_total",
        "kind" => kind,
        "stage" => stage
    )
    .increment(1);
}

/// Tracks one in-flight request; decrements the gauge on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    _private: (),
}

impl InFlightGuard {
    /// Increments the in-flight gauge.
    #[must_use]
    pub fn new() -> Self {
        gauge!("daedalus_in_flight_requests").increment(1.0);
        Self { _private: () }
    }
}

impl Default for InFlightGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        gauge!("daedalus_in_flight_requests").decrement(1.0);
    }
}
