//! Per-service request counters/histograms, registered against the global
//! `prometheus::default_registry()` the way the teacher's sink traits do,
//! scaled down to the two series every DGC service actually needs.

use prometheus::{HistogramVec, IntCounterVec, Opts};

#[derive(Clone)]
pub struct ServiceMetrics {
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
}

impl ServiceMetrics {
    /// Registers `{service}_requests_total{route,status}` and
    /// `{service}_request_duration_seconds{route}` against the default
    /// registry. Call once per process; a second call for the same
    /// `service` name will fail to register (mirrors a real binary, which
    /// only ever constructs one of these at startup).
    pub fn new(service: &str) -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new(
                format!("{service}_requests_total"),
                "Total HTTP requests handled, by route and status code",
            ),
            &["route", "status"],
        )?;
        let request_duration = HistogramVec::new(
            prometheus::HistogramOpts::new(
                format!("{service}_request_duration_seconds"),
                "HTTP request latency in seconds, by route",
            ),
            &["route"],
        )?;

        prometheus::register(Box::new(requests_total.clone()))?;
        prometheus::register(Box::new(request_duration.clone()))?;

        Ok(ServiceMetrics {
            requests_total,
            request_duration,
        })
    }

    pub fn record(&self, route: &str, status: u16, elapsed_secs: f64) {
        self.requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
        self.request_duration
            .with_label_values(&[route])
            .observe(elapsed_secs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_without_panicking() {
        let metrics = ServiceMetrics::new("telemetry_test_svc").unwrap();
        metrics.record("/health", 200, 0.001);
        metrics.record("/health", 500, 0.2);
    }
}
