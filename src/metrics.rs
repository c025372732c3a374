//! Prometheus metrics for the fan-out service

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub http_requests_total: IntCounter,
    pub http_requests_in_flight: IntGauge,
    pub http_request_duration_seconds: Histogram,
    pub fanout_requests_total: IntCounter,
    pub jobs_created_total: IntCounter,
    pub worker_wake_failures_total: IntCounter,
    pub history_clears_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total =
            IntCounter::new("http_requests_total", "Total number of HTTP requests")?;
        let http_requests_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "Number of HTTP requests currently being served",
        )?;
        let http_request_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request latency in seconds",
        ))?;
        let fanout_requests_total = IntCounter::new(
            "fanout_requests_total",
            "Trade submissions accepted by the fan-out service",
        )?;
        let jobs_created_total =
            IntCounter::new("jobs_created_total", "Job rows inserted by fan-out")?;
        let worker_wake_failures_total = IntCounter::new(
            "worker_wake_failures_total",
            "Worker wake-up pings that could not be delivered",
        )?;
        let history_clears_total =
            IntCounter::new("history_clears_total", "Delete-all history operations")?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_in_flight.clone()))?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;
        registry.register(Box::new(fanout_requests_total.clone()))?;
        registry.register(Box::new(jobs_created_total.clone()))?;
        registry.register(Box::new(worker_wake_failures_total.clone()))?;
        registry.register(Box::new(history_clears_total.clone()))?;

        Ok(Self {
            registry,
            http_requests_total,
            http_requests_in_flight,
            http_request_duration_seconds,
            fanout_requests_total,
            jobs_created_total,
            worker_wake_failures_total,
            history_clears_total,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
