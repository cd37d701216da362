//! Prometheus Metrics for Scribe
//!
//! Two kinds of metrics live here:
//! - Static counters and histograms (HTTP traffic, cache flushes, process)
//!   registered once in the default registry
//! - Pollable gauges registered per component through [`MetricsRegistry`],
//!   whose value is read from a supplier on every scrape

use lazy_static::lazy_static;
use parking_lot::RwLock;
use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{
    Encoder, Histogram, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Registry,
    TextEncoder, register_histogram, register_histogram_vec, register_int_counter,
    register_int_counter_vec, register_int_gauge_vec,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

lazy_static! {
    // ============================================================================
    // Write-behind Cache Metrics
    // ============================================================================

    /// Flush cycles by outcome (success, error)
    pub static ref CACHE_FLUSH_TOTAL: IntCounterVec = register_int_counter_vec!(
        "scribe_cache_flush_total",
        "Total number of write-behind flush cycles by outcome",
        &["status"]
    ).unwrap();

    /// Duration of the batch persistence call
    pub static ref CACHE_FLUSH_DURATION: Histogram = register_histogram!(
        "scribe_cache_flush_duration_seconds",
        "Write-behind batch persistence latency in seconds",
        vec![0.0001, 0.001, 0.01, 0.1, 1.0, 10.0]
    ).unwrap();

    /// Entities durably written by flush cycles
    pub static ref CACHE_FLUSHED_ENTITIES_TOTAL: IntCounter = register_int_counter!(
        "scribe_cache_flushed_entities_total",
        "Total number of entities persisted by flush cycles"
    ).unwrap();

    /// Entities dropped because their batch failed to persist
    pub static ref CACHE_DROPPED_ENTITIES_TOTAL: IntCounter = register_int_counter!(
        "scribe_cache_dropped_entities_total",
        "Total number of entities lost to failed flush cycles"
    ).unwrap();

    // ============================================================================
    // HTTP Server Metrics
    // ============================================================================

    /// HTTP requests total
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "scribe_http_requests_total",
        "Total HTTP requests",
        &["method", "path", "status"]
    ).unwrap();

    /// HTTP request duration
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "scribe_http_request_duration_seconds",
        "HTTP request latency in seconds",
        &["method", "path"],
        vec![0.001, 0.01, 0.1, 1.0, 10.0]
    ).unwrap();

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Process memory usage
    pub static ref PROCESS_MEMORY_BYTES: IntGaugeVec = register_int_gauge_vec!(
        "scribe_process_memory_bytes",
        "Process memory usage in bytes",
        &["type"]
    ).unwrap();

    /// Process CPU usage (percentage * 100)
    pub static ref PROCESS_CPU_USAGE: IntGaugeVec = register_int_gauge_vec!(
        "scribe_process_cpu_usage_percent",
        "Process CPU usage percentage",
        &["core"]
    ).unwrap();
}

/// Metrics error types
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("Metrics output is not UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

type Supplier = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Gauge whose value is pulled from a supplier at collection time
struct SupplierGauge {
    gauge: IntGauge,
    supplier: Supplier,
}

impl Collector for SupplierGauge {
    fn desc(&self) -> Vec<&Desc> {
        self.gauge.desc()
    }

    fn collect(&self) -> Vec<MetricFamily> {
        self.gauge.set((self.supplier)());
        self.gauge.collect()
    }
}

/// Registry for component-owned, pollable metrics.
///
/// Each instance is independent, so several services (or tests) can register
/// the same gauge name without clashing. [`MetricsRegistry::encode`] also
/// includes the process-wide static metrics.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    registry: Registry,
    gauges: Arc<RwLock<HashMap<String, Supplier>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an integer gauge read from `supplier` on every scrape.
    ///
    /// The supplier runs on the scraping thread and must not block.
    pub fn register_gauge<F>(&self, name: &str, help: &str, supplier: F) -> Result<(), MetricsError>
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        let supplier: Supplier = Arc::new(supplier);
        let gauge = IntGauge::new(name, help)?;
        self.registry.register(Box::new(SupplierGauge {
            gauge,
            supplier: Arc::clone(&supplier),
        }))?;
        self.gauges.write().insert(name.to_string(), supplier);
        tracing::debug!("Registered gauge {}", name);
        Ok(())
    }

    /// Current value of a registered gauge, if any
    pub fn gauge_value(&self, name: &str) -> Option<i64> {
        self.gauges.read().get(name).map(|supplier| supplier())
    }

    /// Encode this registry and the static metrics to Prometheus text format
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut families = prometheus::gather();
        families.extend(self.registry.gather());

        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        encoder.encode(&families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

/// Record the outcome of one flush cycle
pub fn record_cache_flush(status: &str, entities: usize, duration_secs: f64) {
    CACHE_FLUSH_TOTAL.with_label_values(&[status]).inc();
    CACHE_FLUSH_DURATION.observe(duration_secs);
    match status {
        "success" => CACHE_FLUSHED_ENTITIES_TOTAL.inc_by(entities as u64),
        _ => CACHE_DROPPED_ENTITIES_TOTAL.inc_by(entities as u64),
    }
}

/// Record HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}
