//! # Collector de Métricas
//! src/metrics/collector.rs
//!
//! Recolecta métricas de requests en tiempo real: totales, códigos de
//! estado, requests por ruta, latencias (ventana acotada) y timeouts.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::http::StatusCode;

/// Latencias que se guardan para calcular percentiles
const MAX_LATENCIES: usize = 10_000;

/// Collector thread-safe; los clones comparten los mismos datos
#[derive(Clone, Debug)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsData>>,
    start_time: Instant,
}

#[derive(Debug, Default)]
struct MetricsData {
    total_requests: u64,

    /// 503 producidos por el middleware de timeout
    timed_out: u64,

    status_codes: HashMap<u16, u64>,

    /// Latencias en microsegundos, las más antiguas primero
    latencies: VecDeque<u64>,

    requests_per_route: HashMap<String, u64>,

    active_connections: u64,
}

/// Snapshot serializable para `/metrics`
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub timed_out: u64,
    pub active_connections: u64,
    pub status_codes: BTreeMap<u16, u64>,
    pub requests_per_route: BTreeMap<String, u64>,
    pub latency_us: LatencySummary,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LatencySummary {
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub avg: u64,
    pub samples: usize,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MetricsData {
                latencies: VecDeque::with_capacity(MAX_LATENCIES),
                ..MetricsData::default()
            })),
            start_time: Instant::now(),
        }
    }

    /// Registra un request terminado.
    ///
    /// Un 503 solo lo produce el middleware de timeout, así que cuenta como
    /// request expirado.
    pub fn record_request(&self, route: &str, status: StatusCode, latency: Duration) {
        let mut data = self.inner.lock();

        data.total_requests += 1;
        if status == StatusCode::ServiceUnavailable {
            data.timed_out += 1;
        }
        *data.status_codes.entry(status.as_u16()).or_insert(0) += 1;
        *data.requests_per_route.entry(route.to_string()).or_insert(0) += 1;

        if data.latencies.len() >= MAX_LATENCIES {
            data.latencies.pop_front();
        }
        data.latencies.push_back(latency.as_micros() as u64);
    }

    pub fn increment_active_connections(&self) {
        self.inner.lock().active_connections += 1;
    }

    pub fn decrement_active_connections(&self) {
        let mut data = self.inner.lock();
        data.active_connections = data.active_connections.saturating_sub(1);
    }

    pub fn active_connections(&self) -> u64 {
        self.inner.lock().active_connections
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let data = self.inner.lock();

        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            total_requests: data.total_requests,
            timed_out: data.timed_out,
            active_connections: data.active_connections,
            status_codes: data.status_codes.iter().map(|(k, v)| (*k, *v)).collect(),
            requests_per_route: data
                .requests_per_route
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            latency_us: summarize(&data.latencies),
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn summarize(latencies: &VecDeque<u64>) -> LatencySummary {
    if latencies.is_empty() {
        return LatencySummary::default();
    }

    let mut sorted: Vec<u64> = latencies.iter().copied().collect();
    sorted.sort_unstable();

    let len = sorted.len();
    let sum: u64 = sorted.iter().sum();

    LatencySummary {
        p50: sorted[len * 50 / 100],
        p95: sorted[len * 95 / 100],
        p99: sorted[len * 99 / 100],
        avg: sum / len as u64,
        samples: len,
    }
}
