//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! - Contadores de requests por ruta y por código de estado
//! - Latencias (p50, p95, p99)
//! - Requests expirados por timeout
//! - Conexiones activas

pub mod collector;

pub use collector::{LatencySummary, MetricsCollector, MetricsSnapshot};
