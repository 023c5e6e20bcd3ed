//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión; cada conexión atiende un request y se cierra.
//! Un thread adicional (sweeper) retira periódicamente del registro las
//! tareas terminales expiradas.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::api;
use crate::config::Config;
use crate::context::ExecutionContext;
use crate::engine::TaskEngine;
use crate::http::{ParseError, Request, Response, StatusCode};
use crate::metrics::MetricsCollector;
use crate::router::Router;

/// Tiempo máximo esperando bytes del cliente
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Servidor HTTP de imágenes ASCII
pub struct Server {
    config: Config,
    router: Arc<Router>,
    metrics: MetricsCollector,
    engine: Arc<TaskEngine>,
    listener: TcpListener,
}

impl Server {
    /// Hace bind en `config.address()` y arma el router
    pub fn bind(config: Config, engine: Arc<TaskEngine>) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address())?;
        let metrics = MetricsCollector::new();
        let router = api::build_router(Arc::clone(&engine), metrics.clone(), &config);

        Ok(Self {
            config,
            router: Arc::new(router),
            metrics,
            engine,
            listener,
        })
    }

    /// Dirección real (útil con puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Arranca el sweeper y atiende conexiones indefinidamente
    pub fn run(self) -> io::Result<()> {
        let address = self.local_addr()?;
        tracing::info!(%address, "server listening, one thread per connection");

        spawn_sweeper(
            Arc::clone(&self.engine),
            self.config.task_ttl(),
            self.config.sweep_interval(),
        )?;

        let max_body = self.config.max_body_bytes;

        for stream in self.listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to accept connection");
                    continue;
                }
            };

            let router = Arc::clone(&self.router);
            let metrics = self.metrics.clone();
            metrics.increment_active_connections();

            let spawned = thread::Builder::new()
                .name("connection".to_string())
                .spawn(move || {
                    if let Err(e) = handle_connection(stream, &router, &metrics, max_body) {
                        tracing::warn!(error = %e, "connection error");
                    }
                    metrics.decrement_active_connections();
                });

            if let Err(e) = spawned {
                tracing::error!(error = %e, "could not spawn connection thread");
                self.metrics.decrement_active_connections();
            }
        }

        Ok(())
    }
}

/// Lee un request, lo enruta, escribe la respuesta y registra métricas
pub fn handle_connection(
    mut stream: TcpStream,
    router: &Router,
    metrics: &MetricsCollector,
    max_body: usize,
) -> io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    let (response, route) = match Request::read_from(&mut stream, max_body) {
        Ok(request) => {
            tracing::debug!(%peer, method = request.method().as_str(), path = request.path(), "request parsed");
            let routed = router.route(request, &ExecutionContext::background());
            (routed.response, routed.route)
        }
        Err(ParseError::EmptyRequest) => {
            tracing::debug!(%peer, "connection closed without a request");
            return Ok(());
        }
        Err(ParseError::Io(e)) => return Err(e),
        Err(e) => {
            tracing::warn!(%peer, error = %e, "rejected malformed request");
            (reject(&e), "rejected".to_string())
        }
    };

    stream.write_all(&response.to_bytes())?;
    stream.flush()?;

    let latency = start.elapsed();
    metrics.record_request(&route, response.status(), latency);
    tracing::debug!(%peer, %route, status = response.status().as_u16(), latency_ms = latency.as_millis() as u64, "response sent");

    Ok(())
}

/// Respuesta para un request que no se pudo leer
fn reject(error: &ParseError) -> Response {
    let status = match error {
        ParseError::BodyTooLarge { .. } | ParseError::HeadersTooLarge(_) => StatusCode::PayloadTooLarge,
        ParseError::UnsupportedMethod(_) => StatusCode::MethodNotAllowed,
        _ => StatusCode::BadRequest,
    };

    Response::json(status, &serde_json::json!({ "ErrorMessage": error.to_string() }))
        .with_header("Connection", "close")
}

/// Retira del registro, cada `interval`, las tareas terminales con más de `ttl`
pub fn spawn_sweeper(engine: Arc<TaskEngine>, ttl: Duration, interval: Duration) -> io::Result<JoinHandle<()>> {
    thread::Builder::new().name("task-sweeper".to_string()).spawn(move || loop {
        thread::sleep(interval);
        let evicted = engine.evict_expired(ttl);
        if evicted > 0 {
            tracing::info!(evicted, "task sweeper evicted expired tasks");
        }
    })
}
