//! # Middleware de Timeout
//! src/middleware/timeout.rs
//!
//! Acota el tiempo de pared de un handler. El handler corre en su propio
//! thread con un contexto hijo con deadline; este thread espera el
//! resultado con `recv_timeout`:
//!
//! ```text
//!            ┌── handler termina primero ──► Completed (sin cancelar nada)
//! Running ───┤
//!            └── vence el deadline ────────► TimedOut  (cancela el hijo y retorna)
//! ```
//!
//! El timeout es cooperativo: el handler sigue corriendo hasta su próximo
//! checkpoint y su respuesta tardía se descarta (el canal ya no tiene
//! receptor). No queda ningún timer vivo: el deadline es un instante
//! dentro del contexto, no un thread.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{error_body, Endpoint};
use crate::context::ExecutionContext;
use crate::http::{Request, Response, StatusCode};

/// Resultado de la carrera handler vs. timer
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    TimedOut,

    /// El handler hizo panic o no se pudo lanzar su thread
    Crashed,
}

/// Ejecuta `work` con un contexto hijo que vence en `timeout`.
///
/// Retorna al vencer el deadline sin esperar al handler.
pub fn run_with_timeout<T, F>(ctx: &ExecutionContext, timeout: Duration, work: F) -> Outcome<T>
where
    T: Send + 'static,
    F: FnOnce(&ExecutionContext) -> T + Send + 'static,
{
    let child = ctx.with_deadline(timeout);
    let (tx, rx) = mpsc::sync_channel(1);

    let worker_ctx = child.clone();
    let spawned = thread::Builder::new()
        .name("handler".to_string())
        .spawn(move || {
            let _entered = worker_ctx.span().enter();
            let value = work(&worker_ctx);
            // Si ya hubo timeout el receptor no existe y el envío se ignora
            let _ = tx.send(value);
        });

    if let Err(e) = spawned {
        tracing::error!(error = %e, "could not spawn handler thread");
        return Outcome::Crashed;
    }

    let wait = child.remaining().unwrap_or(timeout);
    let started = Instant::now();

    match rx.recv_timeout(wait) {
        Ok(value) => Outcome::Completed(value),
        Err(RecvTimeoutError::Timeout) => {
            child.cancel();
            tracing::warn!(
                timeout_ms = timeout.as_millis() as u64,
                waited_ms = started.elapsed().as_millis() as u64,
                "request timed out, handler cancelled"
            );
            Outcome::TimedOut
        }
        Err(RecvTimeoutError::Disconnected) => {
            tracing::error!("handler thread exited without a response");
            Outcome::Crashed
        }
    }
}

impl Endpoint {
    /// Timeout fijo para todos los requests
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_dynamic_timeout(move |_| timeout)
    }

    /// Timeout calculado por request (ej: proporcional al tamaño del body).
    ///
    /// Al vencer responde 503; el handler ve su contexto cancelado.
    pub fn with_dynamic_timeout<F>(self, compute: F) -> Self
    where
        F: Fn(&Request) -> Duration + Send + Sync + 'static,
    {
        let inner = self.handler;

        Endpoint::new(move |request, ctx| {
            let timeout = compute(request);
            let handler = Arc::clone(&inner);
            let owned = request.clone();

            match run_with_timeout(ctx, timeout, move |child| handler(&owned, child)) {
                Outcome::Completed(response) => response,
                Outcome::TimedOut => Response::json(
                    StatusCode::ServiceUnavailable,
                    &error_body("request timed out", ctx),
                ),
                Outcome::Crashed => Response::json(
                    StatusCode::InternalServerError,
                    &error_body("internal handler error", ctx),
                ),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn test_fast_handler_result_untouched() {
        let ctx = ExecutionContext::background();
        let outcome = run_with_timeout(&ctx, Duration::from_secs(5), |_| 42);

        assert_eq!(outcome, Outcome::Completed(42));
    }

    #[test]
    fn test_fast_handler_context_not_cancelled() {
        let ctx = ExecutionContext::background();
        let (ctx_tx, ctx_rx) = channel();

        let outcome = run_with_timeout(&ctx, Duration::from_secs(5), move |child| {
            ctx_tx.send(child.clone()).unwrap();
        });
        assert_eq!(outcome, Outcome::Completed(()));

        let child = ctx_rx.recv().unwrap();
        assert!(!child.is_cancelled());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_slow_handler_returns_at_deadline() {
        let ctx = ExecutionContext::background();
        let (ctx_tx, ctx_rx) = channel();
        let timeout = Duration::from_millis(100);

        let started = Instant::now();
        let outcome = run_with_timeout(&ctx, timeout, move |child| {
            ctx_tx.send(child.clone()).unwrap();
            thread::sleep(Duration::from_secs(3));
            "late"
        });
        let elapsed = started.elapsed();

        assert_eq!(outcome, Outcome::TimedOut);
        assert!(elapsed >= timeout);
        assert!(elapsed < Duration::from_secs(2), "waited {:?}", elapsed);

        let child = ctx_rx.recv().unwrap();
        assert!(child.is_cancelled());
        // El padre no se ve afectado
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_cooperative_handler_observes_cancellation() {
        let ctx = ExecutionContext::background();
        let (seen_tx, seen_rx) = channel();

        let outcome = run_with_timeout(&ctx, Duration::from_millis(50), move |child| {
            while !child.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            // limpieza lenta: la respuesta llega después del timeout
            thread::sleep(Duration::from_millis(100));
            seen_tx.send(true).unwrap();
        });

        assert_eq!(outcome, Outcome::TimedOut);
        assert!(seen_rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    #[test]
    fn test_panicking_handler_is_crashed() {
        let ctx = ExecutionContext::background();
        let outcome: Outcome<()> = run_with_timeout(&ctx, Duration::from_secs(5), |_| panic!("boom"));

        assert_eq!(outcome, Outcome::Crashed);
    }

    // ==================== Endpoint ====================

    fn get(path: &str) -> Request {
        Request::parse(format!("GET {} HTTP/1.0\r\n\r\n", path).as_bytes()).unwrap()
    }

    #[test]
    fn test_endpoint_timeout_returns_503() {
        let endpoint = Endpoint::new(|_req, ctx| {
            while !ctx.is_cancelled() {
                thread::sleep(Duration::from_millis(5));
            }
            Response::text(StatusCode::Ok, "too late")
        })
        .with_timeout(Duration::from_millis(50));

        let response = endpoint.call(&get("/slow"), &ExecutionContext::background());
        assert_eq!(response.status(), StatusCode::ServiceUnavailable);
        assert!(String::from_utf8_lossy(response.body()).contains("request timed out"));
    }

    #[test]
    fn test_endpoint_dynamic_timeout_uses_request() {
        let endpoint = Endpoint::new(|_req, ctx| {
            let remaining = ctx.remaining().unwrap_or_default();
            Response::text(StatusCode::Ok, &remaining.as_secs().to_string())
        })
        .with_dynamic_timeout(|req| {
            if req.path() == "/long" {
                Duration::from_secs(100)
            } else {
                Duration::from_secs(10)
            }
        });

        let long = endpoint.call(&get("/long"), &ExecutionContext::background());
        let short = endpoint.call(&get("/short"), &ExecutionContext::background());

        let secs = |r: &Response| String::from_utf8_lossy(r.body()).parse::<u64>().unwrap();
        assert!(secs(&long) >= 90);
        assert!(secs(&short) <= 10);
    }

    #[test]
    fn test_endpoint_panic_returns_500() {
        let endpoint = Endpoint::new(|_req, _ctx| panic!("handler bug")).with_timeout(Duration::from_secs(5));

        let response = endpoint.call(&get("/"), &ExecutionContext::background());
        assert_eq!(response.status(), StatusCode::InternalServerError);
    }

    #[test]
    fn test_parent_cancellation_reaches_handler() {
        let parent = ExecutionContext::background().with_cancel();
        parent.cancel();

        let outcome = run_with_timeout(&parent, Duration::from_secs(5), |child| child.is_cancelled());
        assert_eq!(outcome, Outcome::Completed(true));
    }
}
