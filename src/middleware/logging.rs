//! # Middleware de Logging
//! src/middleware/logging.rs
//!
//! Asigna a cada request un correlation id (UUID v4) y un span
//! `request{correlation_id, operation}`. Todo log emitido dentro del span,
//! incluidos los de threads que lo re-entran, lleva esos campos.

use std::time::Instant;

use super::Endpoint;

/// Header con el que se devuelve el correlation id al cliente
pub const CORRELATION_HEADER: &str = "X-Correlation-Id";

impl Endpoint {
    /// Capa externa: contexto con logging y header `X-Correlation-Id`
    pub fn with_logging_context(self, operation: &'static str) -> Self {
        let inner = self.handler;

        Endpoint::new(move |request, ctx| {
            let ctx = ctx.with_logging(operation);
            let _entered = ctx.span().enter();
            let started = Instant::now();

            tracing::info!(
                method = request.method().as_str(),
                path = request.path(),
                body_bytes = request.body().len(),
                "request received"
            );

            let mut response = inner(request, &ctx);
            if let Some(id) = ctx.correlation_id() {
                response.add_header(CORRELATION_HEADER, id);
            }

            tracing::info!(
                status = response.status().as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request completed"
            );
            response
        })
    }
}
