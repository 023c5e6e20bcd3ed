//! # Middleware de Handlers
//! src/middleware/mod.rs
//!
//! Un `Endpoint` envuelve un handler `(&Request, &ExecutionContext) -> Response`
//! y se compone con capas:
//!
//! ```text
//! Endpoint::new(handler)
//!     .with_timeout(60s)                 // contexto hijo con deadline
//!     .with_logging_context("getImage")  // correlation id + span (capa externa)
//! ```
//!
//! La última capa agregada es la primera en ejecutarse.

pub mod logging;
pub mod timeout;

pub use timeout::{run_with_timeout, Outcome};

use std::sync::Arc;

use crate::context::ExecutionContext;
use crate::http::{Request, Response};

/// Firma de un handler HTTP
pub type Handler = Arc<dyn Fn(&Request, &ExecutionContext) -> Response + Send + Sync>;

/// Handler compuesto con sus capas de middleware
#[derive(Clone)]
pub struct Endpoint {
    handler: Handler,
}

impl Endpoint {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request, &ExecutionContext) -> Response + Send + Sync + 'static,
    {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn call(&self, request: &Request, ctx: &ExecutionContext) -> Response {
        (self.handler)(request, ctx)
    }
}

impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint").finish_non_exhaustive()
    }
}

/// Body de error compartido por las capas (mismo formato que la API)
pub(crate) fn error_body(message: &str, ctx: &ExecutionContext) -> serde_json::Value {
    serde_json::json!({
        "ErrorMessage": message,
        "CorrelationID": ctx.correlation_id().unwrap_or_default(),
    })
}
