//! # Contexto de Ejecución
//! src/context.rs
//!
//! `ExecutionContext` es el portador de cancelación, deadline y logging que
//! acompaña a cada unidad de trabajo (un request, una tarea de conversión).
//!
//! ## Jerarquía
//!
//! ```text
//! background
//!   └─ with_logging("newImageHandler")   (correlation id + span)
//!        └─ with_deadline(60s)           (timeout middleware)
//!             └─ tarea sync              (observa la cancelación del padre)
//!
//! detached()  → raíz nueva que conserva solo el logging (tareas async)
//! ```
//!
//! La cancelación es cooperativa: cancelar un contexto marca una bandera que
//! los hijos ven en su próxima llamada a `is_cancelled()`. Nadie es
//! interrumpido a la fuerza.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Span;

/// Contexto de ejecución clonable (clones comparten el mismo estado)
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    /// Bandera propia de cancelación
    cancelled: AtomicBool,

    /// Contexto padre: si el padre está cancelado, este también
    parent: Option<ExecutionContext>,

    /// Instante a partir del cual el contexto se considera cancelado
    deadline: Option<Instant>,

    correlation_id: Option<String>,
    operation: Option<String>,

    /// Span de tracing asociado al request
    span: Span,
}

impl ExecutionContext {
    /// Contexto raíz: sin deadline, sin correlation id, nunca cancelado
    /// salvo que se llame a `cancel()`.
    pub fn background() -> Self {
        Self::from_inner(ContextInner {
            cancelled: AtomicBool::new(false),
            parent: None,
            deadline: None,
            correlation_id: None,
            operation: None,
            span: Span::none(),
        })
    }

    fn from_inner(inner: ContextInner) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Deriva un hijo con su propia bandera de cancelación.
    ///
    /// Cancelar el hijo no afecta al padre; cancelar el padre sí afecta al hijo.
    pub fn with_cancel(&self) -> Self {
        self.child(self.inner.deadline)
    }

    /// Deriva un hijo cancelable que además expira después de `timeout`.
    ///
    /// El deadline resultante nunca es posterior al del padre.
    pub fn with_deadline(&self, timeout: Duration) -> Self {
        let candidate = Instant::now().checked_add(timeout);
        let deadline = match (self.inner.deadline, candidate) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (Some(parent), None) => Some(parent),
            (None, own) => own,
        };
        self.child(deadline)
    }

    fn child(&self, deadline: Option<Instant>) -> Self {
        Self::from_inner(ContextInner {
            cancelled: AtomicBool::new(false),
            parent: Some(self.clone()),
            deadline,
            correlation_id: self.inner.correlation_id.clone(),
            operation: self.inner.operation.clone(),
            span: self.inner.span.clone(),
        })
    }

    /// Deriva un hijo con un correlation id nuevo y un span de request.
    pub fn with_logging(&self, operation: &str) -> Self {
        let correlation_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!(
            parent: &self.inner.span,
            "request",
            correlation_id = %correlation_id,
            operation = %operation,
        );

        Self::from_inner(ContextInner {
            cancelled: AtomicBool::new(false),
            parent: Some(self.clone()),
            deadline: self.inner.deadline,
            correlation_id: Some(correlation_id),
            operation: Some(operation.to_string()),
            span,
        })
    }

    /// Raíz nueva que copia solo el logging (correlation id, operación, span).
    ///
    /// Se usa para trabajo asíncrono: abortar el request original no debe
    /// matar una conversión que todavía es útil.
    pub fn detached(&self) -> Self {
        Self::from_inner(ContextInner {
            cancelled: AtomicBool::new(false),
            parent: None,
            deadline: None,
            correlation_id: self.inner.correlation_id.clone(),
            operation: self.inner.operation.clone(),
            span: self.inner.span.clone(),
        })
    }

    /// Solicita la cancelación de este contexto y de todos sus hijos
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// Consulta no bloqueante: ¿fue cancelado este contexto, algún ancestro,
    /// o ya pasó el deadline?
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return true;
            }
        }
        match &self.inner.parent {
            Some(parent) => parent.is_cancelled(),
            None => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Tiempo restante hasta el deadline (cero si ya expiró)
    pub fn remaining(&self) -> Option<Duration> {
        self.inner
            .deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.inner.correlation_id.as_deref()
    }

    pub fn operation(&self) -> Option<&str> {
        self.inner.operation.as_deref()
    }

    /// Span del request; los threads que trabajan para el request lo re-entran
    pub fn span(&self) -> &Span {
        &self.inner.span
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::background()
    }
}
