//! # Tarea de Conversión
//! src/engine/task.rs
//!
//! Una `Task` ejecuta exactamente un trabajo de conversión en su propio
//! thread y expone:
//!
//! - `state()`: lectura no bloqueante del estado
//! - `result()`: bloquea hasta el estado terminal y retorna el resultado cacheado
//!
//! ## Máquina de estados
//!
//! ```text
//! Pending ──start()──► Running ──┬──► Succeeded
//!                         │      ├──► Failed
//!                         ▼      └──► Cancelled
//!                    (Cancelling)
//! ```
//!
//! `Cancelling` es observable: el contexto ya fue cancelado pero el worker
//! todavía no llegó a su siguiente checkpoint. Solo el worker escribe el
//! estado terminal, y el resultado se escribe una única vez.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use uuid::Uuid;

use super::error::{EngineError, TaskFailure};
use crate::context::ExecutionContext;

/// Resultado terminal de una tarea
pub type TaskResult = Result<String, TaskFailure>;

/// Trabajo que ejecuta una tarea; recibe el contexto para sus checkpoints
pub type TaskWork = Box<dyn FnOnce(&ExecutionContext) -> TaskResult + Send + 'static>;

/// Estado de una tarea
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelling,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed | TaskState::Cancelled)
    }

    pub fn is_running(&self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Cancelling => "cancelling",
            TaskState::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug)]
struct Slot {
    state: TaskState,
    result: Option<TaskResult>,
    finished_at: Option<Instant>,
}

/// Unidad de trabajo asíncrona con su propio estado
#[derive(Debug)]
pub struct Task {
    id: Uuid,
    ctx: ExecutionContext,
    created_at: Instant,
    slot: Mutex<Slot>,
    done: Condvar,
}

impl Task {
    /// Crea una tarea en estado `Pending` ligada a `ctx`
    pub fn new(id: Uuid, ctx: ExecutionContext) -> Arc<Self> {
        Arc::new(Self {
            id,
            ctx,
            created_at: Instant::now(),
            slot: Mutex::new(Slot {
                state: TaskState::Pending,
                result: None,
                finished_at: None,
            }),
            done: Condvar::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Contexto con el que se inició la tarea (solo para detectar cancelación)
    pub fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Pending → Running y lanza el trabajo en un thread propio.
    ///
    /// El trabajo sigue corriendo aunque quien llamó abandone el request; solo
    /// la cancelación del contexto de la tarea lo detiene (en un checkpoint).
    pub fn start(self: &Arc<Self>, work: TaskWork) -> Result<(), EngineError> {
        {
            let mut slot = self.slot.lock();
            if slot.state != TaskState::Pending {
                return Err(EngineError::AlreadyStarted(self.id));
            }
            slot.state = TaskState::Running;
        }

        let task = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("task-{}", self.id.simple()))
            .spawn(move || task.run(work));

        if let Err(e) = spawned {
            tracing::error!(task_id = %self.id, error = %e, "could not spawn task worker");
            self.complete(Err(TaskFailure::Internal(format!("could not spawn worker: {}", e))));
            return Err(EngineError::Spawn(e));
        }

        Ok(())
    }

    fn run(&self, work: TaskWork) {
        let _entered = self.ctx.span().enter();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&self.ctx))).unwrap_or_else(|_| {
            tracing::error!(task_id = %self.id, "task worker panicked");
            Err(TaskFailure::Internal("conversion worker panicked".to_string()))
        });

        self.complete(outcome);
    }

    /// Registra el resultado terminal (write-once) y despierta a los que esperan
    fn complete(&self, result: TaskResult) {
        let mut slot = self.slot.lock();
        if slot.result.is_some() {
            return;
        }

        slot.state = match &result {
            Ok(_) => TaskState::Succeeded,
            Err(TaskFailure::Cancelled) => TaskState::Cancelled,
            Err(_) => TaskState::Failed,
        };
        slot.result = Some(result);
        slot.finished_at = Some(Instant::now());
        self.done.notify_all();
    }

    /// Estado actual sin bloquear; puede avanzar justo después de leerlo
    pub fn state(&self) -> TaskState {
        let slot = self.slot.lock();
        match slot.state {
            TaskState::Running if self.ctx.is_cancelled() => TaskState::Cancelling,
            state => state,
        }
    }

    /// Bloquea hasta que la tarea sea terminal y retorna el resultado cacheado.
    ///
    /// Llamadas repetidas retornan el mismo valor; el trabajo nunca se re-ejecuta.
    pub fn result(&self) -> TaskResult {
        let mut slot = self.slot.lock();
        loop {
            if let Some(result) = &slot.result {
                return result.clone();
            }
            self.done.wait(&mut slot);
        }
    }

    /// Como `result()` pero se rinde después de `timeout`
    pub fn result_timeout(&self, timeout: Duration) -> Option<TaskResult> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();
        loop {
            if let Some(result) = &slot.result {
                return Some(result.clone());
            }
            if self.done.wait_until(&mut slot, deadline).timed_out() {
                return slot.result.clone();
            }
        }
    }

    /// Resultado si ya es terminal, sin bloquear
    pub fn try_result(&self) -> Option<TaskResult> {
        self.slot.lock().result.clone()
    }

    /// Cuánto tiempo lleva en estado terminal (`None` si sigue corriendo)
    pub fn terminal_for(&self) -> Option<Duration> {
        self.slot.lock().finished_at.map(|at| at.elapsed())
    }
}
