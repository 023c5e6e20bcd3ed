//! # Taxonomía de Errores del Motor
//! src/engine/error.rs
//!
//! - `TaskFailure`: por qué terminó mal una tarea (se guarda en su resultado)
//! - `ErrorKind`: clase de error independiente del transporte
//! - `EngineError`: lo que retornan las operaciones públicas del motor
//!
//! El mapeo `ErrorKind` → código HTTP vive en la capa `api`.

use crate::store::StoreError;
use uuid::Uuid;

/// Clase de error, desacoplada de cualquier código de estado HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entrada no procesable (imagen ilegible); causada por el usuario
    InvalidInput,

    /// Falla de conversión, de almacenamiento o cancelación a mitad de camino
    InternalProcessing,

    /// ID desconocido tanto para el registro como para el store
    ResourceNotFound,
}

/// Motivo terminal de una tarea fallida o cancelada.
///
/// Es `Clone` porque el mismo valor se entrega a todos los lectores del
/// resultado sin recalcularlo.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskFailure {
    #[error("error processing png image: {0}")]
    Decode(String),

    #[error("error converting image to ascii: {0}")]
    Conversion(String),

    #[error("error storing ascii image: {0}")]
    Storage(String),

    #[error("image processing cancelled")]
    Cancelled,

    #[error("internal task error: {0}")]
    Internal(String),
}

impl TaskFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskFailure::Decode(_) => ErrorKind::InvalidInput,
            _ => ErrorKind::InternalProcessing,
        }
    }
}

/// Errores de las operaciones del `TaskEngine`
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// La tarea terminó en fallo o cancelación
    #[error(transparent)]
    Task(#[from] TaskFailure),

    #[error("image {0} does not exist")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// No se pudo leer el cuerpo enviado por el cliente
    #[error("could not read image input: {0}")]
    Input(#[source] std::io::Error),

    /// No se pudo lanzar el thread de la tarea
    #[error("could not start task: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("task {0} was already started")]
    AlreadyStarted(Uuid),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Task(failure) => failure.kind(),
            EngineError::NotFound(_) => ErrorKind::ResourceNotFound,
            EngineError::Input(_) => ErrorKind::InvalidInput,
            EngineError::Store(_) | EngineError::Spawn(_) | EngineError::AlreadyStarted(_) => {
                ErrorKind::InternalProcessing
            }
        }
    }

    /// ¿Es el fallo registrado de una tarea (y no un error de la operación)?
    pub fn task_failure(&self) -> Option<&TaskFailure> {
        match self {
            EngineError::Task(failure) => Some(failure),
            _ => None,
        }
    }
}
