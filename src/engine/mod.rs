//! # Motor de Tareas Asíncronas
//! src/engine/mod.rs
//!
//! - `task`: máquina de estados de una conversión
//! - `registry`: tareas en curso y terminales recientes
//! - `pipeline`: pasos decode → convert → store con checkpoints de cancelación
//! - `service`: `TaskEngine`, la fachada usada por la capa HTTP
//! - `error`: taxonomía de errores independiente del transporte

pub mod error;
pub mod pipeline;
pub mod registry;
pub mod service;
pub mod task;

pub use error::{EngineError, ErrorKind, TaskFailure};
pub use registry::TaskRegistry;
pub use service::{EngineStats, ImageStatus, SyncOutcome, TaskEngine};
pub use task::{Task, TaskResult, TaskState};
