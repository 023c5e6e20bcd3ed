//! # Motor de Tareas
//! src/engine/service.rs
//!
//! `TaskEngine` orquesta la creación de tareas, el envío sync/async y la
//! consulta de resultados. Se construye una vez al arrancar el proceso y se
//! comparte por `Arc` con todos los handlers.
//!
//! ## Consulta (`get`)
//!
//! 1. Registro: en curso → `Processing`; terminal → resultado cacheado
//!    (sin volver a leer el store aunque la tarea ya lo haya escrito)
//! 2. Store: hit → `Finished(text)`; miss → `NotFound`

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::error::EngineError;
use super::pipeline::Pipeline;
use super::registry::TaskRegistry;
use super::task::{Task, TaskWork};
use crate::context::ExecutionContext;
use crate::image::ImageConverter;
use crate::store::BlobStore;

/// Resultado de `get` cuando no hay error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStatus {
    /// La tarea sigue corriendo (no es un error)
    Processing,

    /// Texto ASCII final
    Finished(String),
}

impl ImageStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ImageStatus::Finished(_))
    }
}

/// Resultado de `submit_sync`: el id existe aunque la tarea haya fallado
#[derive(Debug)]
pub struct SyncOutcome {
    pub id: Uuid,
    pub result: Result<String, EngineError>,
}

/// Contadores del registro para `/metrics`
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EngineStats {
    pub resident: usize,
    pub in_flight: usize,
}

pub struct TaskEngine {
    converter: Arc<dyn ImageConverter>,
    store: Arc<dyn BlobStore>,
    registry: TaskRegistry,
}

impl TaskEngine {
    pub fn new(converter: Arc<dyn ImageConverter>, store: Arc<dyn BlobStore>) -> Self {
        Self {
            converter,
            store,
            registry: TaskRegistry::new(),
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Copia la entrada completa antes de retornar: quien llama puede cerrar
    /// su stream apenas vuelve la llamada.
    fn snapshot(mut input: impl Read) -> Result<Vec<u8>, EngineError> {
        let mut bytes = Vec::new();
        input.read_to_end(&mut bytes).map_err(EngineError::Input)?;
        Ok(bytes)
    }

    fn spawn_task(&self, input: Vec<u8>, ctx: ExecutionContext) -> Result<Arc<Task>, EngineError> {
        let id = Uuid::new_v4();
        let task = Task::new(id, ctx);
        let pipeline = Pipeline {
            id,
            input,
            converter: Arc::clone(&self.converter),
            store: Arc::clone(&self.store),
        };

        self.launch(Arc::clone(&task), pipeline.into_work())?;
        Ok(task)
    }

    /// Registra y arranca una tarea; si no arranca, la retira del registro
    fn launch(&self, task: Arc<Task>, work: TaskWork) -> Result<(), EngineError> {
        // Registrar antes de arrancar: un `get` inmediato ya ve la tarea
        self.registry.insert(Arc::clone(&task));
        if let Err(e) = task.start(work) {
            self.registry.remove(task.id());
            return Err(e);
        }
        Ok(())
    }

    /// Lanza la conversión en segundo plano y retorna el id sin esperar.
    ///
    /// La tarea usa un contexto desacoplado de `ctx`: abortar el request no
    /// cancela la conversión. Solo conserva el correlation id para los logs.
    pub fn submit_async(&self, input: impl Read, ctx: &ExecutionContext) -> Result<Uuid, EngineError> {
        let bytes = Self::snapshot(input)?;
        let task = self.spawn_task(bytes, ctx.detached())?;

        tracing::info!(image_id = %task.id(), "image submitted for async processing");
        Ok(task.id())
    }

    /// Convierte ligando la tarea al contexto de quien llama y bloquea hasta
    /// que termine.
    ///
    /// En éxito la entrada se retira del registro (el texto ya está en el
    /// store); en fallo queda registrada para diagnóstico.
    pub fn submit_sync(&self, input: impl Read, ctx: &ExecutionContext) -> SyncOutcome {
        let bytes = match Self::snapshot(input) {
            Ok(bytes) => bytes,
            Err(e) => {
                return SyncOutcome {
                    id: Uuid::nil(),
                    result: Err(e),
                }
            }
        };

        let task = match self.spawn_task(bytes, ctx.clone()) {
            Ok(task) => task,
            Err(e) => {
                return SyncOutcome {
                    id: Uuid::nil(),
                    result: Err(e),
                }
            }
        };
        let id = task.id();

        let result = match task.result() {
            Ok(text) => {
                self.registry.remove(id);
                Ok(text)
            }
            Err(failure) => {
                tracing::warn!(image_id = %id, error = %failure, "sync processing failed");
                Err(EngineError::Task(failure))
            }
        };

        SyncOutcome { id, result }
    }

    /// Estado de una imagen: registro primero, store después
    pub fn get(&self, id: Uuid) -> Result<ImageStatus, EngineError> {
        if let Some(task) = self.registry.get(id) {
            return match task.try_result() {
                None => Ok(ImageStatus::Processing),
                Some(Ok(text)) => Ok(ImageStatus::Finished(text)),
                Some(Err(failure)) => Err(EngineError::Task(failure)),
            };
        }

        match self.store.get(id)? {
            Some(text) => Ok(ImageStatus::Finished(text)),
            None => Err(EngineError::NotFound(id)),
        }
    }

    /// IDs almacenados; no incluye tareas que todavía no escribieron el store
    pub fn list(&self) -> Result<Vec<Uuid>, EngineError> {
        Ok(self.store.list()?)
    }

    /// Retira una tarea del registro; `false` si no estaba
    pub fn evict(&self, id: Uuid) -> bool {
        self.registry.remove(id).is_some()
    }

    /// Retira las tareas terminales con más de `ttl` en ese estado
    pub fn evict_expired(&self, ttl: Duration) -> usize {
        let evicted = self.registry.evict_expired(ttl);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.registry.len(), "evicted expired tasks");
        }
        evicted
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            resident: self.registry.len(),
            in_flight: self.registry.in_flight(),
        }
    }
}
