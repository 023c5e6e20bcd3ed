//! # Pipeline de Conversión
//! src/engine/pipeline.rs
//!
//! Trabajo que ejecuta cada tarea, en orden estricto:
//!
//! 1. checkpoint → decodificar bytes (falla = `Decode`, entrada inválida)
//! 2. checkpoint → convertir a ASCII (falla = `Conversion`)
//! 3. checkpoint → escribir en el store (falla = `Storage`)
//! 4. éxito
//!
//! Un checkpoint cancelado termina la tarea con `Cancelled` sin ejecutar
//! los pasos siguientes.

use std::sync::Arc;

use uuid::Uuid;

use super::error::TaskFailure;
use super::task::{TaskResult, TaskWork};
use crate::context::ExecutionContext;
use crate::image::ImageConverter;
use crate::store::BlobStore;

/// Todo lo que una tarea necesita para correr de forma independiente
pub struct Pipeline {
    pub id: Uuid,
    pub input: Vec<u8>,
    pub converter: Arc<dyn ImageConverter>,
    pub store: Arc<dyn BlobStore>,
}

impl Pipeline {
    /// Empaqueta el pipeline como trabajo de una `Task`
    pub fn into_work(self) -> TaskWork {
        Box::new(move |ctx| self.run(ctx))
    }

    pub fn run(&self, ctx: &ExecutionContext) -> TaskResult {
        checkpoint(ctx, "decode")?;
        tracing::info!(image_id = %self.id, bytes = self.input.len(), "decoding image");
        let image = self.converter.decode(&self.input).map_err(|e| {
            tracing::warn!(image_id = %self.id, error = %e, "error processing png image");
            TaskFailure::Decode(e.to_string())
        })?;

        checkpoint(ctx, "convert")?;
        tracing::info!(
            image_id = %self.id,
            width = image.width(),
            height = image.height(),
            "converting image to ascii"
        );
        let text = self.converter.to_ascii(&image).map_err(|e| {
            tracing::error!(image_id = %self.id, error = %e, "error converting image to ascii");
            TaskFailure::Conversion(e.to_string())
        })?;

        checkpoint(ctx, "store")?;
        tracing::info!(image_id = %self.id, "storing image");
        self.store.put(self.id, &text).map_err(|e| {
            tracing::error!(image_id = %self.id, error = %e, "error storing ascii image");
            TaskFailure::Storage(e.to_string())
        })?;

        tracing::info!(image_id = %self.id, "processing successful");
        Ok(text)
    }
}

fn checkpoint(ctx: &ExecutionContext, step: &'static str) -> Result<(), TaskFailure> {
    if ctx.is_cancelled() {
        tracing::warn!(step, "image processing cancelled");
        return Err(TaskFailure::Cancelled);
    }
    Ok(())
}
