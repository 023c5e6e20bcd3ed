//! # Almacenamiento de Imágenes ASCII
//! src/store/mod.rs
//!
//! Blob store indexado por ID de imagen. El motor solo necesita tres
//! operaciones: `put`, `get` y `list`.
//!
//! Implementaciones:
//! - `FileStore`: un archivo por imagen dentro de un directorio raíz
//! - `MemoryStore`: `HashMap` en memoria (tests y despliegues efímeros)

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use uuid::Uuid;

/// Errores del store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("given path {0} is not a directory")]
    InvalidRoot(String),
}

/// Blob store de texto indexado por ID.
///
/// Debe tolerar `put`/`get` concurrentes sobre IDs distintos.
pub trait BlobStore: Send + Sync {
    /// Guarda (o reemplaza) el texto de una imagen
    fn put(&self, id: Uuid, text: &str) -> Result<(), StoreError>;

    /// Obtiene el texto de una imagen; `Ok(None)` si no existe
    fn get(&self, id: Uuid) -> Result<Option<String>, StoreError>;

    /// Lista los IDs almacenados (sin orden garantizado)
    fn list(&self) -> Result<Vec<Uuid>, StoreError>;
}
