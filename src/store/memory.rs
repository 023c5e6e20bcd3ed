//! # Store en Memoria
//! src/store/memory.rs

use super::{BlobStore, StoreError};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Store efímero; se pierde al reiniciar el proceso
#[derive(Debug, Default)]
pub struct MemoryStore {
    images: RwLock<HashMap<Uuid, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryStore {
    fn put(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        self.images.write().insert(id, text.to_string());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(self.images.read().get(&id).cloned())
    }

    fn list(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(self.images.read().keys().copied().collect())
    }
}
