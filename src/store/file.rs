//! # Store en Disco
//! src/store/file.rs
//!
//! Guarda cada imagen ASCII en `<root>/<uuid>`. Se puede montar un volumen
//! en `root` para que las imágenes sobrevivan a un reinicio.

use super::{BlobStore, StoreError};
use std::fs::{self, File};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Store simple basado en archivos
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Abre (o crea) el directorio raíz del store
    ///
    /// Falla si `path` existe pero no es un directorio.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();

        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(StoreError::InvalidRoot(root.display().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => fs::create_dir_all(&root)?,
            Err(e) => return Err(e.into()),
        }

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(id.to_string())
    }

    fn write_file(path: &Path, text: &str) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}

impl BlobStore for FileStore {
    fn put(&self, id: Uuid, text: &str) -> Result<(), StoreError> {
        let target = self.path_for(id);

        // Escribir a un temporal y renombrar: un lector nunca ve un archivo a medias
        let temp = self.root.join(format!("{}.tmp", id));
        let written = Self::write_file(&temp, text).and_then(|()| fs::rename(&temp, &target));

        if let Err(e) = written {
            // no dejar el temporal huérfano en la raíz
            if let Err(cleanup) = fs::remove_file(&temp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    tracing::warn!(path = %temp.display(), error = %cleanup, "could not remove temp file");
                }
            }
            return Err(e.into());
        }

        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(id)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            // Solo nombres que sean UUIDs válidos (ignora *.tmp y otros)
            if let Some(id) = entry.file_name().to_str().and_then(|n| Uuid::parse_str(n).ok()) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}
