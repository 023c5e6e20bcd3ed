//! Tests del motor de tareas a través de su API pública
//! tests/engine_test.rs

use std::io::Cursor;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ascii_server::context::ExecutionContext;
use ascii_server::engine::{EngineError, ErrorKind, ImageStatus, TaskEngine, TaskFailure, TaskState};
use ascii_server::image::{AsciiConverter, ConvertError, DecodeError, ImageConverter, LumaImage};
use ascii_server::store::{BlobStore, FileStore, MemoryStore, StoreError};
use uuid::Uuid;

mod common;
use common::{distinct_png, expected_ascii, fixture};

fn memory_engine() -> TaskEngine {
    TaskEngine::new(Arc::new(AsciiConverter::new()), Arc::new(MemoryStore::new()))
}

fn wait_terminal(engine: &TaskEngine, id: Uuid) -> Result<ImageStatus, EngineError> {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        match engine.get(id) {
            Ok(ImageStatus::Processing) => {
                assert!(Instant::now() < deadline, "task {} never finished", id);
                thread::sleep(Duration::from_millis(5));
            }
            other => return other,
        }
    }
}

/// Convertidor que bloquea el decode hasta recibir una señal
struct GatedConverter {
    gate: Mutex<Receiver<()>>,
    inner: AsciiConverter,
}

impl ImageConverter for GatedConverter {
    fn decode(&self, bytes: &[u8]) -> Result<LumaImage, DecodeError> {
        let _ = self.gate.lock().unwrap().recv();
        self.inner.decode(bytes)
    }

    fn to_ascii(&self, image: &LumaImage) -> Result<String, ConvertError> {
        self.inner.to_ascii(image)
    }
}

/// Store que rechaza toda escritura
struct ReadOnlyStore;

impl BlobStore for ReadOnlyStore {
    fn put(&self, _id: Uuid, _text: &str) -> Result<(), StoreError> {
        Err(StoreError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        )))
    }

    fn get(&self, _id: Uuid) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn list(&self) -> Result<Vec<Uuid>, StoreError> {
        Ok(Vec::new())
    }
}

// ==================== Sync ====================

#[test]
fn test_sync_result_matches_get() {
    let engine = memory_engine();
    let outcome = engine.submit_sync(Cursor::new(fixture()), &ExecutionContext::background());

    let text = outcome.result.unwrap();
    assert_eq!(text.lines().count(), 32);
    assert_eq!(engine.get(outcome.id).unwrap(), ImageStatus::Finished(text));
}

#[test]
fn test_sync_invalid_input_is_reported_twice() {
    let engine = memory_engine();
    let outcome = engine.submit_sync(Cursor::new(b"0123456789".to_vec()), &ExecutionContext::background());

    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(err.task_failure(), Some(TaskFailure::Decode(_))));

    let again = engine.get(outcome.id).unwrap_err();
    assert_eq!(again.task_failure(), err.task_failure());
}

#[test]
fn test_sync_storage_failure_is_internal() {
    let engine = TaskEngine::new(Arc::new(AsciiConverter::new()), Arc::new(ReadOnlyStore));
    let outcome = engine.submit_sync(Cursor::new(fixture()), &ExecutionContext::background());

    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InternalProcessing);
    assert!(matches!(err.task_failure(), Some(TaskFailure::Storage(_))));
}

#[test]
fn test_sync_with_cancelled_context() {
    let engine = memory_engine();
    let ctx = ExecutionContext::background().with_cancel();
    ctx.cancel();

    let outcome = engine.submit_sync(Cursor::new(fixture()), &ctx);
    assert_eq!(outcome.result.unwrap_err().task_failure(), Some(&TaskFailure::Cancelled));
    assert!(engine.list().unwrap().is_empty());
}

#[test]
fn test_sync_with_expired_deadline() {
    let engine = memory_engine();
    let ctx = ExecutionContext::background().with_deadline(Duration::ZERO);
    thread::sleep(Duration::from_millis(5));

    let outcome = engine.submit_sync(Cursor::new(fixture()), &ctx);
    assert_eq!(outcome.result.unwrap_err().task_failure(), Some(&TaskFailure::Cancelled));
}

// ==================== Async ====================

#[test]
fn test_async_converges_to_sync_text() {
    let engine = memory_engine();
    let ctx = ExecutionContext::background();

    let sync_text = engine.submit_sync(Cursor::new(fixture()), &ctx).result.unwrap();
    let id = engine.submit_async(Cursor::new(fixture()), &ctx).unwrap();

    assert_eq!(wait_terminal(&engine, id).unwrap(), ImageStatus::Finished(sync_text));
}

#[test]
fn test_async_reports_processing_until_released() {
    let (release, gate) = mpsc::channel();
    let converter = GatedConverter {
        gate: Mutex::new(gate),
        inner: AsciiConverter::new(),
    };
    let engine = TaskEngine::new(Arc::new(converter), Arc::new(MemoryStore::new()));

    let id = engine
        .submit_async(Cursor::new(fixture()), &ExecutionContext::background())
        .unwrap();

    assert_eq!(engine.get(id).unwrap(), ImageStatus::Processing);
    assert_eq!(engine.registry().get(id).unwrap().state(), TaskState::Running);
    assert_eq!(engine.stats().in_flight, 1);

    release.send(()).unwrap();
    assert!(wait_terminal(&engine, id).unwrap().is_finished());
    assert_eq!(engine.stats().in_flight, 0);
}

#[test]
fn test_get_is_idempotent() {
    let engine = memory_engine();
    let id = engine
        .submit_async(Cursor::new(fixture()), &ExecutionContext::background())
        .unwrap();

    let first = wait_terminal(&engine, id).unwrap();
    for _ in 0..5 {
        assert_eq!(engine.get(id).unwrap(), first);
    }
}

#[test]
fn test_concurrent_submissions_keep_their_own_results() {
    let engine = Arc::new(memory_engine());

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let input = distinct_png(i);
                let ctx = ExecutionContext::background();
                let id = if i % 2 == 0 {
                    let outcome = engine.submit_sync(Cursor::new(input.clone()), &ctx);
                    assert_eq!(outcome.result.unwrap(), expected_ascii(&input));
                    outcome.id
                } else {
                    engine.submit_async(Cursor::new(input.clone()), &ctx).unwrap()
                };
                (id, input)
            })
        })
        .collect();

    let submitted: Vec<(Uuid, Vec<u8>)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let mut texts = Vec::new();
    for (id, input) in &submitted {
        let expected = expected_ascii(input);
        assert_eq!(wait_terminal(&engine, *id).unwrap(), ImageStatus::Finished(expected.clone()));
        texts.push(expected);
    }

    let mut ids: Vec<Uuid> = submitted.iter().map(|(id, _)| *id).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);

    // cada entrada produce un texto distinto: un cruce entre tareas no pasaría
    texts.sort();
    texts.dedup();
    assert_eq!(texts.len(), 16);
}

// ==================== Store en disco ====================

#[test]
fn test_file_store_survives_engine_restart() {
    let dir = tempfile::tempdir().unwrap();

    let id = {
        let store = Arc::new(FileStore::new(dir.path()).unwrap());
        let engine = TaskEngine::new(Arc::new(AsciiConverter::new()), store);
        let outcome = engine.submit_sync(Cursor::new(fixture()), &ExecutionContext::background());
        outcome.result.unwrap();
        outcome.id
    };

    let store = Arc::new(FileStore::new(dir.path()).unwrap());
    let engine = TaskEngine::new(Arc::new(AsciiConverter::new()), store);

    assert!(engine.get(id).unwrap().is_finished());
    assert_eq!(engine.list().unwrap(), vec![id]);
}

#[test]
fn test_oversized_decode_is_invalid_input() {
    // fixture 32x32 de 1 bit: (4 + 1) * 32 = 160 bytes inflados
    let converter = AsciiConverter::new().with_max_decoded_bytes(100);
    let engine = TaskEngine::new(Arc::new(converter), Arc::new(MemoryStore::new()));

    let outcome = engine.submit_sync(Cursor::new(fixture()), &ExecutionContext::background());
    let err = outcome.result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(matches!(err.task_failure(), Some(TaskFailure::Decode(_))));
    assert!(engine.list().unwrap().is_empty());
}

#[test]
fn test_unknown_id_is_not_found() {
    let engine = memory_engine();
    let err = engine.get(Uuid::new_v4()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResourceNotFound);
}
