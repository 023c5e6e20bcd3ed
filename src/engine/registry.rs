//! # Registro de Tareas
//! src/engine/registry.rs
//!
//! Mapa concurrente `id → Task`. Conserva tareas en curso y tareas terminales
//! recientes para que `get` pueda reportar "processing" o el error exacto.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use uuid::Uuid;

use super::task::Task;

#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<Uuid, Arc<Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una tarea; reemplaza cualquier entrada previa con el mismo id
    pub fn insert(&self, task: Arc<Task>) {
        self.tasks.lock().insert(task.id(), task);
    }

    pub fn get(&self, id: Uuid) -> Option<Arc<Task>> {
        self.tasks.lock().get(&id).cloned()
    }

    pub fn remove(&self, id: Uuid) -> Option<Arc<Task>> {
        self.tasks.lock().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.tasks.lock().keys().copied().collect()
    }

    /// Tareas que todavía no llegaron a un estado terminal
    pub fn in_flight(&self) -> usize {
        self.tasks
            .lock()
            .values()
            .filter(|task| task.state().is_running())
            .count()
    }

    /// Elimina las tareas terminales con más de `ttl` en ese estado.
    ///
    /// Las tareas en curso nunca se eliminan. Retorna cuántas se eliminaron.
    pub fn evict_expired(&self, ttl: Duration) -> usize {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|_, task| match task.terminal_for() {
            Some(age) => age < ttl,
            None => true,
        });
        before - tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExecutionContext;

    fn finished_task() -> Arc<Task> {
        let task = Task::new(Uuid::new_v4(), ExecutionContext::background());
        task.start(Box::new(|_| Ok("done".to_string()))).unwrap();
        task.result().unwrap();
        task
    }

    #[test]
    fn test_insert_get_remove() {
        let registry = TaskRegistry::new();
        let task = finished_task();
        let id = task.id();

        registry.insert(task);
        assert_eq!(registry.len(), 1);
        assert!(registry.get(id).is_some());
        assert_eq!(registry.ids(), vec![id]);

        assert!(registry.remove(id).is_some());
        assert!(registry.get(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_evict_expired_keeps_running_tasks() {
        let registry = TaskRegistry::new();

        let pending = Task::new(Uuid::new_v4(), ExecutionContext::background());
        let pending_id = pending.id();
        registry.insert(pending);
        registry.insert(finished_task());

        assert_eq!(registry.in_flight(), 1);

        let evicted = registry.evict_expired(Duration::ZERO);
        assert_eq!(evicted, 1);
        assert_eq!(registry.ids(), vec![pending_id]);
    }

    #[test]
    fn test_evict_expired_respects_ttl() {
        let registry = TaskRegistry::new();
        registry.insert(finished_task());

        assert_eq!(registry.evict_expired(Duration::from_secs(3600)), 0);
        assert_eq!(registry.len(), 1);
    }
}
