//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! 1. Escucha en un puerto
//! 2. Acepta conexiones y lanza un thread por cada una
//! 3. Lee y parsea el request, lo enruta y envía la respuesta
//! 4. Barre periódicamente el registro de tareas

pub mod tcp;

pub use tcp::{handle_connection, spawn_sweeper, Server};
