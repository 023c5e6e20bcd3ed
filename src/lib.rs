//! # ASCII Image Server
//! src/lib.rs
//!
//! Servicio HTTP que recibe una imagen PNG, la convierte a arte ASCII y
//! permite obtener el resultado de forma síncrona o consultarlo después
//! (asíncrona).
//!
//! ## Arquitectura
//!
//! ```text
//! TcpStream → http → router → middleware (logging, timeout) → api
//!                                                              │
//!                                                         TaskEngine
//!                                               ┌──────────────┼──────────────┐
//!                                          TaskRegistry      Task ──►   image + store
//! ```
//!
//! - `context`: cancelación cooperativa, deadlines y correlation id
//! - `engine`: tareas de conversión, registro y orquestación sync/async
//! - `middleware`: timeout por request y contexto de logging
//! - `image`: decodificador PNG y conversión a ASCII
//! - `store`: almacenamiento de resultados (disco o memoria)
//! - `http`, `router`, `api`, `server`: superficie HTTP
//! - `config`, `logging`, `metrics`: configuración y observabilidad
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use std::sync::Arc;
//! use ascii_server::config::Config;
//! use ascii_server::engine::TaskEngine;
//! use ascii_server::image::AsciiConverter;
//! use ascii_server::server::Server;
//! use ascii_server::store::MemoryStore;
//!
//! let engine = Arc::new(TaskEngine::new(
//!     Arc::new(AsciiConverter::new()),
//!     Arc::new(MemoryStore::new()),
//! ));
//! let server = Server::bind(Config::default(), engine).unwrap();
//! server.run().unwrap();
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod engine;
pub mod http;
pub mod image;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod server;
pub mod store;
