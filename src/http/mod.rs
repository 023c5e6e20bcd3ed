//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Protocolo HTTP/1.x implementado a mano sobre `TcpStream`:
//!
//! - Parsing de requests con body binario (`Content-Length`)
//! - Límites de tamaño para cabecera y body
//! - Construcción de responses (texto o JSON vía `serde_json`)
//! - Códigos de estado
//!
//! Cada conexión atiende un único request y se cierra (estilo HTTP/1.0).

pub mod request;
pub mod response;
pub mod status;

pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
