//! # Logging
//! src/logging.rs
//!
//! Instala el subscriber global de `tracing`. El nivel se controla con
//! `RUST_LOG` (por defecto `info`).

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Error al instalar el subscriber (por ejemplo, si ya había uno)
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub fn init(format: LogFormat) -> Result<(), InitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    }
}
