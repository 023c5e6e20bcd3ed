//! # Configuración del Servidor
//! src/config.rs
//!
//! Argumentos CLI con fallback a variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./ascii_server --port 8000 \
//!   --store file --store-path /asciistore \
//!   --create-timeout-secs 60 \
//!   --task-ttl-secs 3600
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! ASCII_PORT=8000 STORE_PATH=/data LOG_FORMAT=text ./ascii_server
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};

/// Backend de almacenamiento de imágenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// Un archivo por imagen en `--store-path`
    File,
    /// HashMap en memoria (se pierde al reiniciar)
    Memory,
}

/// Formato de los logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Text,
}

/// Errores de validación
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("store path must not be empty when using the file store")]
    EmptyStorePath,
}

/// Configuración del servidor de imágenes ASCII
#[derive(Debug, Clone, Parser)]
#[command(name = "ascii_server")]
#[command(about = "Servidor HTTP que convierte imágenes PNG a arte ASCII")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "ASCII_HOST")]
    pub host: String,

    /// Puerto en el que escucha (0 = efímero)
    #[arg(short, long, default_value = "8000", env = "ASCII_PORT")]
    pub port: u16,

    // === Storage ===

    #[arg(long, value_enum, default_value = "file", env = "ASCII_STORE")]
    pub store: StoreKind,

    /// Directorio raíz del store en disco (se crea si no existe)
    #[arg(long = "store-path", default_value = "/asciistore", env = "STORE_PATH")]
    pub store_path: String,

    // === Timeouts ===

    /// Timeout base de POST /images
    #[arg(long = "create-timeout-secs", default_value = "60", env = "CREATE_TIMEOUT_SECS")]
    pub create_timeout_secs: u64,

    /// Tiempo extra de POST /images por KiB de body
    #[arg(long = "create-timeout-ms-per-kib", default_value = "50", env = "CREATE_TIMEOUT_MS_PER_KIB")]
    pub create_timeout_ms_per_kib: u64,

    #[arg(long = "list-timeout-secs", default_value = "30", env = "LIST_TIMEOUT_SECS")]
    pub list_timeout_secs: u64,

    #[arg(long = "get-timeout-secs", default_value = "60", env = "GET_TIMEOUT_SECS")]
    pub get_timeout_secs: u64,

    // === Límites ===

    /// Tamaño máximo del body de un request (413 si se excede)
    #[arg(long = "max-body-bytes", default_value = "16777216", env = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Tope de bytes de una imagen ya inflada (las más grandes se rechazan con 400)
    #[arg(long = "max-decoded-bytes", default_value = "67108864", env = "MAX_DECODED_BYTES")]
    pub max_decoded_bytes: usize,

    // === Mantenimiento ===

    /// Segundos que una tarea terminal permanece en el registro
    #[arg(long = "task-ttl-secs", default_value = "3600", env = "TASK_TTL_SECS")]
    pub task_ttl_secs: u64,

    /// Cada cuántos segundos corre el barrido de tareas expiradas
    #[arg(long = "sweep-interval-secs", default_value = "60", env = "SWEEP_INTERVAL_SECS")]
    pub sweep_interval_secs: u64,

    // === Logging ===

    #[arg(long = "log-format", value_enum, default_value = "json", env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl Config {
    /// Parsea argumentos CLI y variables de entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// ```rust
    /// use ascii_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    /// Deadline de POST /images para un body de `body_bytes`
    pub fn create_timeout_for(&self, body_bytes: usize) -> Duration {
        let kib = body_bytes.div_ceil(1024) as u64;
        self.create_timeout() + Duration::from_millis(kib.saturating_mul(self.create_timeout_ms_per_kib))
    }

    pub fn list_timeout(&self) -> Duration {
        Duration::from_secs(self.list_timeout_secs)
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.get_timeout_secs)
    }

    pub fn task_ttl(&self) -> Duration {
        Duration::from_secs(self.task_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("create timeout", self.create_timeout_secs),
            ("list timeout", self.list_timeout_secs),
            ("get timeout", self.get_timeout_secs),
            ("task ttl", self.task_ttl_secs),
            ("sweep interval", self.sweep_interval_secs),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        if self.max_body_bytes == 0 {
            return Err(ConfigError::Zero("max body bytes"));
        }
        if self.max_decoded_bytes == 0 {
            return Err(ConfigError::Zero("max decoded bytes"));
        }

        if self.store == StoreKind::File && self.store_path.trim().is_empty() {
            return Err(ConfigError::EmptyStorePath);
        }

        Ok(())
    }

    /// Registra un resumen de la configuración en los logs
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            store = ?self.store,
            store_path = %self.store_path,
            max_body_bytes = self.max_body_bytes,
            max_decoded_bytes = self.max_decoded_bytes,
            "server configuration"
        );
        tracing::info!(
            create_secs = self.create_timeout_secs,
            create_ms_per_kib = self.create_timeout_ms_per_kib,
            list_secs = self.list_timeout_secs,
            get_secs = self.get_timeout_secs,
            "request timeouts"
        );
        tracing::info!(
            task_ttl_secs = self.task_ttl_secs,
            sweep_interval_secs = self.sweep_interval_secs,
            "task eviction"
        );
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            store: StoreKind::File,
            store_path: "/asciistore".to_string(),
            create_timeout_secs: 60,
            create_timeout_ms_per_kib: 50,
            list_timeout_secs: 30,
            get_timeout_secs: 60,
            max_body_bytes: 16 * 1024 * 1024,
            max_decoded_bytes: crate::image::DEFAULT_MAX_DECODED_BYTES,
            task_ttl_secs: 3600,
            sweep_interval_secs: 60,
            log_format: LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.store, StoreKind::File);
        assert_eq!(config.store_path, "/asciistore");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_defaults_match_cli() {
        let parsed = Config::try_parse_from(["ascii_server"]).unwrap();
        let default = Config::default();

        assert_eq!(parsed.port, default.port);
        assert_eq!(parsed.create_timeout_secs, default.create_timeout_secs);
        assert_eq!(parsed.max_body_bytes, default.max_body_bytes);
        assert_eq!(parsed.max_decoded_bytes, default.max_decoded_bytes);
        assert_eq!(parsed.task_ttl_secs, default.task_ttl_secs);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::try_parse_from([
            "ascii_server",
            "--port",
            "9000",
            "--store",
            "memory",
            "--log-format",
            "text",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    // ==================== Timeouts ====================

    #[test]
    fn test_default_timeouts() {
        let config = Config::default();
        assert_eq!(config.create_timeout(), Duration::from_secs(60));
        assert_eq!(config.list_timeout(), Duration::from_secs(30));
        assert_eq!(config.get_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_dynamic_create_timeout() {
        let config = Config::default();
        assert_eq!(config.create_timeout_for(0), Duration::from_secs(60));
        assert_eq!(config.create_timeout_for(1), Duration::from_millis(60_050));
        assert_eq!(config.create_timeout_for(10 * 1024), Duration::from_millis(60_500));
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.get_timeout_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("get timeout")));
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = Config::default();
        config.task_ttl_secs = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("task ttl")));
    }

    #[test]
    fn test_validate_zero_body_limit() {
        let mut config = Config::default();
        config.max_body_bytes = 0;
        assert!(config.validate().unwrap_err().to_string().contains("max body bytes"));
    }

    #[test]
    fn test_validate_zero_decoded_limit() {
        let mut config = Config::default();
        config.max_decoded_bytes = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("max decoded bytes")));
    }

    #[test]
    fn test_validate_empty_store_path() {
        let mut config = Config::default();
        config.store_path = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptyStorePath));

        config.store = StoreKind::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_summary_does_not_panic() {
        Config::default().log_summary();
    }
}
