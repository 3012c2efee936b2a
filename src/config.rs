//! # Configuración del Servidor
//! src/config.rs
//!
//! Este módulo define la configuración del servidor HTTP con soporte completo
//! para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./http11_server --port 8080 \
//!   --workers 8 \
//!   --root ./public \
//!   --timeout-ms 5000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 DOC_ROOT=./public ./http11_server
//! ```

use crate::http::Framing;
use crate::net::DEFAULT_BUFFER_SIZE;
use clap::Parser;
use std::time::Duration;
use tracing::{info, Level};

/// Configuración del servidor HTTP/1.1
#[derive(Debug, Clone, Parser)]
#[command(name = "http11_server")]
#[command(about = "Servidor HTTP/1.1 con pool de workers y document root")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "9999", env = "HTTP_PORT")]
    pub port: u16,

    // === Workers ===

    /// Número de threads del pool de workers
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Conexiones que pueden esperar en la cola del pool
    #[arg(long = "queue-capacity", default_value = "1024", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    // === Conexiones ===

    /// Timeout de lectura/escritura por conexión en milisegundos (0 = sin timeout)
    #[arg(long = "timeout-ms", default_value = "30000", env = "TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Capacidad del buffer de recepción en bytes
    #[arg(long = "buffer-size", default_value = "2048", env = "BUFFER_SIZE")]
    pub buffer_size: usize,

    // === Contenido ===

    /// Directorio raíz desde el que se sirven archivos
    #[arg(short, long, default_value = "www", env = "DOC_ROOT")]
    pub root: String,

    /// Enviar respuestas con `Transfer-Encoding: chunked`
    #[arg(long, env = "CHUNKED")]
    pub chunked: bool,

    /// Tamaño de cada chunk en bytes
    #[arg(long = "chunk-size", default_value = "4096", env = "CHUNK_SIZE")]
    pub chunk_size: usize,

    // === Logging ===

    /// Nivel máximo de log (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: Level,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use http11_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:9999");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout por conexión; `None` si está deshabilitado
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Framing que usa el responder de archivos
    pub fn framing(&self) -> Framing {
        if self.chunked {
            Framing::Chunked {
                chunk_size: self.chunk_size,
            }
        } else {
            Framing::ContentLength
        }
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }
        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }
        // Hace falta espacio al menos para un CRLF
        if self.buffer_size < 2 {
            return Err("Buffer size must be >= 2 bytes".to_string());
        }
        if self.chunk_size == 0 {
            return Err("Chunk size must be >= 1".to_string());
        }
        if self.root.is_empty() {
            return Err("Document root must not be empty".to_string());
        }

        Ok(())
    }

    /// Loguea un resumen de la configuración efectiva
    pub fn log_summary(&self) {
        info!("address:        {}", self.address());
        info!("document root:  {}", self.root);
        info!(
            "workers:        {} (queue capacity {})",
            self.workers, self.queue_capacity
        );
        match self.timeout() {
            Some(t) => info!("timeout:        {} ms", t.as_millis()),
            None => info!("timeout:        disabled"),
        }
        info!("buffer size:    {} bytes", self.buffer_size);
        match self.framing() {
            Framing::ContentLength => info!("framing:        content-length"),
            Framing::Chunked { chunk_size } => info!("framing:        chunked ({} bytes)", chunk_size),
        }
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9999,
            workers: 4,
            queue_capacity: 1024,
            timeout_ms: 30_000,
            buffer_size: DEFAULT_BUFFER_SIZE,
            root: "www".to_string(),
            chunked: false,
            chunk_size: 4096,
            log_level: Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 9999);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.workers, 4);
        assert_eq!(config.root, "www");
        assert_eq!(config.log_level, Level::INFO);
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_parse_cli_args() {
        let config = Config::try_parse_from([
            "http11_server",
            "-p",
            "8080",
            "--workers",
            "8",
            "--root",
            "/srv/www",
            "--chunked",
            "--chunk-size",
            "512",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.workers, 8);
        assert_eq!(config.root, "/srv/www");
        assert_eq!(config.framing(), Framing::Chunked { chunk_size: 512 });
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(Config::try_parse_from(["http11_server", "--port", "99999"]).is_err());
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    // ==================== Validation ====================

    #[test]
    fn test_validate_invalid_workers() {
        let mut config = Config::default();
        config.workers = 0;
        let result = config.validate();
        assert!(result.unwrap_err().contains("Workers"));
    }

    #[test]
    fn test_validate_invalid_queue_capacity() {
        let mut config = Config::default();
        config.queue_capacity = 0;
        assert!(config.validate().unwrap_err().contains("Queue capacity"));
    }

    #[test]
    fn test_validate_buffer_size() {
        let mut config = Config::default();
        config.buffer_size = 1;
        assert!(config.validate().unwrap_err().contains("Buffer size"));

        config.buffer_size = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_chunk_size() {
        let mut config = Config::default();
        config.chunk_size = 0;
        assert!(config.validate().unwrap_err().contains("Chunk size"));
    }

    // ==================== Timeouts ====================

    #[test]
    fn test_timeout() {
        let mut config = Config::default();
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));

        config.timeout_ms = 0;
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_default_framing() {
        assert_eq!(Config::default().framing(), Framing::ContentLength);
    }

    #[test]
    fn test_log_summary() {
        let mut config = Config::default();
        // Should not panic
        config.log_summary();

        config.chunked = true;
        config.timeout_ms = 0;
        config.log_summary();
    }
}
