//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes y las encola en el pool de workers
//! 3. Lee y parsea requests HTTP/1.1 (varios por conexión)
//! 4. Genera, codifica y envía responses HTTP

pub mod session;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use session::{HttpSession, SessionConfig, SessionEnd};
pub use tcp::{Server, ShutdownHandle};
