//! # Errores del Servidor
//! src/error.rs
//!
//! Taxonomía de errores por capa:
//!
//! - [`ConnectionError`]: fallos de E/S sobre el socket. Se recuperan
//!   cerrando la conexión, nunca se reintentan.
//! - [`PoolError`]: el pool rechazó un trabajo. Lo decide el accept loop,
//!   nunca llega al peer.
//! - [`RouteError`]: el responder no pudo mapear el target. Se convierte
//!   en una respuesta 4xx/5xx.

use crate::http::StatusCode;
use std::io;
use thiserror::Error;

/// Errores del socket con buffer
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// El peer hizo un shutdown ordenado antes de completar la línea
    #[error("peer closed the connection")]
    PrematureClose,

    /// Venció el timeout de lectura del socket
    #[error("read timed out")]
    ReadTimeout,

    /// Venció el timeout de escritura del socket
    #[error("write timed out")]
    WriteTimeout,

    /// La línea recibida no es UTF-8 válido
    #[error("received line is not valid UTF-8")]
    MalformedLine,

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl ConnectionError {
    /// `true` si el peer simplemente se fue (no es un error real)
    pub fn is_peer_gone(&self) -> bool {
        matches!(self, ConnectionError::PrematureClose)
    }

    /// `true` si el fallo fue un timeout del socket
    pub fn is_timeout(&self) -> bool {
        matches!(self, ConnectionError::ReadTimeout | ConnectionError::WriteTimeout)
    }
}

/// Errores al encolar trabajo en el pool
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("worker pool is shutting down")]
    PoolClosed,

    #[error("worker queue is full (max capacity: {capacity})")]
    QueueFull { capacity: usize },
}

/// Errores de ruteo devueltos por un responder
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid request target: {0}")]
    BadTarget(String),

    #[error("path escapes the document root: {0}")]
    Forbidden(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(#[from] io::Error),
}

impl RouteError {
    /// Código de estado que recibe el peer
    pub fn status(&self) -> StatusCode {
        match self {
            RouteError::BadTarget(_) => StatusCode::BadRequest,
            RouteError::Forbidden(_) => StatusCode::Forbidden,
            RouteError::NotFound(_) => StatusCode::NotFound,
            RouteError::Internal(_) => StatusCode::InternalServerError,
        }
    }
}
