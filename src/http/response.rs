//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! API para construir respuestas. El framing (`Content-Length` o
//! `Transfer-Encoding: chunked`) y la codificación de contenido los aplica
//! la sesión al serializar, ver [`crate::http::encoding`].
//!
//! ## Ejemplo de uso
//!
//! ```
//! use http11_server::http::{Response, StatusCode};
//!
//! let response = Response::new(StatusCode::Ok)
//!     .with_header("Content-Type", "text/plain")
//!     .with_body("hi");
//!
//! assert_eq!(response.body(), b"hi");
//! ```

use super::encoding::Framing;
use super::headers::{self, HeaderMap};
use super::StatusCode;
use serde::Serialize;

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers con nombre canónico
    headers: HeaderMap,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,

    /// Framing elegido por quien construyó la respuesta
    framing: Framing,
}

/// Body JSON de las respuestas de error
#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl Response {
    /// Crea una nueva respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
            framing: Framing::default(),
        }
    }

    /// Agrega un header (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers
            .insert(headers::canonical_name(name), value.to_string());
    }

    /// Quita un header y retorna su valor
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        self.headers.remove(&headers::canonical_name(name))
    }

    /// Establece el cuerpo desde un string
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo desde bytes
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Reemplaza el cuerpo (lo usa la codificación de contenido)
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Elige el framing de transferencia
    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Atajo para framing chunked
    pub fn chunked(self, chunk_size: usize) -> Self {
        self.with_framing(Framing::Chunked { chunk_size })
    }

    /// Respuesta de texto plano
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::new(status)
            .with_header(headers::CONTENT_TYPE, "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// Respuesta de error con mensaje JSON: `{"error": "mensaje"}`
    ///
    /// # Ejemplo
    /// ```
    /// use http11_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::NotFound, "no \"such\" file");
    /// assert_eq!(response.body(), br#"{"error":"no \"such\" file"}"#);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::to_vec(&ErrorBody { error: message })
            .unwrap_or_else(|_| message.as_bytes().to_vec());
        Self::new(status)
            .with_header(headers::CONTENT_TYPE, "application/json")
            .with_body_bytes(body)
    }

    /// Respuesta para un request malformado (400)
    pub fn bad_request() -> Self {
        Self::error(StatusCode::BadRequest, "malformed request")
    }

    /// Respuesta para una versión de protocolo no soportada (505)
    pub fn version_not_supported() -> Self {
        Self::error(StatusCode::HttpVersionNotSupported, "unsupported protocol version")
    }

    /// Respuesta de error para un código de protocolo cualquiera
    pub fn for_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BadRequest => Self::bad_request(),
            StatusCode::HttpVersionNotSupported => Self::version_not_supported(),
            other => Self::error(other, other.reason_phrase()),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn reason(&self) -> &'static str {
        self.status.reason_phrase()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Obtiene un header sin distinguir mayúsculas en el nombre
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&headers::canonical_name(name))
            .map(|v| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }
}
