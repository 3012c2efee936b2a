//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser escrito a mano sobre [`BufferedConnection::recv_line`].
//!
//! ## Formato de un Request
//!
//! ```text
//! GET /index.html HTTP/1.1\r\n
//! Host: localhost:9999\r\n
//! Accept-Encoding: gzip\r\n
//! \r\n
//! ```
//!
//! 1. **Request Line**: `METHOD SP TARGET SP VERSION`, cortada en los dos
//!    primeros espacios. Falta un separador → 400. Versión distinta del
//!    literal soportado → 505. Método fuera del conjunto → 501.
//! 2. **Headers**: `Name: Value` hasta una línea vacía, cortados en el
//!    primer `:`. Sin folding. El último duplicado gana.
//! 3. **Body**: no se consume.
//!
//! Los errores de protocolo se devuelven como `Err(StatusCode)`.

use super::headers::{self, HeaderMap};
use super::StatusCode;
use crate::error::ConnectionError;
use crate::net::BufferedConnection;
use std::fmt;
use std::io::{Read, Write};

/// Métodos HTTP reconocidos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    OPTIONS,
    GET,
    HEAD,
    POST,
    PUT,
    DELETE,
    TRACE,
    CONNECT,
}

impl Method {
    /// Todos los métodos que el parser reconoce
    pub const ALL: [Method; 8] = [
        Method::OPTIONS,
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::TRACE,
        Method::CONNECT,
    ];

    /// Parsea un método (sensible a mayúsculas)
    ///
    /// # Ejemplo
    /// ```
    /// use http11_server::http::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::OPTIONS => "OPTIONS",
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::TRACE => "TRACE",
            Method::CONNECT => "CONNECT",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parámetros del protocolo, fijos desde el arranque
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    /// Literal de versión aceptado (comparación byte a byte)
    pub version: String,

    /// Métodos implementados
    pub methods: Vec<Method>,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            version: "HTTP/1.1".to_string(),
            methods: Method::ALL.to_vec(),
        }
    }
}

/// Request line ya validada
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub target: String,
    pub version: String,
}

/// Un request HTTP/1.1 parseado. Inmutable una vez construido.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Target tal como llegó (sin normalizar)
    target: String,

    version: String,

    /// Headers con nombre canónico
    headers: HeaderMap,
}

/// Resultado fallido de leer un request
#[derive(Debug)]
pub enum RecvError {
    /// El socket falló o el peer se fue
    Connection(ConnectionError),

    /// El request es inválido; se responde con este código y se cierra
    Status(StatusCode),
}

impl From<ConnectionError> for RecvError {
    fn from(e: ConnectionError) -> Self {
        match e {
            ConnectionError::MalformedLine => RecvError::Status(StatusCode::BadRequest),
            other => RecvError::Connection(other),
        }
    }
}

impl From<StatusCode> for RecvError {
    fn from(status: StatusCode) -> Self {
        RecvError::Status(status)
    }
}

/// Parsea la request line
///
/// # Ejemplo
/// ```
/// use http11_server::http::request::{parse_request_line, Protocol};
/// use http11_server::http::{Method, StatusCode};
///
/// let protocol = Protocol::default();
/// let line = parse_request_line("GET /index.html HTTP/1.1", &protocol).unwrap();
/// assert_eq!(line.method, Method::GET);
/// assert_eq!(line.target, "/index.html");
///
/// let err = parse_request_line("GET / HTTP/1.0", &protocol).unwrap_err();
/// assert_eq!(err, StatusCode::HttpVersionNotSupported);
/// ```
pub fn parse_request_line(line: &str, protocol: &Protocol) -> Result<RequestLine, StatusCode> {
    let (method, rest) = line.split_once(' ').ok_or(StatusCode::BadRequest)?;
    let (target, version) = rest.split_once(' ').ok_or(StatusCode::BadRequest)?;

    if method.is_empty() || target.is_empty() {
        return Err(StatusCode::BadRequest);
    }
    if version != protocol.version {
        return Err(StatusCode::HttpVersionNotSupported);
    }

    let method = Method::from_str(method)
        .filter(|m| protocol.methods.contains(m))
        .ok_or(StatusCode::NotImplemented)?;

    Ok(RequestLine {
        method,
        target: target.to_string(),
        version: version.to_string(),
    })
}

/// Parsea una línea de header en (nombre canónico, valor sin espacios en los bordes)
pub fn parse_header_line(line: &str) -> Result<(String, String), StatusCode> {
    let (name, value) = line.split_once(':').ok_or(StatusCode::BadRequest)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(StatusCode::BadRequest);
    }
    Ok((headers::canonical_name(name), value.trim().to_string()))
}

impl Request {
    /// Crea un request sin headers
    pub fn new(method: Method, target: &str, version: &str) -> Self {
        Self {
            method,
            target: target.to_string(),
            version: version.to_string(),
            headers: HeaderMap::new(),
        }
    }

    /// Agrega un header (el nombre se normaliza)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(headers::canonical_name(name), value.to_string());
        self
    }

    /// Lee un request completo desde la conexión
    ///
    /// Lee la request line y luego headers hasta la línea vacía.
    pub fn read_from<S: Read + Write>(
        conn: &mut BufferedConnection<S>,
        protocol: &Protocol,
    ) -> Result<Self, RecvError> {
        let line = conn.recv_line()?;
        let RequestLine { method, target, version } = parse_request_line(&line, protocol)?;

        let mut headers = HeaderMap::new();
        loop {
            let line = conn.recv_line()?;
            if line.is_empty() {
                break;
            }
            let (name, value) = parse_header_line(&line)?;
            headers.insert(name, value);
        }

        Ok(Self {
            method,
            target,
            version,
            headers,
        })
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    /// Target tal como llegó, incluida la query
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Target sin query ni fragmento
    pub fn path(&self) -> &str {
        let end = self.target.find(&['?', '#'][..]).unwrap_or(self.target.len());
        &self.target[..end]
    }

    pub fn version(&self) -> &str {
        &self.version
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

    /// La conexión persiste salvo `Connection: close`
    pub fn keep_alive(&self) -> bool {
        !self
            .header(headers::CONNECTION)
            .map(|v| v.eq_ignore_ascii_case("close"))
            .unwrap_or(false)
    }

    /// `true` si `Accept-Encoding` menciona gzip
    pub fn accepts_gzip(&self) -> bool {
        self.header(headers::ACCEPT_ENCODING)
            .map(|v| headers::contains_ignore_case(v, "gzip"))
            .unwrap_or(false)
    }
}
