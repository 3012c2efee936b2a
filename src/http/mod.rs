//! # Módulo HTTP
//!
//! Este módulo implementa el protocolo HTTP/1.1 desde cero, sin usar
//! librerías de alto nivel. Incluye:
//!
//! - Parsing de requests HTTP/1.1
//! - Construcción de responses HTTP
//! - Manejo de status codes
//! - Codificación gzip y framing (`Content-Length` o chunked)
//!
//! ## Diferencias con HTTP/1.0
//!
//! - Las conexiones son persistentes por defecto (`Connection: close` las cierra)
//! - Existe el framing `Transfer-Encoding: chunked`
//! - Solo se acepta el literal de versión `HTTP/1.1`
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! Another-Header: Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/plain\r\n
//! Content-Length: 2\r\n
//! Connection: keep-alive\r\n
//! \r\n
//! hi
//! ```

pub mod encoding; // Content-Encoding, framing y serialización
pub mod headers;  // Nombres canónicos de headers
pub mod request;  // Parsing de HTTP requests
pub mod response; // Construcción de HTTP responses
pub mod status;   // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
// Esto permite usar `http::Request` en vez de `http::request::Request`
pub use encoding::{ContentCoding, Framing};
pub use request::{Method, Protocol, Request};
pub use response::Response;
pub use status::StatusCode;
