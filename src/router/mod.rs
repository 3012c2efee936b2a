//! # Sistema de Routing
//! src/router/mod.rs
//!
//! La sesión entrega cada request parseado a un [`Responder`], que decide
//! la respuesta.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Responder → Result<Response, RouteError>
//!                              │
//!                              └─ Err → error_response() → 4xx/5xx JSON
//! ```
//!
//! El responder que trae el servidor es [`FileResponder`], que mapea el
//! target dentro de un [`DocumentRoot`] antes de abrir cualquier archivo.

pub mod files;   // Archivos estáticos e índices de directorio
pub mod sandbox; // Mapeo seguro de targets al document root

pub use files::FileResponder;
pub use sandbox::DocumentRoot;

use crate::error::RouteError;
use crate::http::{Request, Response};

/// Algo capaz de responder requests
///
/// Se comparte entre todos los workers, por eso exige `Send + Sync`.
/// Un responder nunca entra en pánico por un target inválido: lo reporta
/// con un [`RouteError`].
pub trait Responder: Send + Sync + 'static {
    fn respond(&self, request: &Request) -> Result<Response, RouteError>;
}

/// Cualquier closure compatible sirve como responder
///
/// # Ejemplo
/// ```
/// use http11_server::error::RouteError;
/// use http11_server::http::{Method, Request, Response, StatusCode};
/// use http11_server::router::Responder;
///
/// let hello = |_req: &Request| -> Result<Response, RouteError> {
///     Ok(Response::text(StatusCode::Ok, "hello"))
/// };
/// let request = Request::new(Method::GET, "/", "HTTP/1.1");
///
/// assert_eq!(hello.respond(&request).unwrap().body(), b"hello");
/// ```
impl<F> Responder for F
where
    F: Fn(&Request) -> Result<Response, RouteError> + Send + Sync + 'static,
{
    fn respond(&self, request: &Request) -> Result<Response, RouteError> {
        self(request)
    }
}

/// Convierte un error de ruteo en la respuesta que recibe el peer
pub fn error_response(error: &RouteError) -> Response {
    let message = match error {
        // No se filtran detalles de E/S internos al cliente
        RouteError::Internal(_) => "internal server error".to_string(),
        other => other.to_string(),
    };
    Response::error(error.status(), &message)
}
